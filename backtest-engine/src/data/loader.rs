use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use common::{BacktestError, Bar, PriceSeries, Result};
use serde::Deserialize;

/// Load bars from CSV file, oldest first
pub fn load_csv(path: &Path) -> Result<Vec<Bar>> {
    let file = File::open(path).map_err(|e| BacktestError::DataLoadError(e.to_string()))?;
    let reader = BufReader::new(file);
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut bars = Vec::new();

    for result in csv_reader.records() {
        let record = result.map_err(|e| BacktestError::CsvError(e.to_string()))?;

        // Expected columns: date, open, high, low, close, [volume]
        if record.len() < 5 {
            continue;
        }

        let timestamp = parse_timestamp(&record[0])?;
        let open = parse_field(&record[1], "open")?;
        let high = parse_field(&record[2], "high")?;
        let low = parse_field(&record[3], "low")?;
        let close = parse_field(&record[4], "close")?;
        let volume = match record.get(5) {
            Some(raw) if !raw.trim().is_empty() => parse_field(raw, "volume")?,
            _ => 0.0,
        };

        bars.push((timestamp, Bar::new(format_date(&timestamp), open, high, low, close, volume)));
    }

    Ok(sort_chronologically(bars))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPayload {
    Bars(Vec<Bar>),
    Series(PriceSeries),
}

/// Load a JSON file holding either a list of bars or a parallel-array price series
pub fn load_json(path: &Path) -> Result<PriceSeries> {
    let file = File::open(path).map_err(|e| BacktestError::DataLoadError(e.to_string()))?;
    let reader = BufReader::new(file);
    let payload: JsonPayload = serde_json::from_reader(reader)?;

    match payload {
        JsonPayload::Bars(bars) => {
            let mut stamped = Vec::with_capacity(bars.len());
            for mut bar in bars {
                let timestamp = parse_timestamp(&bar.date)?;
                bar.date = format_date(&timestamp);
                stamped.push((timestamp, bar));
            }
            Ok(PriceSeries::from_bars(
                ticker_from_path(path),
                &sort_chronologically(stamped),
            ))
        }
        JsonPayload::Series(series) => into_chronological(series),
    }
}

/// Reverse a series whose dates run newest first
pub fn into_chronological(mut series: PriceSeries) -> Result<PriceSeries> {
    if series.dates.len() < 2 {
        return Ok(series);
    }

    let first = parse_timestamp(&series.dates[0])?;
    let last = parse_timestamp(&series.dates[series.dates.len() - 1])?;
    if first > last {
        series.dates.reverse();
        series.prices.reverse();
        series.opens.reverse();
        series.highs.reverse();
        series.lows.reverse();
        series.volumes.reverse();
    }

    Ok(series)
}

/// File stem, upper-cased, used when the payload carries no ticker
pub fn ticker_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_uppercase)
        .unwrap_or_else(|| "Unknown".to_string())
}

fn sort_chronologically(mut bars: Vec<(DateTime<Utc>, Bar)>) -> Vec<Bar> {
    bars.sort_by_key(|(ts, _)| *ts);
    bars.into_iter().map(|(_, bar)| bar).collect()
}

fn parse_field(raw: &str, name: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| BacktestError::CsvError(format!("Invalid {}: {}", name, raw)))
}

/// Daily bars keep the bare date; intraday bars keep the time as well
fn format_date(ts: &DateTime<Utc>) -> String {
    if ts.num_seconds_from_midnight() == 0 {
        ts.format("%Y-%m-%d").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Parse timestamp from various formats
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    // Try ISO 8601 format first
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    let datetime_formats = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(Utc.from_utc_datetime(&dt));
        }
    }

    let date_formats = ["%Y-%m-%d", "%Y/%m/%d"];
    for fmt in &date_formats {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(s, fmt) {
            if let Some(dt) = date.and_hms_opt(0, 0, 0) {
                return Ok(Utc.from_utc_datetime(&dt));
            }
        }
    }

    // Try Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt);
        }
    }

    Err(BacktestError::DataLoadError(format!(
        "Unable to parse timestamp: {}",
        s
    )))
}
