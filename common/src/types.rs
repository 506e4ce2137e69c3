use serde::{Deserialize, Serialize};

use crate::error::{BacktestError, Result};

/// Daily OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: f64,
}

impl Bar {
    pub fn new(date: impl Into<String>, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date: date.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

fn unknown_ticker() -> String {
    "Unknown".to_string()
}

/// Historical price series in the parallel-array shape produced by the quote provider.
///
/// All non-empty arrays are index-aligned with `prices` (the closes), oldest first.
/// `opens`, `highs`, `lows`, `volumes` and `dates` may be left empty when the
/// provider does not supply them; only the closes drive the backtest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    #[serde(default = "unknown_ticker")]
    pub ticker: String,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub prices: Vec<f64>,
    #[serde(default)]
    pub opens: Vec<f64>,
    #[serde(default)]
    pub highs: Vec<f64>,
    #[serde(default)]
    pub lows: Vec<f64>,
    #[serde(default)]
    pub volumes: Vec<f64>,
}

impl PriceSeries {
    /// Build a close-only series
    pub fn from_closes(ticker: impl Into<String>, dates: Vec<String>, prices: Vec<f64>) -> Self {
        Self {
            ticker: ticker.into(),
            dates,
            prices,
            ..Default::default()
        }
    }

    /// Build a series from bar records, preserving their order
    pub fn from_bars(ticker: impl Into<String>, bars: &[Bar]) -> Self {
        Self {
            ticker: ticker.into(),
            dates: bars.iter().map(|b| b.date.clone()).collect(),
            prices: bars.iter().map(|b| b.close).collect(),
            opens: bars.iter().map(|b| b.open).collect(),
            highs: bars.iter().map(|b| b.high).collect(),
            lows: bars.iter().map(|b| b.low).collect(),
            volumes: bars.iter().map(|b| b.volume).collect(),
        }
    }

    /// Expand back into bar records. Missing OHLV fields fall back to the close (volume to 0).
    pub fn bars(&self) -> Vec<Bar> {
        self.prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                date: self.dates.get(i).cloned().unwrap_or_default(),
                open: self.opens.get(i).copied().unwrap_or(close),
                high: self.highs.get(i).copied().unwrap_or(close),
                low: self.lows.get(i).copied().unwrap_or(close),
                close,
                volume: self.volumes.get(i).copied().unwrap_or(0.0),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn date(&self, idx: usize) -> Option<&str> {
        self.dates.get(idx).map(String::as_str)
    }

    pub fn start_date(&self) -> Option<&str> {
        self.dates.first().map(String::as_str)
    }

    pub fn end_date(&self) -> Option<&str> {
        self.dates.last().map(String::as_str)
    }

    /// Check the series is usable: closes present, positive and finite, and every
    /// supplied parallel array the same length as the closes.
    pub fn validate(&self) -> Result<()> {
        let n = self.prices.len();
        if n == 0 {
            return Err(BacktestError::EmptyPriceSeries);
        }

        let fields: [(&'static str, usize); 5] = [
            ("dates", self.dates.len()),
            ("opens", self.opens.len()),
            ("highs", self.highs.len()),
            ("lows", self.lows.len()),
            ("volumes", self.volumes.len()),
        ];
        for (field, actual) in fields {
            if actual != 0 && actual != n {
                return Err(BacktestError::MismatchedSeries {
                    field,
                    expected: n,
                    actual,
                });
            }
        }

        if let Some((index, &value)) = self
            .prices
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p <= 0.0)
        {
            return Err(BacktestError::InvalidPrice { index, value });
        }

        Ok(())
    }
}

/// Trade direction in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Entry,
    Exit,
}

/// Individual trade record. Immutable once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    pub date: Option<String>,
    pub price: f64,
    pub shares: f64,
    pub value: f64,
}

impl Trade {
    pub fn entry(date: Option<String>, price: f64, shares: f64, cost: f64) -> Self {
        Self {
            trade_type: TradeType::Entry,
            date,
            price,
            shares,
            value: cost,
        }
    }

    pub fn exit(date: Option<String>, price: f64, shares: f64, proceeds: f64) -> Self {
        Self {
            trade_type: TradeType::Exit,
            date,
            price,
            shares,
            value: proceeds,
        }
    }

    pub fn is_entry(&self) -> bool {
        self.trade_type == TradeType::Entry
    }

    pub fn is_exit(&self) -> bool {
        self.trade_type == TradeType::Exit
    }
}

/// Performance metrics. Percentages and the Sharpe ratio are rounded to 2 decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_return: f64,
    pub cagr: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub num_trades: u32,
    /// Strategy return minus buy-and-hold return; only set on strategy metrics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vs_buy_hold: Option<f64>,
}

/// Backtest result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    pub ticker: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub trades: Vec<Trade>,
    pub portfolio_values: Vec<f64>,
    pub metrics: PerformanceMetrics,
    pub buy_hold_values: Vec<f64>,
    pub buy_hold_metrics: PerformanceMetrics,
}

impl BacktestResult {
    pub fn final_value(&self) -> f64 {
        self.portfolio_values.last().copied().unwrap_or(1.0)
    }

    pub fn buy_hold_final_value(&self) -> f64 {
        self.buy_hold_values.last().copied().unwrap_or(1.0)
    }
}
