use std::path::{Path, PathBuf};

use common::{BacktestError, PriceSeries, Result};
use tracing::debug;

use super::loader::{load_csv, load_json, ticker_from_path};
use super::synthetic::generate_synthetic_series;

/// Port for the quote provider that supplies historical prices
pub trait MarketDataSource {
    fn fetch(&self, ticker: &str) -> Result<PriceSeries>;
}

/// Load bars from file, detecting format from extension
pub fn load_file(path: &Path) -> Result<PriceSeries> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => {
            let bars = load_csv(path)?;
            Ok(PriceSeries::from_bars(ticker_from_path(path), &bars))
        }
        "json" => load_json(path),
        _ => Err(BacktestError::DataLoadError(format!(
            "Unsupported file format: {}",
            ext
        ))),
    }
}

/// Reads CSV/JSON price files from disk.
///
/// When pointed at a directory, `fetch` looks for `<TICKER>.csv` and then
/// `<TICKER>.json` inside it; when pointed at a single file, that file is used
/// for every ticker.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    root: PathBuf,
}

impl FileDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, ticker: &str) -> Result<PathBuf> {
        if self.root.is_file() {
            return Ok(self.root.clone());
        }

        ["csv", "json"]
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", ticker.to_uppercase(), ext)))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| {
                BacktestError::DataLoadError(format!(
                    "no price file for {} in {}",
                    ticker,
                    self.root.display()
                ))
            })
    }
}

impl MarketDataSource for FileDataSource {
    fn fetch(&self, ticker: &str) -> Result<PriceSeries> {
        let path = self.resolve(ticker)?;
        debug!(ticker, path = %path.display(), "loading price file");

        let mut series = load_file(&path)?;
        series.ticker = ticker.to_string();
        Ok(series)
    }
}

/// Deterministic random-walk data for demos and tests
#[derive(Debug, Clone, Copy)]
pub struct SyntheticDataSource {
    pub days: usize,
    pub initial_price: f64,
    pub seed: u64,
}

impl Default for SyntheticDataSource {
    fn default() -> Self {
        Self {
            days: 5 * 252,
            initial_price: 100.0,
            seed: 42,
        }
    }
}

impl MarketDataSource for SyntheticDataSource {
    fn fetch(&self, ticker: &str) -> Result<PriceSeries> {
        if self.days == 0 {
            return Err(BacktestError::EmptyPriceSeries);
        }
        Ok(generate_synthetic_series(
            ticker,
            self.days,
            self.initial_price,
            self.seed,
        ))
    }
}
