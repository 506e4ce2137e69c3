pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{calculate_bollinger_bands, BollingerBands};
pub use ema::{calculate_ema, calculate_ema_from_first_valid};
pub use macd::{calculate_macd, MacdSeries};
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use common::StrategyParameters;

/// Indicator values at a single index. `None` means still inside the warm-up prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorValues {
    pub close: f64,
    pub ma_fast: Option<f64>,
    pub ma_slow: Option<f64>,
    pub rsi: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_lower: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
}

/// Pre-computed indicators for all bars, each index-aligned with the closes
#[derive(Debug, Clone)]
pub struct IndicatorSet {
    pub closes: Vec<f64>,
    pub ma_fast: Vec<Option<f64>>,
    pub ma_slow: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub bb: BollingerBands,
    pub macd: MacdSeries,
}

impl IndicatorSet {
    /// Calculate all indicators from closing prices
    pub fn calculate(closes: &[f64], params: &StrategyParameters) -> Self {
        Self {
            closes: closes.to_vec(),
            ma_fast: calculate_sma(closes, params.ma_fast),
            ma_slow: calculate_sma(closes, params.ma_slow),
            rsi: calculate_rsi(closes, params.rsi_period),
            bb: calculate_bollinger_bands(closes, params.bb_period, params.bb_std),
            macd: calculate_macd(
                closes,
                params.macd_fast,
                params.macd_slow,
                params.macd_signal,
            ),
        }
    }

    /// Get indicator values at a specific index, or `None` past the end
    pub fn get(&self, idx: usize) -> Option<IndicatorValues> {
        let close = *self.closes.get(idx)?;
        Some(IndicatorValues {
            close,
            ma_fast: self.ma_fast[idx],
            ma_slow: self.ma_slow[idx],
            rsi: self.rsi[idx],
            bb_upper: self.bb.upper[idx],
            bb_middle: self.bb.middle[idx],
            bb_lower: self.bb.lower[idx],
            macd: self.macd.macd[idx],
            macd_signal: self.macd.signal[idx],
            macd_hist: self.macd.histogram[idx],
        })
    }
}
