use common::{StrategyParameters, StrategyType};

use crate::indicators::IndicatorValues;

/// Entry and reversal conditions for one strategy family.
///
/// Both hooks compare the previous bar against the current one and must return
/// `false` when any value they need is still undefined.
pub trait SignalRule: Send + Sync {
    fn name(&self) -> &str;

    /// Condition for opening a position at `curr`
    fn entry(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool;

    /// Strategy-specific exit, checked after stop loss and take profit
    fn reversal(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool;
}

/// Select the rule for the configured family once, up front
pub fn rule_for(params: &StrategyParameters) -> Box<dyn SignalRule> {
    match &params.strategy_type {
        StrategyType::MaCrossover => Box::new(MaCrossoverRule),
        StrategyType::RsiOversold => Box::new(RsiOversoldRule {
            oversold: params.rsi_oversold,
            overbought: params.rsi_overbought,
        }),
        StrategyType::BollingerBounce => Box::new(BollingerBounceRule),
        StrategyType::MacdCrossover => Box::new(MacdCrossoverRule),
        StrategyType::Unknown(name) => Box::new(NoSignalRule { name: name.clone() }),
    }
}

/// `a` moves from at-or-below `b` to strictly above it
fn crosses_above(prev_a: Option<f64>, prev_b: Option<f64>, a: Option<f64>, b: Option<f64>) -> bool {
    match (prev_a, prev_b, a, b) {
        (Some(pa), Some(pb), Some(a), Some(b)) => pa <= pb && a > b,
        _ => false,
    }
}

/// `a` moves from at-or-above `b` to strictly below it
fn crosses_below(prev_a: Option<f64>, prev_b: Option<f64>, a: Option<f64>, b: Option<f64>) -> bool {
    match (prev_a, prev_b, a, b) {
        (Some(pa), Some(pb), Some(a), Some(b)) => pa >= pb && a < b,
        _ => false,
    }
}

/// Fast SMA crossing the slow SMA
#[derive(Debug, Clone, Copy, Default)]
pub struct MaCrossoverRule;

impl SignalRule for MaCrossoverRule {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn entry(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        crosses_above(prev.ma_fast, prev.ma_slow, curr.ma_fast, curr.ma_slow)
    }

    fn reversal(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        crosses_below(prev.ma_fast, prev.ma_slow, curr.ma_fast, curr.ma_slow)
    }
}

/// RSI recovering from oversold, exiting once overbought
#[derive(Debug, Clone, Copy)]
pub struct RsiOversoldRule {
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiOversoldRule {
    fn default() -> Self {
        Self {
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl SignalRule for RsiOversoldRule {
    fn name(&self) -> &str {
        "rsi_oversold"
    }

    fn entry(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        crosses_above(prev.rsi, Some(self.oversold), curr.rsi, Some(self.oversold))
    }

    fn reversal(&self, _prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        curr.rsi.is_some_and(|rsi| rsi > self.overbought)
    }
}

/// Close bouncing back above the lower band, exiting at the middle band
#[derive(Debug, Clone, Copy, Default)]
pub struct BollingerBounceRule;

impl SignalRule for BollingerBounceRule {
    fn name(&self) -> &str {
        "bollinger_bounce"
    }

    fn entry(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        crosses_above(Some(prev.close), prev.bb_lower, Some(curr.close), curr.bb_lower)
    }

    fn reversal(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        match (prev.bb_middle, curr.bb_middle) {
            (Some(prev_mid), Some(mid)) => prev.close < prev_mid && curr.close >= mid,
            _ => false,
        }
    }
}

/// MACD histogram changing sign
#[derive(Debug, Clone, Copy, Default)]
pub struct MacdCrossoverRule;

impl SignalRule for MacdCrossoverRule {
    fn name(&self) -> &str {
        "macd_crossover"
    }

    fn entry(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        crosses_above(prev.macd_hist, Some(0.0), curr.macd_hist, Some(0.0))
    }

    fn reversal(&self, prev: &IndicatorValues, curr: &IndicatorValues) -> bool {
        crosses_below(prev.macd_hist, Some(0.0), curr.macd_hist, Some(0.0))
    }
}

/// Fallback for unrecognized families: holds cash for the whole run
#[derive(Debug, Clone, Default)]
pub struct NoSignalRule {
    pub name: String,
}

impl SignalRule for NoSignalRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn entry(&self, _prev: &IndicatorValues, _curr: &IndicatorValues) -> bool {
        false
    }

    fn reversal(&self, _prev: &IndicatorValues, _curr: &IndicatorValues) -> bool {
        false
    }
}
