use std::fmt;

use common::StrategyParameters;
use tracing::warn;

use crate::indicators::IndicatorSet;
use crate::portfolio::OpenPosition;
use crate::signals::rules::{rule_for, SignalRule};

/// Why an open position was closed, in evaluation priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Reversal,
    MaxHoldPeriod,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::StopLoss => "stop loss",
            ExitReason::TakeProfit => "take profit",
            ExitReason::Reversal => "signal reversal",
            ExitReason::MaxHoldPeriod => "max holding period",
        };
        f.write_str(s)
    }
}

/// Entry/exit decisions for one configured strategy family
pub struct SignalGenerator {
    rule: Box<dyn SignalRule>,
    stop_loss_pct: f64,
    take_profit_pct: f64,
    max_hold_days: usize,
}

impl SignalGenerator {
    pub fn new(params: &StrategyParameters) -> Self {
        if !params.strategy_type.is_known() {
            warn!(
                strategy_type = %params.strategy_type,
                "unknown strategy type, no signals will be generated"
            );
        }

        Self {
            rule: rule_for(params),
            stop_loss_pct: params.stop_loss_pct,
            take_profit_pct: params.take_profit_pct,
            max_hold_days: params.max_hold_days,
        }
    }

    pub fn strategy_name(&self) -> &str {
        self.rule.name()
    }

    /// Entry fires on the transition between `idx - 1` and `idx`
    pub fn check_entry(&self, indicators: &IndicatorSet, idx: usize) -> bool {
        if idx == 0 {
            return false;
        }
        match (indicators.get(idx - 1), indicators.get(idx)) {
            (Some(prev), Some(curr)) => self.rule.entry(&prev, &curr),
            _ => false,
        }
    }

    /// First matching exit condition for `position` at `idx`, if any
    pub fn check_exit(
        &self,
        indicators: &IndicatorSet,
        idx: usize,
        position: &OpenPosition,
    ) -> Option<ExitReason> {
        let curr = indicators.get(idx)?;
        let price = curr.close;

        if price < position.entry_price * (1.0 - self.stop_loss_pct / 100.0) {
            return Some(ExitReason::StopLoss);
        }

        if price > position.entry_price * (1.0 + self.take_profit_pct / 100.0) {
            return Some(ExitReason::TakeProfit);
        }

        if idx > 0 {
            if let Some(prev) = indicators.get(idx - 1) {
                if self.rule.reversal(&prev, &curr) {
                    return Some(ExitReason::Reversal);
                }
            }
        }

        if position.bars_held(idx) > self.max_hold_days {
            return Some(ExitReason::MaxHoldPeriod);
        }

        None
    }
}
