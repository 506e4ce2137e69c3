pub mod generator;
pub mod rules;

pub use generator::{ExitReason, SignalGenerator};
pub use rules::{
    rule_for, BollingerBounceRule, MaCrossoverRule, MacdCrossoverRule, NoSignalRule,
    RsiOversoldRule, SignalRule,
};
