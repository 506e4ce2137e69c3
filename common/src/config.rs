use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{BacktestError, Result};

/// Signal family governing entry and exit logic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StrategyType {
    MaCrossover,
    RsiOversold,
    BollingerBounce,
    MacdCrossover,
    /// Unrecognized family name; never produces signals
    Unknown(String),
}

impl StrategyType {
    pub const ALL: [StrategyType; 4] = [
        StrategyType::MaCrossover,
        StrategyType::RsiOversold,
        StrategyType::BollingerBounce,
        StrategyType::MacdCrossover,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            StrategyType::MaCrossover => "ma_crossover",
            StrategyType::RsiOversold => "rsi_oversold",
            StrategyType::BollingerBounce => "bollinger_bounce",
            StrategyType::MacdCrossover => "macd_crossover",
            StrategyType::Unknown(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, StrategyType::Unknown(_))
    }
}

impl Default for StrategyType {
    fn default() -> Self {
        StrategyType::MaCrossover
    }
}

impl FromStr for StrategyType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "ma_crossover" => StrategyType::MaCrossover,
            "rsi_oversold" => StrategyType::RsiOversold,
            "bollinger_bounce" => StrategyType::BollingerBounce,
            "macd_crossover" => StrategyType::MacdCrossover,
            other => StrategyType::Unknown(other.to_string()),
        })
    }
}

impl From<String> for StrategyType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<StrategyType> for String {
    fn from(t: StrategyType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for StrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept `10` as well as `10.0` for window lengths
fn deserialize_period<'de, D>(deserializer: D) -> std::result::Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() || raw < 0.0 || raw.fract() != 0.0 {
        return Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {}",
            raw
        )));
    }
    Ok(raw as usize)
}

/// Strategy parameters. Any key missing from the input falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParameters {
    pub strategy_type: StrategyType,
    // Moving averages
    #[serde(deserialize_with = "deserialize_period")]
    pub ma_fast: usize,
    #[serde(deserialize_with = "deserialize_period")]
    pub ma_slow: usize,
    // RSI
    #[serde(deserialize_with = "deserialize_period")]
    pub rsi_period: usize,
    pub rsi_oversold: f64,
    pub rsi_overbought: f64,
    // Bollinger Bands
    #[serde(deserialize_with = "deserialize_period")]
    pub bb_period: usize,
    pub bb_std: f64,
    // MACD
    #[serde(deserialize_with = "deserialize_period")]
    pub macd_fast: usize,
    #[serde(deserialize_with = "deserialize_period")]
    pub macd_slow: usize,
    #[serde(deserialize_with = "deserialize_period")]
    pub macd_signal: usize,
    // Risk management (percentages, 5.0 = 5%)
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    #[serde(deserialize_with = "deserialize_period")]
    pub max_hold_days: usize,
    /// Cash units allocated per entry (portfolio starts at 1.0), capped at available cash
    pub position_size: f64,
}

impl Default for StrategyParameters {
    fn default() -> Self {
        Self {
            strategy_type: StrategyType::MaCrossover,
            ma_fast: 10,
            ma_slow: 50,
            rsi_period: 14,
            rsi_oversold: 30.0,
            rsi_overbought: 70.0,
            bb_period: 20,
            bb_std: 2.0,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            stop_loss_pct: 5.0,
            take_profit_pct: 10.0,
            max_hold_days: 30,
            position_size: 1.0,
        }
    }
}

impl StrategyParameters {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Leading bars skipped for trading decisions
    pub fn warmup_bars(&self) -> usize {
        self.ma_fast.max(self.ma_slow)
    }

    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("ma_fast", self.ma_fast),
            ("ma_slow", self.ma_slow),
            ("rsi_period", self.rsi_period),
            ("bb_period", self.bb_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
        ];
        for (name, value) in periods {
            if value == 0 {
                return Err(BacktestError::InvalidParameter(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        if !self.position_size.is_finite() || self.position_size <= 0.0 {
            return Err(BacktestError::InvalidParameter(format!(
                "position_size must be positive, got {}",
                self.position_size
            )));
        }

        let non_negative = [
            ("bb_std", self.bb_std),
            ("stop_loss_pct", self.stop_loss_pct),
            ("take_profit_pct", self.take_profit_pct),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(BacktestError::InvalidParameter(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }

    /// Set a numeric parameter by its wire name
    pub fn set_value(&mut self, name: &str, value: f64) -> Result<()> {
        let as_period = |v: f64| -> Result<usize> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
                Ok(v as usize)
            } else {
                Err(BacktestError::InvalidParameter(format!(
                    "{} must be a whole number, got {}",
                    name, v
                )))
            }
        };

        match name {
            "ma_fast" => self.ma_fast = as_period(value)?,
            "ma_slow" => self.ma_slow = as_period(value)?,
            "rsi_period" => self.rsi_period = as_period(value)?,
            "rsi_oversold" => self.rsi_oversold = value,
            "rsi_overbought" => self.rsi_overbought = value,
            "bb_period" => self.bb_period = as_period(value)?,
            "bb_std" => self.bb_std = value,
            "macd_fast" => self.macd_fast = as_period(value)?,
            "macd_slow" => self.macd_slow = as_period(value)?,
            "macd_signal" => self.macd_signal = as_period(value)?,
            "stop_loss_pct" => self.stop_loss_pct = value,
            "take_profit_pct" => self.take_profit_pct = value,
            "max_hold_days" => self.max_hold_days = as_period(value)?,
            "position_size" => self.position_size = value,
            _ => {
                return Err(BacktestError::InvalidParameter(format!(
                    "unknown parameter: {}",
                    name
                )))
            }
        }
        Ok(())
    }

    pub fn with_strategy(mut self, strategy_type: StrategyType) -> Self {
        self.strategy_type = strategy_type;
        self
    }

    pub fn with_ma_periods(mut self, fast: usize, slow: usize) -> Self {
        self.ma_fast = fast;
        self.ma_slow = slow;
        self
    }

    pub fn with_rsi(mut self, period: usize, oversold: f64, overbought: f64) -> Self {
        self.rsi_period = period;
        self.rsi_oversold = oversold;
        self.rsi_overbought = overbought;
        self
    }

    pub fn with_bollinger(mut self, period: usize, std_dev: f64) -> Self {
        self.bb_period = period;
        self.bb_std = std_dev;
        self
    }

    pub fn with_macd(mut self, fast: usize, slow: usize, signal: usize) -> Self {
        self.macd_fast = fast;
        self.macd_slow = slow;
        self.macd_signal = signal;
        self
    }

    pub fn with_stop_loss(mut self, stop_loss_pct: f64) -> Self {
        self.stop_loss_pct = stop_loss_pct;
        self
    }

    pub fn with_take_profit(mut self, take_profit_pct: f64) -> Self {
        self.take_profit_pct = take_profit_pct;
        self
    }

    pub fn with_max_hold_days(mut self, days: usize) -> Self {
        self.max_hold_days = days;
        self
    }

    pub fn with_position_size(mut self, position_size: f64) -> Self {
        self.position_size = position_size;
        self
    }
}
