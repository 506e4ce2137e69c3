pub mod config;
pub mod error;
pub mod types;

pub use config::{StrategyParameters, StrategyType};
pub use error::{BacktestError, Result};
pub use types::*;
