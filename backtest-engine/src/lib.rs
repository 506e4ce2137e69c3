pub mod data;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod portfolio;
pub mod signals;
pub mod sweep;

pub use data::{
    generate_pattern_series, generate_synthetic_series, load_file, FileDataSource,
    MarketDataSource, SyntheticDataSource,
};
pub use engine::{run_backtest, BacktestEngine, Simulation};
pub use indicators::{IndicatorSet, IndicatorValues};
pub use metrics::MetricsCalculator;
pub use portfolio::Portfolio;
pub use signals::{ExitReason, SignalGenerator};
pub use sweep::{optimize, OptimizationGoal, ParameterGrid, SweepEntry, SweepReport};

// Re-export common types
pub use common::{
    BacktestError, BacktestResult, Bar, PerformanceMetrics, PriceSeries, Result,
    StrategyParameters, StrategyType, Trade, TradeType,
};
