use thiserror::Error;

#[derive(Error, Debug)]
pub enum BacktestError {
    #[error("No price data available for backtest")]
    EmptyPriceSeries,

    #[error("Mismatched series: {field} has {actual} values, expected {expected}")]
    MismatchedSeries {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid price at index {index}: {value}")]
    InvalidPrice { index: usize, value: f64 },

    #[error("Position already open, entered at index {entry_index}")]
    PositionAlreadyOpen { entry_index: usize },

    #[error("No position to close")]
    NoPositionToClose,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data loading error: {0}")]
    DataLoadError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    CsvError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BacktestError>;
