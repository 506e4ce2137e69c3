pub mod loader;
pub mod source;
pub mod synthetic;

pub use loader::{load_csv, load_json, parse_timestamp};
pub use source::{load_file, FileDataSource, MarketDataSource, SyntheticDataSource};
pub use synthetic::{generate_pattern_series, generate_synthetic_series};
