pub mod candle;
pub mod fetcher;
pub mod source;
pub mod stats;

// Re-exports for convenient access (e.g. `use crate::market_data::Series`).
pub use candle::{Candle, Series};
pub use fetcher::Fetcher;
pub use source::MarketDataSource;
pub use stats::FetchStatsSnapshot;
