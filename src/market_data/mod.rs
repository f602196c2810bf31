pub mod candle;
pub mod loader;

// Re-export the Candle struct for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::Candle;
pub use loader::load_candle_files;
