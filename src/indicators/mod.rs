// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators written next to
// every candle.  Every calculator returns one `Option<f64>` per input row so
// callers are forced to handle insufficient-history and gap scenarios.

pub mod atr;
pub mod engine;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod vwap;

pub use engine::{IndicatorEngine, IndicatorParams};
pub use snapshot::{AnnotatedCandle, IndicatorKind, IndicatorSnapshot};
