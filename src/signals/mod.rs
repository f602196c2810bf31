// =============================================================================
// Signals Module
// =============================================================================
//
// Crossover pipeline over an indicator-annotated series:
// - Transition detection (value vs reference between adjacent rows)
// - The declared comparison set
// - Chunked scanning into actionable records
// - Timestamp-keyed accumulation across chunk runs

pub mod comparison;
pub mod crossover;
pub mod engine;
pub mod ledger;

pub use comparison::CrossoverParams;
pub use engine::{ActionableRecord, CrossoverEngine};
pub use ledger::ActionableLedger;
