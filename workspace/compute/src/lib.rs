//! Recurring pattern engine: the next-occurrence calculator, the pattern
//! lifecycle state machine and the generation runner that materializes due
//! occurrences into transactions.

pub mod error;
pub mod generation;
pub mod lifecycle;
pub mod recurrence;

#[cfg(test)]
mod testing;

pub use error::{ComputeError, Result};
pub use generation::{
    GenerationOutcome, GenerationReport, GenerationRunner, LedgerMaterializer, Materializer,
    PatternRun,
};
pub use lifecycle::LifecycleAction;
pub use recurrence::Schedule;
