use chrono::NaiveDate;
use thiserror::Error;

/// Error types for the compute module
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A recurrence rule or pattern field is malformed
    #[error("Validation error: {0}")]
    Validation(String),

    /// The rule never fires between its start date and end date
    #[error("No occurrence between {start_date} and {end_date}")]
    NoOccurrence {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },

    /// A lifecycle action is not allowed in the pattern's current state
    #[error("Cannot {action} a pattern that is {status}")]
    Lifecycle { action: String, status: String },

    /// A transaction could not be materialized from a pattern
    #[error("{0}")]
    Materialization(String),

    /// Date arithmetic left chrono's supported range
    #[error("Date error: {0}")]
    Date(String),
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
