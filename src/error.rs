//! Error types for tempora operations.

use thiserror::Error;

/// Errors that can occur during temporal algebra operations.
#[derive(Error, Debug)]
pub enum TemporaError {
    /// Invalid input provided to an operation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Span bounds are inconsistent (lower above upper, or an empty span)
    #[error("Invalid span: {0}")]
    InvalidSpan(String),

    /// A span or time computation left the representable range
    #[error("Value out of range: {0}")]
    ValueOutOfRange(String),

    /// Malformed textual input
    #[error("Parse error: {0}")]
    Parse(String),

    /// The two arguments carry different spatial reference identifiers
    #[error("SRID mismatch: {0} vs {1}")]
    SridMismatch(i32, i32),

    /// The arguments' interpolation modes cannot be combined
    #[error("Interpolation mismatch: {0}")]
    InterpolationMismatch(String),

    /// A batch is incompatible with the aggregation state already built up
    #[error("Aggregation mismatch: {0}")]
    AggregationMismatch(String),

    /// The aggregation skip list cannot grow any further
    #[error("Aggregation exceeded available capacity")]
    AggregationCapacity,

    /// The divisor of a temporal division reaches zero during a segment
    #[error("Division by zero at {0}")]
    DivisionByZero(chrono::DateTime<chrono::Utc>),
}

/// Result type alias for tempora operations.
pub type Result<T> = std::result::Result<T, TemporaError>;
