//! Reshaping error types
//!
//! Every failure of the reshaping core is reported synchronously through
//! [`ReshapeError`]. Nothing is retried or silently repaired: a mismatched
//! input fails instead of producing a partially reshaped table.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised by the reshaping core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReshapeError {
    /// Resampling period code is not one of day/week/month/quarter/year
    #[error("Invalid frequency: {0}")]
    InvalidFrequency(String),

    /// Series has no points, or only null values
    #[error("Empty series: {0}")]
    EmptySeries(String),

    /// Seasonal statistics need exactly one value column
    #[error("Seasonal statistics require exactly one value column, got {0}")]
    NonUnivariateInput(usize),

    /// Cutoff year leaves no historical baseline
    #[error("Invalid cutoff year {cutoff_year}: data starts in {first_year}")]
    InvalidCutoff { cutoff_year: i32, first_year: i32 },

    /// Secondary axis rescaling works on exactly two value columns
    #[error("Secondary axis requires exactly two value columns, got {0}")]
    SecondaryAxisArityError(usize),

    /// Secondary column has no spread to rescale against
    #[error("Secondary column '{0}' has zero or undefined standard deviation")]
    DegenerateSecondary(String),

    /// Relative-date expression could not be parsed
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// Relative-date expression resolved to an open bound where a date was required
    #[error("Expression resolved to an unbounded date: {0}")]
    UnboundedDate(String),

    /// A configured hierarchy legend has no matching data column
    #[error("Hierarchy legend not found in data: {0}")]
    HierarchyLegendNotFound(String),

    /// Hierarchy configuration is malformed (depth, duplicate legends, ...)
    #[error("Invalid hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Aggregation name is not recognised
    #[error("Unknown aggregation: {0}")]
    UnknownAggregation(String),

    /// Interpolation method is not recognised
    #[error("Unknown interpolation method: {0}")]
    UnknownInterpolation(String),

    /// Two points share the same date
    #[error("Duplicate timestamp: {0}")]
    DuplicateTimestamp(NaiveDate),

    /// Column name already present in the frame
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),

    /// Column length differs from the frame index length
    #[error("Column '{column}' has {actual} values, index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Referenced column does not exist
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
}

/// Result type for reshaping operations
pub type ReshapeResult<T> = Result<T, ReshapeError>;
