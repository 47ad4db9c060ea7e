//! Validation Error Types

use thiserror::Error;

/// Errors during observation validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Code outside its enumerated set
    #[error("{field} code {value} is not one of {allowed}")]
    InvalidCode {
        field: &'static str,
        value: i64,
        allowed: &'static str,
    },

    /// NaN or infinite measurement
    #[error("{0} must be a finite number")]
    NonFinite(&'static str),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}
