//! Data Validation for Demand Observations
//!
//! Provides the raw observation type, range checking at the input boundary,
//! and the form defaults derived from the observation timestamp.

mod error;
mod observation;
mod validator;

pub use error::ValidationError;
pub use observation::{default_season, default_working_day, parse_timestamp, Observation};
pub use validator::{ValidationConfig, ValidationResult, Validator};
