//! Range Checking for Observations

use crate::error::ValidationError;
use crate::observation::Observation;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Temperature valid range (°C)
    pub temp_range: (f64, f64),
    /// Humidity valid range (%)
    pub humidity_range: (f64, f64),
    /// Wind speed valid range (km/h)
    pub windspeed_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            temp_range: (-20.0, 50.0),
            humidity_range: (0.0, 100.0),
            windspeed_range: (0.0, 80.0),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }
}

/// Boundary validator for observations
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NonFinite(field));
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate an enumerated code against an inclusive range
    pub fn validate_code(
        &self,
        field: &'static str,
        value: u8,
        min: u8,
        max: u8,
        allowed: &'static str,
    ) -> Result<(), ValidationError> {
        if value < min || value > max {
            Err(ValidationError::InvalidCode {
                field,
                value: value as i64,
                allowed,
            })
        } else {
            Ok(())
        }
    }

    /// Validate season code
    pub fn validate_season(&self, season: u8) -> Result<(), ValidationError> {
        self.validate_code("season", season, 1, 4, "{1, 2, 3, 4}")
    }

    /// Validate weather code
    pub fn validate_weather(&self, weather: u8) -> Result<(), ValidationError> {
        self.validate_code("weather", weather, 1, 4, "{1, 2, 3, 4}")
    }

    /// Validate a 0/1 flag
    pub fn validate_flag(&self, field: &'static str, flag: u8) -> Result<(), ValidationError> {
        self.validate_code(field, flag, 0, 1, "{0, 1}")
    }

    /// Validate temperature
    pub fn validate_temp(&self, temp: f64) -> Result<(), ValidationError> {
        self.validate_range("temp", temp, self.config.temp_range)
    }

    /// Validate humidity
    pub fn validate_humidity(&self, humidity: i32) -> Result<(), ValidationError> {
        self.validate_range("humidity", humidity as f64, self.config.humidity_range)
    }

    /// Validate wind speed
    pub fn validate_windspeed(&self, windspeed: f64) -> Result<(), ValidationError> {
        self.validate_range("windspeed", windspeed, self.config.windspeed_range)
    }

    /// Check every field of an observation, collecting all failures
    pub fn validate(&self, obs: &Observation) -> ValidationResult {
        let checks = [
            self.validate_season(obs.season),
            self.validate_flag("holiday", obs.holiday),
            self.validate_flag("workingday", obs.workingday),
            self.validate_weather(obs.weather),
            self.validate_temp(obs.temp),
            self.validate_humidity(obs.humidity),
            self.validate_windspeed(obs.windspeed),
        ];
        let fields_checked = checks.len();
        let errors: Vec<ValidationError> = checks.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            ValidationResult::valid(fields_checked)
        } else {
            debug!("Observation rejected with {} error(s)", errors.len());
            ValidationResult::invalid(errors, fields_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
