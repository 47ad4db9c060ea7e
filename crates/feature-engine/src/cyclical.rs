//! Cyclical Encoding of Periodic Calendar Fields

use crate::calendar::CalendarFields;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Hours per day
pub const HOUR_PERIOD: f64 = 24.0;
/// Months per year
pub const MONTH_PERIOD: f64 = 12.0;
/// Days per week
pub const WEEKDAY_PERIOD: f64 = 7.0;

/// Point on the unit circle for a periodic value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyclicalPair {
    pub sin: f64,
    pub cos: f64,
}

impl CyclicalPair {
    /// Encode `value` with the given period as `(sin(2πv/p), cos(2πv/p))`
    pub fn encode(value: f64, period: f64) -> Self {
        let angle = 2.0 * PI * value / period;
        Self {
            sin: angle.sin(),
            cos: angle.cos(),
        }
    }

    /// Euclidean distance between two encodings
    pub fn distance(&self, other: &CyclicalPair) -> f64 {
        ((self.sin - other.sin).powi(2) + (self.cos - other.cos).powi(2)).sqrt()
    }
}

/// Sine/cosine pairs for hour, month and weekday
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyclicalFeatures {
    pub hour: CyclicalPair,
    pub month: CyclicalPair,
    pub weekday: CyclicalPair,
}

impl CyclicalFeatures {
    /// Encode the periodic fields of a calendar decomposition
    pub fn from_calendar(calendar: &CalendarFields) -> Self {
        Self {
            hour: CyclicalPair::encode(calendar.hour as f64, HOUR_PERIOD),
            month: CyclicalPair::encode(calendar.month as f64, MONTH_PERIOD),
            weekday: CyclicalPair::encode(calendar.weekday as f64, WEEKDAY_PERIOD),
        }
    }
}
