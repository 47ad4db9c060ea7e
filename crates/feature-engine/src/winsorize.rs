//! Outlier Clipping Against Training-Time Bounds
//!
//! Percentile clipping only means something over a population, so the bounds
//! are derived once from the training sample and stored with the model. At
//! inference time each value is clamped against them.

use crate::FeatureError;
use serde::{Deserialize, Serialize};

/// Humidity tail limits (lower, upper) used when fitting bounds
pub const HUMIDITY_TAIL_LIMITS: (f64, f64) = (0.01, 0.01);
/// Wind speed tail limits (lower, upper) used when fitting bounds
pub const WINDSPEED_TAIL_LIMITS: (f64, f64) = (0.05, 0.05);

/// Two-sided clamp `[lower, upper]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipBounds {
    pub lower: f64,
    pub upper: f64,
}

impl ClipBounds {
    /// Create bounds, rejecting NaN ends and `lower > upper`
    pub fn new(lower: f64, upper: f64) -> Result<Self, FeatureError> {
        let bounds = Self { lower, upper };
        bounds.check()?;
        Ok(bounds)
    }

    /// Bounds that leave every value untouched
    pub fn passthrough() -> Self {
        Self {
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
        }
    }

    /// Derive bounds from a training sample.
    ///
    /// Values below the `lower_tail` quantile are raised to the smallest
    /// retained value and values above the `1 - upper_tail` quantile lowered to
    /// the largest retained one; those two retained values are the bounds.
    pub fn from_sample(values: &[f64], lower_tail: f64, upper_tail: f64) -> Result<Self, FeatureError> {
        let tails_ok = |t: f64| (0.0..0.5).contains(&t);
        if !tails_ok(lower_tail) || !tails_ok(upper_tail) {
            return Err(FeatureError::InvalidTailLimits {
                lower: lower_tail,
                upper: upper_tail,
            });
        }

        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return Err(FeatureError::EmptySample);
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let low_idx = (lower_tail * n as f64).floor() as usize;
        let cut_high = (upper_tail * n as f64).floor() as usize;
        let high_idx = n - cut_high - 1;

        // Each tail is below half the sample, so low_idx <= high_idx
        Self::new(sorted[low_idx], sorted[high_idx])
    }

    /// Validate a deserialized pair
    pub fn check(&self) -> Result<(), FeatureError> {
        if self.lower.is_nan() || self.upper.is_nan() {
            return Err(FeatureError::NanBound);
        }
        if self.lower > self.upper {
            return Err(FeatureError::InvertedBounds {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    /// Clamp a single value
    pub fn clip(&self, value: f64) -> f64 {
        self.lower.max(self.upper.min(value))
    }

    /// Whether the value lies inside the bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Clip bounds for every winsorized field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutlierBounds {
    pub humidity: ClipBounds,
    pub windspeed: ClipBounds,
}

impl OutlierBounds {
    /// Fit bounds from training columns using the standard tail limits
    pub fn fit(humidity: &[f64], windspeed: &[f64]) -> Result<Self, FeatureError> {
        Ok(Self {
            humidity: ClipBounds::from_sample(humidity, HUMIDITY_TAIL_LIMITS.0, HUMIDITY_TAIL_LIMITS.1)?,
            windspeed: ClipBounds::from_sample(windspeed, WINDSPEED_TAIL_LIMITS.0, WINDSPEED_TAIL_LIMITS.1)?,
        })
    }

    /// No clipping on any field
    pub fn passthrough() -> Self {
        Self {
            humidity: ClipBounds::passthrough(),
            windspeed: ClipBounds::passthrough(),
        }
    }

    pub fn check(&self) -> Result<(), FeatureError> {
        self.humidity.check()?;
        self.windspeed.check()
    }
}
