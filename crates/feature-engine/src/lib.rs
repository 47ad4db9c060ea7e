//! Feature Engineering Engine
//!
//! Turns a raw demand observation into the named feature vector the trained
//! regression pipeline expects: calendar decomposition, sine/cosine encoding of
//! periodic fields, clamping against training-time outlier bounds, and
//! reconciliation against the model's feature schema.

mod calendar;
mod cyclical;
mod features;
mod schema;
mod winsorize;

pub use calendar::CalendarFields;
pub use cyclical::{CyclicalFeatures, CyclicalPair, HOUR_PERIOD, MONTH_PERIOD, WEEKDAY_PERIOD};
pub use features::{EngineeredRecord, FeatureExtractor};
pub use schema::{
    EngineeredFeatureVector, FeatureSchema, FeatureValue, FieldDefaulted, FieldKind, Reconciled,
    SchemaField, BIKE_SHARING_FIELDS,
};
pub use winsorize::{ClipBounds, OutlierBounds, HUMIDITY_TAIL_LIMITS, WINDSPEED_TAIL_LIMITS};

use thiserror::Error;

/// Errors raised while preparing feature engineering parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureError {
    #[error("Invalid clip bounds: lower {lower} exceeds upper {upper}")]
    InvertedBounds { lower: f64, upper: f64 },
    #[error("Clip bound is NaN")]
    NanBound,
    #[error("Tail limits ({lower}, {upper}) must each be in [0, 0.5)")]
    InvalidTailLimits { lower: f64, upper: f64 },
    #[error("Cannot derive bounds from an empty sample")]
    EmptySample,
}
