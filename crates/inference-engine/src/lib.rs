//! Demand Scoring Engine
//!
//! Loads the trained regression model with its companion metadata and turns
//! engineered features into a rental-count estimate.

mod diagnostics;
mod engine;
mod metadata;
mod model;
mod onnx;

pub use diagnostics::ModelDiagnostics;
pub use engine::{
    invert_log_score, DemandEstimate, DemandPredictor, DemandTier, HIGH_DEMAND_FLOOR,
    LOW_DEMAND_CEILING,
};
pub use metadata::{ModelInfo, ModelMetadata};
pub use model::{encode_input, load_model, InputColumn, LoadedModel, ScoringModel};
pub use onnx::OnnxModel;

use thiserror::Error;

/// Errors during model loading and scoring
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Invalid model metadata: {0}")]
    InvalidMetadata(String),
    #[error("Feature vector does not match model schema: {reason} (vector: {vector})")]
    SchemaMismatch { reason: String, vector: String },
    #[error("Scoring failed: {0}")]
    ScoringFailure(String),
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),
}

impl InferenceError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            InferenceError::ModelUnavailable(_) => "model_unavailable",
            InferenceError::InvalidMetadata(_) => "invalid_metadata",
            InferenceError::SchemaMismatch { .. } => "schema_mismatch",
            InferenceError::ScoringFailure(_) => "scoring_failure",
            InferenceError::Timeout(_) => "timeout",
        }
    }
}
