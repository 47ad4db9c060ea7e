//! Scoring Model Seam and Artifact Loading

use crate::metadata::ModelMetadata;
use crate::onnx::OnnxModel;
use crate::InferenceError;
use feature_engine::{EngineeredFeatureVector, FeatureExtractor, FeatureValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// A trained regression model producing log-scale demand.
///
/// Implementations are shared read-only across requests.
pub trait ScoringModel: Send + Sync {
    /// Score one feature vector, returning `log(1 + count)`
    fn score(&self, features: &EngineeredFeatureVector) -> Result<f64, InferenceError>;

    /// Short human-readable description
    fn describe(&self) -> String {
        "scoring model".to_string()
    }
}

/// One feature's slot(s) in the model input tensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputColumn {
    /// Single column holding the numeric value
    Numeric { field: String },
    /// One column per level; unknown levels encode as all zeros
    OneHot { field: String, levels: Vec<String> },
}

impl InputColumn {
    pub fn field(&self) -> &str {
        match self {
            InputColumn::Numeric { field } | InputColumn::OneHot { field, .. } => field,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            InputColumn::Numeric { .. } => 1,
            InputColumn::OneHot { levels, .. } => levels.len(),
        }
    }
}

/// Label used to match a value against one-hot levels. Integral numbers
/// print without a fractional part so hour 7 matches level "7".
fn level_label(value: &FeatureValue) -> String {
    match value {
        FeatureValue::Categorical(s) => s.clone(),
        FeatureValue::Numeric(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", *v as i64),
        FeatureValue::Numeric(v) => v.to_string(),
    }
}

/// Flatten a reconciled vector into the model's input row
pub fn encode_input(
    layout: &[InputColumn],
    features: &EngineeredFeatureVector,
) -> Result<Vec<f32>, InferenceError> {
    let mismatch = |reason: String| InferenceError::SchemaMismatch {
        reason,
        vector: features.to_string(),
    };

    let mut row = Vec::with_capacity(layout.iter().map(InputColumn::width).sum());
    for column in layout {
        let value = features
            .get(column.field())
            .ok_or_else(|| mismatch(format!("missing feature '{}'", column.field())))?;

        match column {
            InputColumn::Numeric { field } => {
                let v = value
                    .as_f64()
                    .ok_or_else(|| mismatch(format!("feature '{}' must be numeric, got {}", field, value)))?;
                row.push(v as f32);
            }
            InputColumn::OneHot { field, levels } => {
                let label = level_label(value);
                if !levels.iter().any(|l| *l == label) {
                    debug!("Unseen level {:?} for '{}', encoding as all zeros", label, field);
                }
                row.extend(levels.iter().map(|l| if *l == label { 1.0 } else { 0.0 }));
            }
        }
    }
    Ok(row)
}

/// Model handle plus the metadata it was trained with
#[derive(Clone)]
pub struct LoadedModel {
    pub model: Arc<dyn ScoringModel>,
    pub metadata: Arc<ModelMetadata>,
}

impl LoadedModel {
    /// Feature extractor configured with this model's schema and clip bounds
    pub fn extractor(&self) -> FeatureExtractor {
        FeatureExtractor::new(self.metadata.schema(), self.metadata.clip_bounds)
    }
}

/// Load the metadata JSON at `metadata_path` and the ONNX model it names
pub fn load_model(metadata_path: impl AsRef<Path>) -> Result<LoadedModel, InferenceError> {
    let metadata_path = metadata_path.as_ref();
    info!("Loading model metadata from {}", metadata_path.display());

    let metadata = ModelMetadata::from_path(metadata_path)?;
    let model_path = metadata_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(&metadata.model_file);
    let model = OnnxModel::load(&model_path, metadata.input_layout.clone())?;

    info!(
        "Model loaded: {} ({} features)",
        model.describe(),
        metadata.features.len()
    );
    Ok(LoadedModel {
        model: Arc::new(model),
        metadata: Arc::new(metadata),
    })
}
