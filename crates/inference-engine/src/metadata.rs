//! Companion Metadata Stored Next to the Model Artifact

use crate::model::InputColumn;
use crate::InferenceError;
use feature_engine::{FeatureSchema, FieldKind, OutlierBounds};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use tracing::debug;

/// Descriptive information about the trained estimator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Estimator name, e.g. "XGBRegressor"
    #[serde(default)]
    pub estimator: Option<String>,
    /// Hyperparameters as recorded at training time
    #[serde(default)]
    pub parameters: BTreeMap<String, serde_json::Value>,
    /// Validation metrics, e.g. "rmsle" -> 0.27
    #[serde(default)]
    pub training_metrics: BTreeMap<String, f64>,
}

/// Everything fixed at training time that inference needs besides the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model file, relative to the metadata file
    pub model_file: String,
    /// Expected feature fields in model order
    pub features: Vec<String>,
    /// Winsorizing bounds computed from the training distribution
    pub clip_bounds: OutlierBounds,
    /// How the feature vector is laid out in the model's input tensor
    pub input_layout: Vec<InputColumn>,
    #[serde(default)]
    pub info: ModelInfo,
}

impl ModelMetadata {
    /// Read metadata JSON from disk
    pub fn from_path(path: &Path) -> Result<Self, InferenceError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            InferenceError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, InferenceError> {
        let metadata: Self =
            serde_json::from_str(raw).map_err(|e| InferenceError::InvalidMetadata(e.to_string()))?;
        metadata.validate()?;
        debug!(
            "Parsed model metadata: {} features, input width {}",
            metadata.features.len(),
            metadata.input_width()
        );
        Ok(metadata)
    }

    /// Check internal consistency of the record. Feature names outside the
    /// bike-sharing schema are accepted as numeric and default-filled.
    pub fn validate(&self) -> Result<(), InferenceError> {
        let invalid = |msg: String| Err(InferenceError::InvalidMetadata(msg));

        if self.model_file.trim().is_empty() {
            return invalid("model_file is empty".into());
        }
        if self.features.is_empty() {
            return invalid("feature list is empty".into());
        }

        let mut seen = HashSet::new();
        for name in &self.features {
            if !seen.insert(name.as_str()) {
                return invalid(format!("feature '{}' listed twice", name));
            }
        }

        self.clip_bounds
            .check()
            .map_err(|e| InferenceError::InvalidMetadata(e.to_string()))?;

        let schema = self.schema();
        let kinds: HashMap<&str, FieldKind> = schema
            .fields()
            .iter()
            .map(|field| (field.name.as_str(), field.kind))
            .collect();

        let mut covered = HashSet::new();
        for column in &self.input_layout {
            let field = column.field();
            let Some(&kind) = kinds.get(field) else {
                return invalid(format!("input layout references unknown feature '{}'", field));
            };
            if matches!(column, InputColumn::Numeric { .. }) && kind == FieldKind::Categorical {
                return invalid(format!(
                    "categorical feature '{}' cannot feed a numeric input column",
                    field
                ));
            }
            if !covered.insert(field) {
                return invalid(format!("feature '{}' appears twice in input layout", field));
            }
            if let InputColumn::OneHot { levels, .. } = column {
                if levels.is_empty() {
                    return invalid(format!("one-hot column '{}' has no levels", field));
                }
            }
        }
        if let Some(missing) = self.features.iter().find(|f| !covered.contains(f.as_str())) {
            return invalid(format!("feature '{}' has no input layout column", missing));
        }

        Ok(())
    }

    /// Schema of the expected features
    pub fn schema(&self) -> FeatureSchema {
        FeatureSchema::from_names(&self.features)
    }

    /// Width of the flattened model input
    pub fn input_width(&self) -> usize {
        self.input_layout.iter().map(InputColumn::width).sum()
    }
}
