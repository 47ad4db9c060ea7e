//! Read-only Model Diagnostics

use crate::metadata::{ModelInfo, ModelMetadata};
use feature_engine::{OutlierBounds, SchemaField};
use serde::Serialize;

/// Snapshot of what the process knows about its model. Never touches the
/// prediction path.
#[derive(Debug, Clone, Serialize)]
pub struct ModelDiagnostics {
    pub model_loaded: bool,
    /// Why prediction is disabled, when it is
    pub load_error: Option<String>,
    pub model_file: Option<String>,
    pub features: Vec<SchemaField>,
    pub input_width: usize,
    pub clip_bounds: Option<OutlierBounds>,
    pub info: ModelInfo,
}

impl ModelDiagnostics {
    pub fn loaded(metadata: &ModelMetadata) -> Self {
        Self {
            model_loaded: true,
            load_error: None,
            model_file: Some(metadata.model_file.clone()),
            features: metadata.schema().fields().to_vec(),
            input_width: metadata.input_width(),
            clip_bounds: Some(metadata.clip_bounds),
            info: metadata.info.clone(),
        }
    }

    pub fn unavailable(reason: &str) -> Self {
        Self {
            model_loaded: false,
            load_error: Some(reason.to_string()),
            model_file: None,
            features: Vec::new(),
            input_width: 0,
            clip_bounds: None,
            info: ModelInfo::default(),
        }
    }
}
