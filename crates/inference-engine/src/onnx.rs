//! ONNX-backed Scoring Model using tract

use crate::model::{encode_input, InputColumn, ScoringModel};
use crate::InferenceError;
use feature_engine::EngineeredFeatureVector;
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;
use tracing::{debug, info};

/// Regression pipeline exported to ONNX: one `f32` input of shape
/// `[1, width]`, log-scale demand in the first output element
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    layout: Vec<InputColumn>,
    width: usize,
    path: PathBuf,
}

impl OnnxModel {
    /// Load and optimize the model for the given input layout
    pub fn load(path: &Path, layout: Vec<InputColumn>) -> Result<Self, InferenceError> {
        let width: usize = layout.iter().map(InputColumn::width).sum();
        info!("Loading ONNX model {} (input width {})", path.display(), width);

        if !path.exists() {
            return Err(InferenceError::ModelUnavailable(format!(
                "model file {} not found",
                path.display()
            )));
        }

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, width]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                InferenceError::ModelUnavailable(format!("{}: {}", path.display(), e))
            })?;

        Ok(Self {
            plan,
            layout,
            width,
            path: path.to_path_buf(),
        })
    }
}

impl ScoringModel for OnnxModel {
    fn score(&self, features: &EngineeredFeatureVector) -> Result<f64, InferenceError> {
        let row = encode_input(&self.layout, features)?;
        let failure = |e: TractError| InferenceError::ScoringFailure(e.to_string());

        let input = Tensor::from_shape(&[1, self.width], &row).map_err(failure)?;
        let outputs = self.plan.run(tvec!(input.into())).map_err(failure)?;
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::ScoringFailure("model produced no outputs".into()))?;
        let score = output
            .to_array_view::<f32>()
            .map_err(failure)?
            .iter()
            .next()
            .copied()
            .ok_or_else(|| InferenceError::ScoringFailure("model output is empty".into()))?;

        debug!("ONNX raw score {}", score);
        Ok(score as f64)
    }

    fn describe(&self) -> String {
        format!("ONNX model {} (input width {})", self.path.display(), self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DemandPredictor, DemandTier};
    use crate::model::load_model;
    use data_validator::{parse_timestamp, Observation};
    use feature_engine::FeatureExtractor;

    // linear.onnx: `features[1, 3] x weights[3, 1]`, weights (1, 2, 3).
    // integer_output.onnx: the same product cast to int64.
    // truncated.onnx: the first 40 bytes of linear.onnx.
    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    fn numeric_layout() -> Vec<InputColumn> {
        ["temp", "humidity", "windspeed"]
            .into_iter()
            .map(|field| InputColumn::Numeric { field: field.into() })
            .collect()
    }

    fn observation(temp: f64, humidity: i32, windspeed: f64) -> Observation {
        Observation {
            timestamp: parse_timestamp("2024-07-15T10:00").unwrap(),
            season: 2,
            holiday: 0,
            workingday: 1,
            weather: 1,
            temp,
            humidity,
            windspeed,
        }
    }

    #[test]
    fn test_load_model_scores_fixture() {
        let loaded = load_model(fixture("linear.json")).unwrap();
        assert_eq!(loaded.metadata.input_width(), 3);
        assert!(loaded.model.describe().contains("input width 3"));

        let vector = loaded.extractor().extract(&observation(25.0, 60, 10.0)).vector;
        let score = loaded.model.score(&vector).unwrap();
        assert_eq!(score, 25.0 + 2.0 * 60.0 + 3.0 * 10.0);
    }

    #[test]
    fn test_predictor_over_fixture() {
        let loaded = load_model(fixture("linear.json")).unwrap();
        let predictor = DemandPredictor::from_loaded(&loaded);

        // raw score 2 + 0 + 3 = 5, expm1(5) = 147.4
        let estimate = predictor.predict(&observation(2.0, 0, 1.0)).unwrap();
        assert_eq!(estimate.raw_score, 5.0);
        assert_eq!(estimate.count, 147);
        assert_eq!(estimate.tier, DemandTier::Medium);
        assert!(estimate.defaulted.is_empty());
    }

    #[test]
    fn test_non_float_output_is_scoring_failure() {
        let model = OnnxModel::load(&fixture("integer_output.onnx"), numeric_layout()).unwrap();
        let vector = FeatureExtractor::default().extract(&observation(1.0, 1, 1.0)).vector;
        let err = model.score(&vector).unwrap_err();
        assert_eq!(err.kind(), "scoring_failure");
    }

    #[test]
    fn test_missing_model_file_is_unavailable() {
        let err = OnnxModel::load(&fixture("absent.onnx"), numeric_layout()).err().unwrap();
        assert_eq!(err.kind(), "model_unavailable");
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_corrupt_model_file_is_unavailable() {
        let err = OnnxModel::load(&fixture("truncated.onnx"), numeric_layout()).err().unwrap();
        assert_eq!(err.kind(), "model_unavailable");
    }
}
