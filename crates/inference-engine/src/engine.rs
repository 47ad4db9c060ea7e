//! Demand Prediction Engine

use crate::model::{LoadedModel, ScoringModel};
use crate::InferenceError;
use data_validator::Observation;
use feature_engine::{FeatureExtractor, FieldDefaulted, Reconciled};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Counts below this are low demand
pub const LOW_DEMAND_CEILING: u64 = 50;
/// Counts at or above this are high demand
pub const HIGH_DEMAND_FLOOR: u64 = 250;

/// Qualitative demand level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandTier {
    Low,
    Medium,
    High,
}

impl DemandTier {
    pub fn from_count(count: u64) -> Self {
        if count < LOW_DEMAND_CEILING {
            DemandTier::Low
        } else if count < HIGH_DEMAND_FLOOR {
            DemandTier::Medium
        } else {
            DemandTier::High
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandTier::Low => "low",
            DemandTier::Medium => "medium",
            DemandTier::High => "high",
        }
    }

    /// Get recommended action
    pub fn recommendation(&self) -> &'static str {
        match self {
            DemandTier::Low => "Demand is predicted to be low. Consider promotions or a minimal bike allocation.",
            DemandTier::Medium => "Demand is predicted to be moderate. Make sure enough bikes are available.",
            DemandTier::High => "Demand is predicted to be high. Prepare extra bikes and consider strategic placement.",
        }
    }
}

/// Invert the `log1p` target transform: `expm1`, clamp at zero, round
pub fn invert_log_score(raw_score: f64) -> Result<u64, InferenceError> {
    if !raw_score.is_finite() {
        return Err(InferenceError::ScoringFailure(format!(
            "model returned non-finite score {}",
            raw_score
        )));
    }
    let count = raw_score.exp_m1().max(0.0).round();
    if count > u64::MAX as f64 {
        return Err(InferenceError::ScoringFailure(format!(
            "score {} overflows the count range",
            raw_score
        )));
    }
    Ok(count as u64)
}

/// Demand estimate for one observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandEstimate {
    /// Estimated rentals in the hour
    pub count: u64,
    pub tier: DemandTier,
    /// Model output on the log scale
    pub raw_score: f64,
    /// Schema fields the transform did not produce
    pub defaulted: Vec<FieldDefaulted>,
    /// Transform plus scoring latency in milliseconds
    pub latency_ms: u64,
}

/// Feature transform plus scoring model. Holds no mutable state.
pub struct DemandPredictor {
    extractor: FeatureExtractor,
    model: Option<Arc<dyn ScoringModel>>,
    unavailable_reason: Option<String>,
}

impl DemandPredictor {
    /// Create a predictor around an already loaded model
    pub fn new(model: Arc<dyn ScoringModel>, extractor: FeatureExtractor) -> Self {
        info!("Creating demand predictor with {}", model.describe());
        Self {
            extractor,
            model: Some(model),
            unavailable_reason: None,
        }
    }

    /// Predictor for a loaded artifact, using its schema and clip bounds
    pub fn from_loaded(loaded: &LoadedModel) -> Self {
        Self::new(loaded.model.clone(), loaded.extractor())
    }

    /// Predictor whose model failed to load; every prediction reports why
    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        warn!("Prediction disabled: {}", reason);
        Self {
            extractor: FeatureExtractor::default(),
            model: None,
            unavailable_reason: Some(reason),
        }
    }

    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Transform, score and invert one observation
    pub fn predict(&self, obs: &Observation) -> Result<DemandEstimate, InferenceError> {
        let model = self.model.as_ref().ok_or_else(|| {
            InferenceError::ModelUnavailable(
                self.unavailable_reason
                    .clone()
                    .unwrap_or_else(|| "no model loaded".to_string()),
            )
        })?;

        let start = Instant::now();
        let Reconciled {
            vector, defaulted, ..
        } = self.extractor.extract(obs);

        let raw_score = model.score(&vector).map_err(|e| {
            warn!("Scoring failed: {}", e);
            e
        })?;
        let count = invert_log_score(raw_score)?;
        let tier = DemandTier::from_count(count);

        let latency_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Prediction: {} bikes ({}), raw={:.4}, latency={}ms",
            count,
            tier.as_str(),
            raw_score,
            latency_ms
        );

        Ok(DemandEstimate {
            count,
            tier,
            raw_score,
            defaulted,
            latency_ms,
        })
    }

    /// Run `predict` on the blocking pool, giving up after `timeout`
    pub async fn predict_with_timeout(
        self: Arc<Self>,
        obs: Observation,
        timeout: Duration,
    ) -> Result<DemandEstimate, InferenceError> {
        let task = tokio::task::spawn_blocking(move || self.predict(&obs));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(InferenceError::ScoringFailure(format!(
                "prediction task failed: {}",
                join_err
            ))),
            Err(_) => {
                warn!("Prediction exceeded {}ms", timeout.as_millis());
                Err(InferenceError::Timeout(timeout.as_millis() as u64))
            }
        }
    }
}
