//! Prediction Routes

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;
use data_validator::{
    default_season, default_working_day, parse_timestamp, Observation, ValidationError,
};
use feature_engine::FieldDefaulted;
use inference_engine::DemandTier;

/// Prediction request body. Season and working day fall back to the values
/// the input form would preselect for the timestamp.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    /// `YYYY-MM-DDTHH:MM[:SS]`
    pub timestamp: String,
    pub season: Option<u8>,
    pub holiday: u8,
    pub workingday: Option<u8>,
    pub weather: u8,
    pub temp: f64,
    pub humidity: i32,
    pub windspeed: f64,
}

impl PredictRequest {
    /// Parse the timestamp and fill form defaults
    pub fn into_observation(self) -> Result<Observation, ValidationError> {
        let timestamp = parse_timestamp(&self.timestamp)?;
        Ok(Observation {
            season: self.season.unwrap_or_else(|| default_season(timestamp.month())),
            workingday: self.workingday.unwrap_or_else(|| default_working_day(&timestamp)),
            timestamp,
            holiday: self.holiday,
            weather: self.weather,
            temp: self.temp,
            humidity: self.humidity,
            windspeed: self.windspeed,
        })
    }
}

/// Response for the predict endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct PredictResponse {
    pub count: u64,
    pub tier: DemandTier,
    pub recommendation: String,
    pub raw_score: f64,
    pub defaulted_fields: Vec<FieldDefaulted>,
    pub latency_ms: u64,
}

fn record_outcome(outcome: &'static str) {
    metrics::counter!("bike_demand_predictions_total", "outcome" => outcome).increment(1);
}

/// Estimate demand for one observation. A body that does not decode into a
/// request is answered with the same JSON error shape as a failed range check.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let result = match payload {
        Ok(Json(request)) => run_prediction(&state, request).await,
        Err(rejection) => Err(ApiError::from(rejection)),
    };
    match &result {
        Ok(_) => record_outcome("ok"),
        Err(err) => record_outcome(err.kind()),
    }
    result.map(Json)
}

async fn run_prediction(state: &AppState, request: PredictRequest) -> Result<PredictResponse, ApiError> {
    let obs = request.into_observation()?;

    let validation = state.validator.validate(&obs);
    if !validation.valid {
        return Err(ApiError::Validation(validation.errors));
    }

    let estimate = state
        .predictor
        .clone()
        .predict_with_timeout(obs, state.prediction_timeout)
        .await?;

    info!(
        "Predicted {} rentals ({}) in {}ms",
        estimate.count,
        estimate.tier.as_str(),
        estimate.latency_ms
    );

    Ok(PredictResponse {
        count: estimate.count,
        tier: estimate.tier,
        recommendation: estimate.tier.recommendation().to_string(),
        raw_score: estimate.raw_score,
        defaulted_fields: estimate.defaulted,
        latency_ms: estimate.latency_ms,
    })
}
