//! Bike Demand API Server
//!
//! Local HTTP surface in front of the demand predictor: predictions, model
//! diagnostics, health and Prometheus metrics.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

mod error;
mod routes;
mod settings;

pub use error::{ApiError, ErrorBody};
pub use settings::{AppConfig, LoggingConfig, ModelConfig, ServerConfig};
pub use routes::predictions::{PredictRequest, PredictResponse};

use data_validator::Validator;
use inference_engine::{DemandPredictor, InferenceError, LoadedModel, ModelDiagnostics};

/// Application state shared across handlers. Immutable after startup.
pub struct AppState {
    /// Feature transform and model
    pub predictor: Arc<DemandPredictor>,
    /// Model description for the diagnostics route
    pub diagnostics: ModelDiagnostics,
    /// Boundary validation
    pub validator: Validator,
    /// Upper bound on a single prediction
    pub prediction_timeout: Duration,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
    /// Prometheus exposition, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(predictor: DemandPredictor, diagnostics: ModelDiagnostics, prediction_timeout: Duration) -> Self {
        Self {
            predictor: Arc::new(predictor),
            diagnostics,
            validator: Validator::default(),
            prediction_timeout,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// State for the outcome of a model load. A failed load disables
    /// prediction but keeps the other routes serving.
    pub fn from_model(loaded: Result<LoadedModel, InferenceError>, prediction_timeout: Duration) -> Self {
        match loaded {
            Ok(loaded) => Self::new(
                DemandPredictor::from_loaded(&loaded),
                ModelDiagnostics::loaded(&loaded.metadata),
                prediction_timeout,
            ),
            Err(err) => {
                error!("Failed to load prediction model: {}", err);
                let reason = err.to_string();
                Self::new(
                    DemandPredictor::unavailable(reason.clone()),
                    ModelDiagnostics::unavailable(&reason),
                    prediction_timeout,
                )
            }
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub model: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub detail: Option<String>,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/predict", post(routes::predictions::predict))
        .route("/api/v1/model", get(routes::model::get_model))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let model = if state.predictor.is_available() {
        ComponentHealth {
            status: "ok".to_string(),
            detail: None,
        }
    } else {
        ComponentHealth {
            status: "unavailable".to_string(),
            detail: state.predictor.unavailable_reason().map(str::to_string),
        }
    };

    let status = if state.predictor.is_available() { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus { model },
    })
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);

    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Run the server
pub async fn run_server(addr: &str, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use feature_engine::{EngineeredFeatureVector, FeatureExtractor};
    use inference_engine::ScoringModel;
    use tower::ServiceExt;

    struct FixedScore(f64);

    impl ScoringModel for FixedScore {
        fn score(&self, _: &EngineeredFeatureVector) -> Result<f64, InferenceError> {
            Ok(self.0)
        }
    }

    fn loaded_state(score: f64) -> Arc<AppState> {
        let predictor = DemandPredictor::new(Arc::new(FixedScore(score)), FeatureExtractor::default());
        Arc::new(AppState::new(
            predictor,
            ModelDiagnostics::unavailable("diagnostics not under test"),
            Duration::from_secs(5),
        ))
    }

    fn unavailable_state() -> Arc<AppState> {
        Arc::new(AppState::from_model(
            Err(InferenceError::ModelUnavailable("model/bike_demand.json: not found".into())),
            Duration::from_secs(5),
        ))
    }

    fn predict_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/predict")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn summer_morning() -> serde_json::Value {
        serde_json::json!({
            "timestamp": "2024-07-15T10:00",
            "season": 2, "holiday": 0, "workingday": 1, "weather": 1,
            "temp": 25.0, "humidity": 60, "windspeed": 10.0
        })
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_predict_with_model() {
        let response = create_router(loaded_state(301f64.ln()))
            .oneshot(predict_request(summer_morning()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["count"], 300);
        assert_eq!(body["tier"], "high");
        assert_eq!(body["defaulted_fields"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_predict_without_model() {
        let response = create_router(unavailable_state())
            .oneshot(predict_request(summer_morning()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = json_body(response).await;
        assert_eq!(body["kind"], "model_unavailable");
        assert!(body["detail"][0].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range() {
        let mut observation = summer_morning();
        observation["weather"] = serde_json::json!(7);
        observation["humidity"] = serde_json::json!(140);

        let response = create_router(loaded_state(1.0))
            .oneshot(predict_request(observation))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["kind"], "validation");
        assert_eq!(body["detail"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_predict_rejects_code_outside_u8() {
        let mut observation = summer_morning();
        observation["weather"] = serde_json::json!(300);

        let response = create_router(loaded_state(1.0))
            .oneshot(predict_request(observation))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["kind"], "validation");
        assert!(body["detail"][0].as_str().unwrap().contains("weather"));
    }

    #[tokio::test]
    async fn test_predict_rejects_missing_field() {
        let mut observation = summer_morning();
        observation.as_object_mut().unwrap().remove("holiday");

        let response = create_router(loaded_state(1.0))
            .oneshot(predict_request(observation))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = json_body(response).await;
        assert_eq!(body["kind"], "validation");
        assert!(body["detail"][0].as_str().unwrap().contains("holiday"));
    }

    #[tokio::test]
    async fn test_model_info_without_model() {
        let response = create_router(unavailable_state())
            .oneshot(Request::builder().uri("/api/v1/model").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["model_loaded"], false);
    }

    #[tokio::test]
    async fn test_health_reports_degraded() {
        let response = create_router(unavailable_state())
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["components"]["model"]["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_metrics_without_recorder() {
        let response = create_router(loaded_state(1.0))
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_prediction_outcomes_counted() {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let mut bad_weather = summer_morning();
        bad_weather["weather"] = serde_json::json!(7);

        // The counter is recorded on the handler's thread, so drive the router
        // on a current-thread runtime under the local recorder.
        let rendered = metrics::with_local_recorder(&recorder, || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            runtime.block_on(async {
                let state = Arc::new(
                    Arc::into_inner(loaded_state(301f64.ln()))
                        .unwrap()
                        .with_metrics(handle.clone()),
                );
                let app = create_router(state);

                let ok = app.clone().oneshot(predict_request(summer_morning())).await.unwrap();
                assert_eq!(ok.status(), StatusCode::OK);
                let rejected = app.clone().oneshot(predict_request(bad_weather)).await.unwrap();
                assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);

                let response = app
                    .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
                    .await
                    .unwrap();
                assert_eq!(response.status(), StatusCode::OK);
                let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
                String::from_utf8(bytes.to_vec()).unwrap()
            })
        });

        assert!(rendered.contains(r#"bike_demand_predictions_total{outcome="ok"} 1"#));
        assert!(rendered.contains(r#"bike_demand_predictions_total{outcome="validation"} 1"#));
    }
}
