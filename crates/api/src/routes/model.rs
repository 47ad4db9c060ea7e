//! Model Diagnostics Route

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::AppState;
use inference_engine::ModelDiagnostics;

/// Describe the loaded model, or why none is loaded
pub async fn get_model(State(state): State<Arc<AppState>>) -> Json<ModelDiagnostics> {
    Json(state.diagnostics.clone())
}
