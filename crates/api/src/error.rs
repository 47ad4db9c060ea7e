//! API Error Responses

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use data_validator::ValidationError;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned from request handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid observation ({} problem(s))", .0.len())]
    Validation(Vec<ValidationError>),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(vec![err])
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![ValidationError::InvalidFormat(rejection.body_text())])
    }
}

/// JSON body of an error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    pub detail: Vec<String>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(err) => match err {
                InferenceError::ModelUnavailable(_) | InferenceError::InvalidMetadata(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                InferenceError::SchemaMismatch { .. } | InferenceError::ScoringFailure(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                InferenceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Inference(err) => err.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = match &self {
            ApiError::Validation(errors) => errors.iter().map(ToString::to_string).collect(),
            ApiError::Inference(err) => vec![err.to_string()],
        };
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
            detail,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(ValidationError::NonFinite("temp")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(InferenceError::ModelUnavailable("gone".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(InferenceError::Timeout(5)).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::from(InferenceError::ScoringFailure("x".into())).kind(),
            "scoring_failure"
        );
    }
}
