//! Error types for the lookup service
//!
//! All errors implement `IntoResponse` for Axum handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::metrics::RegistryError;
use crate::middleware::RequestOutcome;
use crate::shared::id::ParseError;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML config {path}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Invalid id: {0}")]
    InvalidId(#[from] ParseError),

    #[error("{entity} does not exist")]
    NotFound { entity: &'static str },

    #[error("Metrics error: {0}")]
    Metrics(#[from] RegistryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, outcome) = match &self {
            Self::InvalidId(_) => (StatusCode::BAD_REQUEST, RequestOutcome::ParseError),
            Self::NotFound { .. } => (StatusCode::NOT_FOUND, RequestOutcome::NotFound),
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Metrics(_)
            | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, RequestOutcome::Internal),
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        let mut response = (status, body).into_response();
        response.extensions_mut().insert(outcome);
        response
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
