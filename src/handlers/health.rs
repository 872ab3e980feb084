//! Health check endpoint
//!
//! Provides a simple health check for monitoring and load balancers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Metrics recording status: "operational" or "degraded"
    pub metrics_status: &'static str,
}

/// Health check handler
///
/// Returns 200 OK with service status and metrics recording status.
///
/// Metrics status is "degraded" once any metric recording has failed since
/// startup, otherwise "operational". Requests keep being served either way.
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let recording_failures = state.metrics().recording_failures_count();
    let metrics_status = if recording_failures > 0 {
        "degraded"
    } else {
        "operational"
    };

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            metrics_status,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::metrics::RegistryError;
    use std::sync::Arc;

    fn create_test_state() -> AppState {
        let config: Config = toml::from_str(
            r#"
[server]
host = "127.0.0.1"
port = 3000
"#,
        )
        .expect("should parse test config");
        AppState::new(Arc::new(config)).expect("should create AppState")
    }

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let state = create_test_state();
        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert_eq!(body.metrics_status, "operational");
    }

    #[tokio::test]
    async fn test_health_handler_shows_degraded_when_failures_occur() {
        let state = create_test_state();

        state.metrics().record(
            "test_operation",
            Err(RegistryError::UnknownMetric {
                name: "demo_missing".to_string(),
            }),
        );

        let (status, Json(body)) = handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "OK");
        assert_eq!(body.metrics_status, "degraded");
    }
}
