//! Health check handlers for Kubernetes probes.
//!
//! Provides `/health/live` and `/health/ready` endpoints that return JSON
//! status responses for Kubernetes liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok", "degraded" or "not_ready: ...".
    pub status: String,

    /// Service name for identification.
    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// Upstreams running without credentials (readiness only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_credentials: Vec<String>,

    /// RFC 3339 time of the check.
    pub checked_at: String,
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            missing_credentials: Vec::new(),
            checked_at: now(),
        }
    }

    /// Readiness status. Missing media keys only degrade the service: the
    /// affected detail sections report failure while everything else works.
    pub fn ready(service: &str, version: &str, missing: &[&str]) -> Self {
        Self {
            status: if missing.is_empty() { "ok" } else { "degraded" }.to_string(),
            service: service.to_string(),
            version: version.to_string(),
            missing_credentials: missing.iter().map(|m| m.to_string()).collect(),
            checked_at: now(),
        }
    }

    /// Create a not-ready status.
    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            service: service.to_string(),
            version: version.to_string(),
            missing_credentials: Vec::new(),
            checked_at: now(),
        }
    }
}

/// Liveness probe handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"globepeek-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler.
///
/// Not ready without a Supabase project: the account endpoints would all fail.
/// Missing media keys are reported as `degraded`.
///
/// ```text
/// GET /health/ready
/// {"status":"degraded","service":"...","version":"0.1.0","missing_credentials":["youtube"]}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    if !state.accounts_enabled() {
        let status = HealthStatus::not_ready(service, version, "supabase not configured");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(service, version, &state.missing_keys());
    (StatusCode::OK, Json(status)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_alive() {
        let status = HealthStatus::alive("test-service", "1.0.0");
        assert_eq!(status.status, "ok");
        assert_eq!(status.service, "test-service");
        assert!(status.missing_credentials.is_empty());
    }

    #[test]
    fn test_health_status_degraded() {
        let status = HealthStatus::ready("test-service", "1.0.0", &["youtube"]);
        assert_eq!(status.status, "degraded");
        assert_eq!(status.missing_credentials, ["youtube"]);
    }

    #[test]
    fn test_health_status_not_ready() {
        let status = HealthStatus::not_ready("test-service", "1.0.0", "no project");
        assert!(status.status.starts_with("not_ready:"));
        assert!(status.status.contains("no project"));
    }

    #[test]
    fn test_health_status_serialization() {
        let status = HealthStatus::alive("globepeek", "0.1.0");
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(!json.contains("missing_credentials"));
        assert!(status.checked_at.ends_with('Z'));
    }
}
