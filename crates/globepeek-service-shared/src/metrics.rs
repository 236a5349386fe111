//! Prometheus metrics for the Globe Peek service.
//!
//! - [`MetricsConfig`]: enable flag and endpoint path
//! - [`init_metrics`]: install the Prometheus recorder
//! - [`metrics_handler`]: axum handler for `/metrics`
//! - Business helpers for upstream calls, favorites and directory queries
//!
//! # Example
//!
//! ```no_run
//! use globepeek_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! let config = MetricsConfig::default();
//! init_metrics(&config).expect("failed to initialize metrics");
//!
//! let app: Router = Router::new()
//!     .route("/metrics", get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path for the metrics endpoint (e.g., "/metrics").
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Read `METRICS_ENABLED` (anything but "false" enables) and `METRICS_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("METRICS_ENABLED")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        let path = lookup("METRICS_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| p.starts_with('/'))
            .unwrap_or_else(|| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Install the Prometheus recorder. Only the first call succeeds.
///
/// # Errors
///
/// Fails when metrics are disabled, when a recorder is already installed, or
/// when the exporter cannot be built.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// The installed handle, if [`init_metrics`] succeeded.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Render Prometheus exposition text.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Count a call to an upstream API (`globepeek_upstream_calls_total`).
///
/// `upstream` is the service name used in library errors, e.g. "openweather".
pub fn record_upstream_call(upstream: &str, operation: &str) {
    metrics::counter!(
        "globepeek_upstream_calls_total",
        "upstream" => upstream.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Count a failed upstream call (`globepeek_upstream_failures_total`).
///
/// `reason` is a short label such as "not_found", "missing_key" or "http".
pub fn record_upstream_failure(upstream: &str, reason: &str) {
    metrics::counter!(
        "globepeek_upstream_failures_total",
        "upstream" => upstream.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record how many favorites resolved and how many failed.
pub fn record_favorites_resolved(resolved: usize, failed: usize) {
    metrics::histogram!("globepeek_favorites_resolved").record(resolved as f64);
    if failed > 0 {
        metrics::counter!("globepeek_favorites_failed_total").increment(failed as u64);
    }
}

/// Record a directory query and its match count.
///
/// `kind` distinguishes "list" from "suggest".
pub fn record_directory_query(kind: &str, matches: usize) {
    metrics::counter!(
        "globepeek_directory_queries_total",
        "kind" => kind.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "globepeek_directory_matches",
        "kind" => kind.to_string()
    )
    .record(matches as f64);
}

/// Failure label for a library error, for [`record_upstream_failure`].
pub fn failure_reason(error: &globepeek_lib::Error) -> &'static str {
    use globepeek_lib::Error;
    match error {
        Error::CountryNotFound { .. } => "not_found",
        Error::MissingApiKey { .. } => "missing_key",
        Error::Upstream { .. } => "status",
        Error::UnexpectedPayload { .. } | Error::Json(_) => "payload",
        Error::Http(_) => "http",
        Error::Unauthenticated | Error::Auth { .. } => "auth",
        Error::InvalidInput { .. } => "invalid_input",
        Error::Config { .. } | Error::Io(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_defaults() {
        let config = MetricsConfig::from_lookup(|_| None);
        assert!(config.enabled);
        assert_eq!(config.path, "/metrics");
    }

    #[test]
    fn test_metrics_config_disabled_and_custom_path() {
        let config = MetricsConfig::from_lookup(|k| match k {
            "METRICS_ENABLED" => Some("FALSE".to_string()),
            "METRICS_PATH" => Some("/internal/metrics".to_string()),
            _ => None,
        });
        assert!(!config.enabled);
        assert_eq!(config.path, "/internal/metrics");
    }

    #[test]
    fn test_metrics_config_rejects_relative_path() {
        let config = MetricsConfig::from_lookup(|k| (k == "METRICS_PATH").then(|| "metrics".to_string()));
        assert_eq!(config.path, "/metrics");
    }

    #[tokio::test]
    async fn test_metrics_handler_without_recorder() {
        let output = metrics_handler().await;
        assert!(output.starts_with('#') || output.is_empty() || output.contains("globepeek"));
    }

    #[test]
    fn test_init_metrics_disabled() {
        let config = MetricsConfig {
            enabled: false,
            ..MetricsConfig::default()
        };
        assert!(matches!(init_metrics(&config), Err(MetricsError::Disabled)));
    }

    #[test]
    fn test_business_helpers_record_without_recorder() {
        record_upstream_call("openweather", "weather");
        record_upstream_failure("youtube", "missing_key");
        record_favorites_resolved(3, 1);
        record_directory_query("suggest", 5);
    }

    #[test]
    fn test_failure_reason_labels() {
        let missing = globepeek_lib::Error::MissingApiKey { service: "youtube" };
        assert_eq!(failure_reason(&missing), "missing_key");
        assert_eq!(failure_reason(&globepeek_lib::Error::Unauthenticated), "auth");
    }

    #[test]
    fn test_metrics_error_display() {
        assert_eq!(MetricsError::Disabled.to_string(), "metrics are disabled");
        let failed = MetricsError::InstallFailed("port in use".to_string());
        assert!(failed.to_string().contains("port in use"));
    }
}
