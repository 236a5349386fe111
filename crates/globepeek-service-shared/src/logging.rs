//! Structured logging setup for the Globe Peek service.
//!
//! # Environment Variables
//!
//! - `LOG_FORMAT`: `json` (default) or `text`
//! - `RUST_LOG`: filter directives (default: `info`)
//! - `SERVICE_NAME`: name stamped on the root span (default: `globepeek`)
//!
//! # Example
//!
//! ```no_run
//! use globepeek_service_shared::logging::{LoggingConfig, init_logging};
//!
//! let config = LoggingConfig::from_env();
//! init_logging(&config);
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_SERVICE: &str = "globepeek";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line (production).
    #[default]
    Json,
    /// Human-readable multi-line output (development).
    Text,
}

impl LogFormat {
    /// Accepts `json`, `text` or `pretty` in any case. Anything else is JSON.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => LogFormat::Text,
            _ => LogFormat::Json,
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Fallback filter used when `RUST_LOG` is unset or invalid.
    pub level: String,
    pub service: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            service: DEFAULT_SERVICE.to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read `LOG_FORMAT`, `RUST_LOG` and `SERVICE_NAME`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LoggingConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            format: lookup("LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or(defaults.format),
            level: lookup("RUST_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.level),
            service: lookup("SERVICE_NAME")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.service),
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }
}

/// Install the global tracing subscriber. Call once at startup.
///
/// JSON output carries the enclosing span list, so every line emitted while
/// handling a request includes the `request_id` opened by
/// [`crate::MetricsLayer`]:
///
/// ```json
/// {"timestamp":"...","level":"INFO","fields":{"message":"request completed","status":200},"spans":[{"name":"request","request_id":"..."}]}
/// ```
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Text => {
            registry.with(fmt::layer().pretty()).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(true);
            registry.with(json_layer).init();
        }
    }

    tracing::info!(service = %config.service, format = ?config.format, "logging initialised");
}
