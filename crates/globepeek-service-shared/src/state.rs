//! Application state for the HTTP service.
//!
//! Handlers reach the upstream clients through [`AppState`]. The service
//! keeps no data of its own: every request fetches what it needs, and the
//! signed-in user is resolved per request from the bearer token.

use std::sync::Arc;

use globepeek_lib::{ApiClients, ApiConfig, Error as LibError};

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The upstream configuration is unusable (for example a malformed URL).
    InvalidConfig(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(e) => write!(f, "invalid upstream configuration: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidConfig(e) => Some(e),
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        Self::InvalidConfig(err)
    }
}

/// Shared application state for all axum handlers.
///
/// Cheap to clone (`Arc` inside); share it via axum's `State` extractor.
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use globepeek_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) {
///     let countries = state.clients().countries.all().await;
/// }
///
/// let state = AppState::from_env().unwrap();
/// let app = Router::new()
///     .route("/api/v1/countries", get(handler))
///     .with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    clients: ApiClients,
    config: ApiConfig,
}

impl AppState {
    /// Build state from `GLOBEPEEK_*` environment variables.
    pub fn from_env() -> Result<Self, AppStateError> {
        Self::from_config(ApiConfig::from_env())
    }

    /// Build state from an explicit configuration.
    pub fn from_config(config: ApiConfig) -> Result<Self, AppStateError> {
        let clients = ApiClients::new(&config)?;
        let missing = missing_keys(&config);
        if missing.is_empty() {
            tracing::info!("all upstream credentials configured");
        } else {
            tracing::warn!(missing = ?missing, "some upstream credentials are not configured");
        }
        Ok(Self {
            inner: Arc::new(AppStateInner { clients, config }),
        })
    }

    /// The upstream clients.
    pub fn clients(&self) -> &ApiClients {
        &self.inner.clients
    }

    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Upstreams whose credentials are not configured.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        missing_keys(&self.inner.config)
    }

    /// Whether account features (auth, profile, favorites) can work.
    pub fn accounts_enabled(&self) -> bool {
        self.inner.clients.supabase.is_configured()
    }
}

fn missing_keys(config: &ApiConfig) -> Vec<&'static str> {
    [
        ("openweather", config.openweather_key.is_some()),
        ("unsplash", config.unsplash_key.is_some()),
        ("youtube", config.youtube_key.is_some()),
        ("geoapify", config.geoapify_key.is_some()),
        (
            "supabase",
            config.supabase_url.is_some() && config.supabase_anon_key.is_some(),
        ),
    ]
    .into_iter()
    .filter(|(_, present)| !present)
    .map(|(name, _)| name)
    .collect()
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("rest_countries_url", &self.inner.config.rest_countries_url)
            .field("missing_keys", &self.missing_keys())
            .finish()
    }
}
