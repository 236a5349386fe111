//! Globe Peek HTTP API.
//!
//! Serves the country directory, detail pages, accounts and favorites on top
//! of `globepeek-lib`.
//!
//! # Endpoints
//!
//! - `GET /api/v1/countries` - Filtered, paginated directory
//! - `GET /api/v1/countries/suggest` - Search-as-you-type names
//! - `GET /api/v1/countries/{name}` - Detail page with per-section status
//! - `GET /api/v1/landing` - Hero image, featured countries and video
//! - `POST /api/v1/auth/register`, `/login`, `/logout`; `GET /api/v1/auth/oauth/{provider}`
//! - `PUT /api/v1/auth/password` - Change password (bearer token)
//! - `GET|PUT /api/v1/profile`, `PUT /api/v1/profile/avatar` (bearer token)
//! - `GET|POST /api/v1/favorites`, `DELETE /api/v1/favorites/{name}`,
//!   `POST /api/v1/favorites/{name}/toggle` (bearer token)
//! - `POST /api/v1/newsletter` - Newsletter sign-up
//! - `GET /api/v1/navigate` - Client route and auth gate decision for a path
//! - `GET /metrics`, `GET /health/live`, `GET /health/ready`
//!
//! # Configuration
//!
//! - `GLOBEPEEK_*` - Upstream keys and URLs (see `globepeek_lib::config`)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `METRICS_ENABLED`, `METRICS_PATH` - Prometheus endpoint

mod handlers;


use std::env;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use globepeek_service_shared::{
    AppState, LoggingConfig, MetricsConfig, MetricsLayer, health_live, health_ready, init_logging,
    init_metrics, metrics_handler,
};

use handlers::{account, countries, favorites, navigate};

/// Build the router. Split from `main` so tests can drive it in-process.
fn app(state: AppState, metrics_path: &str) -> Router {
    let api = Router::new()
        .route("/countries", get(countries::list))
        .route("/countries/suggest", get(countries::suggest))
        .route("/countries/{name}", get(countries::detail))
        .route("/landing", get(countries::landing))
        .route("/auth/register", post(account::register))
        .route("/auth/login", post(account::login))
        .route("/auth/logout", post(account::logout))
        .route("/auth/oauth/{provider}", get(account::oauth))
        .route("/auth/password", put(account::change_password))
        .route("/profile", get(account::get_profile).put(account::update_profile))
        .route(
            "/profile/avatar",
            put(account::upload_avatar).layer(DefaultBodyLimit::max(account::MAX_AVATAR_BYTES)),
        )
        .route("/favorites", get(favorites::list).post(favorites::add))
        .route("/favorites/{name}", axum::routing::delete(favorites::remove))
        .route("/favorites/{name}/toggle", post(favorites::toggle))
        .route("/newsletter", post(account::subscribe))
        .route("/navigate", get(navigate::resolve));

    Router::new()
        .nest("/api/v1", api)
        .route(metrics_path, get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(CorsLayer::permissive())
        .layer(MetricsLayer)
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("globepeek-service");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let state = AppState::from_env().map_err(|e| {
        error!(error = %e, "failed to build application state");
        e
    })?;

    info!(
        port,
        accounts = state.accounts_enabled(),
        missing = ?state.missing_keys(),
        "starting globepeek service"
    );

    let app = app(state, &metrics_config.path);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
