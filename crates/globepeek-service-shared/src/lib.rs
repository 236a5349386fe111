//! Shared infrastructure for the Globe Peek HTTP service.
//!
//! - [`AppState`]: the upstream clients, shared by every handler
//! - [`health`]: liveness and readiness probes
//! - [`ProblemDetails`]: RFC 9457 error bodies and [`from_lib_error`]
//! - [`ServiceResponse`]: success wrapper with content type
//! - [`Authenticated`]: bearer-token extractor for protected endpoints
//! - [`metrics`], [`logging`], [`middleware`]: observability
//! - Request types with validation for each endpoint
//!
//! # Architecture
//!
//! Handlers stay thin. Everything the explorer does lives in `globepeek-lib`:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Extract query / JSON body / bearer token                 │
//! │  - Validate parameters                                      │
//! │  - Call globepeek-lib                                       │
//! │  - Format response or ProblemDetails                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! [`test_utils`] provides an in-process fake of every upstream API. Enable
//! the `test-utils` feature to use it from dependent crates.

#![deny(warnings)]

mod auth;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use auth::{bearer_token, resolve_gate, Authenticated};
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    failure_reason, init_metrics, metrics_handler, record_directory_query,
    record_favorites_resolved, record_upstream_call, record_upstream_failure, MetricsConfig,
    MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_AUTH_FAILED, PROBLEM_COUNTRY_NOT_FOUND,
    PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST, PROBLEM_PAGE_NOT_FOUND, PROBLEM_SERVICE_UNAVAILABLE,
    PROBLEM_UNAUTHENTICATED, PROBLEM_UPSTREAM_ERROR,
};
pub use request::{
    AvatarQuery, CredentialsRequest, DirectoryQuery, FavoriteRequest, NavigateQuery,
    NewsletterRequest, OAuthQuery, PasswordRequest, ProfileRequest, SuggestQuery, Validate,
};
pub use response::ServiceResponse;
pub use state::{AppState, AppStateError};
