//! RFC 9457 Problem Details for HTTP APIs.
//!
//! Every error the service returns uses this shape.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use globepeek_lib::Error as LibError;

/// Problem type URI for country names or codes that matched nothing.
pub const PROBLEM_COUNTRY_NOT_FOUND: &str = "/problems/country-not-found";

/// Problem type URI for client paths that name no view.
pub const PROBLEM_PAGE_NOT_FOUND: &str = "/problems/page-not-found";

/// Problem type URI for requests that need a signed-in user.
pub const PROBLEM_UNAUTHENTICATED: &str = "/problems/unauthenticated";

/// Problem type URI for credentials rejected by the auth provider.
pub const PROBLEM_AUTH_FAILED: &str = "/problems/auth-failed";

/// Problem type URI for failing upstream APIs.
pub const PROBLEM_UPSTREAM_ERROR: &str = "/problems/upstream-error";

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Problem type URI for features whose upstream credentials are missing.
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

/// RFC 9457 Problem Details response structure.
///
/// # Example
///
/// ```
/// use globepeek_service_shared::{ProblemDetails, PROBLEM_COUNTRY_NOT_FOUND};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(
///     PROBLEM_COUNTRY_NOT_FOUND,
///     "Country Not Found",
///     StatusCode::NOT_FOUND,
/// )
/// .with_detail("Country 'Frnace' not found. Did you mean: France?")
/// .with_request_id("req-12345");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI reference identifying the specific occurrence (the request ID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// "Did you mean" candidates for not-found problems.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,

    /// Content type for this response (always "application/problem+json").
    pub content_type: String,
}

impl ProblemDetails {
    /// Create a new ProblemDetails with required fields.
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            suggestions: Vec::new(),
            content_type: "application/problem+json".to_string(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add the request identifier for tracing.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// Create a 400 Bad Request problem for invalid input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem for unknown countries.
    pub fn country_not_found(
        name: &str,
        suggestions: &[String],
        request_id: impl Into<String>,
    ) -> Self {
        let detail = if suggestions.is_empty() {
            format!("Country '{}' not found", name)
        } else {
            format!(
                "Country '{}' not found. Did you mean: {}?",
                name,
                suggestions.join(", ")
            )
        };

        let mut problem = Self::new(
            PROBLEM_COUNTRY_NOT_FOUND,
            "Country Not Found",
            StatusCode::NOT_FOUND,
        )
        .with_detail(detail)
        .with_request_id(request_id);
        problem.suggestions = suggestions.to_vec();
        problem
    }

    /// Create a 404 Not Found problem for a client path with no view.
    pub fn page_not_found(path: &str, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_PAGE_NOT_FOUND, "Page Not Found", StatusCode::NOT_FOUND)
            .with_detail(format!("No view is served at '{}'", path))
            .with_request_id(request_id)
    }

    /// Create a 401 Unauthorized problem.
    pub fn unauthenticated(request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UNAUTHENTICATED,
            "Unauthenticated",
            StatusCode::UNAUTHORIZED,
        )
        .with_detail("Sign in to use this endpoint")
        .with_request_id(request_id)
    }

    /// Create a 400 problem for credentials the auth provider rejected.
    pub fn auth_failed(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_AUTH_FAILED,
            "Authentication Failed",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 502 Bad Gateway problem for a failing upstream.
    pub fn upstream_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_UPSTREAM_ERROR,
            "Upstream Error",
            StatusCode::BAD_GATEWAY,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 500 Internal Server Error problem.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 503 Service Unavailable problem.
    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        *response.status_mut() = status;
        response
    }
}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::CountryNotFound { name, suggestions } => {
            ProblemDetails::country_not_found(name, suggestions, request_id)
        }
        LibError::Unauthenticated => ProblemDetails::unauthenticated(request_id),
        LibError::Auth { message } => ProblemDetails::auth_failed(message.clone(), request_id),
        LibError::InvalidInput { message } => ProblemDetails::bad_request(message.clone(), request_id),
        LibError::MissingApiKey { service } => ProblemDetails::service_unavailable(
            format!("{} is not configured on this server", service),
            request_id,
        ),
        LibError::Upstream { .. } | LibError::UnexpectedPayload { .. } | LibError::Http(_) => {
            ProblemDetails::upstream_error(error.to_string(), request_id)
        }
        _ => ProblemDetails::internal_error(error.to_string(), request_id),
    }
}
