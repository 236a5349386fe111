//! Response wrapper for successful HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Successful JSON response.
///
/// The payload is flattened into the top-level object next to a
/// `content_type` field, mirroring [`crate::ProblemDetails`]. The payload
/// must therefore serialize as a JSON object.
///
/// # Example
///
/// ```
/// use globepeek_service_shared::ServiceResponse;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Suggestions {
///     suggestions: Vec<String>,
/// }
///
/// let response = ServiceResponse::new(Suggestions { suggestions: vec!["France".into()] });
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    #[serde(flatten)]
    pub data: T,

    pub content_type: String,

    /// HTTP status; 200 unless built with [`ServiceResponse::created`].
    #[serde(skip, default = "ok")]
    pub status: StatusCode,
}

fn ok() -> StatusCode {
    StatusCode::OK
}

impl<T> ServiceResponse<T> {
    /// 200 OK with `application/json`.
    pub fn new(data: T) -> Self {
        Self {
            data,
            content_type: "application/json".to_string(),
            status: StatusCode::OK,
        }
    }

    /// 201 Created, for endpoints that stored something new.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(data)
        }
    }
}

impl<T> From<T> for ServiceResponse<T> {
    fn from(data: T) -> Self {
        Self::new(data)
    }
}

impl<T: Serialize> IntoResponse for ServiceResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}
