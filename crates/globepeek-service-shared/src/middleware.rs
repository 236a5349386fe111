//! Request tracking and HTTP metrics middleware.
//!
//! [`MetricsLayer`] wraps the router. For every request it:
//!
//! - takes `X-Request-ID` from the request or generates a UUID v7
//! - stores the [`RequestId`] in the request extensions for handlers
//! - opens a `request` span carrying the id, method and route label
//! - echoes the id back in the `X-Request-ID` response header
//! - records `http_requests_total`, `http_request_duration_seconds`,
//!   `http_request_size_bytes` and `http_response_size_bytes`
//!
//! Country and favorite names in paths are collapsed into `{name}` for
//! metric labels so a crawler walking every country cannot blow up label
//! cardinality.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Request, Response};
use pin_project_lite::pin_project;
use tower::{Layer, Service};
use tracing::{info_span, Span};
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of one request.
///
/// Also an axum extractor: handlers take `request_id: RequestId` and get
/// the id [`MetricsLayer`] assigned, or a fresh one when the layer is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new UUID v7 request ID.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(|| extract_or_generate_request_id(&parts.headers)))
    }
}

/// The non-empty `X-Request-ID` header, or a new UUID v7.
pub fn extract_or_generate_request_id(headers: &HeaderMap) -> RequestId {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(RequestId::from)
        .unwrap_or_else(RequestId::generate)
}

/// Metric label for a request path.
///
/// Drops the query string and replaces the user-supplied segment of
/// `/api/v1/countries/{name}` and `/api/v1/favorites/{name}` (plus the
/// `toggle` form) with `{name}`. Fixed routes such as
/// `/api/v1/countries/suggest` keep their literal path.
pub fn normalize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or(path);
    let segments: Vec<&str> = path.split('/').collect();
    match segments.as_slice() {
        ["", "api", "v1", "countries", name] if !name.is_empty() && *name != "suggest" => {
            "/api/v1/countries/{name}".to_string()
        }
        ["", "api", "v1", "favorites", name] if !name.is_empty() => {
            "/api/v1/favorites/{name}".to_string()
        }
        ["", "api", "v1", "favorites", _, "toggle"] => "/api/v1/favorites/{name}/toggle".to_string(),
        ["", "api", "v1", "auth", "oauth", _] => "/api/v1/auth/oauth/{provider}".to_string(),
        _ => path.to_string(),
    }
}

fn status_bucket(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

fn content_length(headers: &HeaderMap) -> Option<f64> {
    headers
        .get(http::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

// =============================================================================
// MetricsLayer - Tower middleware for HTTP metrics
// =============================================================================

/// Tower layer adding request ids, the request span and HTTP metrics.
#[derive(Debug, Clone)]
pub struct MetricsLayer;

impl<S> Layer<S> for MetricsLayer {
    type Service = MetricsMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MetricsMiddleware { inner }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsMiddleware<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for MetricsMiddleware<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    ReqBody: http_body::Body + Send + 'static,
    ResBody: http_body::Body + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = MetricsFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        let path = normalize_path(req.uri().path());

        if let Some(size) = content_length(req.headers()) {
            metrics::histogram!(
                "http_request_size_bytes",
                "method" => method.clone(),
                "path" => path.clone()
            )
            .record(size);
        }

        let request_id = extract_or_generate_request_id(req.headers());
        req.extensions_mut().insert(request_id.clone());

        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %method,
            path = %path,
        );

        {
            let _enter = span.enter();
            tracing::debug!(uri = %req.uri(), "handling request");
        }

        let future = self.inner.call(req);

        MetricsFuture {
            inner: future,
            start,
            method,
            path,
            request_id,
            span,
        }
    }
}

pin_project! {
    /// Future wrapper that records metrics on completion.
    pub struct MetricsFuture<F> {
        #[pin]
        inner: F,
        start: Instant,
        method: String,
        path: String,
        request_id: RequestId,
        span: Span,
    }
}

impl<F, ResBody, E> Future for MetricsFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
    ResBody: http_body::Body,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let _enter = this.span.enter();

        let mut result = match this.inner.poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(result) => result,
        };

        let duration_secs = this.start.elapsed().as_secs_f64();
        let latency_ms = duration_secs * 1000.0;

        metrics::histogram!(
            "http_request_duration_seconds",
            "method" => this.method.clone(),
            "path" => this.path.clone()
        )
        .record(duration_secs);

        match &mut result {
            Ok(response) => {
                let status = response.status().as_u16();
                metrics::counter!(
                    "http_requests_total",
                    "method" => this.method.clone(),
                    "path" => this.path.clone(),
                    "status" => status_bucket(status)
                )
                .increment(1);

                if let Some(size) = content_length(response.headers()) {
                    metrics::histogram!(
                        "http_response_size_bytes",
                        "method" => this.method.clone(),
                        "path" => this.path.clone()
                    )
                    .record(size);
                }

                if let Ok(value) = HeaderValue::from_str(this.request_id.as_str()) {
                    response.headers_mut().insert(REQUEST_ID_HEADER, value);
                }

                if status >= 500 {
                    tracing::warn!(status, latency_ms, "request completed with server error");
                } else {
                    tracing::info!(status, latency_ms, "request completed");
                }
            }
            Err(_) => {
                metrics::counter!(
                    "http_requests_total",
                    "method" => this.method.clone(),
                    "path" => this.path.clone(),
                    "status" => "5xx"
                )
                .increment(1);

                tracing::error!(latency_ms, "request failed");
            }
        }

        Poll::Ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generate() {
        let id1 = RequestId::generate();
        let id2 = RequestId::generate();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_extract_request_id_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Request-ID", HeaderValue::from_static("test-123"));

        assert_eq!(extract_or_generate_request_id(&headers).as_str(), "test-123");
    }

    #[test]
    fn test_extract_request_id_generates_when_blank() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("  "));

        assert_eq!(extract_or_generate_request_id(&headers).as_str().len(), 36);
        assert_eq!(extract_or_generate_request_id(&HeaderMap::new()).as_str().len(), 36);
    }

    #[test]
    fn test_normalize_path_collapses_names() {
        assert_eq!(normalize_path("/api/v1/countries/France"), "/api/v1/countries/{name}");
        assert_eq!(normalize_path("/api/v1/countries/suggest?q=fr"), "/api/v1/countries/suggest");
        assert_eq!(normalize_path("/api/v1/countries?page=2"), "/api/v1/countries");
        assert_eq!(normalize_path("/api/v1/favorites/Peru"), "/api/v1/favorites/{name}");
        assert_eq!(
            normalize_path("/api/v1/favorites/Peru/toggle"),
            "/api/v1/favorites/{name}/toggle"
        );
        assert_eq!(
            normalize_path("/api/v1/auth/oauth/google"),
            "/api/v1/auth/oauth/{provider}"
        );
        assert_eq!(normalize_path("/health/ready"), "/health/ready");
    }

    #[test]
    fn test_status_bucket() {
        assert_eq!(status_bucket(204), "2xx");
        assert_eq!(status_bucket(301), "3xx");
        assert_eq!(status_bucket(404), "4xx");
        assert_eq!(status_bucket(502), "5xx");
        assert_eq!(status_bucket(99), "other");
    }
}
