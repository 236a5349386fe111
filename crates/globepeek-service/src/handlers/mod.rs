//! Route handlers, grouped by the area of the app they serve.

pub mod account;
pub mod countries;
pub mod favorites;
pub mod navigate;

use std::future::Future;

use globepeek_lib::Error;
use globepeek_service_shared::{
    failure_reason, from_lib_error, record_upstream_call, record_upstream_failure, ProblemDetails,
    RequestId, ServiceResponse, Validate,
};

/// Success body or RFC 9457 problem.
pub type ApiResult<T> = Result<ServiceResponse<T>, ProblemDetails>;

/// Count one call to `upstream`, await it, and convert its failure.
pub(crate) async fn upstream_call<T>(
    upstream: &'static str,
    operation: &'static str,
    request_id: &RequestId,
    call: impl Future<Output = Result<T, Error>>,
) -> Result<T, ProblemDetails> {
    record_upstream_call(upstream, operation);
    call.await.map_err(|e| lib_problem(&e, upstream, request_id))
}

/// Log a library error, count it against `upstream`, and convert it.
fn lib_problem(error: &Error, upstream: &'static str, request_id: &RequestId) -> ProblemDetails {
    let reason = failure_reason(error);
    record_upstream_failure(upstream, reason);
    match reason {
        "not_found" | "auth" | "invalid_input" => {
            tracing::info!(request_id = %request_id, upstream, error = %error, "request rejected");
        }
        _ => tracing::error!(request_id = %request_id, upstream, error = %error, "upstream call failed"),
    }
    from_lib_error(error, request_id.as_str())
}

pub(crate) fn validated<T: Validate>(request: T, request_id: &RequestId) -> Result<T, ProblemDetails> {
    request.validate(request_id.as_str()).map_err(|problem| *problem)?;
    Ok(request)
}
