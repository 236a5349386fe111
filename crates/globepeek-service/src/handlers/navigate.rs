use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::Serialize;

use globepeek_lib::{navigate, AuthGate, ClientRoute, GateDecision};
use globepeek_service_shared::{
    from_lib_error, resolve_gate, AppState, NavigateQuery, ProblemDetails, RequestId,
    ServiceResponse,
};

use super::{validated, ApiResult};

#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    pub route: ClientRoute,
    pub decision: GateDecision,
}

/// `GET /api/v1/navigate?path=/profile`
///
/// Resolves a client path to its view and what the auth gate says about it.
/// The bearer token is only checked for protected views.
pub async fn resolve(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    Query(query): Query<NavigateQuery>,
) -> ApiResult<NavigateResponse> {
    let query = validated(query, &request_id)?;
    let Some(route) = ClientRoute::parse(&query.path) else {
        return Err(ProblemDetails::page_not_found(&query.path, request_id.as_str()));
    };

    let gate = if route.is_protected() {
        resolve_gate(&state, &headers)
            .await
            .map_err(|e| from_lib_error(&e, request_id.as_str()))?
    } else {
        AuthGate::new()
    };
    let decision = navigate(&route, &gate);
    Ok(ServiceResponse::new(NavigateResponse { route, decision }))
}
