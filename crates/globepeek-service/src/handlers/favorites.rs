//! Favorites of the signed-in user.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::info;

use globepeek_lib::{add_favorite, remove_favorite, resolve_favorites, toggle_favorite, FavoritesOutcome};
use globepeek_service_shared::{
    record_favorites_resolved, AppState, Authenticated, FavoriteRequest, ProblemDetails, RequestId,
    ServiceResponse,
};

use super::{upstream_call, validated, ApiResult};

#[derive(Debug, Serialize)]
pub struct FavoriteState {
    pub country_name: String,
    pub favorite: bool,
}

/// `GET /api/v1/favorites`: every favorite resolved to its country records.
/// Names that fail to resolve are listed under `failures`.
pub async fn list(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
) -> ApiResult<FavoritesOutcome> {
    let clients = state.clients();
    let outcome = upstream_call(
        "supabase",
        "resolve_favorites",
        &request_id,
        resolve_favorites(&clients.supabase, clients, auth.session()),
    )
    .await?;

    record_favorites_resolved(outcome.countries.len(), outcome.failures.len());
    info!(
        request_id = %request_id,
        user_id = %auth.user().id,
        resolved = outcome.countries.len(),
        failed = outcome.failures.len(),
        "favorites resolved"
    );
    Ok(ServiceResponse::new(outcome))
}

/// `POST /api/v1/favorites`: 201 when the row was new, 200 when it existed.
pub async fn add(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
    Json(request): Json<FavoriteRequest>,
) -> ApiResult<FavoriteState> {
    let request = validated(request, &request_id)?;
    let country_name = request.country_name.trim().to_string();
    let added = upstream_call(
        "supabase",
        "add_favorite",
        &request_id,
        add_favorite(&state.clients().supabase, auth.session(), &country_name),
    )
    .await?;

    let body = FavoriteState {
        country_name,
        favorite: true,
    };
    Ok(if added {
        ServiceResponse::created(body)
    } else {
        ServiceResponse::new(body)
    })
}

/// `DELETE /api/v1/favorites/{name}`
pub async fn remove(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
    Path(name): Path<String>,
) -> Result<StatusCode, ProblemDetails> {
    upstream_call(
        "supabase",
        "remove_favorite",
        &request_id,
        remove_favorite(&state.clients().supabase, auth.session(), &name),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/v1/favorites/{name}/toggle`
pub async fn toggle(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
    Path(name): Path<String>,
) -> ApiResult<FavoriteState> {
    let favorite = upstream_call(
        "supabase",
        "toggle_favorite",
        &request_id,
        toggle_favorite(&state.clients().supabase, auth.session(), &name),
    )
    .await?;
    info!(request_id = %request_id, country = %name.trim(), favorite, "favorite toggled");
    Ok(ServiceResponse::new(FavoriteState {
        country_name: name.trim().to_string(),
        favorite,
    }))
}
