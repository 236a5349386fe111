//! Sign-up, sign-in, password, profile, avatar and newsletter endpoints.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;
use tracing::info;

use globepeek_lib::{Profile, ProfileUpdate, Session, SignUpOutcome, User};
use globepeek_service_shared::{
    bearer_token, from_lib_error, AppState, Authenticated, AvatarQuery, CredentialsRequest,
    NewsletterRequest, OAuthQuery, PasswordRequest, ProblemDetails, ProfileRequest, RequestId,
    ServiceResponse,
};

use super::{upstream_call, validated, ApiResult};

/// Largest accepted avatar upload.
pub const MAX_AVATAR_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct OAuthResponse {
    pub provider: String,
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub avatar_url: String,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct NewsletterResponse {
    pub email: String,
    /// False when the address was already subscribed.
    pub subscribed: bool,
}

/// `POST /api/v1/auth/register`
pub async fn register(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<SignUpOutcome> {
    let request = validated(request, &request_id)?;
    let outcome = upstream_call(
        "supabase",
        "sign_up",
        &request_id,
        state.clients().supabase.sign_up(&request.email, &request.password),
    )
    .await?;

    info!(
        request_id = %request_id,
        signed_in = matches!(outcome, SignUpOutcome::SignedIn { .. }),
        "account registered"
    );
    Ok(ServiceResponse::created(outcome))
}

/// `POST /api/v1/auth/login`
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<CredentialsRequest>,
) -> ApiResult<Session> {
    let request = validated(request, &request_id)?;
    let session = upstream_call(
        "supabase",
        "sign_in_with_password",
        &request_id,
        state.clients().supabase.sign_in_with_password(&request.email, &request.password),
    )
    .await?;

    info!(request_id = %request_id, user_id = %session.user.id, "signed in");
    Ok(ServiceResponse::new(session))
}

/// `POST /api/v1/auth/logout`
///
/// Revokes the bearer token. A token the provider no longer accepts counts
/// as already signed out.
pub async fn logout(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
) -> Result<StatusCode, ProblemDetails> {
    let Some(token) = bearer_token(&headers) else {
        return Err(ProblemDetails::unauthenticated(request_id.as_str()));
    };
    upstream_call(
        "supabase",
        "sign_out",
        &request_id,
        state.clients().supabase.sign_out(token),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/auth/oauth/{provider}`: where to send the browser to start
/// an OAuth sign-in.
pub async fn oauth(
    State(state): State<AppState>,
    request_id: RequestId,
    Path(provider): Path<String>,
    Query(query): Query<OAuthQuery>,
) -> ApiResult<OAuthResponse> {
    let url = state
        .clients()
        .supabase
        .oauth_authorize_url(&provider, query.redirect_to.as_deref())
        .map_err(|e| from_lib_error(&e, request_id.as_str()))?;
    Ok(ServiceResponse::new(OAuthResponse {
        provider: provider.to_lowercase(),
        url: url.to_string(),
    }))
}

/// `PUT /api/v1/auth/password`
pub async fn change_password(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
    Json(request): Json<PasswordRequest>,
) -> ApiResult<User> {
    let request = validated(request, &request_id)?;
    let user = upstream_call(
        "supabase",
        "update_password",
        &request_id,
        state.clients().supabase.update_password(&auth.session().access_token, &request.password),
    )
    .await?;
    info!(request_id = %request_id, user_id = %user.id, "password changed");
    Ok(ServiceResponse::new(user))
}

/// `GET /api/v1/profile`: the stored profile, or a blank one for users who
/// never saved theirs.
pub async fn get_profile(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
) -> ApiResult<Profile> {
    let profile = upstream_call(
        "supabase",
        "get_profile",
        &request_id,
        state.clients().supabase.get_profile(auth.session()),
    )
    .await?
    .unwrap_or_else(|| Profile::blank(&auth.user().id));
    Ok(ServiceResponse::new(profile))
}

/// `PUT /api/v1/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
    Json(request): Json<ProfileRequest>,
) -> ApiResult<Profile> {
    let request = validated(request, &request_id)?;
    let profile = upstream_call(
        "supabase",
        "update_profile",
        &request_id,
        state.clients().supabase.update_profile(auth.session(), request.into()),
    )
    .await?;
    info!(request_id = %request_id, user_id = %profile.id, "profile updated");
    Ok(ServiceResponse::new(profile))
}

/// `PUT /api/v1/profile/avatar?file_name=me.png` with the image as the body.
///
/// Stores the image and points the profile's `avatar_url` at it.
pub async fn upload_avatar(
    State(state): State<AppState>,
    request_id: RequestId,
    auth: Authenticated,
    Query(query): Query<AvatarQuery>,
    body: Bytes,
) -> ApiResult<AvatarResponse> {
    let query = validated(query, &request_id)?;
    if body.is_empty() {
        return Err(ProblemDetails::bad_request("The avatar image is empty", request_id.as_str()));
    }
    if body.len() > MAX_AVATAR_BYTES {
        return Err(ProblemDetails::bad_request(
            format!("The avatar image cannot exceed {} bytes", MAX_AVATAR_BYTES),
            request_id.as_str(),
        ));
    }

    let supabase = &state.clients().supabase;
    let avatar_url = upstream_call(
        "supabase",
        "upload_avatar",
        &request_id,
        supabase.upload_avatar(auth.session(), &query.file_name, body.to_vec()),
    )
    .await?;
    let update = ProfileUpdate {
        avatar_url: Some(avatar_url.clone()),
        ..ProfileUpdate::default()
    };
    let profile = upstream_call(
        "supabase",
        "update_profile",
        &request_id,
        supabase.update_profile(auth.session(), update),
    )
    .await?;

    info!(request_id = %request_id, user_id = %profile.id, bytes = body.len(), "avatar uploaded");
    Ok(ServiceResponse::new(AvatarResponse { avatar_url, profile }))
}

/// `POST /api/v1/newsletter`
pub async fn subscribe(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<NewsletterRequest>,
) -> ApiResult<NewsletterResponse> {
    let request = validated(request, &request_id)?;
    let email = request.email.trim().to_string();
    let subscribed = upstream_call(
        "supabase",
        "subscribe_newsletter",
        &request_id,
        state.clients().supabase.subscribe_newsletter(&email),
    )
    .await?;

    let response = NewsletterResponse { email, subscribed };
    Ok(if subscribed {
        ServiceResponse::created(response)
    } else {
        ServiceResponse::new(response)
    })
}
