//! Bearer-token authentication for protected endpoints.
//!
//! The service holds no sessions. Each request carrying
//! `Authorization: Bearer <token>` is checked against Supabase once, through
//! an [`AuthGate`], and handlers receive the resulting [`Authenticated`]
//! session. A missing, malformed or rejected token is a 401 problem; an auth
//! server that cannot answer is an upstream problem.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use globepeek_lib::{AuthGate, Error as LibError, GateState, Session, User};

use crate::metrics::{failure_reason, record_upstream_call, record_upstream_failure};
use crate::{from_lib_error, AppState, ProblemDetails, RequestId};

/// The bearer token of a request, if it has a well-formed one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Settle an auth gate for `headers`.
///
/// Requests without a token resolve unauthenticated without an upstream call.
/// A rejected token also resolves unauthenticated; any other failure of the
/// user lookup is returned so it is not mistaken for a bad token.
pub async fn resolve_gate(state: &AppState, headers: &HeaderMap) -> Result<AuthGate, LibError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(AuthGate::resolved(None));
    };
    record_upstream_call("supabase", "get_user");
    let user = match state.clients().supabase.get_user(token).await {
        Ok(user) => Some(user),
        Err(LibError::Unauthenticated) => None,
        Err(e) => {
            record_upstream_failure("supabase", failure_reason(&e));
            tracing::warn!(error = %e, "session check failed");
            return Err(e);
        }
    };
    Ok(AuthGate::resolved(user))
}

/// A verified session for the calling user.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

impl Authenticated {
    pub fn session(&self) -> &Session {
        &self.0
    }

    pub fn user(&self) -> &User {
        &self.0.user
    }
}

fn session_for(token: &str, user: User) -> Session {
    Session {
        access_token: token.to_string(),
        refresh_token: None,
        token_type: "bearer".to_string(),
        expires_in: None,
        user,
    }
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ProblemDetails;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();

        if !state.accounts_enabled() {
            return Err(ProblemDetails::service_unavailable(
                "supabase is not configured on this server",
                request_id,
            ));
        }

        let gate = resolve_gate(state, &parts.headers)
            .await
            .map_err(|e| from_lib_error(&e, &request_id))?;
        match (gate.state(), bearer_token(&parts.headers)) {
            (GateState::Authenticated(user), Some(token)) => {
                tracing::debug!(user_id = %user.id, "request authenticated");
                Ok(Authenticated(session_for(token, user.clone())))
            }
            _ => Err(ProblemDetails::unauthenticated(request_id)),
        }
    }
}
