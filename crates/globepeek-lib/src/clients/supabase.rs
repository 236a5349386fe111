//! Supabase client: auth (GoTrue), table rows (PostgREST) and storage.
//!
//! Every request carries the project's anon key as `apikey`. Row and storage
//! calls made on behalf of a user send that user's access token as the bearer
//! so row-level security applies; anonymous calls send the anon key instead.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use crate::clients::{ensure_success, upstream_message};
use crate::config::endpoint;
use crate::error::{Error, Result};
use crate::favorites::{FavoriteRow, FavoriteRows};
use crate::profile::{
    avatar_content_type, avatar_object_path, avatar_public_url, Profile, ProfileUpdate,
    AVATAR_BUCKET,
};
use crate::session::{Session, User};

const SERVICE: &str = "supabase";

/// Minimum password length enforced by Supabase's default auth settings.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Result of a sign-up: projects with email confirmation disabled sign the
/// user in straight away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SignUpOutcome {
    SignedIn { session: Session },
    ConfirmationRequired { user: User },
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: Client,
    base_url: Option<String>,
    anon_key: Option<String>,
}

struct Project<'a> {
    url: &'a str,
    anon_key: &'a str,
}

fn validate_email(email: &str) -> Result<&str> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Error::invalid_input(format!("'{email}' is not an email address"))),
    }
}

fn validate_password(password: &str) -> Result<&str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::invalid_input(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(password)
}

/// Map an auth endpoint response: rejected tokens become
/// [`Error::Unauthenticated`], rejected input becomes [`Error::Auth`].
async fn auth_response(response: Response) -> Result<Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(Error::Unauthenticated),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::TOO_MANY_REQUESTS => {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Auth {
                message: upstream_message(&body),
            })
        }
        _ => ensure_success(SERVICE, response).await,
    }
}

/// Map a PostgREST or storage response. An expired token shows up as 401.
async fn row_response(response: Response) -> Result<Response> {
    if response.status() == StatusCode::UNAUTHORIZED {
        return Err(Error::Unauthenticated);
    }
    ensure_success(SERVICE, response).await
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl SupabaseClient {
    pub fn new(http: Client, base_url: Option<String>, anon_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            anon_key,
        }
    }

    /// Whether both the project URL and anon key are configured.
    pub fn is_configured(&self) -> bool {
        self.project().is_ok()
    }

    fn project(&self) -> Result<Project<'_>> {
        match (self.base_url.as_deref(), self.anon_key.as_deref()) {
            (Some(url), Some(anon_key)) => Ok(Project { url, anon_key }),
            _ => Err(Error::MissingApiKey { service: SERVICE }),
        }
    }

    fn request(&self, method: Method, segments: &[&str], token: Option<&str>) -> Result<RequestBuilder> {
        let project = self.project()?;
        let url = endpoint(project.url, segments)?;
        Ok(self
            .http
            .request(method, url)
            .header("apikey", project.anon_key)
            .bearer_auth(token.unwrap_or(project.anon_key)))
    }

    // ---- auth ----

    /// Register with email and password.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let email = validate_email(email)?;
        let password = validate_password(password)?;

        let response = self
            .request(Method::POST, &["auth", "v1", "signup"], None)?
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: serde_json::Value = auth_response(response).await?.json().await?;

        let outcome = if body.get("access_token").is_some() {
            SignUpOutcome::SignedIn {
                session: serde_json::from_value(body)?,
            }
        } else {
            // Some GoTrue versions nest the user under `user`.
            let nested = body
                .get("id")
                .is_none()
                .then(|| body.get("user").cloned())
                .flatten();
            let user = nested.unwrap_or(body);
            SignUpOutcome::ConfirmationRequired {
                user: serde_json::from_value(user)?,
            }
        };
        debug!(email, "account registered");
        Ok(outcome)
    }

    /// Exchange email and password for a session.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let email = validate_email(email)?;
        if password.is_empty() {
            return Err(Error::invalid_input("password must not be empty"));
        }

        let response = self
            .request(Method::POST, &["auth", "v1", "token"], None)?
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let session: Session = auth_response(response).await?.json().await?;
        debug!(user_id = %session.user.id, "signed in");
        Ok(session)
    }

    /// URL that starts an OAuth sign-in with `provider` (for example
    /// `google`). The provider redirects back to `redirect_to` when given.
    pub fn oauth_authorize_url(&self, provider: &str, redirect_to: Option<&str>) -> Result<Url> {
        let provider = provider.trim().to_ascii_lowercase();
        if provider.is_empty() || !provider.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_input(format!(
                "'{provider}' is not an OAuth provider name"
            )));
        }
        let project = self.project()?;
        let mut url = endpoint(project.url, &["auth", "v1", "authorize"])?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("provider", &provider);
            if let Some(target) = redirect_to.map(str::trim).filter(|t| !t.is_empty()) {
                query.append_pair("redirect_to", target);
            }
        }
        Ok(url)
    }

    /// Revoke the session behind `access_token`. A token the server already
    /// considers invalid counts as signed out.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &["auth", "v1", "logout"], Some(access_token))?
            .send()
            .await?;
        match auth_response(response).await {
            Ok(_) => Ok(()),
            Err(Error::Unauthenticated) => {
                debug!("token already invalid at sign-out");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// The user behind `access_token`; [`Error::Unauthenticated`] when the
    /// token is rejected.
    pub async fn get_user(&self, access_token: &str) -> Result<User> {
        if access_token.trim().is_empty() {
            return Err(Error::Unauthenticated);
        }
        let response = self
            .request(Method::GET, &["auth", "v1", "user"], Some(access_token))?
            .send()
            .await?;
        Ok(auth_response(response).await?.json().await?)
    }

    pub async fn update_password(&self, access_token: &str, password: &str) -> Result<User> {
        let password = validate_password(password)?;
        let response = self
            .request(Method::PUT, &["auth", "v1", "user"], Some(access_token))?
            .json(&json!({ "password": password }))
            .send()
            .await?;
        let user: User = auth_response(response).await?.json().await?;
        info!(user_id = %user.id, "password updated");
        Ok(user)
    }

    // ---- profiles ----

    /// The session user's profile row, if one was ever saved.
    pub async fn get_profile(&self, session: &Session) -> Result<Option<Profile>> {
        let user_id = eq(&session.user.id);
        let response = self
            .request(Method::GET, &["rest", "v1", "profiles"], Some(&session.access_token))?
            .query(&[
                ("select", "id,full_name,country,avatar_url"),
                ("id", user_id.as_str()),
            ])
            .send()
            .await?;
        let rows: Vec<Profile> = row_response(response).await?.json().await?;
        Ok(rows.into_iter().next())
    }

    /// Insert or replace the session user's profile row.
    pub async fn upsert_profile(&self, session: &Session, profile: &Profile) -> Result<Profile> {
        if profile.id != session.user.id {
            return Err(Error::invalid_input("profile does not belong to the signed-in user"));
        }
        let response = self
            .request(Method::POST, &["rest", "v1", "profiles"], Some(&session.access_token))?
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(profile)
            .send()
            .await?;
        let rows: Vec<Profile> = row_response(response).await?.json().await?;
        Ok(rows.into_iter().next().unwrap_or_else(|| profile.clone()))
    }

    /// Load the profile (or start a blank one), apply `update` and save it.
    pub async fn update_profile(&self, session: &Session, update: ProfileUpdate) -> Result<Profile> {
        let mut profile = self
            .get_profile(session)
            .await?
            .unwrap_or_else(|| Profile::blank(&session.user.id));
        profile.apply(update);
        self.upsert_profile(session, &profile).await
    }

    /// Store an avatar as `{user_id}.{ext}` in the avatar bucket, replacing
    /// any previous one, and return its public URL.
    pub async fn upload_avatar(&self, session: &Session, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        if bytes.is_empty() {
            return Err(Error::invalid_input("avatar file is empty"));
        }
        let path = avatar_object_path(&session.user.id, file_name)?;
        let size = bytes.len();

        let response = self
            .request(
                Method::POST,
                &["storage", "v1", "object", AVATAR_BUCKET, path.as_str()],
                Some(&session.access_token),
            )?
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, avatar_content_type(&path))
            .body(bytes)
            .send()
            .await?;
        row_response(response).await?;

        let project = self.project()?;
        info!(path = %path, bytes = size, "avatar uploaded");
        Ok(avatar_public_url(project.url, &path))
    }

    // ---- newsletter ----

    /// Add `email` to the newsletter list. Returns `false` when it was
    /// already subscribed.
    pub async fn subscribe_newsletter(&self, email: &str) -> Result<bool> {
        let email = validate_email(email)?;
        let response = self
            .request(Method::POST, &["rest", "v1", "newsletter"], None)?
            .header("Prefer", "return=minimal")
            .json(&json!([{ "email": email }]))
            .send()
            .await?;
        if response.status() == StatusCode::CONFLICT {
            debug!(email, "already subscribed");
            return Ok(false);
        }
        row_response(response).await?;
        Ok(true)
    }

    // ---- favorites ----

    async fn favorite_rows(&self, session: &Session, name: Option<&str>, limit: Option<&str>) -> Result<Vec<FavoriteRow>> {
        let user_id = eq(&session.user.id);
        let mut query = vec![
            ("select", "user_id,country_name".to_string()),
            ("user_id", user_id),
        ];
        if let Some(name) = name {
            query.push(("country_name", eq(name)));
        }
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        let response = self
            .request(Method::GET, &["rest", "v1", "favorites"], Some(&session.access_token))?
            .query(&query)
            .send()
            .await?;
        Ok(row_response(response).await?.json().await?)
    }
}

impl FavoriteRows for SupabaseClient {
    async fn list(&self, session: &Session) -> Result<Vec<FavoriteRow>> {
        self.favorite_rows(session, None, None).await
    }

    async fn contains(&self, session: &Session, name: &str) -> Result<bool> {
        Ok(!self.favorite_rows(session, Some(name), Some("1")).await?.is_empty())
    }

    async fn insert(&self, session: &Session, name: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &["rest", "v1", "favorites"], Some(&session.access_token))?
            .header("Prefer", "return=minimal")
            .json(&json!({ "user_id": session.user.id, "country_name": name }))
            .send()
            .await?;
        row_response(response).await?;
        debug!(country = name, "favorite added");
        Ok(())
    }

    async fn delete(&self, session: &Session, name: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &["rest", "v1", "favorites"], Some(&session.access_token))?
            .query(&[("user_id", eq(&session.user.id)), ("country_name", eq(name))])
            .send()
            .await?;
        row_response(response).await?;
        debug!(country = name, "favorite removed");
        Ok(())
    }
}
