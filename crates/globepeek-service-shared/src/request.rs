//! Request types and validation for HTTP endpoints.
//!
//! Validation here only rejects requests that can never succeed (blank
//! names, out-of-range pages). Rules that the library enforces anyway, such
//! as the minimum password length, are checked again so a bad request fails
//! before any upstream call.

use serde::{Deserialize, Serialize};

use globepeek_lib::clients::supabase::MIN_PASSWORD_LEN;
use globepeek_lib::{DirectoryFilter, ProfileUpdate};

use crate::ProblemDetails;

/// Longest accepted search query or country name.
pub const MAX_QUERY_LEN: usize = 100;

/// Longest accepted profile text field.
pub const MAX_PROFILE_FIELD_LEN: usize = 200;

/// Validation trait for request types.
pub trait Validate {
    /// Validate the request, returning a boxed 400 problem if invalid.
    ///
    /// The `request_id` is used to populate the `instance` field of any
    /// returned `ProblemDetails`.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

fn invalid(detail: impl Into<String>, request_id: &str) -> Box<ProblemDetails> {
    Box::new(ProblemDetails::bad_request(detail, request_id))
}

fn check_len(field: &str, value: &str, max: usize, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    if value.chars().count() > max {
        return Err(invalid(
            format!("The '{}' field cannot exceed {} characters", field, max),
            request_id,
        ));
    }
    Ok(())
}

fn require(field: &str, value: &str, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    if value.trim().is_empty() {
        return Err(invalid(
            format!("The '{}' field is required and cannot be empty", field),
            request_id,
        ));
    }
    Ok(())
}

fn check_email(email: &str, request_id: &str) -> Result<(), Box<ProblemDetails>> {
    require("email", email, request_id)?;
    if !email.contains('@') {
        return Err(invalid("The 'email' field must be an email address", request_id));
    }
    Ok(())
}

/// Query string of `GET /api/v1/countries`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryQuery {
    /// Case-insensitive substring of the common name.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// 1-based page number (default 1).
    #[serde(default)]
    pub page: Option<usize>,
}

impl DirectoryQuery {
    pub fn filter(&self) -> DirectoryFilter {
        DirectoryFilter {
            query: self.q.clone().unwrap_or_default(),
            region: self.region.clone(),
            language: self.language.clone(),
        }
    }

    pub fn page(&self) -> usize {
        self.page.unwrap_or(1)
    }
}

impl Validate for DirectoryQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.page == Some(0) {
            return Err(invalid("The 'page' field must be at least 1", request_id));
        }
        if let Some(q) = &self.q {
            check_len("q", q, MAX_QUERY_LEN, request_id)?;
        }
        Ok(())
    }
}

/// Query string of `GET /api/v1/countries/suggest`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub q: String,
}

impl Validate for SuggestQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        check_len("q", &self.q, MAX_QUERY_LEN, request_id)
    }
}

/// Body of `POST /api/v1/auth/register` and `POST /api/v1/auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Validate for CredentialsRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        check_email(&self.email, request_id)?;
        require("password", &self.password, request_id)
    }
}

/// Body of `PUT /api/v1/auth/password`.
#[derive(Clone, Serialize, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

impl std::fmt::Debug for PasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordRequest { password: <redacted> }")
    }
}

impl Validate for PasswordRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(invalid(
                format!("The 'password' field must be at least {} characters", MIN_PASSWORD_LEN),
                request_id,
            ));
        }
        Ok(())
    }
}

/// Query string of `GET /api/v1/auth/oauth/{provider}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OAuthQuery {
    /// Where the provider should send the browser after sign-in.
    #[serde(default)]
    pub redirect_to: Option<String>,
}

/// Body of `PUT /api/v1/profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Validate for ProfileRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        let fields = [
            ("full_name", &self.full_name),
            ("country", &self.country),
            ("avatar_url", &self.avatar_url),
        ];
        if fields.iter().all(|(_, v)| v.is_none()) {
            return Err(invalid("Provide at least one profile field to update", request_id));
        }
        for (name, value) in fields {
            if let Some(value) = value {
                check_len(name, value, MAX_PROFILE_FIELD_LEN, request_id)?;
            }
        }
        Ok(())
    }
}

impl From<ProfileRequest> for ProfileUpdate {
    fn from(value: ProfileRequest) -> Self {
        ProfileUpdate {
            full_name: value.full_name,
            country: value.country,
            avatar_url: value.avatar_url,
        }
    }
}

/// Query string of `PUT /api/v1/profile/avatar`; the image is the raw body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarQuery {
    /// Original file name; only its extension is kept.
    pub file_name: String,
}

impl Validate for AvatarQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require("file_name", &self.file_name, request_id)?;
        match self.file_name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => Ok(()),
            _ => Err(invalid(
                "The 'file_name' field must have an extension such as .png or .jpg",
                request_id,
            )),
        }
    }
}

/// Body of `POST /api/v1/favorites`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteRequest {
    pub country_name: String,
}

impl Validate for FavoriteRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        require("country_name", &self.country_name, request_id)?;
        check_len("country_name", &self.country_name, MAX_QUERY_LEN, request_id)
    }
}

/// Body of `POST /api/v1/newsletter`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsletterRequest {
    pub email: String,
}

impl Validate for NewsletterRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        check_email(&self.email, request_id)
    }
}

/// Query string of `GET /api/v1/navigate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateQuery {
    pub path: String,
}

impl Validate for NavigateQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if !self.path.starts_with('/') {
            return Err(invalid("The 'path' field must start with '/'", request_id));
        }
        Ok(())
    }
}
