//! User profile records and avatar storage layout.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Storage bucket holding profile pictures.
pub const AVATAR_BUCKET: &str = "avatars";

/// A row of the `profiles` table, keyed by the auth user id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Fields a user may change. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Empty profile for a user that has never saved one.
    pub fn blank(user_id: &str) -> Self {
        Self {
            id: user_id.to_string(),
            ..Self::default()
        }
    }

    /// Apply an update; blank strings clear a field.
    pub fn apply(&mut self, update: ProfileUpdate) {
        fn merge(slot: &mut Option<String>, value: Option<String>) {
            if let Some(value) = value {
                let value = value.trim();
                *slot = (!value.is_empty()).then(|| value.to_string());
            }
        }
        merge(&mut self.full_name, update.full_name);
        merge(&mut self.country, update.country);
        merge(&mut self.avatar_url, update.avatar_url);
    }
}

/// Object path for a user's avatar: `{user_id}.{ext}`, where `ext` is the
/// uploaded file's extension, lowercased.
pub fn avatar_object_path(user_id: &str, file_name: &str) -> Result<String> {
    if user_id.trim().is_empty() {
        return Err(Error::invalid_input("user id must not be empty"));
    }
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .ok_or_else(|| {
            Error::invalid_input(format!("avatar file '{file_name}' has no usable extension"))
        })?;
    Ok(format!("{user_id}.{}", ext.to_ascii_lowercase()))
}

/// Public URL of an object in the avatar bucket.
pub fn avatar_public_url(supabase_url: &str, object_path: &str) -> String {
    format!(
        "{}/storage/v1/object/public/{AVATAR_BUCKET}/{object_path}",
        supabase_url.trim_end_matches('/')
    )
}

/// MIME type sent with an avatar upload.
pub fn avatar_content_type(object_path: &str) -> &'static str {
    match object_path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}
