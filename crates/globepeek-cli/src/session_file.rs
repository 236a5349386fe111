//! The CLI's persisted session.
//!
//! `login` writes the session JSON to a file so later invocations stay signed
//! in; `logout` removes it. The default location is the platform config
//! directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use globepeek_lib::Session;

const SESSION_FILENAME: &str = "session.json";

/// Default session file location, e.g. `~/.config/globepeek/session.json`.
pub fn default_session_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "globepeek", "globepeek")
        .context("could not determine the platform config directory")?;
    Ok(dirs.config_dir().join(SESSION_FILENAME))
}

/// A session file at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, or `None` when the file does not exist.
    pub fn load(&self) -> Result<Option<Session>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };
        let session = serde_json::from_str(&raw).with_context(|| {
            format!(
                "session file {} is corrupt; run `globepeek logout` to reset it",
                self.path.display()
            )
        })?;
        Ok(Some(session))
    }

    /// Write `session`, creating the parent directory. The file holds a bearer
    /// token, so on Unix it is only readable by the owner.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(session).context("failed to encode session")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .with_context(|| format!("failed to restrict {}", self.path.display()))?;
        }
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Delete the file. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("failed to remove {}", self.path.display())),
        }
    }
}
