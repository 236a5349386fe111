//! Light/dark theme preference with change notification.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::invalid_input(format!(
                "unknown theme '{other}' (expected light or dark)"
            ))),
        }
    }
}

/// Current theme, shared by everything that renders.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    tx: Arc<watch::Sender<Theme>>,
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

impl ThemeStore {
    pub fn new(initial: Theme) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Theme {
        *self.tx.borrow()
    }

    pub fn set(&self, theme: Theme) {
        self.tx.send_if_modified(|current| {
            let changed = *current != theme;
            *current = theme;
            changed
        });
    }

    pub fn toggle(&self) -> Theme {
        let next = self.current().toggled();
        self.set(next);
        next
    }

    pub fn subscribe(&self) -> watch::Receiver<Theme> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[tokio::test]
    async fn subscribers_see_changes_only() {
        let store = ThemeStore::default();
        let mut rx = store.subscribe();

        store.set(Theme::Light);
        assert!(!rx.has_changed().unwrap());

        assert_eq!(store.toggle(), Theme::Dark);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), Theme::Dark);
    }
}
