//! Client-side routes and which of them sit behind the auth gate.

use serde::Serialize;

use crate::session::{AuthGate, GateDecision};

/// A view the app can show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", content = "country", rename_all = "snake_case")]
pub enum ClientRoute {
    Landing,
    Directory,
    Login,
    Register,
    Profile,
    ChangePassword,
    /// `/{countryName}`.
    Detail(String),
}

impl ClientRoute {
    /// Map a path to its view. Paths are expected already percent-decoded;
    /// a trailing slash is ignored. Returns `None` for nested paths, which
    /// match no view.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim();
        let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

        let route = match trimmed {
            "" => ClientRoute::Landing,
            "countries" => ClientRoute::Directory,
            "login" => ClientRoute::Login,
            "register" => ClientRoute::Register,
            "profile" => ClientRoute::Profile,
            "change-password" => ClientRoute::ChangePassword,
            name if name.contains('/') || name.trim().is_empty() => return None,
            name => ClientRoute::Detail(name.trim().to_string()),
        };
        Some(route)
    }

    /// Views that require a session.
    pub fn is_protected(&self) -> bool {
        matches!(self, ClientRoute::Profile | ClientRoute::ChangePassword)
    }

    /// Canonical path of the view.
    pub fn path(&self) -> String {
        match self {
            ClientRoute::Landing => "/".to_string(),
            ClientRoute::Directory => "/countries".to_string(),
            ClientRoute::Login => "/login".to_string(),
            ClientRoute::Register => "/register".to_string(),
            ClientRoute::Profile => "/profile".to_string(),
            ClientRoute::ChangePassword => "/change-password".to_string(),
            ClientRoute::Detail(name) => format!("/{name}"),
        }
    }
}

/// What to do when navigating to `route` with the gate in its current state.
/// Public views always render.
pub fn navigate(route: &ClientRoute, gate: &AuthGate) -> GateDecision {
    if route.is_protected() {
        gate.decision()
    } else {
        GateDecision::Render
    }
}
