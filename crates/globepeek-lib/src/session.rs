//! Session state and the auth gate that protects account views.
//!
//! [`SessionStore`] is the single owner of "who is signed in". It is built
//! once at the composition root (the service's `AppState`, the CLI context)
//! and handed to whoever needs it; interested parties subscribe and receive a
//! [`SessionEvent`] on every sign-in and sign-out.
//!
//! [`AuthGate`] is the three-state gate in front of protected views. It starts
//! [`GateState::Unknown`], settles after exactly one session check, and after
//! that only moves in response to session events.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};

/// Where unauthenticated visitors of a protected view are sent.
pub const LOGIN_PATH: &str = "/login";

/// Identity returned by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// An authenticated session: the bearer token plus the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Session change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
}

/// Holds the current session and notifies subscribers when it changes.
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<User> {
        self.tx.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Bearer token of the current session, or [`Error::Unauthenticated`].
    pub fn access_token(&self) -> Result<String> {
        self.tx
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .ok_or(Error::Unauthenticated)
    }

    pub fn sign_in(&self, session: Session) {
        tracing::debug!(user_id = %session.user.id, "session signed in");
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if self.tx.send_replace(None).is_some() {
            tracing::debug!("session signed out");
        }
    }

    /// Subscribe to future session changes.
    pub fn subscribe(&self) -> SessionEvents {
        SessionEvents {
            rx: self.tx.subscribe(),
        }
    }
}

/// Stream of [`SessionEvent`]s from a [`SessionStore`].
#[derive(Debug)]
pub struct SessionEvents {
    rx: watch::Receiver<Option<Session>>,
}

impl SessionEvents {
    /// Wait for the next change. Returns `None` once the store is dropped.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.rx.changed().await.ok()?;
        let event = match self.rx.borrow_and_update().as_ref() {
            Some(session) => SessionEvent::SignedIn(session.user.clone()),
            None => SessionEvent::SignedOut,
        };
        Some(event)
    }
}

/// Auth gate state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum GateState {
    /// The session check is still in flight.
    #[default]
    Unknown,
    Authenticated(User),
    Unauthenticated,
}

/// What a protected view should do in the current gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum GateDecision {
    /// Show a placeholder until the check completes.
    Pending,
    Render,
    RedirectToLogin {
        #[serde(rename = "to")]
        path: &'static str,
    },
}

impl GateState {
    pub fn decision(&self) -> GateDecision {
        match self {
            GateState::Unknown => GateDecision::Pending,
            GateState::Authenticated(_) => GateDecision::Render,
            GateState::Unauthenticated => GateDecision::RedirectToLogin { path: LOGIN_PATH },
        }
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            GateState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Gate in front of protected views.
#[derive(Debug, Clone, Default)]
pub struct AuthGate {
    state: GateState,
}

impl AuthGate {
    /// A gate whose session check has not completed.
    pub fn new() -> Self {
        Self::default()
    }

    /// A gate already settled with the outcome of a session check.
    pub fn resolved(user: Option<User>) -> Self {
        let mut gate = Self::new();
        gate.resolve(user);
        gate
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    pub fn decision(&self) -> GateDecision {
        self.state.decision()
    }

    /// Settle the gate with the result of the session check. Only the first
    /// call has an effect; returns whether it did.
    pub fn resolve(&mut self, user: Option<User>) -> bool {
        if self.state != GateState::Unknown {
            return false;
        }
        self.state = match user {
            Some(user) => GateState::Authenticated(user),
            None => GateState::Unauthenticated,
        };
        true
    }

    /// Run the session check: `verify` is awaited once and any failure,
    /// rejected token or otherwise, leaves the visitor unauthenticated.
    pub async fn check<F>(&mut self, verify: F) -> &GateState
    where
        F: std::future::Future<Output = Result<Option<User>>>,
    {
        if self.state == GateState::Unknown {
            let user = match verify.await {
                Ok(user) => user,
                Err(e) => {
                    tracing::warn!(error = %e, "session check failed");
                    None
                }
            };
            self.resolve(user);
        }
        &self.state
    }

    /// Re-resolve on a session change event.
    pub fn on_event(&mut self, event: SessionEvent) {
        self.state = match event {
            SessionEvent::SignedIn(user) => GateState::Authenticated(user),
            SessionEvent::SignedOut => GateState::Unauthenticated,
        };
    }
}
