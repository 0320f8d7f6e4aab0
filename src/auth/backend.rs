//! Identity provider seam

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: User,
}

impl Session {
    pub fn email(&self) -> Option<&str> {
        self.user.email.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// A session change pushed by the identity provider
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, session: Option<Session>) -> Self {
        Self { kind, session }
    }
}

#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// End the current session. Local state is cleared even if the provider errors.
    async fn sign_out(&self) -> Result<()>;

    async fn get_session(&self) -> Result<Option<Session>>;

    async fn get_user(&self) -> Result<Option<User>>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()>;

    async fn update_password(&self, new_password: &str) -> Result<User>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Current session plus the channel its changes are announced on
pub struct SessionSlot {
    session: std::sync::RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for SessionSlot {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            session: std::sync::RwLock::new(None),
            events,
        }
    }
}

impl SessionSlot {
    pub fn current(&self) -> Option<Session> {
        self.session.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Replace the session and announce the change
    pub fn set(&self, kind: AuthEventKind, session: Option<Session>) {
        *self.session.write().unwrap_or_else(|p| p.into_inner()) = session.clone();
        // No subscribers is fine
        let _ = self.events.send(AuthEvent::new(kind, session));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
