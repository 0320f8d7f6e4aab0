//! Single-admin access gate
//!
//! Wraps an [`AuthBackend`] and admits exactly one identity, the configured
//! admin email. Every session change is re-checked: a foreign session is
//! signed out and the caller is sent back to the login page.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::backend::{AuthBackend, AuthEvent, Session, User};
use crate::Error;

pub const LOGIN_PAGE: &str = "admin-login.html";
pub const ACCESS_DENIED: &str = "Access denied. Admin access only.";

const SIGN_IN_FAILED: &str = "Failed to sign in. Please check your credentials.";

/// What the caller should do after a session check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "target", rename_all = "snake_case")]
pub enum GateDecision {
    Allow,
    Redirect(String),
}

impl GateDecision {
    pub fn unauthorized() -> Self {
        GateDecision::Redirect(format!("{LOGIN_PAGE}?error=unauthorized"))
    }

    pub fn login() -> Self {
        GateDecision::Redirect(LOGIN_PAGE.to_string())
    }
}

/// Uniform outcome of a backend-touching gate operation
#[derive(Debug, Clone, Serialize)]
pub struct AuthResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> AuthResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

fn user_message(error: &Error) -> String {
    match error {
        Error::Remote { message, .. } | Error::Unauthorized(message) => message.clone(),
        other => other.to_string(),
    }
}

pub struct AuthGate {
    backend: Arc<dyn AuthBackend>,
    admin_email: String,
    site_url: String,
    current_user: RwLock<Option<User>>,
    /// Token handed out at sign-in. Still accepted after the backend refreshes.
    issued_token: RwLock<Option<String>>,
}

impl AuthGate {
    pub fn new(backend: Arc<dyn AuthBackend>, admin_email: &str) -> Self {
        Self {
            backend,
            admin_email: admin_email.trim().to_string(),
            site_url: String::new(),
            current_user: RwLock::new(None),
            issued_token: RwLock::new(None),
        }
    }

    /// Public origin used to build the password-reset return link
    pub fn with_site_url(mut self, site_url: &str) -> Self {
        self.site_url = site_url.trim_end_matches('/').to_string();
        self
    }

    pub fn admin_email(&self) -> &str {
        &self.admin_email
    }

    fn is_admin_email(&self, email: Option<&str>) -> bool {
        email.is_some_and(|e| e.trim().eq_ignore_ascii_case(&self.admin_email))
    }

    fn remember(&self, user: Option<User>) {
        *self.current_user.write().unwrap_or_else(|p| p.into_inner()) = user;
    }

    fn issue(&self, token: Option<String>) {
        *self.issued_token.write().unwrap_or_else(|p| p.into_inner()) = token;
    }

    fn accepts(&self, token: Option<&str>, session: &Session) -> bool {
        let Some(token) = token else {
            return false;
        };
        token == session.access_token
            || self
                .issued_token
                .read()
                .unwrap_or_else(|p| p.into_inner())
                .as_deref()
                == Some(token)
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    /// Apply one session-change event
    pub async fn handle_event(&self, event: &AuthEvent) -> GateDecision {
        tracing::debug!("Auth state changed: {:?}", event.kind);
        let user = event.session.as_ref().map(|s| s.user.clone());
        let foreign = user
            .as_ref()
            .is_some_and(|u| !self.is_admin_email(u.email.as_deref()));
        self.remember(user);

        if foreign {
            tracing::warn!("Non-admin session detected, signing out");
            self.sign_out().await;
            return GateDecision::unauthorized();
        }
        GateDecision::Allow
    }

    /// Apply [`Self::handle_event`] to every event the backend emits
    pub fn watch(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.backend.subscribe();
        let gate = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let GateDecision::Redirect(target) = gate.handle_event(&event).await {
                            tracing::info!("Session rejected, redirecting to {}", target);
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Auth watcher skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AuthResult<Session> {
        if !self.is_admin_email(Some(email)) {
            return AuthResult::err(ACCESS_DENIED);
        }

        let session = match self.backend.sign_in_with_password(email.trim(), password).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Sign in error: {}", e);
                let message = user_message(&e);
                return AuthResult::err(if message.is_empty() {
                    SIGN_IN_FAILED.to_string()
                } else {
                    message
                });
            }
        };

        if !self.is_admin_email(session.email()) {
            self.sign_out().await;
            return AuthResult::err(ACCESS_DENIED);
        }

        self.remember(Some(session.user.clone()));
        self.issue(Some(session.access_token.clone()));
        AuthResult::ok(session)
    }

    pub async fn sign_out(&self) -> AuthResult<()> {
        let result = self.backend.sign_out().await;
        self.remember(None);
        self.issue(None);
        match result {
            Ok(()) => AuthResult::ok(()),
            Err(e) => {
                tracing::error!("Sign out error: {}", e);
                AuthResult::err(user_message(&e))
            }
        }
    }

    pub async fn get_session(&self) -> AuthResult<Option<Session>> {
        match self.backend.get_session().await {
            Ok(session) => {
                self.remember(session.as_ref().map(|s| s.user.clone()));
                AuthResult::ok(session)
            }
            Err(e) => {
                tracing::error!("Get session error: {}", e);
                AuthResult::err(user_message(&e))
            }
        }
    }

    pub async fn get_current_user(&self) -> AuthResult<Option<User>> {
        match self.backend.get_user().await {
            Ok(user) => {
                self.remember(user.clone());
                AuthResult::ok(user)
            }
            Err(e) => {
                tracing::error!("Get user error: {}", e);
                AuthResult::err(user_message(&e))
            }
        }
    }

    /// True whenever a session exists.
    ///
    /// Does not look at whose session it is. A foreign session is only
    /// rejected once its change event reaches [`Self::handle_event`]; callers
    /// guarding admin-only work use [`Self::is_admin`] or [`Self::authorize`].
    pub async fn is_authenticated(&self) -> bool {
        self.get_session().await.data.flatten().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current_user()
            .is_some_and(|u| self.is_admin_email(u.email.as_deref()))
    }

    /// Check a request's bearer token against the live admin session
    pub async fn authorize(&self, token: Option<&str>) -> Result<Session, GateDecision> {
        let session = match self.backend.get_session().await {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.issue(None);
                return Err(GateDecision::login());
            }
            Err(e) => {
                tracing::warn!("Session lookup failed: {}", e);
                return Err(GateDecision::login());
            }
        };

        if !self.accepts(token, &session) {
            return Err(GateDecision::login());
        }

        if !self.is_admin_email(session.email()) {
            self.sign_out().await;
            return Err(GateDecision::unauthorized());
        }

        self.remember(Some(session.user.clone()));
        Ok(session)
    }

    pub async fn reset_password(&self, email: &str) -> AuthResult<()> {
        let redirect_to = format!("{}/{}", self.site_url, LOGIN_PAGE);
        match self.backend.reset_password_for_email(email.trim(), &redirect_to).await {
            Ok(()) => AuthResult::ok(()).with_message("Password reset email sent"),
            Err(e) => {
                tracing::error!("Reset password error: {}", e);
                AuthResult::err(user_message(&e))
            }
        }
    }

    pub async fn update_password(&self, new_password: &str) -> AuthResult<()> {
        match self.backend.update_password(new_password).await {
            Ok(_) => AuthResult::ok(()).with_message("Password updated successfully"),
            Err(e) => {
                tracing::error!("Update password error: {}", e);
                AuthResult::err(user_message(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::backend::AuthEventKind;
    use crate::auth::local::{LocalAuth, store_credentials};
    use crate::storage::LocalStorage;

    fn gate(stored_user: &str) -> AuthGate {
        let storage = Arc::new(LocalStorage::open_in_memory().unwrap());
        store_credentials(&storage, stored_user, "pw").unwrap();
        AuthGate::new(Arc::new(LocalAuth::new(storage)), "admin@example.com")
    }

    fn session_for(email: &str) -> Session {
        Session {
            access_token: "t".into(),
            refresh_token: None,
            expires_in: None,
            user: User {
                id: "u".into(),
                email: Some(email.into()),
            },
        }
    }

    #[tokio::test]
    async fn test_non_admin_email_rejected_before_backend() {
        let gate = gate("admin@example.com");
        let result = gate.sign_in("someone@example.com", "pw").await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(ACCESS_DENIED));
        assert!(!gate.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_admin_sign_in_and_authorize() {
        let gate = gate("admin@example.com");
        let result = gate.sign_in("admin@example.com", "pw").await;
        assert!(result.success);
        let token = result.data.unwrap().access_token;

        assert!(gate.is_authenticated().await);
        assert!(gate.is_admin());
        assert!(gate.authorize(Some(&token)).await.is_ok());
        assert_eq!(gate.authorize(Some("stale")).await.unwrap_err(), GateDecision::login());
        assert_eq!(gate.authorize(None).await.unwrap_err(), GateDecision::login());
    }

    #[tokio::test]
    async fn test_wrong_password_reports_backend_message() {
        let gate = gate("admin@example.com");
        let result = gate.sign_in("admin@example.com", "nope").await;
        assert_eq!(result.error.as_deref(), Some("Invalid login credentials"));
    }

    #[tokio::test]
    async fn test_foreign_event_redirects() {
        let gate = gate("admin@example.com");
        let event = AuthEvent::new(AuthEventKind::SignedIn, Some(session_for("intruder@example.com")));

        assert_eq!(gate.handle_event(&event).await, GateDecision::unauthorized());
        assert!(gate.current_user().is_none());
        assert!(!gate.is_admin());

        let event = AuthEvent::new(AuthEventKind::TokenRefreshed, Some(session_for("admin@example.com")));
        assert_eq!(gate.handle_event(&event).await, GateDecision::Allow);
        assert!(gate.is_admin());
    }

    #[tokio::test]
    async fn test_local_reset_is_reported_not_raised() {
        let gate = gate("admin@example.com");
        let result = gate.reset_password("admin@example.com").await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_unauthorized_target() {
        assert_eq!(
            GateDecision::unauthorized(),
            GateDecision::Redirect("admin-login.html?error=unauthorized".into())
        );
    }
}
