//! Hosted auth API (GoTrue)

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::{Mutex, broadcast};

use super::{SupabaseClient, check};
use crate::auth::{AuthBackend, AuthEvent, AuthEventKind, Session, SessionSlot, User};
use crate::{Error, Result};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(token: TokenResponse) -> Self {
        Session {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_in: token.expires_in,
            user: token.user,
        }
    }
}

/// Refresh this long before the access token runs out
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

pub struct SupabaseAuth {
    client: Arc<SupabaseClient>,
    slot: SessionSlot,
    expires_at: RwLock<Option<Instant>>,
    refreshing: Mutex<()>,
}

impl SupabaseAuth {
    pub fn new(client: Arc<SupabaseClient>) -> Self {
        Self {
            client,
            slot: SessionSlot::default(),
            expires_at: RwLock::new(None),
            refreshing: Mutex::new(()),
        }
    }

    fn store(&self, kind: AuthEventKind, session: Option<Session>) {
        // A user update keeps the token it was made with
        if kind != AuthEventKind::UserUpdated {
            let expires_at = session
                .as_ref()
                .and_then(|s| s.expires_in)
                .and_then(|secs| Instant::now().checked_add(Duration::from_secs(secs)));
            *self.expires_at.write().unwrap_or_else(|p| p.into_inner()) = expires_at;
        }
        self.client
            .set_access_token(session.as_ref().map(|s| s.access_token.clone()));
        self.slot.set(kind, session);
    }

    fn expiring(&self) -> bool {
        self.expires_at
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .is_some_and(|at| at.saturating_duration_since(Instant::now()) <= REFRESH_MARGIN)
    }

    /// Swap the refresh token for a new access token
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        let response = self
            .client
            .public_request(Method::POST, "auth/v1/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;
        let token: TokenResponse = check(response).await?.json().await?;
        let session = Session::from(token);
        self.store(AuthEventKind::TokenRefreshed, Some(session.clone()));
        tracing::debug!("Access token refreshed");
        Ok(session)
    }

    /// The current session, refreshed when close to expiry.
    ///
    /// A session that cannot be refreshed is dropped and announced as
    /// signed out, so the gate sends the admin back to the login page.
    async fn live_session(&self) -> Option<Session> {
        if !self.expiring() {
            return self.slot.current();
        }

        let _guard = self.refreshing.lock().await;
        // Another caller may have refreshed while we waited
        let session = self.slot.current()?;
        if !self.expiring() {
            return Some(session);
        }

        let refreshed = match session.refresh_token.as_deref() {
            Some(refresh_token) => self.refresh(refresh_token).await,
            None => Err(Error::Unauthorized("Session expired".into())),
        };
        match refreshed {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Session expired and could not be refreshed: {}", e);
                self.store(AuthEventKind::SignedOut, None);
                None
            }
        }
    }
}

#[async_trait]
impl AuthBackend for SupabaseAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let response = self
            .client
            .public_request(Method::POST, "auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = check(response).await?.json().await?;
        let session = Session::from(token);
        self.store(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.slot.current().is_none() {
            return Ok(());
        }

        let result = match self.client.request(Method::POST, "auth/v1/logout").send().await {
            Ok(response) => check(response).await.map(|_| ()),
            Err(e) => Err(e.into()),
        };
        self.store(AuthEventKind::SignedOut, None);
        result
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.live_session().await)
    }

    async fn get_user(&self) -> Result<Option<User>> {
        if self.live_session().await.is_none() {
            return Ok(None);
        }
        let response = self.client.request(Method::GET, "auth/v1/user").send().await?;
        Ok(Some(check(response).await?.json().await?))
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: &str) -> Result<()> {
        let response = self
            .client
            .public_request(Method::POST, "auth/v1/recover")
            .query(&[("redirect_to", redirect_to)])
            .json(&json!({ "email": email }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<User> {
        let Some(mut session) = self.live_session().await else {
            return Err(Error::Unauthorized("No active session".into()));
        };

        let response = self
            .client
            .request(Method::PUT, "auth/v1/user")
            .json(&json!({ "password": new_password }))
            .send()
            .await?;
        let user: User = check(response).await?.json().await?;
        session.user = user.clone();
        self.store(AuthEventKind::UserUpdated, Some(session));
        Ok(user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.slot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_parses() {
        let body = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": "u-1", "email": "admin@example.com", "role": "authenticated" }
        }"#;
        let session = Session::from(serde_json::from_str::<TokenResponse>(body).unwrap());
        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.email(), Some("admin@example.com"));
        assert_eq!(session.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn test_sign_out_without_session_skips_network() {
        let client = Arc::new(SupabaseClient::new("http://127.0.0.1:9", "anon").unwrap());
        let auth = SupabaseAuth::new(client);
        auth.sign_out().await.unwrap();
        assert!(auth.get_user().await.unwrap().is_none());
        assert!(auth.update_password("x").await.is_err());
    }
}
