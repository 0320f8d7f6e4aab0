//! Credential check against the local store, used when no hosted backend is configured

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::backend::{AuthBackend, AuthEvent, AuthEventKind, Session, SessionSlot, User};
use super::password::{hash_password, verify_password};
use crate::storage::{LocalStorage, keys};
use crate::{Error, Result};

const LOCAL_ADMIN_ID: &str = "local-admin";
const INVALID_LOGIN: &str = "Invalid login credentials";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub username: String,
    pub password_hash: String,
}

/// Older panels stored the password in the clear
#[derive(Deserialize)]
struct LegacyCredentials {
    username: String,
    password: String,
}

/// Hash `password` and store it under `adminCredentials`
pub fn store_credentials(storage: &LocalStorage, username: &str, password: &str) -> Result<()> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(Error::Validation("Please fill in all fields".into()));
    }

    let credentials = StoredCredentials {
        username: username.to_string(),
        password_hash: hash_password(password)?,
    };
    storage.write_json(keys::ADMIN_CREDENTIALS, &credentials)
}

/// Read stored credentials, upgrading a plaintext entry in place
pub fn load_credentials(storage: &LocalStorage) -> Result<Option<StoredCredentials>> {
    let Some(raw) = storage.read_json::<serde_json::Value>(keys::ADMIN_CREDENTIALS)? else {
        return Ok(None);
    };

    if raw.get("password_hash").is_some() {
        return Ok(Some(serde_json::from_value(raw)?));
    }

    let legacy: LegacyCredentials = serde_json::from_value(raw)?;
    tracing::info!("Upgrading plaintext admin credentials to an Argon2 hash");
    store_credentials(storage, &legacy.username, &legacy.password)?;
    storage.read_json(keys::ADMIN_CREDENTIALS)
}

pub struct LocalAuth {
    storage: Arc<LocalStorage>,
    slot: SessionSlot,
}

impl LocalAuth {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self {
            storage,
            slot: SessionSlot::default(),
        }
    }

    fn session_for(username: &str) -> Session {
        Session {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: None,
            expires_in: None,
            user: User {
                id: LOCAL_ADMIN_ID.to_string(),
                email: Some(username.to_string()),
            },
        }
    }
}

#[async_trait]
impl AuthBackend for LocalAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let Some(credentials) = load_credentials(&self.storage)? else {
            return Err(Error::Unauthorized(
                "No admin credentials stored; run `folio credentials` first".into(),
            ));
        };

        if !credentials.username.eq_ignore_ascii_case(email.trim())
            || !verify_password(password, &credentials.password_hash)?
        {
            return Err(Error::Unauthorized(INVALID_LOGIN.into()));
        }

        let session = Self::session_for(&credentials.username);
        self.slot.set(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        if self.slot.current().is_some() {
            self.slot.set(AuthEventKind::SignedOut, None);
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.slot.current())
    }

    async fn get_user(&self) -> Result<Option<User>> {
        Ok(self.slot.current().map(|s| s.user))
    }

    async fn reset_password_for_email(&self, _email: &str, _redirect_to: &str) -> Result<()> {
        Err(Error::NotConfigured("password reset emails need the hosted backend"))
    }

    async fn update_password(&self, new_password: &str) -> Result<User> {
        let Some(session) = self.slot.current() else {
            return Err(Error::Unauthorized("No active session".into()));
        };
        let username = session.email().unwrap_or_default().to_string();
        store_credentials(&self.storage, &username, new_password)?;
        self.slot.set(AuthEventKind::UserUpdated, Some(session.clone()));
        Ok(session.user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.slot.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with(username: &str, password: &str) -> LocalAuth {
        let storage = Arc::new(LocalStorage::open_in_memory().unwrap());
        store_credentials(&storage, username, password).unwrap();
        LocalAuth::new(storage)
    }

    #[tokio::test]
    async fn test_sign_in_checks_hash() {
        let auth = auth_with("admin@example.com", "s3cret");

        assert!(auth.sign_in_with_password("admin@example.com", "wrong").await.is_err());
        assert!(auth.get_session().await.unwrap().is_none());

        let session = auth.sign_in_with_password("Admin@Example.com", "s3cret").await.unwrap();
        assert_eq!(session.email(), Some("admin@example.com"));
        assert_eq!(auth.get_user().await.unwrap().unwrap().id, LOCAL_ADMIN_ID);
    }

    #[tokio::test]
    async fn test_events_follow_session() {
        let auth = auth_with("admin@example.com", "s3cret");
        let mut events = auth.subscribe();

        auth.sign_in_with_password("admin@example.com", "s3cret").await.unwrap();
        assert_eq!(events.recv().await.unwrap().kind, AuthEventKind::SignedIn);

        auth.sign_out().await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(event.kind, AuthEventKind::SignedOut);
        assert!(event.session.is_none());
    }

    #[tokio::test]
    async fn test_update_password_rehashes() {
        let auth = auth_with("admin@example.com", "old");
        auth.sign_in_with_password("admin@example.com", "old").await.unwrap();
        auth.update_password("new").await.unwrap();
        auth.sign_out().await.unwrap();

        assert!(auth.sign_in_with_password("admin@example.com", "old").await.is_err());
        assert!(auth.sign_in_with_password("admin@example.com", "new").await.is_ok());
    }

    #[test]
    fn test_plaintext_credentials_are_upgraded() {
        let storage = LocalStorage::open_in_memory().unwrap();
        storage
            .set_item(keys::ADMIN_CREDENTIALS, r#"{"username":"admin","password":"pw"}"#)
            .unwrap();

        let credentials = load_credentials(&storage).unwrap().unwrap();
        assert_eq!(credentials.username, "admin");
        assert!(verify_password("pw", &credentials.password_hash).unwrap());
        assert!(!storage.get_item(keys::ADMIN_CREDENTIALS).unwrap().unwrap().contains("\"password\":"));
    }

    #[test]
    fn test_store_rejects_blank_fields() {
        let storage = LocalStorage::open_in_memory().unwrap();
        assert!(store_credentials(&storage, " ", "pw").is_err());
        assert!(store_credentials(&storage, "admin", "").is_err());
    }
}
