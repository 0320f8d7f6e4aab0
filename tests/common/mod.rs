//! In-process stand-ins for the hosted backend

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use folio::auth::{AuthBackend, AuthEvent, AuthEventKind, Session, SessionSlot, User};
use folio::config::{BackendMode, RemoteSettings};
use folio::data::{DataService, RemoteHandles};
use folio::storage::{AssetBucket, LocalStorage, RemoteTable};
use folio::{Error, RecordId, Result};
use serde_json::Value;
use tokio::sync::broadcast;

pub const BUCKET_URL: &str = "https://fake.supabase.co/storage/v1/object/public/portfolio-assets";

fn unavailable() -> Error {
    Error::Remote {
        status: 503,
        message: "service unavailable".into(),
    }
}

/// Tables with integer ids and increasing `created_at`
#[derive(Default)]
pub struct FakeRemote {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl FakeRemote {
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    pub fn set_failing_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_writes(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    fn read_guard(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) { Err(unavailable()) } else { Ok(()) }
    }

    fn write_guard(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) { Err(unavailable()) } else { Ok(()) }
    }
}

fn matches_id(row: &Value, id: &RecordId) -> bool {
    match row.get("id") {
        Some(Value::Number(n)) => n.to_string() == id.as_str(),
        Some(Value::String(s)) => s == id.as_str(),
        _ => false,
    }
}

#[async_trait]
impl RemoteTable for FakeRemote {
    async fn select_all(&self, table: &str, order_by: &str) -> Result<Vec<Value>> {
        self.read_guard()?;
        let mut rows = self.rows(table);
        rows.sort_by(|a, b| {
            let key = |v: &Value| v.get(order_by).and_then(Value::as_str).unwrap_or_default().to_string();
            key(b).cmp(&key(a))
        });
        Ok(rows)
    }

    async fn select_first(&self, table: &str) -> Result<Option<Value>> {
        self.read_guard()?;
        Ok(self.rows(table).into_iter().next())
    }

    async fn insert(&self, table: &str, mut row: Value) -> Result<Value> {
        self.write_guard()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        if let Value::Object(obj) = &mut row {
            obj.insert("id".into(), Value::from(n));
            obj.insert("created_at".into(), Value::from(format!("2024-01-01T00:00:00.{n:06}Z")));
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &RecordId, row: Value) -> Result<Value> {
        self.write_guard()?;
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| matches_id(r, id)))
            .ok_or_else(|| Error::NotFound(format!("{table} {id}")))?;
        if let (Value::Object(target), Value::Object(changes)) = (&mut *stored, row) {
            target.extend(changes);
        }
        Ok(stored.clone())
    }

    async fn delete(&self, table: &str, id: &RecordId) -> Result<()> {
        self.write_guard()?;
        if let Some(rows) = self.tables.lock().unwrap().get_mut(table) {
            rows.retain(|r| !matches_id(r, id));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeBucket {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    pub removed: Mutex<Vec<String>>,
}

impl FakeBucket {
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

#[async_trait]
impl AssetBucket for FakeBucket {
    async fn upload(&self, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<String> {
        self.objects.lock().unwrap().insert(path.to_string(), bytes);
        Ok(self.public_url(path))
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        let mut objects = self.objects.lock().unwrap();
        for path in paths {
            objects.remove(path);
            self.removed.lock().unwrap().push(path.clone());
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{BUCKET_URL}/{path}")
    }

    fn owns(&self, url: &str) -> bool {
        url.starts_with(BUCKET_URL)
    }
}

/// Remote-mode data service over fresh fakes
pub fn remote_service() -> (Arc<DataService>, Arc<FakeRemote>, Arc<FakeBucket>) {
    let remote = Arc::new(FakeRemote::default());
    let bucket = Arc::new(FakeBucket::default());
    let local = Arc::new(LocalStorage::open_in_memory().unwrap());
    let mode = BackendMode::Remote(RemoteSettings {
        url: "https://fake.supabase.co".into(),
        anon_key: "anon".into(),
        bucket: "portfolio-assets".into(),
    });
    let handles = RemoteHandles {
        tables: remote.clone(),
        bucket: bucket.clone(),
    };
    let data = DataService::new(mode, local, Some(handles)).unwrap();
    (Arc::new(data), remote, bucket)
}

pub fn local_service() -> Arc<DataService> {
    let local = Arc::new(LocalStorage::open_in_memory().unwrap());
    Arc::new(DataService::local_only(local).unwrap())
}

/// Identity provider that accepts any listed account
#[derive(Default)]
pub struct FakeAuth {
    accounts: Mutex<HashMap<String, String>>,
    slot: SessionSlot,
}

impl FakeAuth {
    pub fn with_account(email: &str, password: &str) -> Self {
        let auth = Self::default();
        auth.accounts
            .lock()
            .unwrap()
            .insert(email.to_string(), password.to_string());
        auth
    }

    pub fn session_for(email: &str) -> Session {
        Session {
            access_token: format!("token-{email}"),
            refresh_token: None,
            expires_in: Some(3600),
            user: User {
                id: format!("user-{email}"),
                email: Some(email.to_string()),
            },
        }
    }

    /// Simulate the provider switching sessions on its own
    pub fn emit(&self, kind: AuthEventKind, session: Option<Session>) {
        self.slot.set(kind, session);
    }
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let known = self.accounts.lock().unwrap().get(email).cloned();
        if known.as_deref() != Some(password) {
            return Err(Error::Unauthorized("Invalid login credentials".into()));
        }
        let session = Self::session_for(email);
        self.slot.set(AuthEventKind::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<()> {
        self.slot.set(AuthEventKind::SignedOut, None);
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>> {
        Ok(self.slot.current())
    }

    async fn get_user(&self) -> Result<Option<User>> {
        Ok(self.slot.current().map(|s| s.user))
    }

    async fn reset_password_for_email(&self, _email: &str, _redirect_to: &str) -> Result<()> {
        Ok(())
    }

    async fn update_password(&self, new_password: &str) -> Result<User> {
        let session = self
            .slot
            .current()
            .ok_or_else(|| Error::Unauthorized("Auth session missing!".into()))?;
        if let Some(email) = session.email() {
            self.accounts
                .lock()
                .unwrap()
                .insert(email.to_string(), new_password.to_string());
        }
        self.slot.set(AuthEventKind::UserUpdated, Some(session.clone()));
        Ok(session.user)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.slot.subscribe()
    }
}
