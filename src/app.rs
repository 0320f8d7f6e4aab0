//! Startup wiring
//!
//! Resolves the backend mode once and builds every long-lived component
//! around it. Nothing downstream re-reads the configuration.

use std::sync::Arc;

use crate::auth::{AuthBackend, AuthGate, LocalAuth};
use crate::config::{BackendMode, FolioConfig};
use crate::data::{DataService, RemoteHandles};
use crate::storage::LocalStorage;
use crate::supabase::{SupabaseAuth, SupabaseBucket, SupabaseClient};
use crate::Result;

pub struct App {
    pub config: FolioConfig,
    pub data: Arc<DataService>,
    pub gate: Arc<AuthGate>,
}

impl App {
    /// Open the local store, pick the backend and start the session watcher
    pub fn bootstrap(config: FolioConfig) -> Result<Self> {
        let local = Arc::new(LocalStorage::open(&config.database_path())?);
        let mode = config.backend_mode();

        let (remote, auth) = match &mode {
            BackendMode::Remote(settings) => {
                let client = Arc::new(SupabaseClient::from_settings(settings)?);
                let handles = RemoteHandles {
                    tables: client.clone(),
                    bucket: Arc::new(SupabaseBucket::new(client.clone(), &settings.bucket)),
                };
                let auth: Arc<dyn AuthBackend> = Arc::new(SupabaseAuth::new(client));
                (Some(handles), auth)
            }
            BackendMode::LocalFallback => {
                let auth: Arc<dyn AuthBackend> = Arc::new(LocalAuth::new(local.clone()));
                (None, auth)
            }
        };

        tracing::info!("Backend mode: {}", mode.label());
        let data = Arc::new(DataService::new(mode, local, remote)?);
        Ok(Self::from_parts(config, data, auth))
    }

    /// Assemble from already-built parts. Must run inside a tokio runtime.
    pub fn from_parts(config: FolioConfig, data: Arc<DataService>, auth: Arc<dyn AuthBackend>) -> Self {
        let site_url = format!("http://localhost:{}", config.port);
        let gate = Arc::new(AuthGate::new(auth, &config.admin_email).with_site_url(&site_url));
        gate.watch();

        Self { config, data, gate }
    }

    pub fn mode(&self) -> &BackendMode {
        self.data.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bootstrap_without_backend_is_local() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FolioConfig::default();
        config.database = dir.path().join("folio.db").to_string_lossy().into_owned();

        let app = App::bootstrap(config).unwrap();
        assert_eq!(app.mode(), &BackendMode::LocalFallback);
        assert!(app.data.list_projects().await.unwrap().is_empty());
        assert!(!app.gate.is_admin());
    }

    #[tokio::test]
    async fn test_bootstrap_with_backend_is_remote() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = FolioConfig::default();
        config.database = dir.path().join("folio.db").to_string_lossy().into_owned();
        config.backend.url = Some("https://abc.supabase.co".into());
        config.backend.anon_key = Some("anon".into());

        let app = App::bootstrap(config).unwrap();
        assert!(app.mode().is_remote());
    }
}
