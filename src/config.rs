use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bucket used for uploaded profile photos
pub const DEFAULT_BUCKET: &str = "portfolio-assets";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub port: u16,
    /// Directory holding the static pages and assets
    pub site_dir: String,
    /// Local fallback store
    pub database: String,
    /// The single identity allowed into the admin panel
    pub admin_email: String,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    pub bucket: String,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            site_dir: "site".to_string(),
            database: default_database_path().to_string_lossy().into_owned(),
            admin_email: "admin@example.com".to_string(),
            backend: BackendConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

/// Connection settings for the hosted backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub anon_key: String,
    pub bucket: String,
}

/// Where records live, decided once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendMode {
    Remote(RemoteSettings),
    LocalFallback,
}

impl BackendMode {
    pub fn is_remote(&self) -> bool {
        matches!(self, BackendMode::Remote(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            BackendMode::Remote(_) => "remote",
            BackendMode::LocalFallback => "local-fallback",
        }
    }
}

impl FolioConfig {
    /// Overlay `FOLIO_*` environment variables
    pub fn with_env(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("FOLIO_BACKEND_URL") {
            self.backend.url = Some(url);
        }
        if let Some(key) = lookup("FOLIO_BACKEND_ANON_KEY") {
            self.backend.anon_key = Some(key);
        }
        if let Some(email) = lookup("FOLIO_ADMIN_EMAIL") {
            self.admin_email = email;
        }
        if let Some(port) = lookup("FOLIO_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(e) => tracing::warn!("Invalid FOLIO_PORT value {:?}: {}", port, e),
            }
        }
        self
    }

    /// Remote when both url and key are present, local fallback otherwise
    pub fn backend_mode(&self) -> BackendMode {
        let url = self.backend.url.as_deref().map(str::trim).unwrap_or_default();
        let key = self.backend.anon_key.as_deref().map(str::trim).unwrap_or_default();

        if url.is_empty() || key.is_empty() {
            tracing::warn!("Backend credentials not configured, records will use the local store");
            return BackendMode::LocalFallback;
        }

        BackendMode::Remote(RemoteSettings {
            url: url.trim_end_matches('/').to_string(),
            anon_key: key.to_string(),
            bucket: self.backend.bucket.clone(),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.database)
    }

    pub fn site_path(&self) -> PathBuf {
        PathBuf::from(&self.site_dir)
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("folio.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from(".folio").join("folio.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<FolioConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FolioConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &FolioConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_backend_falls_back() {
        let config = FolioConfig::default();
        assert_eq!(config.backend_mode(), BackendMode::LocalFallback);

        let mut half = FolioConfig::default();
        half.backend.url = Some("https://abc.supabase.co".into());
        half.backend.anon_key = Some("   ".into());
        assert_eq!(half.backend_mode(), BackendMode::LocalFallback);
    }

    #[test]
    fn test_configured_backend_is_remote() {
        let mut config = FolioConfig::default();
        config.backend.url = Some("https://abc.supabase.co/".into());
        config.backend.anon_key = Some("anon".into());

        match config.backend_mode() {
            BackendMode::Remote(settings) => {
                assert_eq!(settings.url, "https://abc.supabase.co");
                assert_eq!(settings.bucket, DEFAULT_BUCKET);
            }
            BackendMode::LocalFallback => panic!("expected remote mode"),
        }
    }

    #[test]
    fn test_env_overrides() {
        let config = FolioConfig::default().with_overrides(|key| match key {
            "FOLIO_BACKEND_URL" => Some("https://x.supabase.co".into()),
            "FOLIO_BACKEND_ANON_KEY" => Some("k".into()),
            "FOLIO_ADMIN_EMAIL" => Some("me@example.com".into()),
            "FOLIO_PORT" => Some("not-a-port".into()),
            _ => None,
        });

        assert!(config.backend_mode().is_remote());
        assert_eq!(config.admin_email, "me@example.com");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_write_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");

        let mut config = FolioConfig::default();
        config.port = 9000;
        write_config(&path, &config, false).unwrap();
        assert!(write_config(&path, &config, false).is_err());
        write_config(&path, &config, true).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.port, 9000);
        assert_eq!(loaded.backend.bucket, DEFAULT_BUCKET);

        assert!(load_config(Some(&dir.path().join("missing.toml"))).unwrap().is_none());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: FolioConfig = toml::from_str("admin_email = \"a@b.c\"\n[backend]\nurl = \"https://x\"\n").unwrap();
        assert_eq!(config.admin_email, "a@b.c");
        assert_eq!(config.port, 8080);
        assert_eq!(config.backend.bucket, DEFAULT_BUCKET);
        assert_eq!(config.backend_mode(), BackendMode::LocalFallback);
    }
}
