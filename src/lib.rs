//! # Folio - Personal portfolio site with an admin panel
//!
//! Folio serves a static portfolio (home, projects, services, about) whose
//! content comes from a hosted backend, and an admin API that edits it.
//!
//! Folio provides:
//! - A data-access layer over a Supabase-compatible REST backend, falling back
//!   to a local key/value store when the backend is unconfigured or failing
//! - A schema migration step that turns legacy record shapes into canonical ones
//! - Client-style image preparation (resize, square crop, validation)
//! - An auth gate that admits a single allow-listed admin identity
//! - Page rendering into marked regions of static HTML templates
//! - Admin command handlers, import/export, and an axum HTTP surface

pub mod admin;
pub mod app;
pub mod auth;
pub mod backup;
pub mod config;
pub mod data;
pub mod imaging;
pub mod migrate;
pub mod model;
pub mod notify;
pub mod render;
pub mod server;
pub mod storage;
pub mod supabase;
pub mod ui;

// Re-exports for convenient access
pub use app::App;
pub use config::{BackendMode, FolioConfig};
pub use data::DataService;
pub use model::{AboutContent, Project, ProjectDraft, RecordId, Service, ServiceDraft};
pub use storage::LocalStorage;

/// Result type alias for Folio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Folio operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote store error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Backend not configured: {0}")]
    NotConfigured(&'static str),

    #[error("Image error: {0}")]
    Image(#[from] imaging::ImageError),

    #[error("Invalid record: {0}")]
    Migration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
