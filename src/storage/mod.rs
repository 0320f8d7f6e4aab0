//! Storage Layer - local fallback store and remote store seams
//!
//! The local store is a key/value table in SQLite, one JSON document per key:
//! - portfolioProjects, portfolioServices, portfolioAbout
//! - adminCredentials, portfolioSchemaVersion
//!
//! The remote store is reached through the [`RemoteTable`] and [`AssetBucket`]
//! traits so the data service never depends on a concrete backend.

pub mod local;
pub mod remote;
pub mod schema;

pub use local::LocalStorage;
pub use remote::{AssetBucket, RemoteTable};

/// Keys used in the local store
pub mod keys {
    pub const PROJECTS: &str = "portfolioProjects";
    pub const SERVICES: &str = "portfolioServices";
    pub const ABOUT: &str = "portfolioAbout";
    pub const ADMIN_CREDENTIALS: &str = "adminCredentials";
    pub const SCHEMA_VERSION: &str = "portfolioSchemaVersion";
}
