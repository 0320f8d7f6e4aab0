//! Backend-agnostic remote store seams.
//!
//! The data service calls these traits, never a concrete client. Rows travel
//! as raw JSON so that shape normalization stays in one place
//! ([`crate::migrate`]).

use async_trait::async_trait;
use serde_json::Value;

use crate::Result;
use crate::model::RecordId;

/// Relational tables behind a REST interface.
#[async_trait]
pub trait RemoteTable: Send + Sync {
    /// All rows, ordered by `order_by` descending.
    async fn select_all(&self, table: &str, order_by: &str) -> Result<Vec<Value>>;

    /// The first row of the table, if any. Used for singleton tables.
    async fn select_first(&self, table: &str) -> Result<Option<Value>>;

    /// Insert one row and return it as stored (with its assigned id).
    async fn insert(&self, table: &str, row: Value) -> Result<Value>;

    /// Update the row keyed by `id` and return it as stored.
    async fn update(&self, table: &str, id: &RecordId, row: Value) -> Result<Value>;

    /// Delete the row keyed by `id`. Deleting an absent row is not an error.
    async fn delete(&self, table: &str, id: &RecordId) -> Result<()>;
}

/// Object storage bucket for uploaded assets.
#[async_trait]
pub trait AssetBucket: Send + Sync {
    /// Upload `bytes` at `path` and return the public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;

    async fn remove(&self, paths: &[String]) -> Result<()>;

    fn public_url(&self, path: &str) -> String;

    /// Whether `url` points into this bucket's backend.
    fn owns(&self, url: &str) -> bool;
}
