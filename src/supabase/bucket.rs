//! Object storage for uploaded assets

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::{SupabaseClient, check};
use crate::Result;
use crate::storage::AssetBucket;

pub struct SupabaseBucket {
    client: Arc<SupabaseClient>,
    bucket: String,
}

impl SupabaseBucket {
    pub fn new(client: Arc<SupabaseClient>, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }

    fn object_path(&self, path: &str) -> String {
        format!("storage/v1/object/{}/{}", self.bucket, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl AssetBucket for SupabaseBucket {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        let response = self
            .client
            .request(Method::POST, &self.object_path(path))
            .header("content-type", content_type)
            .header("cache-control", "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        check(response).await?;
        Ok(self.public_url(path))
    }

    async fn remove(&self, paths: &[String]) -> Result<()> {
        let response = self
            .client
            .request(Method::DELETE, &format!("storage/v1/object/{}", self.bucket))
            .json(&json!({ "prefixes": paths }))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.client.endpoint(&format!(
            "storage/v1/object/public/{}/{}",
            self.bucket,
            path.trim_start_matches('/')
        ))
    }

    fn owns(&self, url: &str) -> bool {
        url.starts_with(self.client.url())
    }
}
