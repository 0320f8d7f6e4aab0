//! Supabase-compatible backend client
//!
//! One [`SupabaseClient`] is shared (behind `Arc`) by the table, bucket, and
//! auth adapters, the way a single hosted-client object serves all three.
//! Every request carries the project's anon key as `apikey`. Public reads use
//! the anon key as bearer too; everything else sends the session's access
//! token once signed in.

pub mod auth;
pub mod bucket;
pub mod rest;

pub use auth::SupabaseAuth;
pub use bucket::SupabaseBucket;

use std::sync::RwLock;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use crate::config::RemoteSettings;
use crate::{Error, Result};

pub struct SupabaseClient {
    http: reqwest::Client,
    url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl SupabaseClient {
    pub fn new(url: &str, anon_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: RwLock::new(None),
        })
    }

    pub fn from_settings(settings: &RemoteSettings) -> Result<Self> {
        Self::new(&settings.url, &settings.anon_key)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().unwrap_or_else(|p| p.into_inner()) = token;
    }

    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self.access_token().unwrap_or_else(|| self.anon_key.clone());
        self.with_bearer(method, path, &bearer)
    }

    /// Request that never carries the admin session, so an expired token
    /// cannot break what anonymous visitors may read anyway
    pub(crate) fn public_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.with_bearer(method, path, &self.anon_key)
    }

    fn with_bearer(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }
}

/// Turn a non-2xx response into [`Error::Remote`], keeping the backend's message
pub(crate) async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Remote {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            ["message", "msg", "error_description", "error"]
                .iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.trim().to_string())
}
