//! Per-collection wiring shared by projects and services

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::Result;
use crate::migrate;
use crate::model::{Project, ProjectDraft, RecordId, Service, ServiceDraft};
use crate::storage::keys;

pub(super) trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    type Draft: Send + Sync;

    /// Remote table name
    const TABLE: &'static str;
    /// Local store key
    const LOCAL_KEY: &'static str;
    /// Used in log lines and errors
    const NAME: &'static str;

    fn id(&self) -> &RecordId;

    fn created_at(&self) -> Option<String>;

    fn from_value(value: Value) -> Result<Self>;

    fn assemble(id: RecordId, draft: Self::Draft, created_at: Option<String>) -> Self;

    /// Row body sent to the remote table (no id, no timestamps)
    fn remote_row(draft: &Self::Draft) -> Value;
}

impl Record for Project {
    type Draft = ProjectDraft;

    const TABLE: &'static str = "projects";
    const LOCAL_KEY: &'static str = keys::PROJECTS;
    const NAME: &'static str = "project";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> Option<String> {
        self.created_at.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        migrate::project(value)
    }

    fn assemble(id: RecordId, draft: ProjectDraft, created_at: Option<String>) -> Self {
        Project {
            id,
            title: draft.title,
            description: draft.description,
            tech_stack: draft.tech_stack,
            live_url: draft.live_url,
            code_url: draft.code_url,
            featured: draft.featured,
            created_at,
        }
    }

    fn remote_row(draft: &ProjectDraft) -> Value {
        json!({
            "title": draft.title,
            "description": draft.description,
            "tech_stack": draft.tech_stack,
            "live_url": draft.live_url,
            "code_url": draft.code_url,
            "featured": draft.featured,
        })
    }
}

impl Record for Service {
    type Draft = ServiceDraft;

    const TABLE: &'static str = "services";
    const LOCAL_KEY: &'static str = keys::SERVICES;
    const NAME: &'static str = "service";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> Option<String> {
        self.created_at.clone()
    }

    fn from_value(value: Value) -> Result<Self> {
        migrate::service(value)
    }

    fn assemble(id: RecordId, draft: ServiceDraft, created_at: Option<String>) -> Self {
        Service {
            id,
            title: draft.title,
            description: draft.description,
            created_at,
        }
    }

    fn remote_row(draft: &ServiceDraft) -> Value {
        json!({
            "title": draft.title,
            "description": draft.description,
        })
    }
}
