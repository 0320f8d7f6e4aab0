//! Editor form state for projects and services

use serde::{Deserialize, Serialize};

use crate::migrate::split_tags;
use crate::model::{Project, ProjectDraft, RecordId, Service, ServiceDraft};

/// Project editor fields as typed by the admin
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectForm {
    /// Empty when adding a new project
    pub id: Option<RecordId>,
    pub title: String,
    pub description: String,
    /// Comma-separated technologies
    pub tech: String,
    pub live_url: String,
    pub code_url: String,
    pub featured: bool,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() { None } else { Some(value.to_string()) }
}

impl ProjectForm {
    pub fn from_project(project: &Project) -> Self {
        Self {
            id: Some(project.id.clone()),
            title: project.title.clone(),
            description: project.description.clone(),
            tech: project.tech_stack.join(", "),
            live_url: project.live_url.clone().unwrap_or_default(),
            code_url: project.code_url.clone().unwrap_or_default(),
            featured: project.featured,
        }
    }

    pub fn into_draft(self) -> ProjectDraft {
        ProjectDraft {
            tech_stack: split_tags(&self.tech),
            live_url: optional(&self.live_url),
            code_url: optional(&self.code_url),
            title: self.title,
            description: self.description,
            featured: self.featured,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceForm {
    pub id: Option<RecordId>,
    pub title: String,
    pub description: String,
}

impl ServiceForm {
    pub fn from_service(service: &Service) -> Self {
        Self {
            id: Some(service.id.clone()),
            title: service.title.clone(),
            description: service.description.clone(),
        }
    }

    pub fn into_draft(self) -> ServiceDraft {
        ServiceDraft {
            title: self.title,
            description: self.description,
        }
    }
}

/// An open add/edit dialog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Editor<F> {
    pub title: &'static str,
    pub form: F,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatField {
    Value,
    Label,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EducationField {
    Year,
    Title,
    Institution,
    Description,
}
