//! Portfolio records
//!
//! Canonical in-memory shapes. Anything read from a store passes through
//! [`crate::migrate`] before it becomes one of these.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque record identifier.
///
/// Remote stores may hand out integers or UUIDs; both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identifier for records created in the local store
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A portfolio project as shown on the projects page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub live_url: Option<String>,
    pub code_url: Option<String>,
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Editable fields of a project (everything but store-assigned metadata)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub live_url: Option<String>,
    pub code_url: Option<String>,
    pub featured: bool,
}

impl Project {
    pub fn draft(&self) -> ProjectDraft {
        ProjectDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            tech_stack: self.tech_stack.clone(),
            live_url: self.live_url.clone(),
            code_url: self.code_url.clone(),
            featured: self.featured,
        }
    }
}

/// A service offering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceDraft {
    pub title: String,
    pub description: String,
}

impl Service {
    pub fn draft(&self) -> ServiceDraft {
        ServiceDraft {
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// Headline number on the about page, e.g. "10+" / "Technologies"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stat {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub year: String,
    pub title: String,
    pub institution: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillCategory {
    pub name: String,
    pub skills: Vec<String>,
}

/// Singleton about-page record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutContent {
    /// Free text, paragraphs separated by a blank line
    pub journey: String,
    /// Remote URL or embedded `data:` URI; empty when unset
    pub profile_photo_url: String,
    pub stats: Vec<Stat>,
    pub education: Vec<Education>,
    pub skills: Vec<SkillCategory>,
}

impl AboutContent {
    pub fn photo_url(&self) -> Option<&str> {
        let url = self.profile_photo_url.trim();
        if url.is_empty() { None } else { Some(url) }
    }
}
