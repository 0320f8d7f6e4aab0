//! Import/export documents
//!
//! An export is a single pretty-printed JSON document
//! `{projects, services, about, timestamp}`. Import accepts the same shape,
//! including documents written by older panels (camelCase keys, missing ids,
//! nested sequences as text), and replays every entry through the data
//! service.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::DataService;
use crate::model::{AboutContent, Project, ProjectDraft, RecordId, Service, ServiceDraft};
use crate::{Error, Result, migrate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Backup {
    pub projects: Vec<Project>,
    pub services: Vec<Service>,
    pub about: AboutContent,
    pub timestamp: String,
}

impl Backup {
    pub async fn collect(data: &DataService) -> Result<Self> {
        Ok(Self {
            projects: data.list_projects().await?,
            services: data.list_services().await?,
            about: data.get_about().await?,
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Suggested download name, `portfolio-backup-<millis>.json`
pub fn backup_filename() -> String {
    format!("portfolio-backup-{}.json", chrono::Utc::now().timestamp_millis())
}

/// A parsed import document
#[derive(Debug, Clone, Default)]
pub struct ImportDocument {
    pub projects: Vec<(Option<RecordId>, ProjectDraft)>,
    pub services: Vec<(Option<RecordId>, ServiceDraft)>,
    pub about: Option<AboutContent>,
}

impl ImportDocument {
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut doc) = value else {
            return Err(Error::Validation("import document must be a JSON object".into()));
        };

        let mut parsed = ImportDocument::default();
        for item in entries(doc.remove("projects"), "projects")? {
            parsed.projects.push(migrate::project_entry(item)?);
        }
        for item in entries(doc.remove("services"), "services")? {
            parsed.services.push(migrate::service_entry(item)?);
        }
        parsed.about = match doc.remove("about") {
            None | Some(Value::Null) => None,
            Some(about) => Some(migrate::about(about)?),
        };
        Ok(parsed)
    }
}

impl From<Backup> for ImportDocument {
    fn from(backup: Backup) -> Self {
        Self {
            projects: backup
                .projects
                .iter()
                .map(|p| (Some(p.id.clone()), p.draft()))
                .collect(),
            services: backup
                .services
                .iter()
                .map(|s| (Some(s.id.clone()), s.draft()))
                .collect(),
            about: Some(backup.about),
        }
    }
}

fn entries(value: Option<Value>, name: &str) -> Result<Vec<Value>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(Error::Validation(format!("`{name}` must be an array"))),
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub projects_inserted: usize,
    pub projects_updated: usize,
    pub services_inserted: usize,
    pub services_updated: usize,
    pub about_replaced: bool,
}

/// Replay `doc` through the data service.
///
/// Entries whose id already exists are updated in place, the rest inserted,
/// so importing an export of the current state changes nothing.
pub async fn import(data: &DataService, doc: ImportDocument) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    let existing: HashSet<RecordId> = data.list_projects().await?.into_iter().map(|p| p.id).collect();
    for (id, draft) in doc.projects {
        match id.filter(|id| existing.contains(id)) {
            Some(id) => {
                data.save_project(draft, Some(&id)).await?;
                report.projects_updated += 1;
            }
            None => {
                data.save_project(draft, None).await?;
                report.projects_inserted += 1;
            }
        }
    }

    let existing: HashSet<RecordId> = data.list_services().await?.into_iter().map(|s| s.id).collect();
    for (id, draft) in doc.services {
        match id.filter(|id| existing.contains(id)) {
            Some(id) => {
                data.save_service(draft, Some(&id)).await?;
                report.services_updated += 1;
            }
            None => {
                data.save_service(draft, None).await?;
                report.services_inserted += 1;
            }
        }
    }

    if let Some(about) = doc.about {
        data.save_about(&about).await?;
        report.about_replaced = true;
    }

    tracing::info!(
        "Imported projects (+{} ~{}), services (+{} ~{})",
        report.projects_inserted,
        report.projects_updated,
        report.services_inserted,
        report.services_updated
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStorage;
    use std::sync::Arc;

    fn data() -> DataService {
        DataService::local_only(Arc::new(LocalStorage::open_in_memory().unwrap())).unwrap()
    }

    #[test]
    fn test_parse_legacy_document() {
        let doc = ImportDocument::parse(
            r#"{
                "projects": [{"title": "X", "techStack": ["A"], "liveUrl": "https://x"}],
                "services": [{"id": 3, "title": "S", "description": "D"}],
                "about": {"journey": "J", "stats": "[{\"value\":\"1\",\"label\":\"L\"}]"},
                "timestamp": "2024-01-01T00:00:00.000Z"
            }"#,
        )
        .unwrap();

        assert_eq!(doc.projects.len(), 1);
        assert!(doc.projects[0].0.is_none());
        assert_eq!(doc.projects[0].1.tech_stack, vec!["A"]);
        assert_eq!(doc.services[0].0, Some(RecordId::new("3")));
        assert_eq!(doc.about.unwrap().stats[0].label, "L");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        assert!(ImportDocument::parse("[]").is_err());
        assert!(ImportDocument::parse(r#"{"projects": {}}"#).is_err());
        assert!(ImportDocument::parse("not json").is_err());
        let empty = ImportDocument::parse("{}").unwrap();
        assert!(empty.projects.is_empty() && empty.about.is_none());
    }

    #[tokio::test]
    async fn test_export_import_is_idempotent() {
        let data = data();
        data.save_project(
            ProjectDraft {
                title: "X".into(),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

        let before = data.list_projects().await.unwrap();
        let backup = Backup::collect(&data).await.unwrap();
        let text = backup.to_json_pretty().unwrap();

        let report = import(&data, ImportDocument::parse(&text).unwrap()).await.unwrap();
        assert_eq!(report.projects_updated, 1);
        assert_eq!(report.projects_inserted, 0);
        assert_eq!(data.list_projects().await.unwrap(), before);
    }

    #[test]
    fn test_backup_filename() {
        let name = backup_filename();
        assert!(name.starts_with("portfolio-backup-"));
        assert!(name.ends_with(".json"));
    }
}
