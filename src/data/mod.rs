//! Data access with local fallback
//!
//! [`DataService`] is the only component that talks to record stores. In
//! remote mode, reads go to the hosted backend and fall back to the local
//! store on any failure. Writes are not mirrored: a failed remote write is
//! returned to the caller and nothing is written locally. Without a backend
//! every operation runs against the local store.

mod record;

use std::sync::Arc;

use serde_json::Value;

use self::record::Record;
use crate::config::BackendMode;
use crate::imaging::{self, ImageFile};
use crate::model::{AboutContent, Project, ProjectDraft, RecordId, Service, ServiceDraft};
use crate::storage::{AssetBucket, LocalStorage, RemoteTable, keys};
use crate::{Error, Result, migrate};

pub const ABOUT_TABLE: &str = "about_content";
pub const PHOTO_FOLDER: &str = "profile-photos";

/// Table and bucket adapters for the hosted backend
#[derive(Clone)]
pub struct RemoteHandles {
    pub tables: Arc<dyn RemoteTable>,
    pub bucket: Arc<dyn AssetBucket>,
}

pub struct DataService {
    mode: BackendMode,
    local: Arc<LocalStorage>,
    remote: Option<RemoteHandles>,
}

impl DataService {
    /// Build the service, bringing the local store up to the current schema
    pub fn new(mode: BackendMode, local: Arc<LocalStorage>, remote: Option<RemoteHandles>) -> Result<Self> {
        if mode.is_remote() && remote.is_none() {
            return Err(Error::NotConfigured("remote mode needs table and bucket adapters"));
        }
        migrate::migrate_local(&local)?;
        Ok(Self { mode, local, remote })
    }

    pub fn local_only(local: Arc<LocalStorage>) -> Result<Self> {
        Self::new(BackendMode::LocalFallback, local, None)
    }

    pub fn mode(&self) -> &BackendMode {
        &self.mode
    }

    pub fn local_storage(&self) -> &Arc<LocalStorage> {
        &self.local
    }

    fn remote(&self) -> Option<&RemoteHandles> {
        match self.mode {
            BackendMode::Remote(_) => self.remote.as_ref(),
            BackendMode::LocalFallback => None,
        }
    }

    // ========== Collections ==========

    fn local_records<R: Record>(&self) -> Result<Vec<R>> {
        let items = self.local.read_json::<Vec<Value>>(R::LOCAL_KEY)?.unwrap_or_default();
        Ok(convert_rows(items, R::LOCAL_KEY))
    }

    async fn list<R: Record>(&self) -> Result<Vec<R>> {
        if let Some(remote) = self.remote() {
            match remote.tables.select_all(R::TABLE, "created_at").await {
                Ok(rows) => return Ok(convert_rows(rows, R::TABLE)),
                Err(e) => tracing::error!("Error fetching {}, using local store: {}", R::TABLE, e),
            }
        }
        self.local_records()
    }

    async fn save<R: Record>(&self, id: Option<&RecordId>, draft: R::Draft) -> Result<R> {
        if let Some(remote) = self.remote() {
            let row = R::remote_row(&draft);
            let stored = match id {
                Some(id) => remote.tables.update(R::TABLE, id, row).await,
                None => remote.tables.insert(R::TABLE, row).await,
            }
            .inspect_err(|e| tracing::error!("Error saving {}: {}", R::NAME, e))?;
            return R::from_value(stored);
        }

        let mut records: Vec<R> = self.local_records()?;
        let record = match id {
            Some(id) => {
                let slot = records
                    .iter_mut()
                    .find(|r| r.id() == id)
                    .ok_or_else(|| Error::NotFound(format!("{} {}", R::NAME, id)))?;
                *slot = R::assemble(id.clone(), draft, slot.created_at());
                slot.clone()
            }
            None => {
                let record = R::assemble(
                    RecordId::generate(),
                    draft,
                    Some(chrono::Utc::now().to_rfc3339()),
                );
                records.push(record.clone());
                record
            }
        };
        self.local.write_json(R::LOCAL_KEY, &records)?;
        Ok(record)
    }

    async fn delete<R: Record>(&self, id: &RecordId) -> Result<()> {
        if let Some(remote) = self.remote() {
            return remote
                .tables
                .delete(R::TABLE, id)
                .await
                .inspect_err(|e| tracing::error!("Error deleting {}: {}", R::NAME, e));
        }

        let mut records: Vec<R> = self.local_records()?;
        let before = records.len();
        records.retain(|r| r.id() != id);
        if records.len() != before {
            self.local.write_json(R::LOCAL_KEY, &records)?;
        }
        Ok(())
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.list().await
    }

    /// Insert (`id == None`) or update a project, returning it as stored
    pub async fn save_project(&self, draft: ProjectDraft, id: Option<&RecordId>) -> Result<Project> {
        self.save(id, draft).await
    }

    pub async fn delete_project(&self, id: &RecordId) -> Result<()> {
        self.delete::<Project>(id).await
    }

    pub async fn list_services(&self) -> Result<Vec<Service>> {
        self.list().await
    }

    pub async fn save_service(&self, draft: ServiceDraft, id: Option<&RecordId>) -> Result<Service> {
        self.save(id, draft).await
    }

    pub async fn delete_service(&self, id: &RecordId) -> Result<()> {
        self.delete::<Service>(id).await
    }

    // ========== About ==========

    fn local_about(&self) -> Result<AboutContent> {
        match self.local.read_json::<Value>(keys::ABOUT)? {
            Some(raw) => migrate::about(raw),
            None => Ok(AboutContent::default()),
        }
    }

    pub async fn get_about(&self) -> Result<AboutContent> {
        if let Some(remote) = self.remote() {
            match remote.tables.select_first(ABOUT_TABLE).await {
                Ok(Some(row)) => match migrate::about(row) {
                    Ok(about) => return Ok(about),
                    Err(e) => tracing::error!("Unreadable about row, using local store: {}", e),
                },
                Ok(None) => return Ok(AboutContent::default()),
                Err(e) => tracing::error!("Error fetching about data, using local store: {}", e),
            }
        }
        self.local_about()
    }

    /// Overwrite the about record (there is only ever one)
    pub async fn save_about(&self, about: &AboutContent) -> Result<()> {
        let Some(remote) = self.remote() else {
            return self.local.write_json(keys::ABOUT, about);
        };

        let existing = match remote.tables.select_first(ABOUT_TABLE).await {
            Ok(row) => row.as_ref().and_then(migrate::record_id),
            Err(e) => {
                tracing::warn!("Could not look up existing about row: {}", e);
                None
            }
        };

        let row = migrate::about_row(about, &chrono::Utc::now().to_rfc3339())?;
        let result = match existing {
            Some(id) => remote.tables.update(ABOUT_TABLE, &id, row).await.map(|_| ()),
            None => remote.tables.insert(ABOUT_TABLE, row).await.map(|_| ()),
        };
        result.inspect_err(|e| tracing::error!("Error saving about data: {}", e))
    }

    // ========== Photos ==========

    /// Store a profile photo and return the URL to record in the about data.
    ///
    /// Without a backend the photo is embedded as a `data:` URI.
    pub async fn upload_photo(&self, file: &ImageFile) -> Result<String> {
        let Some(remote) = self.remote() else {
            return Ok(imaging::to_data_uri(file));
        };

        let path = format!(
            "{PHOTO_FOLDER}/profile-photo-{}.{}",
            chrono::Utc::now().timestamp_millis(),
            file.extension()
        );
        remote
            .bucket
            .upload(&path, file.bytes.clone(), &file.mime_type)
            .await
            .inspect_err(|e| tracing::error!("Error uploading photo: {}", e))
    }

    /// Remove a previously uploaded photo. Failures are logged, never returned.
    pub async fn delete_photo(&self, url: &str) {
        let Some(remote) = self.remote() else {
            return;
        };
        if url.trim().is_empty() || !remote.bucket.owns(url) {
            return;
        }

        let Some(path) = photo_path(url) else {
            return;
        };
        if let Err(e) = remote.bucket.remove(&[path]).await {
            tracing::warn!("Error deleting photo from storage: {}", e);
        }
    }
}

/// Bucket path of an uploaded photo, from its public URL
fn photo_path(url: &str) -> Option<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let name = without_query.rsplit('/').next()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(format!("{PHOTO_FOLDER}/{name}"))
}

fn convert_rows<R: Record>(rows: Vec<Value>, source: &str) -> Vec<R> {
    rows.into_iter()
        .filter_map(|row| {
            R::from_value(row)
                .inspect_err(|e| tracing::warn!("Skipping malformed row from {}: {}", source, e))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> DataService {
        DataService::local_only(Arc::new(LocalStorage::open_in_memory().unwrap())).unwrap()
    }

    fn draft(title: &str) -> ProjectDraft {
        ProjectDraft {
            title: title.into(),
            description: "Y".into(),
            tech_stack: vec!["A".into(), "B".into()],
            featured: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_local_save_assigns_id() {
        let data = service();
        let saved = data.save_project(draft("X"), None).await.unwrap();
        assert!(!saved.id.as_str().is_empty());

        let projects = data.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "X");
        assert_eq!(projects[0].tech_stack, vec!["A", "B"]);
        assert!(projects[0].featured);
        assert_eq!(projects[0].id, saved.id);
    }

    #[tokio::test]
    async fn test_local_update_keeps_identity_and_created_at() {
        let data = service();
        let first = data.save_project(draft("X"), None).await.unwrap();
        let second = data.save_project(draft("Other"), None).await.unwrap();

        let updated = data.save_project(draft("X2"), Some(&first.id)).await.unwrap();
        assert_eq!(updated.id, first.id);
        assert_eq!(updated.created_at, first.created_at);

        let titles: Vec<_> = data.list_projects().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["X2", "Other"]);

        data.delete_project(&first.id).await.unwrap();
        let remaining = data.list_projects().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, second.id);
    }

    #[tokio::test]
    async fn test_local_delete_missing_is_noop() {
        let data = service();
        data.save_project(draft("X"), None).await.unwrap();
        data.delete_project(&RecordId::new("nope")).await.unwrap();
        assert_eq!(data.list_projects().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_local_update_of_missing_id_is_not_found() {
        let data = service();
        let err = data
            .save_service(ServiceDraft::default(), Some(&RecordId::new("ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_local_about_roundtrip() {
        let data = service();
        assert_eq!(data.get_about().await.unwrap(), AboutContent::default());

        let about = AboutContent {
            journey: "Started.\n\nContinued.".into(),
            ..Default::default()
        };
        data.save_about(&about).await.unwrap();
        assert_eq!(data.get_about().await.unwrap(), about);
    }

    #[tokio::test]
    async fn test_local_photo_is_embedded() {
        let data = service();
        let file = ImageFile::new("me.png", "image/png", vec![1, 2, 3]);
        let url = data.upload_photo(&file).await.unwrap();
        assert_eq!(url, "data:image/png;base64,AQID");
        data.delete_photo(&url).await;
    }

    #[test]
    fn test_photo_path_from_url() {
        assert_eq!(
            photo_path("https://abc.supabase.co/storage/v1/object/public/portfolio-assets/profile-photos/p-1.jpg?t=1").as_deref(),
            Some("profile-photos/p-1.jpg")
        );
        assert_eq!(photo_path("https://abc.supabase.co/"), None);
    }

    #[test]
    fn test_remote_mode_requires_adapters() {
        let mode = BackendMode::Remote(crate::config::RemoteSettings {
            url: "https://abc.supabase.co".into(),
            anon_key: "k".into(),
            bucket: "b".into(),
        });
        let local = Arc::new(LocalStorage::open_in_memory().unwrap());
        assert!(DataService::new(mode, local, None).is_err());
    }
}
