//! Admin panel command handlers
//!
//! [`AdminConsole`] is driven one command at a time (by the HTTP layer or
//! the CLI). Each command talks to the [`DataService`], records feedback in
//! the [`Notifier`], and leaves the refreshed state in [`AdminView`].
//! Destructive commands ask a [`Confirm`] first.

pub mod forms;
pub mod seed;

pub use forms::{EducationField, Editor, ProjectForm, ServiceForm, StatField};
pub use seed::{SeedReport, seed_defaults};

use std::sync::Arc;

use serde::Serialize;

use crate::auth::store_credentials;
use crate::backup::{self, Backup, ImportDocument};
use crate::data::DataService;
use crate::imaging::{self, DEFAULT_MAX_SIZE_MB, DEFAULT_SQUARE_SIZE, ImageFile};
use crate::model::{AboutContent, Education, Project, RecordId, Service, SkillCategory, Stat};
use crate::notify::Notifier;

/// Inline error slot used by the photo controls
pub const PHOTO_FIELD: &str = "photoStatus";
/// Inline error slot used by the credentials form
pub const CREDENTIALS_FIELD: &str = "credentials";

/// Asks the user to confirm a destructive action
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// A confirmation decided before the command runs
#[derive(Debug, Clone, Copy)]
pub struct PreConfirmed(pub bool);

impl Confirm for PreConfirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    /// The user declined the confirmation
    Cancelled,
    /// Rejected before any I/O
    Invalid(String),
    Failed(String),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Done)
    }
}

/// Everything the admin page shows
#[derive(Debug, Clone, Default, Serialize)]
pub struct AdminView {
    pub projects: Vec<Project>,
    pub services: Vec<Service>,
    pub about: AboutContent,
    pub project_editor: Option<Editor<ProjectForm>>,
    pub service_editor: Option<Editor<ServiceForm>>,
}

/// An edit to the about record; `Err` rejects it before anything is saved
type AboutEdit<'a> = Box<dyn FnOnce(&mut AboutContent) -> Result<(), String> + Send + 'a>;

fn slot<'a, T>(items: &'a mut [T], index: usize, what: &str) -> Result<&'a mut T, String> {
    items
        .get_mut(index)
        .ok_or_else(|| format!("No {what} at position {index}"))
}

fn check_index<T>(items: &[T], index: usize, what: &str) -> Result<(), String> {
    if index < items.len() {
        Ok(())
    } else {
        Err(format!("No {what} at position {index}"))
    }
}

pub struct AdminConsole {
    data: Arc<DataService>,
    notifier: Notifier,
    view: AdminView,
}

impl AdminConsole {
    pub fn new(data: Arc<DataService>) -> Self {
        Self {
            data,
            notifier: Notifier::new(),
            view: AdminView::default(),
        }
    }

    pub fn view(&self) -> &AdminView {
        &self.view
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut Notifier {
        &mut self.notifier
    }

    fn failed(&mut self, toast: &str, error: impl std::fmt::Display) -> Outcome {
        tracing::error!("{} ({})", toast, error);
        self.notifier.error(toast);
        Outcome::Failed(error.to_string())
    }

    /// Reload every collection into the view
    pub async fn refresh(&mut self) -> Outcome {
        let loaded = async {
            let projects = self.data.list_projects().await?;
            let services = self.data.list_services().await?;
            let about = self.data.get_about().await?;
            crate::Result::Ok((projects, services, about))
        }
        .await;

        match loaded {
            Ok((projects, services, about)) => {
                self.view.projects = projects;
                self.view.services = services;
                self.view.about = about;
                Outcome::Done
            }
            Err(e) => self.failed("Error loading data. Please try again.", e),
        }
    }

    async fn reload_projects(&mut self) -> crate::Result<()> {
        self.view.projects = self.data.list_projects().await?;
        Ok(())
    }

    async fn reload_services(&mut self) -> crate::Result<()> {
        self.view.services = self.data.list_services().await?;
        Ok(())
    }

    // ========== Projects ==========

    pub async fn open_project_editor(&mut self, id: Option<&RecordId>) -> Outcome {
        let Some(id) = id else {
            self.view.project_editor = Some(Editor {
                title: "Add Project",
                form: ProjectForm::default(),
            });
            return Outcome::Done;
        };

        if let Err(e) = self.reload_projects().await {
            return self.failed("Error loading projects. Please try again.", e);
        }
        match self.view.projects.iter().find(|p| &p.id == id) {
            Some(project) => {
                self.view.project_editor = Some(Editor {
                    title: "Edit Project",
                    form: ProjectForm::from_project(project),
                });
                Outcome::Done
            }
            None => Outcome::Invalid(format!("No project with id {id}")),
        }
    }

    pub fn close_project_editor(&mut self) {
        self.view.project_editor = None;
    }

    pub async fn submit_project(&mut self, form: ProjectForm) -> Outcome {
        let id = form.id.clone();
        let saved = self.data.save_project(form.into_draft(), id.as_ref()).await;
        if let Err(e) = saved {
            return self.failed("Error saving project. Please try again.", e);
        }
        if let Err(e) = self.reload_projects().await {
            return self.failed("Error loading projects. Please try again.", e);
        }
        self.close_project_editor();
        self.notifier.success("Project saved successfully!");
        Outcome::Done
    }

    pub async fn delete_project(&mut self, id: &RecordId, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Are you sure you want to delete this project?") {
            return Outcome::Cancelled;
        }
        if let Err(e) = self.data.delete_project(id).await {
            return self.failed("Error deleting project. Please try again.", e);
        }
        if let Err(e) = self.reload_projects().await {
            return self.failed("Error loading projects. Please try again.", e);
        }
        self.notifier.success("Project deleted successfully!");
        Outcome::Done
    }

    // ========== Services ==========

    pub async fn open_service_editor(&mut self, id: Option<&RecordId>) -> Outcome {
        let Some(id) = id else {
            self.view.service_editor = Some(Editor {
                title: "Add Service",
                form: ServiceForm::default(),
            });
            return Outcome::Done;
        };

        if let Err(e) = self.reload_services().await {
            return self.failed("Error loading services. Please try again.", e);
        }
        match self.view.services.iter().find(|s| &s.id == id) {
            Some(service) => {
                self.view.service_editor = Some(Editor {
                    title: "Edit Service",
                    form: ServiceForm::from_service(service),
                });
                Outcome::Done
            }
            None => Outcome::Invalid(format!("No service with id {id}")),
        }
    }

    pub fn close_service_editor(&mut self) {
        self.view.service_editor = None;
    }

    pub async fn submit_service(&mut self, form: ServiceForm) -> Outcome {
        let id = form.id.clone();
        let saved = self.data.save_service(form.into_draft(), id.as_ref()).await;
        if let Err(e) = saved {
            return self.failed("Error saving service. Please try again.", e);
        }
        if let Err(e) = self.reload_services().await {
            return self.failed("Error loading services. Please try again.", e);
        }
        self.close_service_editor();
        self.notifier.success("Service saved successfully!");
        Outcome::Done
    }

    pub async fn delete_service(&mut self, id: &RecordId, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Are you sure you want to delete this service?") {
            return Outcome::Cancelled;
        }
        if let Err(e) = self.data.delete_service(id).await {
            return self.failed("Error deleting service. Please try again.", e);
        }
        if let Err(e) = self.reload_services().await {
            return self.failed("Error loading services. Please try again.", e);
        }
        self.notifier.success("Service deleted successfully!");
        Outcome::Done
    }

    // ========== About ==========

    /// Read-modify-write of the about record
    async fn edit_about(&mut self, edit: AboutEdit<'_>, success: &str) -> Outcome {
        let mut about = match self.data.get_about().await {
            Ok(about) => about,
            Err(e) => return self.failed("Error loading about data. Please try again.", e),
        };
        if let Err(reason) = edit(&mut about) {
            return Outcome::Invalid(reason);
        }
        if let Err(e) = self.data.save_about(&about).await {
            return self.failed("Error saving about data. Please try again.", e);
        }
        self.view.about = about;
        self.notifier.success(success);
        Outcome::Done
    }

    pub async fn save_journey(&mut self, journey: &str) -> Outcome {
        let journey = journey.to_string();
        self.edit_about(
            Box::new(move |about| {
                about.journey = journey;
                Ok(())
            }),
            "About page content saved successfully!",
        )
        .await
    }

    pub async fn add_stat(&mut self) -> Outcome {
        self.edit_about(
            Box::new(|about| {
                about.stats.push(Stat::default());
                Ok(())
            }),
            "Stat added",
        )
        .await
    }

    pub async fn update_stat(&mut self, index: usize, field: StatField, value: &str) -> Outcome {
        let value = value.to_string();
        self.edit_about(
            Box::new(move |about| {
                let stat = slot(&mut about.stats, index, "stat")?;
                match field {
                    StatField::Value => stat.value = value,
                    StatField::Label => stat.label = value,
                }
                Ok(())
            }),
            "Stat updated",
        )
        .await
    }

    pub async fn remove_stat(&mut self, index: usize, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Are you sure you want to remove this stat?") {
            return Outcome::Cancelled;
        }
        self.edit_about(
            Box::new(move |about| {
                check_index(&about.stats, index, "stat")?;
                about.stats.remove(index);
                Ok(())
            }),
            "Stat removed",
        )
        .await
    }

    pub async fn add_education(&mut self) -> Outcome {
        self.edit_about(
            Box::new(|about| {
                about.education.push(Education::default());
                Ok(())
            }),
            "Education entry added",
        )
        .await
    }

    pub async fn update_education(&mut self, index: usize, field: EducationField, value: &str) -> Outcome {
        let value = value.to_string();
        self.edit_about(
            Box::new(move |about| {
                let entry = slot(&mut about.education, index, "education entry")?;
                match field {
                    EducationField::Year => entry.year = value,
                    EducationField::Title => entry.title = value,
                    EducationField::Institution => entry.institution = value,
                    EducationField::Description => entry.description = value,
                }
                Ok(())
            }),
            "Education entry updated",
        )
        .await
    }

    pub async fn remove_education(&mut self, index: usize, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Are you sure you want to remove this education entry?") {
            return Outcome::Cancelled;
        }
        self.edit_about(
            Box::new(move |about| {
                check_index(&about.education, index, "education entry")?;
                about.education.remove(index);
                Ok(())
            }),
            "Education entry removed",
        )
        .await
    }

    pub async fn add_skill_category(&mut self) -> Outcome {
        self.edit_about(
            Box::new(|about| {
                about.skills.push(SkillCategory::default());
                Ok(())
            }),
            "Skill category added",
        )
        .await
    }

    pub async fn update_skill_category(&mut self, index: usize, name: &str) -> Outcome {
        let name = name.to_string();
        self.edit_about(
            Box::new(move |about| {
                slot(&mut about.skills, index, "skill category")?.name = name;
                Ok(())
            }),
            "Skill category updated",
        )
        .await
    }

    pub async fn remove_skill_category(&mut self, index: usize, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Are you sure you want to remove this skill category?") {
            return Outcome::Cancelled;
        }
        self.edit_about(
            Box::new(move |about| {
                check_index(&about.skills, index, "skill category")?;
                about.skills.remove(index);
                Ok(())
            }),
            "Skill category removed",
        )
        .await
    }

    pub async fn add_skill(&mut self, category: usize) -> Outcome {
        self.edit_about(
            Box::new(move |about| {
                slot(&mut about.skills, category, "skill category")?
                    .skills
                    .push(String::new());
                Ok(())
            }),
            "Skill added",
        )
        .await
    }

    pub async fn update_skill(&mut self, category: usize, index: usize, value: &str) -> Outcome {
        let value = value.to_string();
        self.edit_about(
            Box::new(move |about| {
                let skills = &mut slot(&mut about.skills, category, "skill category")?.skills;
                *slot(skills, index, "skill")? = value;
                Ok(())
            }),
            "Skill updated",
        )
        .await
    }

    pub async fn remove_skill(&mut self, category: usize, index: usize, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Are you sure you want to remove this skill?") {
            return Outcome::Cancelled;
        }
        self.edit_about(
            Box::new(move |about| {
                let skills = &mut slot(&mut about.skills, category, "skill category")?.skills;
                check_index(skills.as_slice(), index, "skill")?;
                skills.remove(index);
                Ok(())
            }),
            "Skill removed",
        )
        .await
    }

    // ========== Photo ==========

    /// Validate, square-crop, upload, then point the about record at the new photo.
    ///
    /// Not atomic: if the final save fails the uploaded file stays in the bucket.
    pub async fn upload_photo(&mut self, file: Option<ImageFile>) -> Outcome {
        let validation = imaging::validate(file.as_ref(), DEFAULT_MAX_SIZE_MB);
        let Some(file) = file.filter(|_| validation.valid) else {
            let reason = validation.error.unwrap_or_default();
            self.notifier.show_error(PHOTO_FIELD, reason.clone());
            return Outcome::Invalid(reason);
        };
        self.notifier.hide_error(PHOTO_FIELD);

        self.notifier.show_loading();
        let outcome = self.replace_photo(file).await;
        self.notifier.hide_loading();
        outcome
    }

    async fn replace_photo(&mut self, file: ImageFile) -> Outcome {
        const FAILURE: &str = "Error uploading photo. Please try again.";

        let prepared = match imaging::optimize_square(&file, DEFAULT_SQUARE_SIZE).await {
            Ok(image) => image.into_file(&file.name),
            Err(e) => return self.failed(FAILURE, e),
        };
        let url = match self.data.upload_photo(&prepared).await {
            Ok(url) => url,
            Err(e) => return self.failed(FAILURE, e),
        };

        let mut about = match self.data.get_about().await {
            Ok(about) => about,
            Err(e) => {
                tracing::warn!("Uploaded photo is not referenced yet: {}", url);
                return self.failed(FAILURE, e);
            }
        };
        let old = std::mem::replace(&mut about.profile_photo_url, url.clone());
        if !old.is_empty() && old != url {
            self.data.delete_photo(&old).await;
        }
        if let Err(e) = self.data.save_about(&about).await {
            tracing::warn!("Uploaded photo is not referenced yet: {}", url);
            return self.failed(FAILURE, e);
        }

        self.view.about = about;
        self.notifier.success("Photo uploaded successfully!");
        Outcome::Done
    }

    pub async fn remove_photo(&mut self, confirm: &dyn Confirm) -> Outcome {
        if !confirm.confirm("Are you sure you want to remove the profile photo?") {
            return Outcome::Cancelled;
        }

        let mut about = match self.data.get_about().await {
            Ok(about) => about,
            Err(e) => return self.failed("Error removing photo. Please try again.", e),
        };
        let old = std::mem::take(&mut about.profile_photo_url);
        self.data.delete_photo(&old).await;
        if let Err(e) = self.data.save_about(&about).await {
            return self.failed("Error removing photo. Please try again.", e);
        }

        self.view.about = about;
        self.notifier.success("Photo removed successfully!");
        Outcome::Done
    }

    pub async fn save_photo_url(&mut self, url: &str) -> Outcome {
        let url = url.trim();
        if url.is_empty() {
            return self.invalid_photo_url("Please enter a URL");
        }
        if reqwest::Url::parse(url).is_err() {
            return self.invalid_photo_url("Invalid URL. Please enter a valid URL.");
        }
        self.notifier.hide_error(PHOTO_FIELD);

        let mut about = match self.data.get_about().await {
            Ok(about) => about,
            Err(e) => return self.failed("Error saving photo URL. Please try again.", e),
        };
        let old = std::mem::replace(&mut about.profile_photo_url, url.to_string());
        if !old.is_empty() && old != url {
            self.data.delete_photo(&old).await;
        }
        if let Err(e) = self.data.save_about(&about).await {
            return self.failed("Error saving photo URL. Please try again.", e);
        }

        self.view.about = about;
        self.notifier.success("Photo URL saved successfully!");
        Outcome::Done
    }

    fn invalid_photo_url(&mut self, reason: &str) -> Outcome {
        self.notifier.show_error(PHOTO_FIELD, reason);
        Outcome::Invalid(reason.to_string())
    }

    // ========== Settings ==========

    pub fn save_credentials(&mut self, username: &str, password: &str) -> Outcome {
        if username.trim().is_empty() || password.is_empty() {
            const REASON: &str = "Please enter both username and password";
            self.notifier.show_error(CREDENTIALS_FIELD, REASON);
            return Outcome::Invalid(REASON.to_string());
        }
        self.notifier.hide_error(CREDENTIALS_FIELD);

        if let Err(e) = store_credentials(self.data.local_storage(), username, password) {
            return self.failed("Error saving credentials. Please try again.", e);
        }
        self.notifier.success("Credentials updated successfully!");
        Outcome::Done
    }

    pub async fn export(&mut self) -> crate::Result<Backup> {
        match Backup::collect(&self.data).await {
            Ok(backup) => {
                self.notifier.success("Data exported successfully!");
                Ok(backup)
            }
            Err(e) => {
                tracing::error!("Error exporting data: {}", e);
                self.notifier.error("Error exporting data. Please try again.");
                Err(e)
            }
        }
    }

    pub async fn import(&mut self, doc: ImportDocument) -> Outcome {
        match backup::import(&self.data, doc).await {
            Ok(_) => {
                let refreshed = self.refresh().await;
                if refreshed.is_done() {
                    self.notifier.success("Data imported successfully!");
                }
                refreshed
            }
            Err(e) => {
                let message = format!("Error importing data: {e}");
                self.failed(&message, e)
            }
        }
    }

    pub async fn seed_defaults(&mut self) -> Outcome {
        match seed_defaults(&self.data).await {
            Ok(report) => {
                let refreshed = self.refresh().await;
                if refreshed.is_done() && !report.is_empty() {
                    self.notifier.info("Starter content added");
                }
                refreshed
            }
            Err(e) => self.failed("Error adding starter content. Please try again.", e),
        }
    }
}
