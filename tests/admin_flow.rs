mod common;

use std::io::Cursor;

use common::{local_service, remote_service};
use folio::admin::{AdminConsole, Outcome, PHOTO_FIELD, PreConfirmed, ProjectForm, ServiceForm, StatField};
use folio::backup::{Backup, ImportDocument};
use folio::imaging::ImageFile;
use folio::notify::ToastKind;

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 40, 40]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn project_form(title: &str, tech: &str) -> ProjectForm {
    ProjectForm {
        title: title.into(),
        description: "desc".into(),
        tech: tech.into(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_submit_splits_tags_and_closes_editor() {
    let (data, _, _) = remote_service();
    let mut console = AdminConsole::new(data);

    assert!(console.open_project_editor(None).await.is_done());
    assert!(console.view().project_editor.is_some());

    let outcome = console.submit_project(project_form("Site", " Rust, ,Axum ,")).await;
    assert_eq!(outcome, Outcome::Done);
    assert!(console.view().project_editor.is_none());
    assert_eq!(console.view().projects.len(), 1);
    assert_eq!(console.view().projects[0].tech_stack, vec!["Rust", "Axum"]);

    let toasts = console.notifier_mut().drain();
    assert_eq!(toasts.last().unwrap().kind, ToastKind::Success);
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let mut console = AdminConsole::new(local_service());
    console.submit_service(ServiceForm { title: "Consulting".into(), ..Default::default() }).await;
    let id = console.view().services[0].id.clone();

    assert_eq!(console.delete_service(&id, &PreConfirmed(false)).await, Outcome::Cancelled);
    assert_eq!(console.view().services.len(), 1);

    assert!(console.delete_service(&id, &PreConfirmed(true)).await.is_done());
    assert!(console.view().services.is_empty());
}

#[tokio::test]
async fn test_about_list_editing() {
    let mut console = AdminConsole::new(local_service());

    assert!(console.add_stat().await.is_done());
    assert!(console.update_stat(0, StatField::Value, "10+").await.is_done());
    assert!(console.update_stat(0, StatField::Label, "Clients").await.is_done());
    assert!(matches!(console.update_stat(3, StatField::Label, "x").await, Outcome::Invalid(_)));

    assert!(console.add_skill_category().await.is_done());
    assert!(console.update_skill_category(0, "Frontend").await.is_done());
    assert!(console.add_skill(0).await.is_done());
    assert!(console.update_skill(0, 0, "CSS").await.is_done());

    let about = &console.view().about;
    assert_eq!(about.stats[0].value, "10+");
    assert_eq!(about.stats[0].label, "Clients");
    assert_eq!(about.skills[0].name, "Frontend");
    assert_eq!(about.skills[0].skills, vec!["CSS"]);

    assert_eq!(console.remove_skill(0, 0, &PreConfirmed(false)).await, Outcome::Cancelled);
    assert!(console.remove_skill(0, 0, &PreConfirmed(true)).await.is_done());
    assert!(console.remove_stat(0, &PreConfirmed(true)).await.is_done());
    assert!(console.view().about.stats.is_empty());
    assert!(console.view().about.skills[0].skills.is_empty());
}

#[tokio::test]
async fn test_photo_upload_replaces_previous() {
    let (data, _, bucket) = remote_service();
    let mut console = AdminConsole::new(data.clone());

    let first = ImageFile::new("wide.png", "image/png", png(300, 120));
    assert!(console.upload_photo(Some(first)).await.is_done());
    let first_url = data.get_about().await.unwrap().profile_photo_url;
    assert_eq!(bucket.paths().len(), 1);
    assert!(first_url.ends_with(".jpg"));

    // Photo paths are keyed by millisecond
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let second = ImageFile::new("tall.png", "image/png", png(80, 200));
    assert!(console.upload_photo(Some(second)).await.is_done());
    let second_url = data.get_about().await.unwrap().profile_photo_url;
    assert_ne!(first_url, second_url);
    assert_eq!(bucket.paths().len(), 1);
    assert_eq!(bucket.removed.lock().unwrap().len(), 1);

    assert!(console.remove_photo(&PreConfirmed(true)).await.is_done());
    assert!(data.get_about().await.unwrap().photo_url().is_none());
    assert!(bucket.paths().is_empty());
}

#[tokio::test]
async fn test_photo_validation_errors_are_inline() {
    let mut console = AdminConsole::new(local_service());

    assert!(matches!(console.upload_photo(None).await, Outcome::Invalid(_)));
    assert_eq!(console.notifier().field_error(PHOTO_FIELD), Some("No file selected"));

    let gif = ImageFile::new("a.gif", "image/gif", vec![1]);
    assert!(matches!(console.upload_photo(Some(gif)).await, Outcome::Invalid(_)));

    assert!(matches!(console.save_photo_url("not a url").await, Outcome::Invalid(_)));
    assert!(console.save_photo_url("https://cdn.example.com/me.jpg").await.is_done());
    assert_eq!(console.notifier().field_error(PHOTO_FIELD), None);
}

#[tokio::test]
async fn test_export_import_round_trip_is_idempotent() {
    for data in [remote_service().0, local_service()] {
        let mut console = AdminConsole::new(data.clone());
        console.submit_project(project_form("One", "A, B")).await;
        console.submit_project(project_form("Two", "C")).await;
        console.submit_service(ServiceForm { title: "Audit".into(), ..Default::default() }).await;
        console.save_journey("Hello.").await;

        let backup = console.export().await.unwrap();
        let before_projects = data.list_projects().await.unwrap();
        let before_services = data.list_services().await.unwrap();

        // Through the serialized form, as a downloaded file would be
        let text = backup.to_json_pretty().unwrap();
        let doc = ImportDocument::parse(&text).unwrap();
        assert!(console.import(doc).await.is_done());

        assert_eq!(data.list_projects().await.unwrap(), before_projects);
        assert_eq!(data.list_services().await.unwrap(), before_services);
        assert_eq!(data.get_about().await.unwrap().journey, "Hello.");
    }
}

#[tokio::test]
async fn test_import_into_empty_store_inserts() {
    let (source, _, _) = remote_service();
    source.save_project(project_form("Moved", "X").into_draft(), None).await.unwrap();
    let backup = Backup::collect(&source).await.unwrap();

    let target = local_service();
    let mut console = AdminConsole::new(target.clone());
    assert!(console.import(backup.into()).await.is_done());

    let projects = target.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].title, "Moved");
}

#[tokio::test]
async fn test_seed_fills_only_empty_collections() {
    let mut console = AdminConsole::new(local_service());
    console.submit_project(project_form("Mine", "")).await;

    assert!(console.seed_defaults().await.is_done());
    assert_eq!(console.view().projects.len(), 1);
    assert!(!console.view().services.is_empty());
    assert!(!console.view().about.journey.is_empty());
}

#[tokio::test]
async fn test_remote_write_failure_shows_error_toast() {
    let (data, remote, _) = remote_service();
    let mut console = AdminConsole::new(data);
    remote.set_failing_writes(true);

    assert!(matches!(console.submit_project(project_form("X", "")).await, Outcome::Failed(_)));
    let toasts = console.notifier_mut().drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert!(toasts[0].message.contains("Please try again"));
}
