//! Schema boundary
//!
//! Everything read from a store or an import document is converted here into
//! the canonical records of [`crate::model`], exactly once:
//! - legacy camelCase keys (`techStack`, `liveUrl`, `codeUrl`, `profilePhotoUrl`)
//! - nested sequences stored as JSON text instead of structured arrays
//! - numeric identifiers, missing optional fields, empty strings for "unset"
//!
//! The local store is additionally rewritten in canonical form on first open
//! and stamped with [`SCHEMA_VERSION`].

use serde_json::{Map, Value, json};

use crate::model::{
    AboutContent, Education, Project, ProjectDraft, RecordId, Service, ServiceDraft,
    SkillCategory, Stat,
};
use crate::storage::{LocalStorage, keys};
use crate::{Error, Result};

/// Version 1 is the untyped browser shape, version 2 the canonical one.
pub const SCHEMA_VERSION: u32 = 2;

type Object = Map<String, Value>;

fn into_object(value: Value, what: &str) -> Result<Object> {
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(Error::Migration(format!(
            "{what} must be an object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// First non-null value among `keys` (canonical key first, then legacy ones)
fn field<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| obj.get(*k))
        .find(|v| !v.is_null())
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn text(obj: &Object, keys: &[&str]) -> String {
    field(obj, keys).map(scalar_text).unwrap_or_default()
}

fn optional_text(obj: &Object, keys: &[&str]) -> Option<String> {
    let value = text(obj, keys);
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

fn flag(obj: &Object, keys: &[&str]) -> bool {
    match field(obj, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Identifier of a stored row, text or numeric
pub fn record_id(value: &Value) -> Option<RecordId> {
    value.as_object().and_then(object_id)
}

fn object_id(obj: &Object) -> Option<RecordId> {
    match obj.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(RecordId::new(s.trim())),
        Value::Number(n) => Some(RecordId::new(n.to_string())),
        _ => None,
    }
}

/// A nested sequence stored either as an array or as JSON-encoded text
fn sequence(value: Option<&Value>, name: &str) -> Result<Vec<Value>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::String(raw)) if raw.trim().is_empty() => Ok(Vec::new()),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(Value::Null) => Ok(Vec::new()),
            Ok(other) => Err(Error::Migration(format!(
                "{name} must encode an array, got {}",
                type_name(&other)
            ))),
            Err(e) => Err(Error::Migration(format!("{name} is not valid JSON: {e}"))),
        },
        Some(other) => Err(Error::Migration(format!(
            "{name} must be an array, got {}",
            type_name(other)
        ))),
    }
}

/// A list of tags. Besides the array/JSON-text forms, plain comma-separated
/// text is accepted, which is how the tags are typed into the admin form.
/// Text that fails to parse as a JSON array is treated as typed text.
fn tag_list(value: Option<&Value>, name: &str) -> Result<Vec<String>> {
    let items = match value {
        Some(Value::String(raw)) => match serde_json::from_str::<Vec<Value>>(raw) {
            Ok(items) => items,
            Err(_) => return Ok(split_tags(raw)),
        },
        other => sequence(other, name)?,
    };
    Ok(items
        .iter()
        .map(scalar_text)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Split comma-separated tag input into trimmed, non-empty tags in order
pub fn split_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ========== Projects ==========

fn project_fields(obj: &Object) -> Result<ProjectDraft> {
    Ok(ProjectDraft {
        title: text(obj, &["title"]),
        description: text(obj, &["description"]),
        tech_stack: tag_list(field(obj, &["tech_stack", "techStack"]), "tech_stack")?,
        live_url: optional_text(obj, &["live_url", "liveUrl"]),
        code_url: optional_text(obj, &["code_url", "codeUrl"]),
        featured: flag(obj, &["featured"]),
    })
}

/// Convert a stored project row into a [`Project`]. The row must carry an id.
pub fn project(value: Value) -> Result<Project> {
    let id = record_id(&value)
        .ok_or_else(|| Error::Migration("project record has no identifier".into()))?;
    let obj = into_object(value, "project")?;
    let draft = project_fields(&obj)?;
    Ok(Project {
        id,
        title: draft.title,
        description: draft.description,
        tech_stack: draft.tech_stack,
        live_url: draft.live_url,
        code_url: draft.code_url,
        featured: draft.featured,
        created_at: optional_text(&obj, &["created_at", "createdAt"]),
    })
}

/// Convert an imported project into its (optional) id and editable fields
pub fn project_entry(value: Value) -> Result<(Option<RecordId>, ProjectDraft)> {
    let id = record_id(&value);
    let obj = into_object(value, "project")?;
    Ok((id, project_fields(&obj)?))
}

// ========== Services ==========

fn service_fields(obj: &Object) -> ServiceDraft {
    ServiceDraft {
        title: text(obj, &["title"]),
        description: text(obj, &["description"]),
    }
}

pub fn service(value: Value) -> Result<Service> {
    let id = record_id(&value)
        .ok_or_else(|| Error::Migration("service record has no identifier".into()))?;
    let obj = into_object(value, "service")?;
    let draft = service_fields(&obj);
    Ok(Service {
        id,
        title: draft.title,
        description: draft.description,
        created_at: optional_text(&obj, &["created_at", "createdAt"]),
    })
}

pub fn service_entry(value: Value) -> Result<(Option<RecordId>, ServiceDraft)> {
    let id = record_id(&value);
    let obj = into_object(value, "service")?;
    Ok((id, service_fields(&obj)))
}

// ========== About ==========

fn objects(items: Vec<Value>, name: &str) -> Result<Vec<Object>> {
    items
        .into_iter()
        .map(|item| into_object(item, name))
        .collect()
}

/// Convert a stored about document or row into [`AboutContent`].
///
/// `null` (no row yet) becomes the empty record.
pub fn about(value: Value) -> Result<AboutContent> {
    if value.is_null() {
        return Ok(AboutContent::default());
    }
    let obj = into_object(value, "about")?;

    let stats = objects(sequence(field(&obj, &["stats"]), "stats")?, "stat")?
        .iter()
        .map(|s| Stat {
            value: text(s, &["value"]),
            label: text(s, &["label"]),
        })
        .collect();

    let education = objects(sequence(field(&obj, &["education"]), "education")?, "education")?
        .iter()
        .map(|e| Education {
            year: text(e, &["year"]),
            title: text(e, &["title"]),
            institution: text(e, &["institution"]),
            description: text(e, &["description"]),
        })
        .collect();

    let mut skills = Vec::new();
    for category in objects(sequence(field(&obj, &["skills"]), "skills")?, "skill category")? {
        skills.push(SkillCategory {
            name: text(&category, &["name"]),
            skills: tag_list(field(&category, &["skills"]), "skills")?,
        });
    }

    Ok(AboutContent {
        journey: text(&obj, &["journey"]),
        profile_photo_url: text(&obj, &["profile_photo_url", "profilePhotoUrl"]),
        stats,
        education,
        skills,
    })
}

/// Row written to the relational `about_content` table: nested sequences are
/// serialized to text.
pub fn about_row(about: &AboutContent, updated_at: &str) -> Result<Value> {
    Ok(json!({
        "journey": about.journey,
        "profile_photo_url": about.profile_photo_url,
        "stats": serde_json::to_string(&about.stats)?,
        "education": serde_json::to_string(&about.education)?,
        "skills": serde_json::to_string(&about.skills)?,
        "updated_at": updated_at,
    }))
}

// ========== Local Store ==========

fn stored_version(storage: &LocalStorage) -> Result<u32> {
    let raw = storage.get_item(keys::SCHEMA_VERSION)?;
    Ok(raw.and_then(|v| v.trim().parse().ok()).unwrap_or(1))
}

/// Rewrite a legacy collection with ids assigned and fields canonical.
fn migrate_collection<T, F>(storage: &LocalStorage, key: &str, convert: F) -> Result<usize>
where
    T: serde::Serialize,
    F: Fn(Value) -> Result<T>,
{
    let Some(items) = storage.read_json::<Vec<Value>>(key)? else {
        return Ok(0);
    };

    let mut records = Vec::with_capacity(items.len());
    for mut item in items {
        if let Value::Object(obj) = &mut item {
            if object_id(obj).is_none() {
                obj.insert("id".into(), Value::String(RecordId::generate().to_string()));
            }
        }
        match convert(item) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("Dropping unreadable entry under {}: {}", key, e),
        }
    }

    storage.write_json(key, &records)?;
    Ok(records.len())
}

/// Bring the local store up to [`SCHEMA_VERSION`]. Returns whether anything
/// was rewritten.
pub fn migrate_local(storage: &LocalStorage) -> Result<bool> {
    let version = stored_version(storage)?;
    if version >= SCHEMA_VERSION {
        return Ok(false);
    }

    tracing::info!("Migrating local store from schema v{} to v{}", version, SCHEMA_VERSION);

    let projects = migrate_collection(storage, keys::PROJECTS, project)?;
    let services = migrate_collection(storage, keys::SERVICES, service)?;

    if let Some(raw) = storage.read_json::<Value>(keys::ABOUT)? {
        match about(raw) {
            Ok(content) => storage.write_json(keys::ABOUT, &content)?,
            Err(e) => {
                tracing::warn!("Resetting unreadable about document: {}", e);
                storage.remove_item(keys::ABOUT)?;
            }
        }
    }

    storage.set_item(keys::SCHEMA_VERSION, &SCHEMA_VERSION.to_string())?;
    tracing::debug!("Migrated {} projects and {} services", projects, services);
    Ok(true)
}
