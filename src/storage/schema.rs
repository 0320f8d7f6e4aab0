//! Database schema definitions

/// SQL to create the key/value table backing the local store
pub const CREATE_LOCAL_STORAGE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS local_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL
)
"#;

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![CREATE_LOCAL_STORAGE_TABLE]
}
