/// Key-value table for the note store.
///
/// BLOB keys compare with memcmp, which gives LevelDB-style byte ordering.
/// WITHOUT ROWID keeps rows clustered by key for range scans.
pub const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key BLOB PRIMARY KEY NOT NULL,
    value BLOB NOT NULL
) WITHOUT ROWID;
"#;

/// Bookkeeping table recording which migrations have run.
pub const MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at INTEGER NOT NULL,
    description TEXT
);
"#;
