use rusqlite::Connection;
use time::OffsetDateTime;

use super::schema::{KV_SCHEMA, MIGRATIONS_TABLE};
use crate::error::Result;

/// Individual migration with version metadata.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

impl Migration {
    /// Creates a new migration.
    pub const fn new(version: u32, description: &'static str, up: &'static str) -> Self {
        Self {
            version,
            description,
            up,
        }
    }

    /// Checks if this migration has been applied to the database.
    pub fn is_applied(&self, conn: &Connection) -> Result<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schema_migrations WHERE version = ?1)",
            [self.version],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Applies this migration and records it in one transaction.
    pub fn apply(&self, conn: &mut Connection) -> Result<()> {
        let tx = conn.transaction()?;

        tx.execute_batch(self.up)?;

        let applied_at = OffsetDateTime::now_utc().unix_timestamp();
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at, description) VALUES (?1, ?2, ?3)",
            rusqlite::params![self.version, applied_at, self.description],
        )?;

        tx.commit()?;
        Ok(())
    }
}

/// Registry of all migrations in version order.
pub const MIGRATIONS: &[Migration] = &[Migration::new(
    1,
    "Initial schema: create ordered kv table",
    KV_SCHEMA,
)];

/// Applies all pending migrations in version order.
pub fn apply_pending_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(MIGRATIONS_TABLE)?;

    for migration in MIGRATIONS {
        if !migration.is_applied(conn)? {
            migration.apply(conn)?;
            tracing::info!(
                version = migration.version,
                "applied migration: {}",
                migration.description
            );
        }
    }

    Ok(())
}
