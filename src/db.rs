mod migration;
mod schema;

#[cfg(test)]
mod tests;

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;

/// A key-value pair as stored, in raw bytes.
pub type KeyValue = (Vec<u8>, Vec<u8>);

/// Embedded ordered key-value store backed by a single SQLite table.
///
/// Keys are BLOBs compared byte-wise, so iteration order matches the
/// lexicographic order of the raw key bytes.
pub struct Database {
    conn: Connection,
}

/// A single write queued in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// An ordered set of puts and deletes applied in one transaction.
///
/// # Examples
///
/// ```
/// use cnote::{Database, WriteBatch};
///
/// # fn main() -> cnote::Result<()> {
/// let mut db = Database::in_memory()?;
/// let mut batch = WriteBatch::new();
/// batch.put("a", "1");
/// batch.put("b", "2");
/// batch.delete("a");
/// db.write_batch(batch)?;
///
/// assert_eq!(db.get(b"a")?, None);
/// assert_eq!(db.get(b"b")?, Some(b"2".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Put(key.into(), value.into()));
    }

    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.ops.push(BatchOp::Delete(key.into()));
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Database {
    /// Opens an in-memory store.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    /// Opens a file-based store at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let mut db = Self { conn };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Applies any pending schema migrations.
    ///
    /// Idempotent: reopening an existing store applies nothing.
    fn initialize_schema(&mut self) -> Result<()> {
        migration::apply_pending_migrations(&mut self.conn)
    }

    /// Returns the value stored under `key`, if any.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Removes `key`. Deleting a missing key is not an error.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    /// Returns every pair whose key starts with `prefix`, in key order.
    pub fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<KeyValue>> {
        match prefix_upper_bound(prefix) {
            Some(upper) => self.collect_pairs(
                "SELECT key, value FROM kv WHERE key >= ?1 AND key < ?2 ORDER BY key",
                params![prefix, upper],
            ),
            None => self.collect_pairs(
                "SELECT key, value FROM kv WHERE key >= ?1 ORDER BY key",
                params![prefix],
            ),
        }
    }

    /// Returns every stored pair in key order.
    pub fn scan_all(&self) -> Result<Vec<KeyValue>> {
        self.collect_pairs("SELECT key, value FROM kv ORDER BY key", params![])
    }

    fn collect_pairs(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<KeyValue>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut pairs = Vec::new();
        for row in rows {
            pairs.push(row?);
        }
        Ok(pairs)
    }

    /// Applies every operation in `batch` atomically.
    pub fn write_batch(&mut self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        for op in &batch.ops {
            match op {
                BatchOp::Put(key, value) => {
                    tx.execute(
                        "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                        params![key, value],
                    )?;
                }
                BatchOp::Delete(key) => {
                    tx.execute("DELETE FROM kv WHERE key = ?1", [key])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Returns a reference to the underlying connection.
    ///
    /// Useful for inspecting the raw table in tests.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Smallest key greater than every key starting with `prefix`.
///
/// Returns `None` when no such bound exists (empty prefix or all `0xff`).
fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.pop() {
        if last < u8::MAX {
            upper.push(last + 1);
            return Some(upper);
        }
    }
    None
}
