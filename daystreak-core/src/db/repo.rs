//! Database repository layer
//!
//! Key/value operations backing the local statistics tier.

use crate::error::{Error, Result};
use crate::sync::LocalTier;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Database handle (single connection)
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.connection();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    ///
    /// A poisoned lock is recovered; every statement here is a single
    /// autocommit write, so the connection cannot be left mid-transaction.
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ============================================
    // Key/value operations
    // ============================================

    /// Read a value by key
    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        let conn = self.connection();
        conn.query_row("SELECT value FROM kv WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()
        .map_err(Error::from)
    }

    /// Insert or overwrite a value
    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Delete a value; deleting a missing key is not an error
    pub fn remove_value(&self, key: &str) -> Result<()> {
        let conn = self.connection();
        conn.execute("DELETE FROM kv WHERE key = ?", [key])?;
        Ok(())
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let conn = self.connection();
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}

impl LocalTier for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.get_value(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_value(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_value(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    #[test]
    fn test_set_get_remove() {
        let db = test_db();
        assert_eq!(db.get_value("currentStreak").unwrap(), None);

        db.set_value("currentStreak", "3").unwrap();
        assert_eq!(db.get_value("currentStreak").unwrap().as_deref(), Some("3"));

        db.set_value("currentStreak", "4").unwrap();
        assert_eq!(db.get_value("currentStreak").unwrap().as_deref(), Some("4"));

        db.remove_value("currentStreak").unwrap();
        assert_eq!(db.get_value("currentStreak").unwrap(), None);

        // Removing again is fine
        db.remove_value("currentStreak").unwrap();
    }

    #[test]
    fn test_keys_sorted() {
        let db = test_db();
        db.set_value("b", "1").unwrap();
        db.set_value("a", "2").unwrap();
        assert_eq!(db.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_unmigrated_database_errors() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_value("x"), Err(Error::Database(_))));
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("daystreak.db");

        {
            let db = Database::open(&path).unwrap();
            db.migrate().unwrap();
            db.set_value("lastActiveDate", "2024-03-10").unwrap();
        }

        let db = Database::open(&path).unwrap();
        db.migrate().unwrap();
        assert_eq!(
            db.get_value("lastActiveDate").unwrap().as_deref(),
            Some("2024-03-10")
        );
    }
}
