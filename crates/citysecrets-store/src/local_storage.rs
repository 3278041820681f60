//! String key/value operations on the `local_storage` table.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Insert or overwrite `key`.
    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Delete `key`.  Returns `true` if a row was removed.
    pub fn remove_item(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;

    #[test]
    fn set_get_overwrite_remove() {
        let db = Database::open_in_memory().unwrap();

        assert_eq!(db.get_item("theme").unwrap(), None);

        db.set_item("theme", "dark").unwrap();
        db.set_item("theme", "light").unwrap();
        assert_eq!(db.get_item("theme").unwrap().as_deref(), Some("light"));

        assert!(db.remove_item("theme").unwrap());
        assert!(!db.remove_item("theme").unwrap());
        assert_eq!(db.get_item("theme").unwrap(), None);
    }
}
