use crate::errors::{AppError, AppResult};
use crate::models::AppSettings;
use crate::persistence::BlobStore;
use anyhow::Context;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        let db = Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        };

        db.ensure_default_settings()?;

        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn get_settings(&self) -> AppResult<AppSettings> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let raw = conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = 'app'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(serde_json::from_str::<AppSettings>(&raw).unwrap_or_else(|error| {
                tracing::warn!(error = %error, "stored settings are unreadable, using defaults");
                AppSettings::default()
            })),
            None => Ok(AppSettings::default()),
        }
    }

    /// Applies a JSON merge of `update` over the current settings.
    pub fn update_settings(&self, update: serde_json::Value) -> AppResult<AppSettings> {
        let current = self.get_settings()?;
        let mut merged = serde_json::to_value(current)?;
        merge_json(&mut merged, update);
        let settings: AppSettings = serde_json::from_value(merged)?;

        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO settings (key, value_json, updated_at)
             VALUES ('app', ?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![serde_json::to_string(&settings)?, Utc::now().to_rfc3339()],
        )?;

        Ok(settings)
    }

    fn ensure_default_settings(&self) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let count: i64 = conn.query_row("SELECT COUNT(1) FROM settings WHERE key = 'app'", [], |row| row.get(0))?;
        if count == 0 {
            conn.execute(
                "INSERT INTO settings (key, value_json, updated_at) VALUES ('app', ?1, ?2)",
                params![
                    serde_json::to_string(&AppSettings::default())?,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }
        Ok(())
    }
}

impl BlobStore for Database {
    fn load(&self, key: &str) -> AppResult<Option<String>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let value = conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, blob: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, blob, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }
}

fn merge_json(target: &mut serde_json::Value, update: serde_json::Value) {
    match (target, update) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_json(target_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, update) => {
            *target = update;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Database;
    use crate::errors::AppError;
    use crate::models::AppSettings;
    use crate::persistence::BlobStore;

    #[test]
    fn seeds_default_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("nested").join("state.sqlite")).expect("db");

        let settings = db.get_settings().expect("settings");
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.autosave_debounce_ms, 350);
        assert!(db.path().exists());
    }

    #[test]
    fn unusable_parent_dir_is_an_io_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").expect("write");

        match Database::new(&blocker.join("state.sqlite")) {
            Err(AppError::Io(_)) => {}
            other => panic!("expected io failure, got {other:?}"),
        }
    }

    #[test]
    fn settings_update_merges_partial_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("state.sqlite");
        let db = Database::new(&db_path).expect("db");

        let updated = db
            .update_settings(serde_json::json!({ "autosaveDebounceMs": 500 }))
            .expect("update");
        assert_eq!(updated.autosave_debounce_ms, 500);
        assert_eq!(updated.storage_key, "medidrive-root");

        drop(db);
        let reopened = Database::new(&db_path).expect("reopen");
        assert_eq!(reopened.get_settings().expect("settings").autosave_debounce_ms, 500);
    }

    #[test]
    fn rejects_settings_of_wrong_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("state.sqlite")).expect("db");

        assert!(db
            .update_settings(serde_json::json!({ "autosaveDebounceMs": "soon" }))
            .is_err());
        assert_eq!(db.get_settings().expect("settings"), AppSettings::default());
    }

    #[test]
    fn blob_round_trip_and_remove() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = Database::new(&dir.path().join("state.sqlite")).expect("db");

        assert!(db.load("medidrive-root").expect("load").is_none());
        db.save("medidrive-root", "{\"a\":1}").expect("save");
        db.save("medidrive-root", "{\"a\":2}").expect("overwrite");
        assert_eq!(db.load("medidrive-root").expect("load").as_deref(), Some("{\"a\":2}"));

        db.remove("medidrive-root").expect("remove");
        assert!(db.load("medidrive-root").expect("load").is_none());
    }
}
