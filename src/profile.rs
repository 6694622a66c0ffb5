use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use crate::error::StoreError;
use crate::report::WordReport;

/// Durable per-user record that outlives a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_name: Option<String>,
    pub words: Vec<String>,
    pub report: WordReport,
    pub test_attempts: u32,
    pub updated_at: Option<DateTime<Local>>,
}

/// Storage for one user's profile. Implementations are already bound to a
/// user identity; concurrent writers are last-writer-wins.
pub trait ProfileStore {
    /// `Ok(None)` until the first profile is saved.
    fn load(&self) -> Result<Option<Profile>, StoreError>;
    fn save(&self, profile: &Profile) -> Result<(), StoreError>;
}

/// SQLite-backed profiles, one row per user.
#[derive(Debug)]
pub struct SqliteProfileStore {
    conn: Connection,
    user_id: String,
}

impl SqliteProfileStore {
    /// Opens (creating if needed) the database at `path` for `user_id`.
    pub fn open<P: AsRef<Path>>(path: P, user_id: impl Into<String>) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn, user_id)
    }

    pub fn open_in_memory(user_id: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, user_id)
    }

    fn with_connection(conn: Connection, user_id: impl Into<String>) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY,
                user_name TEXT,
                words TEXT NOT NULL,
                report TEXT NOT NULL,
                test_attempts INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn,
            user_id: user_id.into(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Same database, different user.
    pub fn for_user(self, user_id: impl Into<String>) -> Self {
        Self {
            conn: self.conn,
            user_id: user_id.into(),
        }
    }

    /// Removes this user's row. Returns whether a row existed.
    pub fn delete(&self) -> Result<bool, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM profiles WHERE user_id = ?1", [&self.user_id])?;
        Ok(removed > 0)
    }
}

impl ProfileStore for SqliteProfileStore {
    fn load(&self) -> Result<Option<Profile>, StoreError> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT user_name, words, report, test_attempts, updated_at
                FROM profiles
                WHERE user_id = ?1
                "#,
                [&self.user_id],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, Option<String>>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((user_name, words, report, test_attempts, updated_at)) = row else {
            return Ok(None);
        };

        let updated_at = updated_at
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Local));

        Ok(Some(Profile {
            user_name,
            words: serde_json::from_str(&words)?,
            report: serde_json::from_str(&report)?,
            test_attempts,
            updated_at,
        }))
    }

    fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        let stamp = profile.updated_at.unwrap_or_else(Local::now);
        self.conn.execute(
            r#"
            INSERT INTO profiles (user_id, user_name, words, report, test_attempts, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                user_name = excluded.user_name,
                words = excluded.words,
                report = excluded.report,
                test_attempts = excluded.test_attempts,
                updated_at = excluded.updated_at
            "#,
            params![
                self.user_id,
                profile.user_name,
                serde_json::to_string(&profile.words)?,
                serde_json::to_string(&profile.report)?,
                profile.test_attempts,
                stamp.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryCell {
    profile: Option<Profile>,
    saves: usize,
    failing: bool,
}

/// In-process store. Clones share the same slot, so a test can keep a handle
/// while the dispatcher owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    cell: Rc<RefCell<MemoryCell>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: Profile) -> Self {
        let store = Self::new();
        store.cell.borrow_mut().profile = Some(profile);
        store
    }

    /// While set, every `load` and `save` fails with `StoreError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.cell.borrow_mut().failing = failing;
    }

    pub fn snapshot(&self) -> Option<Profile> {
        self.cell.borrow().profile.clone()
    }

    pub fn save_count(&self) -> usize {
        self.cell.borrow().saves
    }
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Result<Option<Profile>, StoreError> {
        let cell = self.cell.borrow();
        if cell.failing {
            return Err(StoreError::Unavailable);
        }
        Ok(cell.profile.clone())
    }

    fn save(&self, profile: &Profile) -> Result<(), StoreError> {
        let mut cell = self.cell.borrow_mut();
        if cell.failing {
            return Err(StoreError::Unavailable);
        }
        cell.profile = Some(profile.clone());
        cell.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    fn sample_profile() -> Profile {
        let words = vec!["cat".to_string(), "dog".to_string()];
        let mut report = WordReport::reset(&words);
        report.record_miss("dog").unwrap();
        Profile {
            user_name: Some("Ada".to_string()),
            words,
            report,
            test_attempts: 2,
            updated_at: None,
        }
    }

    #[test]
    fn test_load_missing_profile() {
        let store = SqliteProfileStore::open_in_memory("nobody").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_and_load() {
        let store = SqliteProfileStore::open_in_memory("ada").unwrap();
        let profile = sample_profile();
        store.save(&profile).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.user_name.as_deref(), Some("Ada"));
        assert_eq!(loaded.words, profile.words);
        assert_eq!(loaded.report, profile.report);
        assert_eq!(loaded.test_attempts, 2);
        assert!(loaded.updated_at.is_some());
    }

    #[test]
    fn test_save_overwrites() {
        let store = SqliteProfileStore::open_in_memory("ada").unwrap();
        let mut profile = sample_profile();
        store.save(&profile).unwrap();

        profile.words.clear();
        profile.test_attempts = 0;
        store.save(&profile).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert!(loaded.words.is_empty());
        assert_eq!(loaded.test_attempts, 0);
    }

    #[test]
    fn test_users_are_isolated() {
        let store = SqliteProfileStore::open_in_memory("ada").unwrap();
        store.save(&sample_profile()).unwrap();

        let store = store.for_user("grace");
        assert_eq!(store.user_id(), "grace");
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_delete() {
        let store = SqliteProfileStore::open_in_memory("ada").unwrap();
        assert!(!store.delete().unwrap());
        store.save(&sample_profile()).unwrap();
        assert!(store.delete().unwrap());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_persists_across_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("profiles.db");
        {
            let store = SqliteProfileStore::open(&path, "ada").unwrap();
            store.save(&sample_profile()).unwrap();
        }
        let store = SqliteProfileStore::open(&path, "ada").unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.report.misses("dog"), Some(1));
    }

    #[test]
    fn test_memory_store_shares_state_between_clones() {
        let store = MemoryProfileStore::new();
        let handle = store.clone();
        store.save(&sample_profile()).unwrap();
        assert_eq!(handle.save_count(), 1);
        assert_eq!(handle.snapshot(), Some(sample_profile()));
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemoryProfileStore::with_profile(sample_profile());
        store.set_failing(true);
        assert_matches!(store.load(), Err(StoreError::Unavailable));
        assert_matches!(store.save(&Profile::default()), Err(StoreError::Unavailable));
        store.set_failing(false);
        assert_eq!(store.load().unwrap(), Some(sample_profile()));
        assert_eq!(store.save_count(), 0);
    }
}
