// Object store: generic JSON document persistence behind a small trait.
//
// The engine validates document shapes via serde; the store itself only
// moves opaque JSON values. Keys are namespaced (`user:`, `group:`,
// `groupcode:`) and sanitized so ids containing path separators cannot
// escape their namespace.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde_json::Value;

// ---------------------------------------------------------------------------
// ObjectStore trait
// ---------------------------------------------------------------------------

pub trait ObjectStore: Send + Sync {
    /// Load the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &Value) -> Result<()>;
}

/// Replace path separators so user-supplied ids cannot form nested keys.
pub fn sanitize_key(key: &str) -> String {
    key.replace(['/', '\\'], "_")
}

/// Store key builders for the three document namespaces.
pub mod keys {
    use super::sanitize_key;

    pub fn user(id: &str) -> String {
        format!("user:{}", sanitize_key(id))
    }

    pub fn group(id: &str) -> String {
        format!("group:{}", sanitize_key(id))
    }

    pub fn group_code(code: &str) -> String {
        format!("groupcode:{}", sanitize_key(code))
    }
}

// ---------------------------------------------------------------------------
// SqliteStore
// ---------------------------------------------------------------------------

/// SQLite-backed object store: one `objects` table of (key, value) rows.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`. Pass `":memory:"` for an
    /// ephemeral in-memory store (useful for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("failed to open store at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set store pragmas")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS objects (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );",
        )
        .context("failed to create store schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }
}

impl ObjectStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = sanitize_key(key);
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT value FROM objects WHERE key = ?1")
            .context("failed to prepare object load")?;

        let mut rows = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))
            .context("failed to query object")?;

        match rows.next() {
            Some(row) => {
                let json_str = row.context("failed to read object row")?;
                let value: Value = serde_json::from_str(&json_str)
                    .context("failed to deserialize stored object")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &Value) -> Result<()> {
        let key = sanitize_key(key);
        let json_str = serde_json::to_string(value).context("failed to serialize object")?;
        let conn = self.conn();
        conn.execute(
            "INSERT INTO objects (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value      = excluded.value,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![key, json_str],
        )
        .context("failed to store object")?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Helper: create a fresh in-memory store for each test.
    fn test_store() -> SqliteStore {
        SqliteStore::open(":memory:").expect("in-memory store should open")
    }

    // -- Key sanitization --

    #[test]
    fn sanitize_replaces_path_separators() {
        assert_eq!(sanitize_key("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_key("plain"), "plain");
    }

    #[test]
    fn key_builders_namespace_and_sanitize() {
        assert_eq!(keys::user("alice"), "user:alice");
        assert_eq!(keys::group("g/1"), "group:g_1");
        assert_eq!(keys::group_code("1234"), "groupcode:1234");
    }

    // -- Get / set --

    #[test]
    fn set_and_get_round_trip() {
        let store = test_store();
        let value = json!({"name": "The League", "members": ["alice"]});

        store.set("group:g1", &value).unwrap();
        assert_eq!(store.get("group:g1").unwrap(), Some(value));
    }

    #[test]
    fn get_missing_key_returns_none() {
        let store = test_store();
        assert!(store.get("group:nope").unwrap().is_none());
    }

    #[test]
    fn set_overwrites_previous_value() {
        let store = test_store();
        store.set("k", &json!(1)).unwrap();
        store.set("k", &json!({"v": 2})).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(json!({"v": 2})));
    }

    #[test]
    fn keys_with_separators_collapse_to_same_row() {
        let store = test_store();
        store.set("group:a/b", &json!(1)).unwrap();
        // The sanitized form reads back the same row.
        assert_eq!(store.get("group:a_b").unwrap(), Some(json!(1)));
        assert_eq!(store.get("group:a\\b").unwrap(), Some(json!(1)));
    }

    #[test]
    fn distinct_namespaces_do_not_collide() {
        let store = test_store();
        store.set(&keys::user("x"), &json!("u")).unwrap();
        store.set(&keys::group("x"), &json!("g")).unwrap();
        assert_eq!(store.get(&keys::user("x")).unwrap(), Some(json!("u")));
        assert_eq!(store.get(&keys::group("x")).unwrap(), Some(json!("g")));
    }

    #[test]
    fn updated_at_is_maintained() {
        let store = test_store();
        store.set("k", &json!(1)).unwrap();

        let conn = store.conn();
        let ts: String = conn
            .query_row("SELECT updated_at FROM objects WHERE key = 'k'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(ts.contains('T'));
    }
}
