//! netpulse persistence: a small durable key-value store for UI state that must
//! survive a full reload, and the one-shot bridge built on top of it.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use metrics::{counter, histogram};

pub mod bridge;

pub use bridge::{PersistenceBridge, FILTER_KEY, TAB_KEY};

/// Durable per-device key-value store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store. Simple and synchronous; writes happen only around reloads.
pub struct SqliteKv {
    db: Mutex<rusqlite::Connection>,
}

impl SqliteKv {
    pub fn open_default() -> Result<Self> {
        let path = std::env::var("NETPULSE_DB_PATH").unwrap_or_else(|_| default_db_path());
        Self::open(&path)
    }

    pub fn open(path: &str) -> Result<Self> {
        let started = std::time::Instant::now();
        let db = rusqlite::Connection::open(path).with_context(|| format!("opening sqlite db at {}", path))?;
        db.pragma_update(None, "journal_mode", "WAL").ok();
        db.pragma_update(None, "synchronous", "NORMAL").ok();
        db.execute(
            "CREATE TABLE IF NOT EXISTS ui_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                ts    INTEGER NOT NULL
            )",
            [],
        )
        .context("creating ui_state table")?;
        histogram!("persist_open_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(Self { db: Mutex::new(db) })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>> {
        self.db.lock().map_err(|_| anyhow!("sqlite connection lock poisoned"))
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.conn()?;
        let mut stmt = db.prepare("SELECT value FROM ui_state WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        let value: Option<String> = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO ui_state(key, value, ts) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, ts = excluded.ts",
            (key, value, now_ts()),
        )
        .with_context(|| format!("writing ui_state key {}", key))?;
        counter!("persist_put_total", 1u64);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let db = self.conn()?;
        db.execute("DELETE FROM ui_state WHERE key = ?1", [key])
            .with_context(|| format!("deleting ui_state key {}", key))?;
        Ok(())
    }
}

/// In-memory store for tests and for runs that do not need to outlive the process.
#[derive(Default)]
pub struct MemoryKv {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.map.lock().map_err(|_| anyhow!("memory store lock poisoned"))
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.map()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.map()?.remove(key);
        Ok(())
    }
}

fn default_db_path() -> String {
    if let Some(home) = std::env::var_os("HOME") {
        let mut p = std::path::PathBuf::from(home);
        p.push(".netpulse");
        let _ = std::fs::create_dir_all(&p);
        p.push("netpulse.db");
        return p.to_string_lossy().to_string();
    }
    "netpulse.db".to_string()
}

pub fn now_ts() -> i64 {
    let now = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap_or_default();
    now.as_secs() as i64
}
