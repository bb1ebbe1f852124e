//! SQLite implementation of the Store trait.
//!
//! This is the persistent backend for the ledger. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::Store;

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        tracing::debug!(path = %path.display(), "opened sqlite block store");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| StoreError::Background(format!("mutex poisoned: {}", e)))?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Background(e.to_string()))?
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn get(&self, height: u64) -> Result<Option<Bytes>> {
        self.blocking(move |conn| {
            let value: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT value FROM blocks WHERE height = ?1",
                    params![height as i64],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value.map(Bytes::from))
        })
        .await
    }

    async fn put(&self, height: u64, value: Bytes) -> Result<()> {
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO blocks (height, value, written_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(height) DO UPDATE SET
                    value = excluded.value,
                    written_at = excluded.written_at",
                params![height as i64, value.as_ref(), now_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn scan_all(&self) -> Result<Vec<(u64, Bytes)>> {
        self.blocking(|conn| {
            let mut stmt = conn.prepare("SELECT height, value FROM blocks ORDER BY height ASC")?;
            let rows = stmt
                .query_map([], |row| {
                    let height: i64 = row.get(0)?;
                    let value: Vec<u8> = row.get(1)?;
                    Ok((height as u64, Bytes::from(value)))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM blocks", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
