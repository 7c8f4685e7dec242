use super::{BackendError, BackendResult, Blob, IndexStore, NoteId, ObjectStore};
use log::debug;
use rusqlite::{Connection, Error as SqliteError, ErrorCode, OptionalExtension, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// Keeps blobs and index records in two tables of one `SQLite` database.
/// Clones share the same connection
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteBackend {
    /// Opens the `SQLite` database at the given path and makes sure the
    /// `objects` and `note_index` tables exist.
    ///
    /// # Errors
    ///
    /// Returns a mapped `BackendError` if the database cannot be opened or the
    /// tables cannot be created
    pub fn new(path: impl AsRef<Path>) -> BackendResult<Self> {
        let connection = Connection::open(path.as_ref()).map_err(map_sqlite_error)?;

        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS objects (
                    key          TEXT PRIMARY KEY,
                    body         BLOB NOT NULL,
                    content_type TEXT NOT NULL
                );
                CREATE TABLE IF NOT EXISTS note_index (
                    id TEXT PRIMARY KEY
                );
                ",
            )
            .map_err(map_sqlite_error)?;

        debug!("Opened SQLite backend at {}", path.as_ref().display());
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Number of records in the index table
    ///
    /// # Errors
    ///
    /// Returns a mapped `BackendError` if the query fails
    pub fn index_len(&self) -> BackendResult<usize> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM note_index", [], |row| row.get(0))
            .map_err(map_sqlite_error)?;
        usize::try_from(count).map_err(|e| BackendError::Other(e.into()))
    }

    fn lock(&self) -> BackendResult<MutexGuard<'_, Connection>> {
        self.connection.lock().map_err(|_| BackendError::Poisoned)
    }
}

/// Maps a `rusqlite::Error` into a `BackendError`, wrapping known SQLite-specific codes into
/// dedicated variants. Everything else ends up in `BackendError::Other`.
fn map_sqlite_error(e: rusqlite::Error) -> BackendError {
    match e {
        SqliteError::SqliteFailure(code, _) => match code.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => BackendError::DatabaseBusy,
            ErrorCode::PermissionDenied => BackendError::PermissionDenied,
            ErrorCode::NotADatabase => BackendError::NotADatabase,
            ErrorCode::SchemaChanged => BackendError::SchemaChanged,
            _ => BackendError::Other(anyhow::anyhow!("SQLite error: {code:?}")),
        },
        other => BackendError::Other(anyhow::Error::new(other)),
    }
}

impl ObjectStore for SqliteBackend {
    /// Inserts the object, or replaces body and content type if the key exists.
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> BackendResult<()> {
        self.lock()?
            .execute(
                "INSERT INTO objects (key, body, content_type) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET body = excluded.body, content_type = excluded.content_type",
                params![key, body, content_type],
            )
            .map_err(map_sqlite_error)?;
        Ok(())
    }

    fn get(&self, key: &str) -> BackendResult<Blob> {
        self.lock()?
            .query_row(
                "SELECT body, content_type FROM objects WHERE key = ?1",
                [key],
                |row| {
                    Ok(Blob {
                        body: row.get(0)?,
                        content_type: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(map_sqlite_error)?
            .ok_or_else(|| BackendError::ObjectNotFound(key.to_string()))
    }

    /// Returns every object key, sorted.
    fn list(&self) -> BackendResult<Vec<String>> {
        let connection = self.lock()?;
        let mut stmt = connection
            .prepare("SELECT key FROM objects ORDER BY key ASC")
            .map_err(map_sqlite_error)?;

        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(map_sqlite_error)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_sqlite_error)?;
        Ok(keys)
    }
}

impl IndexStore for SqliteBackend {
    fn put_item(&self, id: &NoteId) -> BackendResult<()> {
        self.lock()?
            .execute(
                "INSERT OR REPLACE INTO note_index (id) VALUES (?1)",
                [id.as_str()],
            )
            .map_err(map_sqlite_error)?;
        Ok(())
    }
}
