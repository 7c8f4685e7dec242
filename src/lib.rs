#![deny(clippy::cargo)]
#![deny(clippy::complexity)]
#![deny(clippy::correctness)]
#![deny(clippy::nursery)]
#![deny(clippy::perf)]
#![deny(clippy::style)]
#![deny(clippy::suspicious)]
#![deny(clippy::pedantic)]
// Not published, so there is no repository or readme to point at
#![allow(clippy::cargo_common_metadata)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use tabled::Tabled;
use thiserror::Error;
use uuid::Uuid;

pub mod app;
pub mod backends;
pub mod contract;
pub mod setup;
pub mod ui;

pub use app::NoteService;

// More convenient Result types
pub type Result<T> = std::result::Result<T, NoteError>;
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Content type every note blob is stored with
pub const NOTE_CONTENT_TYPE: &str = "text/html";

/// Suffix appended to a note ID to form its object key
pub const NOTE_KEY_SUFFIX: &str = ".html";

/// Opaque note identifier. Generated once at creation, never changed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generates a fresh random (UUID v4) identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Key of the blob holding this note's content: `<id>.html`
    #[must_use]
    pub fn object_key(&self) -> String {
        format!("{}{NOTE_KEY_SUFFIX}", self.0)
    }

    /// Recovers the note ID from an object key.
    ///
    /// Keys without the `.html` suffix are taken as-is.
    #[must_use]
    pub fn from_object_key(key: &str) -> Self {
        Self(key.strip_suffix(NOTE_KEY_SUFFIX).unwrap_or(key).to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A note paired with its full HTML content
#[derive(Tabled, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
}

/// Raw object as returned by an [`ObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Key/value blob storage holding note content.
///
/// Every call may fail independently; no multi-key atomicity is provided.
pub trait ObjectStore: Send + Sync {
    /// Writes `body` under `key`, replacing anything stored there
    ///
    /// # Errors
    ///
    /// Returns an error if the object could not be written
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> BackendResult<()>;

    /// Fetches the object stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::ObjectNotFound` if nothing is stored under `key`,
    /// or another error if the read fails
    fn get(&self, key: &str) -> BackendResult<Blob>;

    /// Lists every key currently in the store
    ///
    /// # Errors
    ///
    /// Returns an error if the enumeration fails
    fn list(&self) -> BackendResult<Vec<String>>;
}

/// Record store used only to register that a note ID exists
pub trait IndexStore: Send + Sync {
    /// Writes the index record for `id`, overwriting an existing one
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be written
    fn put_item(&self, id: &NoteId) -> BackendResult<()>;
}

/// Which of the ordered write steps failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    Blob,
    Index,
}

impl fmt::Display for WriteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => f.write_str("note content"),
            Self::Index => f.write_str("index record"),
        }
    }
}

/// Which read step failed while listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadStep {
    List,
    Fetch(String),
}

impl fmt::Display for ReadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => f.write_str("listing notes"),
            Self::Fetch(key) => write!(f, "fetching '{key}'"),
        }
    }
}

// Enum for all errors surfaced by the note service and the client
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("Failed writing {step}: {source}")]
    StorageWrite {
        step: WriteStep,
        #[source]
        source: BackendError,
    },

    #[error("Failed {step}: {source}")]
    StorageRead {
        step: ReadStep,
        #[source]
        source: BackendError,
    },

    #[error("Failed opening storage: {0}")]
    Setup(#[source] BackendError),

    #[error(transparent)]
    Menu(#[from] MenuError),
}

impl NoteError {
    #[must_use]
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::StorageWrite { .. })
    }

    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::StorageRead { .. })
    }
}

// Enum for all possible client input/output errors
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Failed to read from stdin: {0}")]
    StdinReadError(io::Error),

    #[error("Couldn't convert '{0}' to a number. Please enter a number 1-4")]
    ParseError(String),

    #[error("Couldn't convert '{0}' to a MenuOption. Please enter a number 1-4")]
    InvalidOption(u8),

    #[error("Failed writing to stdout")]
    StdoutWriteError(io::Error),

    #[error("Reached end of input")]
    EndOfInput,

    #[error("Failed encoding response as JSON")]
    JsonEncodeError(serde_json::Error),

    #[error("Failed reading note content from '{path}': {source}")]
    ContentReadError {
        path: String,
        #[source]
        source: io::Error,
    },
}

// Enum for all possible storage backend errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed creating directory for notes")]
    DirectoryCreationError(#[source] io::Error),

    #[error("Failed writing note data to file")]
    FileWriteError(#[source] io::Error),

    #[error("Failed reading note data from file")]
    FileReadError(#[source] io::Error),

    #[error("Failed reading directory contents")]
    DirectoryReadError(#[source] io::Error),

    #[error("Invalid object key: '{0}'")]
    InvalidKey(String),

    #[error("No object stored under '{0}'")]
    ObjectNotFound(String),

    #[error("Database is locked or busy")]
    DatabaseBusy,

    #[error("Database file is not a valid SQLite database")]
    NotADatabase,

    #[error("Database schema has changed unexpectedly")]
    SchemaChanged,

    #[error("Insufficient permissions")]
    PermissionDenied,

    #[error("Storage connection lock was poisoned")]
    Poisoned,

    #[error(transparent)]
    Other(#[from] anyhow::Error), // Used as fallback
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_key_appends_html_suffix() {
        let id = NoteId::from("abc123");
        assert_eq!(id.object_key(), "abc123.html");
        assert_eq!(NoteId::from_object_key("abc123.html"), id);
    }

    #[test]
    fn foreign_keys_keep_their_name() {
        assert_eq!(NoteId::from_object_key("readme.txt").as_str(), "readme.txt");
    }

    #[test]
    fn generated_ids_are_hyphenated_uuids() {
        let id = NoteId::generate();
        assert_eq!(id.as_str().len(), 36);
        assert!(Uuid::parse_str(id.as_str()).is_ok());
        assert_ne!(id, NoteId::generate());
    }

    #[test]
    fn write_errors_name_the_failed_step() {
        let err = NoteError::StorageWrite {
            step: WriteStep::Index,
            source: BackendError::DatabaseBusy,
        };
        assert!(err.is_write());
        assert_eq!(
            err.to_string(),
            "Failed writing index record: Database is locked or busy"
        );
    }
}
