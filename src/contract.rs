//! Request and response shapes for the three note operations.

use crate::NoteId;
use serde::{Deserialize, Serialize};

/// Message shown to the user on any failed operation
pub const TRY_AGAIN: &str = "Something went wrong, please try again";

/// Returned by a successful create
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteResponse {
    pub id: NoteId,
}

/// Replaces the whole content of a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveNoteRequest {
    pub id: NoteId,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveNoteResponse {
    pub ok: bool,
}

impl SaveNoteResponse {
    #[must_use]
    pub const fn ok() -> Self {
        Self { ok: true }
    }
}

/// Opaque failure reported to the caller. Details stay in the log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl Default for ErrorResponse {
    fn default() -> Self {
        Self {
            ok: false,
            error: TRY_AGAIN.to_string(),
        }
    }
}
