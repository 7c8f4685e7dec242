use crate::contract::{CreateNoteResponse, SaveNoteRequest, SaveNoteResponse};
use crate::{
    IndexStore, NOTE_CONTENT_TYPE, Note, NoteError, NoteId, ObjectStore, ReadStep, Result,
    WriteStep,
};
use log::{debug, error, info, trace, warn};
use std::panic;
use std::thread;

/// Default number of note bodies fetched in parallel while listing
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

pub struct NoteService {
    objects: Box<dyn ObjectStore>,
    index: Box<dyn IndexStore>,
    fetch_concurrency: usize,
}

impl NoteService {
    #[must_use]
    pub fn new(objects: Box<dyn ObjectStore>, index: Box<dyn IndexStore>) -> Self {
        Self {
            objects,
            index,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    /// Caps how many bodies `list_all` fetches at once. Zero is treated as one
    #[must_use]
    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    /// Creates an empty note and registers it in the index.
    ///
    /// The blob is written before the index record. A failed index write
    /// leaves the blob behind; nothing rolls it back.
    ///
    /// # Errors
    ///
    /// `NoteError::StorageWrite` with `WriteStep::Blob` if the blob write fails
    /// (the index is not touched), or `WriteStep::Index` if the index write fails
    pub fn create(&self) -> Result<CreateNoteResponse> {
        let id = NoteId::generate();
        let key = id.object_key();
        trace!("Generated note ID {id}");

        self.objects
            .put(&key, &[], NOTE_CONTENT_TYPE)
            .map_err(|source| {
                error!("Failed writing empty blob '{key}': {source}");
                NoteError::StorageWrite {
                    step: WriteStep::Blob,
                    source,
                }
            })?;
        debug!("Wrote empty blob '{key}'");

        self.index.put_item(&id).map_err(|source| {
            warn!("Blob '{key}' has no index record: {source}");
            NoteError::StorageWrite {
                step: WriteStep::Index,
                source,
            }
        })?;

        info!("Created note {id}");
        Ok(CreateNoteResponse { id })
    }

    /// Replaces the content of a note in full.
    ///
    /// The ID is not checked against the index, so this also creates the blob
    /// if it is missing. Repeating a save with the same arguments is harmless.
    ///
    /// # Errors
    ///
    /// `NoteError::StorageWrite` with `WriteStep::Blob` if the write fails
    pub fn save(&self, request: SaveNoteRequest) -> Result<SaveNoteResponse> {
        let SaveNoteRequest { id, content } = request;
        let key = id.object_key();
        self.objects
            .put(&key, content.as_bytes(), NOTE_CONTENT_TYPE)
            .map_err(|source| {
                error!("Failed saving '{key}': {source}");
                NoteError::StorageWrite {
                    step: WriteStep::Blob,
                    source,
                }
            })?;

        info!("Saved note {id} ({} bytes)", content.len());
        Ok(SaveNoteResponse::ok())
    }

    /// Returns every stored note with its full content, in listing order.
    ///
    /// Uses a single listing call; bodies are fetched in parallel batches of
    /// at most `fetch_concurrency`.
    ///
    /// # Errors
    ///
    /// `NoteError::StorageRead` if the listing or any single fetch fails.
    /// Partial results are discarded
    pub fn list_all(&self) -> Result<Vec<Note>> {
        let keys = self.objects.list().map_err(|source| {
            error!("Failed listing notes: {source}");
            NoteError::StorageRead {
                step: ReadStep::List,
                source,
            }
        })?;
        debug!("Listed {} keys", keys.len());

        let mut notes = Vec::with_capacity(keys.len());
        for batch in keys.chunks(self.fetch_concurrency) {
            let fetched = thread::scope(|scope| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|key| scope.spawn(move || self.fetch_note(key)))
                    .collect();

                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                    .collect::<Result<Vec<Note>>>()
            })?;
            notes.extend(fetched);
        }

        info!("Fetched {} notes", notes.len());
        Ok(notes)
    }

    fn fetch_note(&self, key: &str) -> Result<Note> {
        let blob = self.objects.get(key).map_err(|source| {
            error!("Failed fetching '{key}': {source}");
            NoteError::StorageRead {
                step: ReadStep::Fetch(key.to_string()),
                source,
            }
        })?;
        trace!("Fetched '{key}' ({} bytes)", blob.body.len());

        Ok(Note {
            id: NoteId::from_object_key(key),
            content: String::from_utf8_lossy(&blob.body).into_owned(),
        })
    }
}
