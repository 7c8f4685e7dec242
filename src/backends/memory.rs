use super::{BackendError, BackendResult, Blob, IndexStore, NoteId, ObjectStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    objects: BTreeMap<String, Blob>,
    index: BTreeSet<NoteId>,
}

/// Process-local backend. Clones share the same state, which makes it handy
/// as both object and index store for a single `NoteService`
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// IDs registered in the index, sorted
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Poisoned` if a writer panicked while holding the lock
    pub fn index_ids(&self) -> BackendResult<Vec<NoteId>> {
        Ok(self.lock()?.index.iter().cloned().collect())
    }

    fn lock(&self) -> BackendResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| BackendError::Poisoned)
    }
}

impl ObjectStore for MemoryBackend {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> BackendResult<()> {
        self.lock()?.objects.insert(
            key.to_string(),
            Blob {
                body: body.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    fn get(&self, key: &str) -> BackendResult<Blob> {
        self.lock()?
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| BackendError::ObjectNotFound(key.to_string()))
    }

    fn list(&self) -> BackendResult<Vec<String>> {
        Ok(self.lock()?.objects.keys().cloned().collect())
    }
}

impl IndexStore for MemoryBackend {
    fn put_item(&self, id: &NoteId) -> BackendResult<()> {
        self.lock()?.index.insert(id.clone());
        Ok(())
    }
}
