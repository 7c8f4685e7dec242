#![allow(dead_code)]

use quicknotez::backends::MemoryBackend;
use quicknotez::{BackendError, BackendResult, Blob, IndexStore, NoteId, NoteService, ObjectStore};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Switches that make the next calls to a `FaultyStore` fail
#[derive(Debug, Default)]
pub struct Faults {
    pub put: AtomicBool,
    pub list: AtomicBool,
    pub put_item: AtomicBool,
    pub get_key: Mutex<Option<String>>,
    pub gets: AtomicUsize,
}

/// In-memory store that can be told to fail individual operations
#[derive(Debug, Clone, Default)]
pub struct FaultyStore {
    pub inner: MemoryBackend,
    pub faults: Arc<Faults>,
}

fn injected(op: &str) -> BackendError {
    BackendError::Other(anyhow::anyhow!("injected {op} failure"))
}

impl FaultyStore {
    pub fn fail_puts(&self, fail: bool) {
        self.faults.put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_list(&self, fail: bool) {
        self.faults.list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_index(&self, fail: bool) {
        self.faults.put_item.store(fail, Ordering::SeqCst);
    }

    pub fn fail_get_of(&self, key: &str) {
        *self.faults.get_key.lock().unwrap() = Some(key.to_string());
    }

    pub fn get_calls(&self) -> usize {
        self.faults.gets.load(Ordering::SeqCst)
    }
}

impl ObjectStore for FaultyStore {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> BackendResult<()> {
        if self.faults.put.load(Ordering::SeqCst) {
            return Err(injected("put"));
        }
        self.inner.put(key, body, content_type)
    }

    fn get(&self, key: &str) -> BackendResult<Blob> {
        self.faults.gets.fetch_add(1, Ordering::SeqCst);
        if self.faults.get_key.lock().unwrap().as_deref() == Some(key) {
            return Err(injected("get"));
        }
        self.inner.get(key)
    }

    fn list(&self) -> BackendResult<Vec<String>> {
        if self.faults.list.load(Ordering::SeqCst) {
            return Err(injected("list"));
        }
        self.inner.list()
    }
}

impl IndexStore for FaultyStore {
    fn put_item(&self, id: &NoteId) -> BackendResult<()> {
        if self.faults.put_item.load(Ordering::SeqCst) {
            return Err(injected("put_item"));
        }
        self.inner.put_item(id)
    }
}

/// A service over a fresh `FaultyStore`, plus a handle to that store
pub fn faulty_service() -> (NoteService, FaultyStore) {
    let store = FaultyStore::default();
    let service = NoteService::new(Box::new(store.clone()), Box::new(store.clone()));
    (service, store)
}
