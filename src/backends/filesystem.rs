use super::{BackendError, BackendResult, Blob, IndexStore, NoteId, ObjectStore};
use log::{debug, trace};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const OBJECTS_DIR: &str = "objects";
const CONTENT_TYPES_DIR: &str = "content-types";
const INDEX_DIR: &str = "index";
const TMP_DIR: &str = "tmp";

/// Used when an object has no recorded content type
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Stores notes as plain files under a root directory:
///
/// ```text
/// <root>/objects/<key>        body
/// <root>/content-types/<key>  content type
/// <root>/index/<id>           empty marker
/// <root>/tmp/                 staging area for writes
/// ```
#[derive(Debug, Clone)]
pub struct FilesystemBackend {
    root: PathBuf,
}

impl FilesystemBackend {
    /// Opens (and creates if needed) the directory tree rooted at `path`.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::DirectoryCreationError` if any directory cannot be created
    pub fn new(path: impl Into<PathBuf>) -> BackendResult<Self> {
        let root = path.into();
        for dir in [OBJECTS_DIR, CONTENT_TYPES_DIR, INDEX_DIR, TMP_DIR] {
            fs::create_dir_all(root.join(dir)).map_err(BackendError::DirectoryCreationError)?;
        }
        debug!("Filesystem backend rooted at {}", root.display());
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_in(&self, dir: &str, key: &str) -> BackendResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(dir).join(key))
    }

    /// Writes `data` to a staging file and renames it over `target`
    fn write_atomically(&self, target: &Path, data: &[u8]) -> BackendResult<()> {
        let staging = self.root.join(TMP_DIR).join(Uuid::new_v4().to_string());
        fs::write(&staging, data).map_err(BackendError::FileWriteError)?;
        fs::rename(&staging, target).map_err(|e| {
            // Best effort, the staging area is never listed
            let _ = fs::remove_file(&staging);
            BackendError::FileWriteError(e)
        })
    }
}

// Keys become file names, so anything that could escape the directory is refused
fn validate_key(key: &str) -> BackendResult<()> {
    if key.is_empty() || key.starts_with('.') || key.contains(['/', '\\', '\0']) {
        return Err(BackendError::InvalidKey(key.to_string()));
    }
    Ok(())
}

impl ObjectStore for FilesystemBackend {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> BackendResult<()> {
        let body_path = self.path_in(OBJECTS_DIR, key)?;
        let type_path = self.path_in(CONTENT_TYPES_DIR, key)?;

        self.write_atomically(&type_path, content_type.as_bytes())?;
        self.write_atomically(&body_path, body)?;
        trace!("Wrote {} bytes to {}", body.len(), body_path.display());
        Ok(())
    }

    fn get(&self, key: &str) -> BackendResult<Blob> {
        let body_path = self.path_in(OBJECTS_DIR, key)?;
        let body = fs::read(&body_path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackendError::ObjectNotFound(key.to_string()),
            _ => BackendError::FileReadError(e),
        })?;

        let content_type = match fs::read_to_string(self.path_in(CONTENT_TYPES_DIR, key)?) {
            Ok(content_type) => content_type,
            Err(e) if e.kind() == ErrorKind::NotFound => FALLBACK_CONTENT_TYPE.to_string(),
            Err(e) => return Err(BackendError::FileReadError(e)),
        };

        Ok(Blob { body, content_type })
    }

    fn list(&self) -> BackendResult<Vec<String>> {
        let entries =
            fs::read_dir(self.root.join(OBJECTS_DIR)).map_err(BackendError::DirectoryReadError)?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(BackendError::DirectoryReadError)?;
            let is_file = entry
                .file_type()
                .map_err(BackendError::DirectoryReadError)?
                .is_file();
            // Stray files (dotfiles, editor swap files) are not objects `get` would serve
            match entry.file_name().to_str() {
                Some(name) if is_file && validate_key(name).is_ok() => keys.push(name.to_string()),
                _ => trace!("Skipping {}", entry.path().display()),
            }
        }

        keys.sort();
        Ok(keys)
    }
}

impl IndexStore for FilesystemBackend {
    fn put_item(&self, id: &NoteId) -> BackendResult<()> {
        let marker = self.path_in(INDEX_DIR, id.as_str())?;
        fs::write(&marker, b"").map_err(BackendError::FileWriteError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backend() -> (TempDir, FilesystemBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path().join("notes")).unwrap();
        (dir, backend)
    }

    #[test]
    fn put_then_get_keeps_content_type() {
        let (_dir, fs_backend) = backend();
        fs_backend.put("a.html", b"", "text/html").unwrap();

        let blob = fs_backend.get("a.html").unwrap();
        assert!(blob.body.is_empty());
        assert_eq!(blob.content_type, "text/html");
    }

    #[test]
    fn put_overwrites_whole_body() {
        let (_dir, fs_backend) = backend();
        fs_backend.put("a.html", b"<p>long first body</p>", "text/html").unwrap();
        fs_backend.put("a.html", b"<p>x</p>", "text/html").unwrap();

        assert_eq!(fs_backend.get("a.html").unwrap().body, b"<p>x</p>");
    }

    #[test]
    fn list_only_sees_objects() {
        let (_dir, fs_backend) = backend();
        fs_backend.put("b.html", b"b", "text/html").unwrap();
        fs_backend.put("a.html", b"a", "text/html").unwrap();
        fs_backend.put_item(&NoteId::from("c")).unwrap();

        assert_eq!(fs_backend.list().unwrap(), vec!["a.html", "b.html"]);
        assert!(fs_backend.root().join("index").join("c").exists());
    }

    #[test]
    fn list_skips_files_get_would_refuse() {
        let (_dir, fs_backend) = backend();
        fs_backend.put("a.html", b"a", "text/html").unwrap();
        let objects = fs_backend.root().join("objects");
        fs::write(objects.join(".DS_Store"), b"junk").unwrap();
        fs::write(objects.join(".a.html.swp"), b"junk").unwrap();

        let keys = fs_backend.list().unwrap();
        assert_eq!(keys, vec!["a.html"]);
        for key in &keys {
            assert!(fs_backend.get(key).is_ok());
        }
    }

    #[test]
    fn rejects_keys_that_leave_the_root() {
        let (_dir, fs_backend) = backend();
        for key in ["../escape.html", "a/b.html", ".hidden", ""] {
            assert!(matches!(
                fs_backend.put(key, b"x", "text/html"),
                Err(BackendError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn missing_object_is_not_found() {
        let (_dir, fs_backend) = backend();
        assert!(matches!(
            fs_backend.get("nope.html"),
            Err(BackendError::ObjectNotFound(_))
        ));
    }
}
