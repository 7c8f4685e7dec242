use quicknotez::backends::{FilesystemBackend, SqliteBackend};
use quicknotez::contract::SaveNoteRequest;
use quicknotez::setup::arguments::{Backend, open_backend};
use quicknotez::{Note, NoteService};
use std::path::Path;

fn service_at(backend: Backend, path: &Path) -> NoteService {
    let (objects, index) = open_backend(backend, path).unwrap();
    NoteService::new(objects, index)
}

fn create_save_list(service: &NoteService) -> Note {
    let id = service.create().unwrap().id;
    assert_eq!(service.list_all().unwrap()[0].content, "");

    service
        .save(SaveNoteRequest {
            id: id.clone(),
            content: "<p>hi</p>".to_string(),
        })
        .unwrap();

    let notes = service.list_all().unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, id);
    assert_eq!(notes[0].content, "<p>hi</p>");
    notes[0].clone()
}

#[test]
fn sqlite_notes_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.db");

    let saved = create_save_list(&service_at(Backend::Sqlite, &path));

    let reopened = service_at(Backend::Sqlite, &path);
    assert_eq!(reopened.list_all().unwrap(), vec![saved]);
    assert_eq!(SqliteBackend::new(&path).unwrap().index_len().unwrap(), 1);
}

#[test]
fn filesystem_notes_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("notes");

    let saved = create_save_list(&service_at(Backend::Filesystem, &root));

    let reopened = service_at(Backend::Filesystem, &root);
    assert_eq!(reopened.list_all().unwrap(), vec![saved.clone()]);
    assert!(
        FilesystemBackend::new(&root)
            .unwrap()
            .root()
            .join("index")
            .join(saved.id.as_str())
            .exists()
    );
}

#[test]
fn filesystem_rejects_ids_that_escape_the_root() {
    let dir = tempfile::tempdir().unwrap();
    let service = service_at(Backend::Filesystem, &dir.path().join("notes"));

    let err = service
        .save(SaveNoteRequest {
            id: "../../etc/passwd".into(),
            content: String::new(),
        })
        .unwrap_err();
    assert!(err.is_write());
}
