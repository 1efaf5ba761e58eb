use super::*;
use serde::Deserialize;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Draft {
    name: String,
}

fn draft(name: &str) -> Draft {
    Draft { name: name.to_owned() }
}

// =============================================================
// MemoryStorage
// =============================================================

#[test]
fn memory_storage_set_get_remove() {
    let storage = MemoryStorage::new();
    assert_eq!(storage.get_item("k").unwrap(), None);

    storage.set_item("k", "v").unwrap();
    assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));

    storage.remove_item("k").unwrap();
    assert_eq!(storage.get_item("k").unwrap(), None);
}

#[test]
fn memory_storage_remove_absent_key_is_ok() {
    let storage = MemoryStorage::new();
    assert!(storage.remove_item("missing").is_ok());
}

// =============================================================
// load_json / save_json
// =============================================================

#[test]
fn load_json_absent_key_is_none() {
    let storage = MemoryStorage::new();
    let loaded: Option<Draft> = load_json(&storage, "draft").unwrap();
    assert!(loaded.is_none());
}

#[test]
fn save_then_load_json() {
    let storage = MemoryStorage::new();
    save_json(&storage, "draft", &draft("Alice")).unwrap();
    let loaded: Option<Draft> = load_json(&storage, "draft").unwrap();
    assert_eq!(loaded, Some(draft("Alice")));
}

#[test]
fn load_json_corrupt_value_is_error() {
    let storage = MemoryStorage::new();
    storage.set_item("draft", "{not json").unwrap();
    let err = load_json::<Draft>(&storage, "draft").unwrap_err();
    assert!(matches!(err, StorageError::Json(_)));
}

// =============================================================
// FileStorage
// =============================================================

#[test]
fn file_storage_missing_file_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("session.json"));
    assert_eq!(storage.get_item("k").unwrap(), None);
}

#[test]
fn file_storage_persists_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("session.json");

    FileStorage::new(&path).set_item("currentUser", "{\"id\":\"u1\"}").unwrap();

    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get_item("currentUser").unwrap().as_deref(), Some("{\"id\":\"u1\"}"));
}

#[test]
fn file_storage_remove_keeps_other_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("session.json"));
    storage.set_item("a", "1").unwrap();
    storage.set_item("b", "2").unwrap();

    storage.remove_item("a").unwrap();

    assert_eq!(storage.get_item("a").unwrap(), None);
    assert_eq!(storage.get_item("b").unwrap().as_deref(), Some("2"));
}

#[test]
fn file_storage_corrupt_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();
    let storage = FileStorage::new(&path);
    assert!(matches!(storage.get_item("k"), Err(StorageError::Json(_))));
}
