use super::*;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect::<HashMap<_, _>>();
    move |key| map.get(key).cloned()
}

/// # Safety
/// Tests must run with `--test-threads=1` to avoid env races.
unsafe fn clear_chat_env() {
    unsafe {
        for key in [
            "CHATLINE_STORE",
            "CHATLINE_SESSION_FILE",
            "CHATLINE_POLL_INTERVAL_MS",
            "CHATLINE_REQUEST_TIMEOUT_SECS",
            "CHATLINE_CONNECT_TIMEOUT_SECS",
            "FIRESTORE_PROJECT_ID",
            "FIRESTORE_DATABASE",
            "FIRESTORE_API_KEY",
            "FIRESTORE_BASE_URL",
        ] {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn defaults_to_memory_store_with_default_session_file() {
    let cfg = ChatConfig::from_lookup(lookup_from(&[])).unwrap();
    assert_eq!(cfg.store, StoreKind::Memory);
    assert_eq!(cfg.firestore, None);
    assert_eq!(cfg.session_file, default_session_file());
}

#[test]
fn firestore_defaults() {
    let cfg = ChatConfig::from_lookup(lookup_from(&[
        ("CHATLINE_STORE", "firestore"),
        ("FIRESTORE_PROJECT_ID", "demo"),
    ]))
    .unwrap();
    assert_eq!(cfg.store, StoreKind::Firestore);
    let fs = cfg.firestore.unwrap();
    assert_eq!(fs.project_id, "demo");
    assert_eq!(fs.database, DEFAULT_FIRESTORE_DATABASE);
    assert_eq!(fs.api_key, None);
    assert_eq!(fs.base_url, DEFAULT_FIRESTORE_BASE_URL);
    assert_eq!(fs.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert_eq!(
        fs.timeouts,
        StoreTimeouts { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    );
}

#[test]
fn firestore_overrides() {
    let cfg = ChatConfig::from_lookup(lookup_from(&[
        ("CHATLINE_STORE", "Firestore"),
        ("FIRESTORE_PROJECT_ID", "demo"),
        ("FIRESTORE_DATABASE", "chat"),
        ("FIRESTORE_API_KEY", "k-123"),
        ("FIRESTORE_BASE_URL", "http://localhost:8080/v1/"),
        ("CHATLINE_POLL_INTERVAL_MS", "250"),
        ("CHATLINE_REQUEST_TIMEOUT_SECS", "42"),
        ("CHATLINE_CONNECT_TIMEOUT_SECS", "7"),
    ]))
    .unwrap();
    let fs = cfg.firestore.unwrap();
    assert_eq!(fs.database, "chat");
    assert_eq!(fs.api_key.as_deref(), Some("k-123"));
    assert_eq!(fs.base_url, "http://localhost:8080/v1");
    assert_eq!(fs.poll_interval_ms, 250);
    assert_eq!(fs.timeouts, StoreTimeouts { request_secs: 42, connect_secs: 7 });
}

#[test]
fn unparsable_numbers_fall_back_to_defaults() {
    let cfg = ChatConfig::from_lookup(lookup_from(&[
        ("CHATLINE_STORE", "firestore"),
        ("FIRESTORE_PROJECT_ID", "demo"),
        ("CHATLINE_POLL_INTERVAL_MS", "soon"),
    ]))
    .unwrap();
    assert_eq!(cfg.firestore.unwrap().poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
}

#[test]
fn firestore_without_project_errors() {
    let err = ChatConfig::from_lookup(lookup_from(&[("CHATLINE_STORE", "firestore")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing { var: "FIRESTORE_PROJECT_ID".into() });
}

#[test]
fn unknown_store_errors() {
    let err = ChatConfig::from_lookup(lookup_from(&[("CHATLINE_STORE", "redis")]))
        .unwrap_err()
        .to_string();
    assert!(err.contains("unknown store 'redis'"));
}

#[test]
fn empty_session_file_disables_persistence() {
    let cfg = ChatConfig::from_lookup(lookup_from(&[("CHATLINE_SESSION_FILE", "")])).unwrap();
    assert_eq!(cfg.session_file, None);
}

#[test]
fn explicit_session_file_is_used() {
    let cfg = ChatConfig::from_lookup(lookup_from(&[("CHATLINE_SESSION_FILE", "/tmp/chat.json")])).unwrap();
    assert_eq!(cfg.session_file, Some(PathBuf::from("/tmp/chat.json")));
}

#[test]
fn open_store_rejects_firestore_without_settings() {
    let cfg = ChatConfig { store: StoreKind::Firestore, firestore: None, session_file: None };
    assert!(matches!(cfg.open_store(), Err(StoreError::Unavailable(_))));
}

#[test]
fn open_storage_uses_file_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.json");
    let cfg = ChatConfig { store: StoreKind::Memory, firestore: None, session_file: Some(path.clone()) };
    let storage = cfg.open_storage();
    storage.set_item("k", "v").unwrap();
    assert!(path.exists());
}

#[test]
fn from_env_reads_process_environment() {
    unsafe {
        clear_chat_env();
        std::env::set_var("CHATLINE_STORE", "firestore");
        std::env::set_var("FIRESTORE_PROJECT_ID", "env-project");
        std::env::set_var("CHATLINE_SESSION_FILE", "");
    }

    let cfg = ChatConfig::from_env().unwrap();
    assert_eq!(cfg.firestore.unwrap().project_id, "env-project");
    assert_eq!(cfg.session_file, None);

    unsafe { clear_chat_env() };
}
