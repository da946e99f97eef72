//! Config store seeded from a settings file and shared across threads.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use hostkit::{settings, AppError, ConfigStore};
use serde_json::json;
use tempfile::NamedTempFile;

const SETTINGS: &str = r#"
[host]
log_level = "debug"

[namespaces.default]
port = 8888
exfil_dir = "/tmp/out"

[namespaces.payloads]
standard = ["sandcat.go"]
"#;

fn seeded_store() -> ConfigStore {
    let mut f = NamedTempFile::new().unwrap();
    f.write_all(SETTINGS.as_bytes()).unwrap();
    let s = settings::load_from(f.path(), None).unwrap();
    ConfigStore::from_settings(&s).unwrap()
}

#[test]
fn settings_namespaces_are_applied() {
    let store = seeded_store();
    assert_eq!(store.namespaces().unwrap(), vec!["default", "payloads"]);
    assert_eq!(store.get(Some("port"), None).unwrap(), Some(json!(8888)));
    assert_eq!(
        store.get(Some("standard"), Some("payloads")).unwrap(),
        Some(json!(["sandcat.go"]))
    );
    assert_eq!(store.get(Some("missing"), Some("payloads")).unwrap(), None);
    assert!(matches!(
        store.get(None, Some("agents")),
        Err(AppError::ConfigNotFound(_))
    ));
}

#[test]
fn optional_overrides_do_not_erase() {
    let store = seeded_store();
    let cli_port: Option<u16> = None;
    store.set("default", "port", cli_port.map(|p| json!(p))).unwrap();
    assert_eq!(store.property("port", None).unwrap(), Some(json!(8888)));

    store.set("default", "port", Some(json!(9999))).unwrap();
    assert_eq!(store.property("port", None).unwrap(), Some(json!(9999)));
}

#[test]
fn shared_store_across_threads() {
    let store = Arc::new(seeded_store());
    let writers: Vec<_> = (0..4)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                store
                    .set("default", &format!("worker_{i}"), Some(json!(i)))
                    .unwrap();
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }
    let props = store.properties(None).unwrap();
    for i in 0..4 {
        assert_eq!(props[&format!("worker_{i}")], json!(i));
    }
    assert_eq!(props["port"], json!(8888));
}
