//! Structured log output of a failed attempt.
//!
//! Installs the global subscriber, so this binary holds a single test.

mod common;

use std::sync::Arc;

use common::{service, wait_for};
use tasks_enrich::logging;
use tasks_enrich::{
    init_tracing, ChangeNotification, EnrichConfig, EnrichmentEvent, LogConfig, LogFormat,
};
use tasks_inference::mock::MockInferenceClient;
use tasks_store::MemoryStore;

#[tokio::test]
async fn test_failed_attempt_logged_as_json_with_record_fields() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig::default()
        .with_format(LogFormat::Json)
        .with_file(dir.path().join("enrich.log"));
    let guard = init_tracing(&config)
        .unwrap()
        .expect("file logging returns a guard");

    let store = MemoryStore::new();
    let ids = store.insert_tasks(["remind me tomorrow"]).unwrap();
    let client = Arc::new(MockInferenceClient::new().with_failure("remind me tomorrow", "dns lookup failed"));
    let service = service(&store, client, EnrichConfig::default());
    let mut events = service.events();

    service
        .observer()
        .on_change(&ChangeNotification::modified("Task", vec![0]));
    wait_for(&mut events, EnrichmentEvent::is_terminal).await;

    // Flushes the non-blocking writer.
    drop(guard);

    let mut contents = String::new();
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let entry = entry.unwrap();
        if entry.file_name().to_string_lossy().starts_with("enrich.log") {
            contents.push_str(&std::fs::read_to_string(entry.path()).unwrap());
        }
    }

    let line = contents
        .lines()
        .find(|l| l.contains("Enrichment failed"))
        .expect("failure should be logged");
    let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
    let fields = &parsed["fields"];

    assert_eq!(parsed["level"], "ERROR");
    assert_eq!(fields[logging::RECORD_ID], ids[0].to_string());
    assert_eq!(fields[logging::FAILURE_KIND], "request");
    assert!(fields[logging::ERROR_MSG]
        .as_str()
        .unwrap()
        .contains("dns lookup failed"));
}
