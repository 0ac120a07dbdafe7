#![allow(dead_code)]

use irflow_core::{models::Playbook, Tracker, TrackerBuilder};
use tempfile::TempDir;

pub const PHISHING_PLAYBOOK: &str = r#"{
    "name": "phishing",
    "title": "Phishing response",
    "description": "Contain a reported phishing email",
    "phases": [
        {"name": "triage", "title": "Triage", "steps": [
            {"name": "collect", "title": "Collect headers", "step_type": "artifact_collection"},
            {"name": "analyse", "title": "Analyse sender", "step_type": "analysis", "depends_on": ["collect"]}
        ]},
        {"name": "contain", "title": "Containment", "steps": [
            {"name": "block", "title": "Block sender", "depends_on": ["analyse"]},
            {"name": "notify", "title": "Notify users", "step_type": "notification", "required": false}
        ]}
    ]
}"#;

pub fn phishing_playbook() -> Playbook {
    Playbook::from_json(PHISHING_PLAYBOOK).expect("Failed to parse playbook")
}

/// Helper function to create a test tracker backed by a temporary database
pub async fn create_test_tracker() -> (TempDir, Tracker) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let tracker = TrackerBuilder::new()
        .with_database_path(Some(&db_path))
        .build()
        .await
        .expect("Failed to create tracker");
    tracker
        .import_playbook(&phishing_playbook())
        .await
        .expect("Failed to import playbook");
    (temp_dir, tracker)
}
