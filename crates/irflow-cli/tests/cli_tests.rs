use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PLAYBOOK: &str = r#"{
    "name": "ransomware",
    "title": "Ransomware response",
    "phases": [
        {"name": "contain", "title": "Contain", "steps": [
            {"name": "isolate", "title": "Isolate infected hosts", "estimated_minutes": 15},
            {"name": "notify", "title": "Notify stakeholders", "required": false}
        ]},
        {"name": "recover", "title": "Recover", "steps": [
            {"name": "restore", "title": "Restore from backup", "depends_on": ["isolate"]}
        ]}
    ]
}"#;

struct TestEnv {
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory");
        let db_path = temp_dir.path().join("cli_test.db");
        Self {
            _temp_dir: temp_dir,
            db_path,
        }
    }

    /// A command with --no-color, the test database and analyst alice
    fn cmd(&self) -> Command {
        self.cmd_as("alice")
    }

    fn cmd_as(&self, analyst: &str) -> Command {
        let mut cmd = Command::cargo_bin("irf").expect("Failed to find irf binary");
        cmd.env_remove("IRFLOW_SERVER")
            .env_remove("IRFLOW_TOKEN")
            .args(["--no-color", "--analyst", analyst, "--database-file"])
            .arg(&self.db_path);
        cmd
    }

    fn import_playbook(&self) {
        let file = self.db_path.with_file_name("ransomware.json");
        std::fs::write(&file, PLAYBOOK).expect("Failed to write playbook file");
        self.cmd()
            .args(["playbook", "import"])
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("Imported playbook 'ransomware'"));
    }

    fn trigger(&self, incident: &str) {
        self.cmd()
            .args(["flow", "trigger", "ransomware", incident])
            .assert()
            .success();
    }

    fn step(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.cmd().arg("step").args(args).assert()
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("Failed to write file");
    path
}

#[test]
fn test_cli_import_and_list_playbooks() {
    let env = TestEnv::new();

    env.cmd()
        .args(["playbook", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No playbooks found."));

    env.import_playbook();

    env.cmd()
        .args(["pb", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "- **ransomware**: Ransomware response (2 phases, 3 steps)",
        ));

    env.cmd()
        .args(["playbook", "show", "ransomware"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Ransomware response (ransomware)"))
        .stdout(predicate::str::contains("after isolate"));
}

#[test]
fn test_cli_import_invalid_playbook() {
    let env = TestEnv::new();
    let file = write_file(
        env.db_path.parent().unwrap(),
        "broken.json",
        r#"{"name": "broken", "title": "Broken", "phases": [
            {"name": "a", "title": "A", "steps": [
                {"name": "x", "title": "X", "depends_on": ["missing"]}
            ]}
        ]}"#,
    );

    env.cmd()
        .args(["playbook", "import"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid playbook"));
}

#[test]
fn test_cli_trigger_flow() {
    let env = TestEnv::new();
    env.import_playbook();

    env.cmd()
        .args(["flow", "trigger", "ransomware", "INC-100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Triggered flow 1 for incident INC-100"))
        .stdout(predicate::str::contains("- Started by: alice"))
        .stdout(predicate::str::contains("- Progress: 0% (0/3 steps, in progress)"));

    // Second in-flight flow for the same incident is refused
    env.cmd()
        .args(["flow", "trigger", "ransomware", "INC-100"])
        .assert()
        .failure();
}

#[test]
fn test_cli_trigger_unknown_playbook() {
    let env = TestEnv::new();

    env.cmd()
        .args(["flow", "trigger", "ddos", "INC-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Playbook 'ddos' not found"));
}

#[test]
fn test_cli_step_lifecycle() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-7");

    // Dependencies are checked before anything is written
    env.step(&["start", "1", "restore"]).failure();

    env.step(&["start", "1", "isolate"])
        .success()
        .stdout(predicate::str::contains("- start isolate"));

    env.step(&["complete", "1", "isolate", "--output", r#"{"hosts": 4}"#])
        .success()
        .stdout(predicate::str::contains("\"hosts\": 4"));

    env.step(&["skip", "1", "notify", "--reason", "after hours"])
        .success()
        .stdout(predicate::str::contains("- Skipped: after hours"));

    env.cmd()
        .args(["flow", "next", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next step:"))
        .stdout(predicate::str::contains("### restore"));
}

#[test]
fn test_cli_step_rejects_invalid_json() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-7");
    env.step(&["start", "1", "isolate"]).success();

    env.step(&["complete", "1", "isolate", "--output", "{hosts"])
        .failure()
        .stderr(predicate::str::contains("--output must be valid JSON"));
}

#[test]
fn test_cli_approval_records_analyst() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-8");

    env.step(&["start", "1", "isolate"]).success();
    env.step(&["await-approval", "1", "isolate"])
        .success()
        .stdout(predicate::str::contains("Waiting for Approval"));
    env.step(&["approve", "1", "isolate", "--note", "go ahead"])
        .success()
        .stdout(predicate::str::contains("\"approved_by\": \"alice\""));
}

#[test]
fn test_cli_pause_blocks_step_actions() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-9");

    env.cmd()
        .args(["flow", "pause", "1", "--reason", "waiting on legal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Status: paused"))
        .stdout(predicate::str::contains("- Reason: waiting on legal"));

    env.step(&["start", "1", "isolate"])
        .failure()
        .stderr(predicate::str::contains("step actions require an active flow"));

    env.cmd()
        .args(["flow", "resume", "1", "--reason", "cleared"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- Status: active"));
}

#[test]
fn test_cli_commit_flow() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-11");

    let commit = [
        "flow",
        "commit",
        "1",
        "--report",
        "Hosts restored",
        "--disposition",
        "resolved",
    ];

    env.cmd().args(commit).assert().failure();

    env.step(&["start", "1", "isolate"]).success();
    env.step(&["complete", "1", "isolate"]).success();
    env.step(&["skip", "1", "notify", "--reason", "n/a"]).success();
    env.step(&["start", "1", "restore"]).success();
    env.step(&["complete", "1", "restore"]).success();

    env.cmd()
        .args(commit)
        .assert()
        .success()
        .stdout(predicate::str::contains("- Status: completed"))
        .stdout(predicate::str::contains("## Final Report"))
        .stdout(predicate::str::contains("Hosts restored"));

    // Completed flows drop out of the default listing
    env.cmd()
        .args(["flow", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No flows found."));
    env.cmd()
        .args(["flow", "list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## Flow 1: ransomware for INC-11 (2/3)"));
}

#[test]
fn test_cli_progress() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-12");
    env.step(&["start", "1", "isolate"]).success();
    env.step(&["complete", "1", "isolate"]).success();

    env.cmd()
        .args(["flow", "progress", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Flow 1 for INC-12: 33%"))
        .stdout(predicate::str::contains("- Contain: 50% (1/2)"));
}

#[test]
fn test_cli_show_flow_by_incident() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-13");

    env.cmd()
        .args(["flow", "show", "--incident", "INC-13"])
        .assert()
        .success()
        .stdout(predicate::str::contains("# Flow 1: ransomware"));

    env.cmd()
        .args(["flow", "show", "99999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Flow 99999 not found"));
}

#[test]
fn test_cli_dashboard_is_default_command() {
    let env = TestEnv::new();

    env.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("# Flows in flight"))
        .stdout(predicate::str::contains("No flows found."));

    env.import_playbook();
    env.trigger("INC-14");

    env.cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Steps: 3 pending"))
        .stdout(predicate::str::contains("## Flow 1: ransomware for INC-14"));

    // Another analyst only sees their own flows
    env.cmd_as("bob")
        .assert()
        .success()
        .stdout(predicate::str::contains("No flows found."))
        .stdout(predicate::str::contains("INC-14").not());
}

#[test]
fn test_cli_wait_times_out() {
    let env = TestEnv::new();
    env.import_playbook();
    env.trigger("INC-15");

    env.cmd()
        .args([
            "flow",
            "wait",
            "1",
            "completed",
            "--attempts",
            "2",
            "--interval",
            "0",
        ])
        .assert()
        .failure();

    env.cmd()
        .args(["flow", "wait", "1", "active", "--attempts", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Success: Flow 1 is active"));
}

#[test]
fn test_cli_help_output() {
    Command::cargo_bin("irf")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("playbook"))
        .stdout(predicate::str::contains("flow"))
        .stdout(predicate::str::contains("step"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn test_cli_step_help() {
    Command::cargo_bin("irf")
        .unwrap()
        .args(["step", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("await-input"))
        .stdout(predicate::str::contains("approve"))
        .stdout(predicate::str::contains("reject"));
}

#[test]
fn test_cli_version_output() {
    Command::cargo_bin("irf")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("irf "));
}

#[test]
fn test_cli_watch_requires_endpoint() {
    let env = TestEnv::new();

    env.cmd()
        .arg("watch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("watch needs --feed-url or --server"));
}
