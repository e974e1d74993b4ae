#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn offsync(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("offsync").unwrap();
    cmd.env("OFFSYNC_HOME", dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn pending(dir: &TempDir) -> u64 {
    let out = offsync(dir)
        .args(["--offline", "status", "-o", "json"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    value["pending"].as_u64().unwrap()
}

// ---------------------------------------------------------------------------
// submit
// ---------------------------------------------------------------------------

#[test]
fn submit_offline_queues_the_form() {
    let dir = TempDir::new().unwrap();

    offsync(&dir)
        .args(["--offline", "submit", "Ada", "Lovelace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queued"));

    assert_eq!(pending(&dir), 1);
    assert!(dir.path().join("offsync.db").exists());
    assert!(!dir.path().join("outbox.jsonl").exists());
}

#[test]
fn submit_online_delivers_immediately() {
    let dir = TempDir::new().unwrap();

    offsync(&dir)
        .args(["--online", "submit", "Ada", "Lovelace"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent successfully"));

    assert_eq!(pending(&dir), 0);
    let outbox = std::fs::read_to_string(dir.path().join("outbox.jsonl")).unwrap();
    assert!(outbox.contains("Form submission : Ada Lovelace"));
}

#[test]
fn submit_blank_name_fails() {
    let dir = TempDir::new().unwrap();

    offsync(&dir)
        .args(["--offline", "submit", "Ada", " "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("firstname and lastname"));

    assert_eq!(pending(&dir), 0);
}

// ---------------------------------------------------------------------------
// sync
// ---------------------------------------------------------------------------

#[test]
fn sync_online_delivers_queued_forms() {
    let dir = TempDir::new().unwrap();
    offsync(&dir)
        .args(["--offline", "submit", "Ada", "Lovelace"])
        .assert()
        .success();
    offsync(&dir)
        .args(["--offline", "submit", "Grace", "Hopper"])
        .assert()
        .success();

    offsync(&dir)
        .args(["--online", "sync", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"delivered\": 2"));

    assert_eq!(pending(&dir), 0);
    offsync(&dir)
        .args(["outbox"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Grace Hopper"));
}

#[test]
fn sync_offline_fails_and_keeps_pile() {
    let dir = TempDir::new().unwrap();
    offsync(&dir)
        .args(["--offline", "submit", "Ada", "Lovelace"])
        .assert()
        .success();

    offsync(&dir)
        .args(["--offline", "sync"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("offline"));

    assert_eq!(pending(&dir), 1);
}

#[test]
fn sync_empty_pile_has_nothing_to_do() {
    let dir = TempDir::new().unwrap();

    offsync(&dir)
        .args(["--online", "sync"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to sync."));
}

// ---------------------------------------------------------------------------
// enqueue / list / purge
// ---------------------------------------------------------------------------

#[test]
fn enqueue_unknown_action_fails() {
    let dir = TempDir::new().unwrap();

    offsync(&dir)
        .args(["enqueue", "unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("action not registered: unknown"));

    assert_eq!(pending(&dir), 0);
}

#[test]
fn list_data_only_prints_payloads() {
    let dir = TempDir::new().unwrap();
    offsync(&dir)
        .args([
            "--offline",
            "enqueue",
            "send_form",
            "-d",
            r#"{"firstname":"Ada","lastname":"Lovelace"}"#,
        ])
        .assert()
        .success();

    let out = offsync(&dir)
        .args(["--offline", "list", "--data-only", "-o", "json"])
        .output()
        .unwrap();
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    assert_eq!(
        value,
        serde_json::json!([{"firstname": "Ada", "lastname": "Lovelace"}])
    );
}

#[test]
fn purge_removes_queued_forms() {
    let dir = TempDir::new().unwrap();
    offsync(&dir)
        .args(["--offline", "submit", "Ada", "Lovelace"])
        .assert()
        .success();

    offsync(&dir)
        .args(["--offline", "purge", "send_form"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 queued actions"));

    assert_eq!(pending(&dir), 0);
}

#[test]
fn config_can_force_offline_mode() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yaml"), "network:\n  mode: offline\n").unwrap();

    offsync(&dir)
        .args(["submit", "Ada", "Lovelace", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"queued\""));

    assert_eq!(pending(&dir), 1);
}

#[test]
fn completions_do_not_touch_data_dir() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home");
    Command::cargo_bin("offsync")
        .unwrap()
        .env("OFFSYNC_HOME", &home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("offsync"));

    assert!(!home.exists());
}

#[test]
fn outbox_reads_without_opening_the_pile() {
    let dir = TempDir::new().unwrap();
    let home = dir.path().join("home");
    Command::cargo_bin("offsync")
        .unwrap()
        .env("OFFSYNC_HOME", &home)
        .env("NO_COLOR", "1")
        .args(["outbox"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Outbox (0 posts)"));

    assert!(!home.exists());
}
