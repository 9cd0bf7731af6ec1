//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary against a throwaway data directory and
//! verify its JSON output.

use std::path::Path;
use std::process::Command;

use serde_json::Value;

const PLAN: &str = "\
# Push Day
Bench Press 2x8-12 @ 60kg [chest] rest 45
Dips 1xAMRAP [triceps] rest 30 after_exercise
";

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_liftroom"))
        .args(args)
        .env("LIFTROOM_DATA_DIR", data_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(data_dir: &Path, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(data_dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("{args:?} printed non-JSON ({e}): {stdout}"))
}

fn import_plan(data_dir: &Path) -> Value {
    let file = data_dir.join("push.txt");
    std::fs::write(&file, PLAN).unwrap();
    run_json(data_dir, &["plan", "import", file.to_str().unwrap()])
}

#[test]
fn test_config_defaults_and_set() {
    let dir = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "rest.default_seconds"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "90");

    let (_, _, code) = run_cli(dir.path(), &["config", "set", "rest.default_trigger", "after_exercise"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(dir.path(), &["config", "get", "rest.default_trigger"]);
    assert_eq!(stdout.trim(), "after_exercise");

    let (stdout, _, code) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("sync.surface_file = widget.json"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["config", "set", "rest.nope", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_plan_import_list_show() {
    let dir = tempfile::tempdir().unwrap();
    let plan = import_plan(dir.path());
    assert_eq!(plan["name"], "Push Day");
    assert_eq!(plan["exercises"].as_array().unwrap().len(), 2);

    let list = run_json(dir.path(), &["plan", "list"]);
    assert_eq!(list[0]["total_sets"], 3);

    let shown = run_json(dir.path(), &["plan", "show", "push day"]);
    assert_eq!(shown["id"], plan["id"]);

    run_json(dir.path(), &["plan", "remove", "Push Day"]);
    let list = run_json(dir.path(), &["plan", "list"]);
    assert!(list.as_array().unwrap().is_empty());
}

#[test]
fn test_session_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    import_plan(dir.path());

    let started = run_json(dir.path(), &["session", "start", "Push Day"]);
    assert_eq!(started["type"], "SessionStarted");
    assert_eq!(started["total_sets"], 3);
    assert!(dir.path().join("widget.json").exists());

    let toggled = run_json(dir.path(), &["session", "toggle", "1", "1"]);
    assert_eq!(toggled["type"], "SetToggled");
    assert_eq!(toggled["completion_pct"], 33);
    assert_eq!(toggled["rest_started_secs"], 45);

    let status = run_json(dir.path(), &["session", "status"]);
    assert_eq!(status["phase"], "resting");

    run_json(dir.path(), &["session", "skip-rest"]);
    let queued = run_json(dir.path(), &["session", "remote", "MARK_NEXT_SET"]);
    assert_eq!(queued["queued"], "MARK_NEXT_SET");

    let synced = run_json(dir.path(), &["session", "sync"]);
    let synced = synced.as_array().unwrap();
    assert_eq!(synced.len(), 1);
    assert_eq!(synced[0]["set_number"], 2);

    let widget: Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("widget.json")).unwrap()).unwrap();
    assert_eq!(widget["workout_name"], "Push Day");
    assert_eq!(widget["current_exercise"], "Dips");

    let finished = run_json(dir.path(), &["session", "finish"]);
    assert_eq!(finished["type"], "SessionFinished");
    assert_eq!(finished["completed_sets"], 2);
    assert!(!dir.path().join("widget.json").exists());

    let status = run_json(dir.path(), &["session", "status"]);
    assert_eq!(status["phase"], "idle");

    let history = run_json(dir.path(), &["history", "list"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["completion_pct"], 67);

    let stats = run_json(dir.path(), &["history", "stats"]);
    assert_eq!(stats["total_sessions"], 1);
    assert_eq!(stats["muscle_groups"]["chest"], 2);
}

#[test]
fn test_second_start_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    import_plan(dir.path());
    run_json(dir.path(), &["session", "start", "Push Day"]);

    let (_, stderr, code) = run_cli(dir.path(), &["session", "start", "Push Day"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already active"), "{stderr}");
}

#[test]
fn test_commands_need_an_active_session() {
    let dir = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["session", "pause"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no active workout session"), "{stderr}");
}

#[test]
fn test_toggle_numbers_start_at_one() {
    let dir = tempfile::tempdir().unwrap();
    import_plan(dir.path());
    run_json(dir.path(), &["session", "start", "Push Day"]);
    let (_, stderr, code) = run_cli(dir.path(), &["session", "toggle", "0", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("start at 1"));
}

#[test]
fn test_watch_streams_ticks() {
    let dir = tempfile::tempdir().unwrap();
    import_plan(dir.path());
    run_json(dir.path(), &["session", "start", "Push Day"]);
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "ticker.interval_ms", "100"]);
    assert_eq!(code, 0);

    let (stdout, stderr, code) = run_cli(dir.path(), &["session", "watch", "--seconds", "1"]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.lines().any(|l| l.contains("\"type\":\"Tick\"")), "{stdout}");
}
