use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Contract tests for `launchseq start`

fn launchseq() -> Command {
    let mut cmd = Command::cargo_bin("launchseq").unwrap();
    cmd.env_remove("LAUNCHSEQ_CONFIG")
        .env_remove("LAUNCH_PORT")
        .env_remove("LAUNCH_HOST")
        .env_remove("API_PORT")
        .env_remove("API_HOST");
    cmd
}

fn write_launch(dir: &TempDir, content: &str) {
    fs::write(dir.path().join("launch.toml"), content).unwrap();
}

#[cfg(unix)]
#[test]
fn test_start_runs_stages_in_order() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[launch]
name = "contract"

[initializer]
command = "echo init-ran"

[worker]
command = "true"

[server]
command = "echo server-on-{host}-{port}"
port = 8123
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"(?s)Initializing database\.\.\..*init-ran.*Starting Celery worker in background\.\.\..*Starting FastAPI application\.\.\..*server-on-0\.0\.0\.0-8123",
        ).unwrap());
}

#[cfg(unix)]
#[test]
fn test_start_exit_status_comes_from_server() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[initializer]
command = "true"

[worker]
enabled = false

[server]
command = "exit 7"
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .arg("start")
        .assert()
        .code(7);
}

#[cfg(unix)]
#[test]
fn test_start_continues_after_failed_initializer() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[initializer]
command = "exit 3"

[worker]
enabled = false

[server]
command = "echo server-started"
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("server-started"));
}

#[cfg(unix)]
#[test]
fn test_start_strict_aborts_on_failed_initializer() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[initializer]
command = "exit 3"

[worker]
command = "true"

[server]
command = "echo server-started"
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .args(["start", "--strict"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Initializing database..."))
        .stdout(predicate::str::contains("Starting FastAPI application...").not())
        .stderr(predicate::str::contains("initializer"));
}

#[cfg(unix)]
#[test]
fn test_start_abort_policy_from_launch_file() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[launch]
on_init_failure = "abort"

[initializer]
command = "exit 5"

[server]
command = "echo server-started"
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .arg("start")
        .assert()
        .code(5)
        .stdout(predicate::str::contains("server-started").not());
}

#[cfg(unix)]
#[test]
fn test_start_skip_flags() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[initializer]
command = "echo init-ran"

[worker]
command = "true"

[server]
command = "echo server-started"
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .args(["start", "--skip-init", "--skip-worker"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init-ran").not())
        .stdout(predicate::str::contains("Starting Celery worker").not())
        .stdout(predicate::str::contains("server-started"));
}

#[cfg(unix)]
#[test]
fn test_start_exports_launch_environment() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[launch]
name = "event-images"

[env]
SHARED = "from-env-table"

[initializer]
command = "true"

[worker]
enabled = false

[server]
command = 'echo "stage=$LAUNCH_STAGE app=$LAUNCH_APP_NAME port=$LAUNCH_PORT shared=$SHARED"'
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .args(["start", "--port", "9001"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "stage=server app=event-images port=9001 shared=from-env-table",
        ));
}

#[cfg(unix)]
#[test]
fn test_start_creates_directories_in_workdir() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[launch]
workdir = "app"

[initializer]
command = "true"

[worker]
enabled = false

[server]
command = "ls"
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("uploads"))
        .stdout(predicate::str::contains("temp"));

    assert!(temp_dir.path().join("app/uploads").is_dir());
    assert!(temp_dir.path().join("app/temp").is_dir());
}

#[test]
fn test_start_rejects_invalid_launch_file() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, "[server]\nport = 0\n");

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .arg("start")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("port"));
}

#[test]
fn test_start_missing_explicit_config() {
    let temp_dir = TempDir::new().unwrap();

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .args(["--config", "missing.toml", "start"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("not found"));
}

#[cfg(unix)]
#[test]
fn test_start_falls_back_to_application_bind_variables() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, r#"
[initializer]
command = "true"

[worker]
enabled = false

[server]
command = "echo bind={host}:{port}"
"#);

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .env("API_PORT", "9100")
        .env("API_HOST", "127.0.0.1")
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("bind=127.0.0.1:9100"));

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .env("API_PORT", "9100")
        .env("LAUNCH_PORT", "9200")
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("bind=0.0.0.0:9200"));
}

#[test]
fn test_start_rejects_misspelled_stage_key() {
    let temp_dir = TempDir::new().unwrap();
    write_launch(&temp_dir, "[initializer]\ncomand = \"echo mine\"\n");

    let mut cmd = launchseq();
    cmd.current_dir(&temp_dir)
        .arg("start")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("comand"));
}
