use std::path::Path;
use std::process::{Command, Output};

fn sortinghat(log_dir: &Path, db_path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sortinghat"))
        .env_remove("SORTINGHAT_DATABASE")
        .env_remove("SORTINGHAT_LOG_LEVEL")
        .env("SORTINGHAT_LOG_DIR", log_dir)
        .arg("-d")
        .arg(db_path)
        .args(["--log-level", "info"])
        .args(args)
        .output()
        .unwrap()
}

fn read_logs(log_dir: &Path) -> String {
    std::fs::read_dir(log_dir)
        .unwrap()
        .map(|entry| std::fs::read_to_string(entry.unwrap().path()).unwrap())
        .collect()
}

#[test]
fn failing_command_leaves_events_in_log_directory() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let db_path = dir.path().join("registry.db");

    let output = sortinghat(&log_dir, &db_path, &["show", "FFFF"]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8(output.stderr).unwrap(),
        "Error: FFFF not found in the registry\n"
    );
    assert!(output.stdout.is_empty());

    let logs = read_logs(&log_dir);
    assert!(logs.contains("event=db_open"), "log file content: {logs:?}");
    assert!(logs.contains("event=cli_exit module=cli status=error code=1"));
}

#[test]
fn successful_command_is_logged_and_prints_report() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    let db_path = dir.path().join("registry.db");

    let output = sortinghat(
        &log_dir,
        &db_path,
        &["add", "--source", "scm", "--email", "jroe@example.com"],
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8(output.stdout)
        .unwrap()
        .starts_with("New identity "));

    let logs = read_logs(&log_dir);
    assert!(logs.contains("event=identity_add module=service status=ok"));
}

#[test]
fn bootstrap_failure_exits_with_code_two() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sortinghat"))
        .env_remove("SORTINGHAT_LOG_DIR")
        .args(["--log-level", "loud", "show"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr)
        .unwrap()
        .starts_with("Error: invalid configuration: unsupported log level"));
}
