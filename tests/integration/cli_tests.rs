//! Tests that drive the compiled `flagstrip` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const SERVICE: &str = "if (useUiFlag('archiveProjects')) {\n    archive();\n} else {\n    keep();\n}\n";

/// A temp workspace with a `.git` marker so config discovery stops there.
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join(".git")).unwrap();
    dir
}

fn flagstrip(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flagstrip"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_dry_run_reports_pending_changes() {
    let dir = workspace();
    fs::write(dir.path().join("service.ts"), SERVICE).unwrap();

    let output = flagstrip(dir.path(), &["run", "service.ts", "--flag", "archiveProjects"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Would rewrite"));
    assert_eq!(fs::read_to_string(dir.path().join("service.ts")).unwrap(), SERVICE);
}

#[test]
fn test_apply_rewrites_in_place() {
    let dir = workspace();
    fs::write(dir.path().join("service.ts"), SERVICE).unwrap();

    let output = flagstrip(
        dir.path(),
        &["run", ".", "--flag", "archiveProjects", "--apply"],
    );
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        fs::read_to_string(dir.path().join("service.ts")).unwrap(),
        "archive();\n"
    );

    // Nothing left to do on a second pass.
    let again = flagstrip(dir.path(), &["run", ".", "--flag", "archiveProjects"]);
    assert_eq!(again.status.code(), Some(0));
}

#[test]
fn test_stdout_prints_result() {
    let dir = workspace();
    fs::write(dir.path().join("service.ts"), SERVICE).unwrap();

    let output = flagstrip(
        dir.path(),
        &["run", "service.ts", "--flag", "archiveProjects", "--stdout"],
    );
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "archive();\n");
    assert_eq!(fs::read_to_string(dir.path().join("service.ts")).unwrap(), SERVICE);
}

#[test]
fn test_flag_name_from_config() {
    let dir = workspace();
    fs::write(
        dir.path().join(".flagstrip.toml"),
        "[flag]\nname = \"newNav\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("nav.ts"),
        "if (useUiFlag('newNav')) {\n    nav();\n}\n",
    )
    .unwrap();

    let output = flagstrip(dir.path(), &["run", "nav.ts", "--stdout"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output), "nav();\n");
}

#[test]
fn test_init_creates_config_once() {
    let dir = workspace();

    let output = flagstrip(dir.path(), &["init"]);
    assert_eq!(output.status.code(), Some(0));
    let written = fs::read_to_string(dir.path().join(".flagstrip.toml")).unwrap();
    assert!(written.contains("[flag]"));

    let repeat = flagstrip(dir.path(), &["init"]);
    assert_eq!(repeat.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&repeat.stderr).contains("--force"));

    let forced = flagstrip(dir.path(), &["init", "--force"]);
    assert_eq!(forced.status.code(), Some(0));
}

#[test]
fn test_invalid_config_is_config_error() {
    let dir = workspace();
    fs::write(dir.path().join("bad.toml"), "[flag\nname = ").unwrap();
    fs::write(dir.path().join("service.ts"), SERVICE).unwrap();

    let output = flagstrip(dir.path(), &["--config", "bad.toml", "run", "service.ts"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_missing_path_is_io_error() {
    let dir = workspace();
    let output = flagstrip(dir.path(), &["run", "missing.ts", "--flag", "archiveProjects"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_syntax_error_is_parse_failure() {
    let dir = workspace();
    fs::write(dir.path().join("broken.ts"), "if (useUiFlag('archiveProjects') {\n").unwrap();

    let output = flagstrip(dir.path(), &["run", "broken.ts", "--flag", "archiveProjects"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("broken.ts"));
}
