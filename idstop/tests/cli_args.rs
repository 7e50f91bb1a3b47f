//! CLI arg parsing tests for idstop
use assert_cmd::Command;

fn idstop() -> Command {
    Command::cargo_bin("idstop").expect("idstop binary")
}

fn run(args: &[&str]) -> (bool, String) {
    let output = idstop().args(args).output().expect("run idstop");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (output.status.success(), text)
}

#[test]
fn test_help_mentions_short_and_long_flags() {
    let (ok, text) = run(&["--help"]);
    assert!(ok, "idstop --help failed\n{text}");
    assert!(
        text.contains("--profile")
            && text.contains("-P")
            && text.contains("--log")
            && text.contains("--dry-run"),
        "help text missing expected flags\n{text}"
    );
}

#[test]
fn test_flags_accepted_before_help() {
    for args in [
        &["--profile", "dev", "--help"][..],
        &["-l", "/tmp/idstop-test.log", "--help"][..],
        &["--save", "--dry-run", "--help"][..],
    ] {
        let (ok, text) = run(args);
        assert!(ok, "idstop {args:?} did not succeed\n{text}");
        assert!(text.contains("Usage:"));
    }
}

#[test]
fn test_unknown_flag_fails() {
    let (ok, text) = run(&["--bogus", "x"]);
    assert!(!ok);
    assert!(text.contains("Unknown option"), "{text}");
}

#[test]
fn test_dry_run_prints_default_url() {
    let td = tempfile::tempdir().unwrap();
    let assert = idstop()
        .env("XDG_CONFIG_HOME", td.path())
        .arg("--dry-run")
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.trim(), "http://127.0.0.1:5000");
}

#[test]
fn test_invalid_url_rejected() {
    let td = tempfile::tempdir().unwrap();
    idstop()
        .env("XDG_CONFIG_HOME", td.path())
        .args(["--dry-run", "not a url"])
        .assert()
        .failure();
}
