//! Smoke tests for the telsh binary surface.

use assert_cmd::Command;

#[test]
fn help_lists_the_flags() {
    let output = Command::cargo_bin("telsh").unwrap().arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("--port"));
    assert!(text.contains("--log-dir"));
    assert!(text.contains("--disable-log"));
}

#[test]
fn host_argument_is_required() {
    Command::cargo_bin("telsh").unwrap().assert().failure();
}

#[test]
fn rejects_unknown_flags() {
    Command::cargo_bin("telsh")
        .unwrap()
        .args(["somehost", "--no-such-flag"])
        .assert()
        .failure();
}
