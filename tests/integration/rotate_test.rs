use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn passrot_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("passrot").unwrap();
    cmd.env("HOME", home.path());
    cmd.env("PASSROT_PASSPHRASE", "testpass");
    cmd.env_remove("PASSROT_KEYFILE");
    cmd.env_remove("PASSROT_LOG");
    cmd
}

fn setup(home: &TempDir) {
    let mut cmd = Command::cargo_bin("passrot").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("PASSROT_PASSPHRASE")
        .env_remove("PASSROT_KEYFILE")
        .args(["init", "--passphrase", "testpass"])
        .assert()
        .success();

    passrot_cmd(home)
        .args(["item", "add", "members", "--interval", "30"])
        .write_stdin("hunter2")
        .assert()
        .success();

    passrot_cmd(home)
        .args(["item", "add", "public"])
        .write_stdin("")
        .assert()
        .success();
}

fn revealed(home: &TempDir, id: &str) -> String {
    let output = passrot_cmd(home)
        .args(["item", "show", id, "--reveal"])
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    stdout
        .lines()
        .find_map(|l| l.strip_prefix("password: "))
        .unwrap_or_default()
        .to_string()
}

#[test]
fn test_manual_rotate_reports_single_message() {
    let home = TempDir::new().unwrap();
    setup(&home);

    passrot_cmd(&home)
        .args(["rotate"])
        .assert()
        .success()
        .stdout("Passwords have been reset\n");
}

#[test]
fn test_manual_rotate_ignores_due_date() {
    let home = TempDir::new().unwrap();
    setup(&home);

    // Not due for 30 days, rotated anyway.
    passrot_cmd(&home).args(["rotate"]).assert().success();

    let secret = revealed(&home, "1");
    assert_ne!(secret, "hunter2");
    assert_eq!(secret.chars().count(), 12);
    assert_eq!(revealed(&home, "2"), "");
}

#[test]
fn test_manual_rotate_spools_notice() {
    let home = TempDir::new().unwrap();
    setup(&home);

    passrot_cmd(&home).args(["rotate"]).assert().success();
    let secret = revealed(&home, "1");

    let spool = std::fs::read_to_string(home.path().join(".passrot/outbox.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = spool
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["to"], "admin@localhost");
    assert_eq!(lines[0]["subject"], "Password changed - members");
    assert!(lines[0]["body"].as_str().unwrap().ends_with(&secret));
}

#[test]
fn test_manual_rotate_uses_configured_length() {
    let home = TempDir::new().unwrap();
    setup(&home);

    std::fs::write(
        home.path().join(".passrot/passrot.toml"),
        "[rotation]\npassword_length = 20\nspecial_chars = false\n",
    )
    .unwrap();

    passrot_cmd(&home).args(["rotate"]).assert().success();
    let secret = revealed(&home, "1");
    assert_eq!(secret.len(), 20);
    assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn test_command_transport_failure_does_not_fail_rotation() {
    let home = TempDir::new().unwrap();
    setup(&home);

    std::fs::write(
        home.path().join(".passrot/passrot.toml"),
        "[notify]\ntransport = \"command\"\ncommand = [\"/nonexistent/mailer\"]\n",
    )
    .unwrap();

    passrot_cmd(&home)
        .args(["rotate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Passwords have been reset"))
        .stderr(predicate::str::contains("rotation notice dropped"));

    assert_ne!(revealed(&home, "1"), "hunter2");
}
