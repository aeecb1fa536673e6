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
        .args(["item", "add", "members", "--interval", "2"])
        .write_stdin("hunter2")
        .assert()
        .success();

    passrot_cmd(home).args(["rotate"]).assert().success();
}

#[test]
fn test_audit_show() {
    let home = TempDir::new().unwrap();
    setup(&home);

    passrot_cmd(&home)
        .args(["audit", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("item.add"))
        .stdout(predicate::str::contains("interval.set"))
        .stdout(predicate::str::contains("rotate.batch"))
        .stdout(predicate::str::contains("mode=manual"));
}

#[test]
fn test_audit_show_count() {
    let home = TempDir::new().unwrap();
    setup(&home);

    passrot_cmd(&home)
        .args(["audit", "show", "--count", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rotate.batch"))
        .stdout(predicate::str::contains("item.add").not());
}

#[test]
fn test_audit_verify() {
    let home = TempDir::new().unwrap();
    setup(&home);

    passrot_cmd(&home)
        .args(["audit", "verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("chain intact"));
}

#[test]
fn test_audit_verify_detects_tampering() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let path = home.path().join(".passrot/audit.log");
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::write(&path, content.replacen("item.add", "item.del", 1)).unwrap();

    passrot_cmd(&home)
        .args(["audit", "verify"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("INTEGRITY FAILURE"));
}

#[test]
fn test_audit_export() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let output = passrot_cmd(&home).args(["audit", "export"]).output().unwrap();
    assert!(output.status.success());

    let entries: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(entries.iter().any(|e| e["operation"] == "rotate" && e["item"] == 1));
    assert!(entries.iter().all(|e| e["chain_hmac"].is_string()));
}

#[test]
fn test_audit_disabled_in_config() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let path = home.path().join(".passrot/audit.log");
    let before = std::fs::read_to_string(&path).unwrap().lines().count();

    std::fs::write(
        home.path().join(".passrot/passrot.toml"),
        "[audit]\nenabled = false\n",
    )
    .unwrap();
    passrot_cmd(&home).args(["rotate"]).assert().success();

    let after = std::fs::read_to_string(&path).unwrap().lines().count();
    assert_eq!(before, after);
}
