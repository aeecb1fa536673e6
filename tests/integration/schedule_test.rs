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

fn init_catalog(home: &TempDir) {
    let mut cmd = Command::cargo_bin("passrot").unwrap();
    cmd.env("HOME", home.path())
        .env_remove("PASSROT_PASSPHRASE")
        .env_remove("PASSROT_KEYFILE")
        .args(["init", "--passphrase", "testpass"])
        .assert()
        .success();
}

#[test]
fn test_status_after_init_is_armed_hourly() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    passrot_cmd(&home)
        .args(["schedule", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("passrot_rotate_passwords: hourly"))
        .stdout(predicate::str::contains("last run: never"));
}

#[test]
fn test_arm_is_idempotent() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    passrot_cmd(&home)
        .args(["schedule", "arm"])
        .assert()
        .success()
        .stderr(predicate::str::contains("already armed"));
}

#[test]
fn test_rearm_after_registry_loss() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    std::fs::remove_file(home.path().join(".passrot/schedule.toml")).unwrap();

    passrot_cmd(&home)
        .args(["schedule", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not armed"));

    passrot_cmd(&home)
        .args(["schedule", "tick"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not armed"));

    passrot_cmd(&home)
        .args(["schedule", "arm"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Rotation job armed."));
}

#[test]
fn test_tick_runs_once_then_idles() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    passrot_cmd(&home)
        .args(["item", "add", "members", "--interval", "3"])
        .write_stdin("hunter2")
        .assert()
        .success();

    // The job is due right after arming, but the item is not.
    passrot_cmd(&home)
        .args(["schedule", "tick"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Rotated 0 of 0 due items"));

    passrot_cmd(&home)
        .args(["schedule", "tick"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Nothing due"));

    passrot_cmd(&home)
        .args(["item", "show", "1", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("password: hunter2"));

    passrot_cmd(&home)
        .args(["schedule", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("last run: never").not());
}
