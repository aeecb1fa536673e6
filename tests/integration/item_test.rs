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

fn add(home: &TempDir, title: &str, secret: &str, interval: Option<&str>) {
    let mut cmd = passrot_cmd(home);
    cmd.args(["item", "add", title]);
    if let Some(days) = interval {
        cmd.args(["--interval", days]);
    }
    cmd.write_stdin(secret).assert().success();
}

#[test]
fn test_add_prints_id() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    passrot_cmd(&home)
        .args(["item", "add", "members"])
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stdout("1\n");

    passrot_cmd(&home)
        .args(["item", "add", "staff"])
        .write_stdin("pw")
        .assert()
        .success()
        .stdout("2\n");
}

#[test]
fn test_add_trims_trailing_newline() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    add(&home, "members", "hunter2\n", None);

    passrot_cmd(&home)
        .args(["item", "show", "1", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("password: hunter2\n"));
}

#[test]
fn test_list_shows_protection_and_interval() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    add(&home, "members", "pw", Some("7"));
    add(&home, "public", "", None);

    passrot_cmd(&home)
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("members"))
        .stdout(predicate::str::contains("protected"))
        .stdout(predicate::str::contains("7d"))
        .stdout(predicate::str::contains("public"))
        .stdout(predicate::str::contains("open"));
}

#[test]
fn test_show_hides_secret_without_reveal() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    add(&home, "members", "hunter2", None);

    passrot_cmd(&home)
        .args(["item", "show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("members"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_save_interval_outcomes() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    add(&home, "members", "pw", Some("5"));

    passrot_cmd(&home)
        .args(["item", "save", "1", "--interval", "5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("interval unchanged (5 days)"));

    passrot_cmd(&home)
        .args(["item", "save", "1", "--interval", "10"])
        .assert()
        .success()
        .stderr(predicate::str::contains("rotates every 10 days"));

    passrot_cmd(&home)
        .args(["item", "save", "1", "--interval", "abc"])
        .assert()
        .success()
        .stderr(predicate::str::contains("ignored"));

    passrot_cmd(&home)
        .args(["item", "save", "1", "--interval", "0"])
        .assert()
        .success()
        .stderr(predicate::str::contains("cleared"));

    passrot_cmd(&home)
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10d").not());
}

#[test]
fn test_save_on_unprotected_item() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    add(&home, "public", "", None);

    passrot_cmd(&home)
        .args(["item", "save", "1", "--interval", "3"])
        .assert()
        .success()
        .stderr(predicate::str::contains("not protected"));
}

#[test]
fn test_save_new_secret_from_stdin() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    add(&home, "members", "old", None);

    passrot_cmd(&home)
        .args(["item", "save", "1", "--secret-stdin"])
        .write_stdin("new\n")
        .assert()
        .success();

    passrot_cmd(&home)
        .args(["item", "show", "1", "--reveal"])
        .assert()
        .success()
        .stdout(predicate::str::contains("password: new"));
}

#[test]
fn test_remove() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);
    add(&home, "members", "pw", None);

    passrot_cmd(&home)
        .args(["item", "remove", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Item 1 removed"));

    passrot_cmd(&home)
        .args(["item", "show", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Item not found: 1"));
}
