use assert_cmd::Command;
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
        .args(["item", "add", "members", "--interval", "7"])
        .write_stdin("hunter2")
        .assert()
        .success();

    passrot_cmd(home)
        .args(["item", "add", "public"])
        .write_stdin("")
        .assert()
        .success();
}

fn json_stdout(home: &TempDir, args: &[&str]) -> serde_json::Value {
    let output = passrot_cmd(home).args(args).output().unwrap();
    assert!(output.status.success(), "{:?} failed", args);
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_item_add_json() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let output = passrot_cmd(&home)
        .args(["item", "add", "staff", "--json"])
        .write_stdin("pw")
        .output()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["id"], 3);
    assert_eq!(body["title"], "staff");
    assert_eq!(body["protected"], true);
}

#[test]
fn test_item_list_json() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let body = json_stdout(&home, &["item", "list", "--json"]);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["title"], "members");
    assert_eq!(items[0]["interval_days"], 7);
    assert!(items[0]["next_due_at"].is_string());
    assert!(items[0].get("secret").is_none());
    assert_eq!(items[1]["protected"], false);
    assert!(items[1]["interval_days"].is_null());
}

#[test]
fn test_item_show_json_reveal() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let hidden = json_stdout(&home, &["item", "show", "1", "--json"]);
    assert!(hidden.get("secret").is_none());

    let shown = json_stdout(&home, &["item", "show", "1", "--reveal", "--json"]);
    assert_eq!(shown["secret"], "hunter2");
    assert_eq!(shown["id"], 1);
}

#[test]
fn test_item_save_json_outcomes() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let same = json_stdout(&home, &["item", "save", "1", "--interval", "7", "--json"]);
    assert_eq!(same["outcome"], "unchanged");
    assert_eq!(same["interval_days"], 7);

    let changed = json_stdout(&home, &["item", "save", "1", "--interval", "14", "--json"]);
    assert_eq!(changed["outcome"], "rearmed");
    assert!(changed["next_due_at"].is_string());

    let open = json_stdout(&home, &["item", "save", "2", "--interval", "14", "--json"]);
    assert_eq!(open["outcome"], "unprotected");

    let none = json_stdout(&home, &["item", "save", "1", "--json"]);
    assert_eq!(none["outcome"], "no_field");
}

#[test]
fn test_rotate_json() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let body = json_stdout(&home, &["rotate", "--json"]);
    assert_eq!(body["message"], "Passwords have been reset");
    assert_eq!(body["mode"], "manual");
    assert_eq!(body["selected"], 1);
    assert_eq!(body["rotated"][0]["title"], "members");
    assert!(body["failed"].as_array().unwrap().is_empty());
}

#[test]
fn test_schedule_json() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let status = json_stdout(&home, &["schedule", "status", "--json"]);
    assert_eq!(status["armed"], true);
    assert_eq!(status["cadence"], "hourly");
    assert!(status.get("last_run_at").is_none());

    let ran = json_stdout(&home, &["schedule", "tick", "--json"]);
    assert_eq!(ran["status"], "ran");
    assert_eq!(ran["report"]["mode"], "unattended");

    let idle = json_stdout(&home, &["schedule", "tick", "--json"]);
    assert_eq!(idle["status"], "idle");
}

#[test]
fn test_audit_show_json() {
    let home = TempDir::new().unwrap();
    setup(&home);

    let body = json_stdout(&home, &["audit", "show", "--json", "--count", "2"]);
    assert_eq!(body["shown"], 2);
    assert!(body["total"].as_u64().unwrap() >= 4);
}
