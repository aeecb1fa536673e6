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
fn test_exit_code_catalog_not_initialized() {
    let home = TempDir::new().unwrap();
    let output = passrot_cmd(&home).args(["item", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(7)); // NotInitialized
}

#[test]
fn test_exit_code_rotate_not_initialized() {
    let home = TempDir::new().unwrap();
    let output = passrot_cmd(&home).args(["rotate"]).output().unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(!home.path().join(".passrot").exists());
}

#[test]
fn test_exit_code_item_not_found() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    let output = passrot_cmd(&home)
        .args(["item", "show", "42"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3)); // ItemNotFound

    let output = passrot_cmd(&home)
        .args(["item", "save", "42", "--interval", "3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_exit_code_already_initialized() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    let output = passrot_cmd(&home)
        .args(["init", "--passphrase", "testpass"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(5)); // AlreadyInitialized
}

#[test]
fn test_exit_code_wrong_passphrase() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    let output = passrot_cmd(&home)
        .env("PASSROT_PASSPHRASE", "wrong")
        .args(["item", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2)); // Decryption
}

#[test]
fn test_exit_code_no_credentials() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    let output = passrot_cmd(&home)
        .env_remove("PASSROT_PASSPHRASE")
        .args(["rotate"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2)); // AuthFailed
}

#[test]
fn test_json_error_on_stderr() {
    let home = TempDir::new().unwrap();
    init_catalog(&home);

    let output = passrot_cmd(&home)
        .args(["item", "show", "42", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    let body: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["exit_code"], 3);
}
