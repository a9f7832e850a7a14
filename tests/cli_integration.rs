//! Integration tests for the PassVault CLI.
//!
//! These tests exercise the binary end-to-end using `assert_cmd`. Master
//! keys come from the environment so nothing prompts, and every project
//! directory carries a `.passvault.toml` with cheap Argon2 settings.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

const KEY: &str = "integration master key";

/// Helper: get a Command pointing at the passvault binary.
fn passvault() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("passvault").expect("binary should exist")
}

/// A project directory with fast key derivation configured.
fn project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    tmp.child(".passvault.toml")
        .write_str("argon2_memory_kib = 8192\nargon2_iterations = 1\nargon2_parallelism = 1\n")
        .unwrap();
    tmp
}

/// A command run inside `dir` with the master key in the environment.
fn in_project(dir: &TempDir) -> Command {
    let mut cmd = passvault();
    cmd.current_dir(dir.path())
        .env("PASSVAULT_MASTER_KEY", KEY)
        .env_remove("PASSVAULT_NEW_MASTER_KEY")
        .env_remove("PASSVAULT_VAULT_DIR");
    cmd
}

fn init(dir: &TempDir) {
    in_project(dir).args(["init", "--yes"]).assert().success();
}

#[test]
fn help_flag_shows_usage() {
    passvault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Local encrypted credential vault"))
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("delete"))
        .stdout(predicate::str::contains("rotate-key"));
}

#[test]
fn version_flag_shows_version() {
    passvault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("passvault"));
}

#[test]
fn no_args_shows_help() {
    passvault()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn init_creates_vault_file() {
    let tmp = project();
    init(&tmp);

    tmp.child(".passvault/vault.pv")
        .assert(predicate::path::is_file());
}

#[test]
fn init_twice_fails() {
    let tmp = project();
    init(&tmp);

    in_project(&tmp)
        .args(["init", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_rejects_short_key() {
    let tmp = project();
    passvault()
        .current_dir(tmp.path())
        .env("PASSVAULT_MASTER_KEY", "short")
        .args(["init", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 8 characters"));

    tmp.child(".passvault/vault.pv")
        .assert(predicate::path::missing());
}

#[test]
fn list_on_missing_vault_fails() {
    let tmp = project();
    in_project(&tmp)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("passvault init"));
}

#[test]
fn add_then_list_masks_passwords() {
    let tmp = project();
    init(&tmp);

    in_project(&tmp)
        .args(["add", "site.com", "alice", "hunter2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("site.com"));

    in_project(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("site.com"))
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("hunter2").not());

    in_project(&tmp)
        .args(["list", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn add_reads_password_from_stdin() {
    let tmp = project();
    init(&tmp);

    in_project(&tmp)
        .args(["add", "site.com", "alice"])
        .write_stdin("piped-pass\n")
        .assert()
        .success();

    in_project(&tmp)
        .args(["list", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("piped-pass"));
}

#[test]
fn add_rejects_inner_whitespace() {
    let tmp = project();
    init(&tmp);

    in_project(&tmp)
        .args(["add", "my site.com", "alice", "hunter2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));

    in_project(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No credentials"));
}

#[test]
fn wrong_master_key_fails() {
    let tmp = project();
    init(&tmp);

    passvault()
        .current_dir(tmp.path())
        .env("PASSVAULT_MASTER_KEY", "not the right key")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not match"));
}

#[test]
fn set_and_delete_by_row() {
    let tmp = project();
    init(&tmp);
    in_project(&tmp)
        .args(["add", "site.com", "alice", "hunter2"])
        .assert()
        .success();

    in_project(&tmp)
        .args(["set", "1", "user-id", "carol"])
        .assert()
        .success();
    in_project(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("carol"));

    in_project(&tmp)
        .args(["set", "2", "url", "x.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no row 2"));

    in_project(&tmp)
        .args(["delete", "1", "--force"])
        .assert()
        .success();
    in_project(&tmp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("site.com").not());
}

#[test]
fn rotate_key_switches_the_master_key() {
    let tmp = project();
    init(&tmp);
    in_project(&tmp)
        .args(["add", "site.com", "alice", "hunter2"])
        .assert()
        .success();

    in_project(&tmp)
        .arg("rotate-key")
        .env("PASSVAULT_NEW_MASTER_KEY", "rotated master key")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 credential(s) re-encrypted"));

    in_project(&tmp).arg("list").assert().failure();

    passvault()
        .current_dir(tmp.path())
        .env("PASSVAULT_MASTER_KEY", "rotated master key")
        .args(["list", "--show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2"));
}

#[test]
fn vault_dir_flag_overrides_location() {
    let tmp = project();
    in_project(&tmp)
        .args(["init", "--yes", "--vault-dir", "elsewhere"])
        .assert()
        .success();

    tmp.child("elsewhere/vault.pv")
        .assert(predicate::path::is_file());
    tmp.child(".passvault").assert(predicate::path::missing());
}

#[test]
fn vault_dir_env_var_sets_location() {
    let tmp = project();
    in_project(&tmp)
        .env("PASSVAULT_VAULT_DIR", "from-env")
        .args(["init", "--yes"])
        .assert()
        .success();

    tmp.child("from-env/vault.pv")
        .assert(predicate::path::is_file());
    tmp.child(".passvault").assert(predicate::path::missing());
}
