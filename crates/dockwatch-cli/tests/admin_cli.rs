use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn dockwatch(dir: &TempDir) -> std::process::Command {
    let mut cmd = std::process::Command::new(assert_cmd::cargo::cargo_bin!("dockwatch"));
    // Nothing listens on the discard port; any request would fail with a
    // transport error instead of the usage message.
    cmd.current_dir(dir.path())
        .env("DOCKWATCH_URL", "http://127.0.0.1:9")
        .env("DOCKWATCH_USER", "alice");
    cmd
}

#[test]
fn remove_without_username_prints_usage() {
    let tmp = TempDir::new().expect("tmpdir");
    dockwatch(&tmp)
        .args(["admin", "remove"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage: remove <username>"))
        .stderr(predicate::str::contains("request failed").not());
}

#[test]
fn empty_admin_input_prints_usage() {
    let tmp = TempDir::new().expect("tmpdir");
    dockwatch(&tmp)
        .arg("admin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("usage:"));
}

#[test]
fn serve_requires_allow_list() {
    let tmp = TempDir::new().expect("tmpdir");
    dockwatch(&tmp)
        .arg("serve")
        .env_remove("ALLOWED_USERS")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ALLOWED_USERS must be set"));
}
