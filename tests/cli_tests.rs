//! Command-line surface of the binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("kodegen_release_flow").unwrap()
}

#[test]
fn test_help_lists_flows() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extension"))
        .stdout(predicate::str::contains("package"))
        .stdout(predicate::str::contains("monorepo"))
        .stdout(predicate::str::contains("legacy"));
}

#[test]
fn test_subcommand_help_shows_shared_flags() {
    cli()
        .args(["package", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--release-branch"))
        .stdout(predicate::str::contains("--no-interactive"))
        .stdout(predicate::str::contains("--bump"));
}

#[test]
fn test_unknown_bump_is_usage_error() {
    cli()
        .args(["package", "--bump", "huge"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("huge"));
}

#[test]
fn test_invalid_release_version_is_usage_error() {
    cli()
        .args(["legacy", "--release-version", "one.two"])
        .assert()
        .code(2);
}

#[test]
fn test_extension_requires_instance() {
    cli()
        .arg("extension")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--instance"));
}

#[test]
fn test_missing_repository_directory_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = tmp.path().join("missing");
    cli()
        .args(["legacy", "--no-interactive", "--no-write", "--path"])
        .arg(&missing)
        .env_remove("GH_TOKEN")
        .env_remove("GITHUB_TOKEN")
        .assert()
        .code(1);
}
