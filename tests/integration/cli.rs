#[path = "common/mod.rs"]
mod common;

use std::{fs, path::Path};

use assert_cmd::Command;
use common::{Sandbox, mode_of, write_executable};
use predicates::str::contains;
use tempfile::tempdir;

fn botctl() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("botctl"))
}

/// Points every location at the sandbox and hides the host's systemd tools.
fn sandboxed(sandbox: &Sandbox, path: &Path) -> Command {
    let mut cmd = botctl();
    cmd.env("BOTCTL_REPO_ROOT", &sandbox.repo)
        .env("BOTCTL_UNIT_DIR", &sandbox.unit_dir)
        .env("BOTCTL_ENV_DIR", &sandbox.env_dir)
        .env("BOTCTL_LOCK_DIR", &sandbox.lock_dir)
        .env("BOTCTL_SERVICE_USER", "alice")
        .env("PATH", path)
        .env_remove("BOT_TOKEN");
    cmd
}

#[test]
fn missing_subcommand_prints_usage() {
    botctl()
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Usage"));
}

#[test]
fn unknown_subcommand_prints_usage() {
    botctl()
        .arg("start")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Usage"));
}

#[test]
fn privileged_subcommands_require_root() {
    if nix::unistd::Uid::effective().is_root() {
        return;
    }

    for subcommand in ["install", "restart", "stop", "uninstall"] {
        let output = botctl()
            .arg(subcommand)
            .output()
            .expect("failed to invoke botctl");

        assert_eq!(output.status.code(), Some(77), "{subcommand} should be refused");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("sudo ") && stderr.contains(&format!(" {subcommand}")),
            "stderr should show the sudo re-invocation for {subcommand}: {stderr}"
        );
    }
}

#[test]
fn status_runs_without_root_or_systemd() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let empty_path = temp.path().join("empty-bin");
    fs::create_dir_all(&empty_path).unwrap();

    sandboxed(&sandbox, &empty_path)
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Unit file:"))
        .stdout(contains("absent"));
}

#[test]
fn status_of_stopped_unit_is_not_reported_as_an_error() {
    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let bin = temp.path().join("bin");
    write_executable(
        &bin.join("systemctl"),
        "#!/bin/sh\necho \"Active: inactive (dead)\"\nexit 3\n",
    );

    sandboxed(&sandbox, &bin)
        .env_remove("RUST_LOG")
        .env_remove("BOTCTL_LOG_LEVEL")
        .arg("status")
        .assert()
        .success()
        .stdout(contains("inactive (dead)"))
        .stderr(contains("is not running"));
}

#[test]
fn install_and_uninstall_against_fake_systemctl() {
    if !nix::unistd::Uid::effective().is_root() {
        return;
    }

    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let bin = temp.path().join("bin");
    let calls = temp.path().join("systemctl.log");
    write_executable(
        &bin.join("systemctl"),
        &format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\ncase \"$1\" in is-active) exit 3;; esac\nexit 0\n",
            calls.display()
        ),
    );

    sandboxed(&sandbox, &bin)
        .env("BOT_TOKEN", "T1")
        .arg("install")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(sandbox.env_path()).unwrap(),
        "BOT_TOKEN=T1\n"
    );
    assert_eq!(mode_of(&sandbox.env_path()), 0o600);
    let unit = fs::read_to_string(sandbox.unit_path()).unwrap();
    assert!(unit.contains("User=alice"));
    assert!(!unit.contains("{{"));

    sandboxed(&sandbox, &bin)
        .arg("uninstall")
        .assert()
        .success()
        .stdout(contains("Removed"));

    assert!(!sandbox.unit_path().exists());
    assert!(!sandbox.env_path().exists());

    let log = fs::read_to_string(&calls).unwrap();
    let verbs: Vec<&str> = log.lines().collect();
    assert_eq!(
        verbs,
        vec![
            "is-active --quiet dtek-bot.service",
            "daemon-reload",
            "enable --now dtek-bot.service",
            "disable --now dtek-bot.service",
            "daemon-reload",
        ]
    );
}

#[test]
fn uninstall_with_nothing_installed_succeeds() {
    if !nix::unistd::Uid::effective().is_root() {
        return;
    }

    let temp = tempdir().expect("failed to create tempdir");
    let sandbox = Sandbox::new(temp.path());
    let bin = temp.path().join("bin");
    write_executable(
        &bin.join("systemctl"),
        "#!/bin/sh\ncase \"$1\" in disable) exit 1;; esac\nexit 0\n",
    );

    sandboxed(&sandbox, &bin)
        .arg("uninstall")
        .assert()
        .success()
        .stdout(contains("Nothing to remove"));
}
