#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use botctl::config::{Config, ResolverInputs};

pub const SHIPPED_TEMPLATE: &str = include_str!("../../../deploy/dtek-bot.service.tpl");

/// A fake bot checkout plus system directories, all under one tempdir.
pub struct Sandbox {
    pub root: PathBuf,
    pub repo: PathBuf,
    pub unit_dir: PathBuf,
    pub env_dir: PathBuf,
    pub lock_dir: PathBuf,
}

impl Sandbox {
    /// Lays out `repo/` with an executable interpreter, `bot.py` and the template.
    pub fn new(root: &Path) -> Self {
        let sandbox = Self {
            root: root.to_path_buf(),
            repo: root.join("repo"),
            unit_dir: root.join("etc/systemd/system"),
            env_dir: root.join("etc"),
            lock_dir: root.join("run/lock"),
        };

        write_executable(&sandbox.interpreter(), "#!/bin/sh\nexit 0\n");
        fs::write(sandbox.repo.join("bot.py"), "print('bot')\n").expect("write bot.py");
        sandbox.write_template(SHIPPED_TEMPLATE);
        sandbox
    }

    pub fn interpreter(&self) -> PathBuf {
        self.repo.join(".venv/bin/python")
    }

    pub fn unit_path(&self) -> PathBuf {
        self.unit_dir.join("dtek-bot.service")
    }

    pub fn env_path(&self) -> PathBuf {
        self.env_dir.join("dtek-bot.env")
    }

    pub fn write_template(&self, contents: &str) {
        let path = self.repo.join("deploy/dtek-bot.service.tpl");
        fs::create_dir_all(path.parent().unwrap()).expect("create deploy dir");
        fs::write(path, contents).expect("write template");
    }

    /// Resolved config pointing every location into the sandbox.
    pub fn config(&self) -> Config {
        let mut config = Config::resolve(ResolverInputs {
            repo_root: Some(self.repo.clone()),
            current_user: Some("alice".into()),
            unit_dir: Some(self.unit_dir.clone()),
            env_dir: Some(self.env_dir.clone()),
            lock_dir: Some(self.lock_dir.clone()),
            ..ResolverInputs::default()
        })
        .expect("resolve sandbox config");
        config.secret_owner = None;
        config
    }
}

pub fn write_executable(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).expect("create parent dir");
    fs::write(path, contents).expect("write executable");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).expect("chmod executable");
}

pub fn mode_of(path: &Path) -> u32 {
    fs::metadata(path).expect("stat file").permissions().mode() & 0o777
}
