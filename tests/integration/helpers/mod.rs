//! Helpers for running the promptbatch binary in isolation

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

const KEY_VARS: [&str; 3] = ["GEMINI_API_KEY", "MOONSHOT_API_KEY", "DEEPSEEK_API_KEY"];

/// A fake home directory that doubles as the working directory.
pub struct Sandbox {
    pub home: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp home"),
        }
    }

    pub fn path(&self) -> &Path {
        self.home.path()
    }

    /// The binary with HOME pointed here and no API keys in the environment.
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("promptbatch").expect("binary builds");
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        for var in KEY_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    /// Write `relative` under the sandbox, creating parents.
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write file");
        path
    }

    pub fn config_path(&self) -> PathBuf {
        self.path()
            .join(".config")
            .join("promptbatch")
            .join("config.toml")
    }
}
