//! Configuration management for promptbatch

pub mod docs;
mod io;
mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};

impl Config {
    /// Get the config file path (~/.config/promptbatch/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        io::config_path()
    }

    /// Get the config directory path (~/.config/promptbatch)
    pub fn config_dir() -> Result<PathBuf> {
        io::config_dir()
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> Result<Self> {
        io::load()
    }

    /// Load configuration from a specific file, or return defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        io::load_from(path)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        io::save(self)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        io::save_to(self, path)
    }

    /// Input directory with `~` expanded
    pub fn input_directory(&self) -> PathBuf {
        expand_home(&self.paths.input_dir)
    }

    /// Prompt template directory with `~` expanded
    pub fn prompts_directory(&self) -> PathBuf {
        expand_home(&self.paths.prompts_dir)
    }

    /// Output root with `~` expanded
    pub fn output_directory(&self) -> PathBuf {
        expand_home(&self.paths.output_dir)
    }

    /// Look up per-provider settings.
    ///
    /// Returns `None` for unknown provider names.
    pub fn provider_settings(&self, name: &str) -> Option<&ProviderSettings> {
        self.providers.settings(name)
    }
}

/// Expand a leading `~/` to the home directory
fn expand_home(dir: &str) -> PathBuf {
    if let Some(stripped) = dir.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(dir)
}
