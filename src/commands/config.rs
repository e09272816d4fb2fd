//! Config subcommands handler

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use promptbatch::config::docs::{annotate_config, insert_optional_field_templates};
use promptbatch::Config;

/// Show current configuration as TOML with inline documentation comments.
#[cfg(not(tarpaulin_include))]
pub fn handle_show() -> Result<()> {
    let config = Config::load()?;
    println!("{}", render_annotated(&config)?);
    Ok(())
}

/// Print the config file location.
#[cfg(not(tarpaulin_include))]
pub fn handle_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Write a default config file.
#[cfg(not(tarpaulin_include))]
pub fn handle_init(force: bool) -> Result<()> {
    let path = Config::config_path()?;
    init_at(&path, force)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Serialize `config` with field comments and templates for unset options.
pub fn render_annotated(config: &Config) -> Result<String> {
    let toml_str = toml::to_string_pretty(config).context("Failed to serialize config")?;
    // Templates first so they get documentation comments too
    let with_templates = insert_optional_field_templates(&toml_str);
    Ok(annotate_config(&with_templates))
}

/// Write the annotated default configuration to `path`.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn init_at(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}\nHint: use --force to overwrite it.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }
    let contents = render_annotated(&Config::default())?;
    fs::write(path, contents).with_context(|| format!("Failed to write config file: {:?}", path))?;
    Ok(())
}
