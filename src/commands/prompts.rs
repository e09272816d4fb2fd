//! Prompts command handler

use anyhow::{Context, Result};
use std::path::Path;

use promptbatch::analyzer::PromptLibrary;
use promptbatch::Config;

/// List available prompt templates.
#[cfg(not(tarpaulin_include))]
pub fn handle(dir_override: Option<&Path>) -> Result<()> {
    let dir = match dir_override {
        Some(dir) => dir.to_path_buf(),
        None => Config::load()?.prompts_directory(),
    };
    let library = PromptLibrary::new(&dir);
    let ids = library
        .list()
        .with_context(|| format!("Failed to list prompts in {}", dir.display()))?;

    if ids.is_empty() {
        println!("No prompt templates found in {}", dir.display());
        return Ok(());
    }

    println!("Prompt templates in {}:", dir.display());
    for id in ids {
        println!("  {}", id);
    }
    Ok(())
}
