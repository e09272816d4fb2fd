//! xtask - Build tasks for promptbatch
//!
//! Run with: cargo xtask <command>
//!
//! Commands:
//! - gen-docs: Generate documentation (man pages, COMMANDS.md, CONFIGURATION.md)

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, Command, CommandFactory, Parser, Subcommand};

use promptbatch::cli::Cli;
use promptbatch::config::docs::generate_config_markdown;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build tasks for promptbatch")]
struct Xtask {
    #[command(subcommand)]
    command: XtaskCommand,
}

#[derive(Subcommand)]
enum XtaskCommand {
    /// Generate documentation from CLI and config definitions
    #[command(name = "gen-docs")]
    GenDocs {
        /// Output directory (default: docs/)
        #[arg(long, short, default_value = "docs")]
        output: PathBuf,

        /// Generate man pages
        #[arg(long)]
        man: bool,

        /// Generate COMMANDS.md
        #[arg(long)]
        markdown: bool,

        /// Generate CONFIGURATION.md
        #[arg(long)]
        config: bool,
    },
}

fn main() -> Result<()> {
    let args = Xtask::parse();

    match args.command {
        XtaskCommand::GenDocs {
            output,
            man,
            markdown,
            config,
        } => {
            // No specific format means all of them
            let gen_all = !man && !markdown && !config;

            if gen_all || man {
                generate_man_pages(&output)?;
            }
            if gen_all || markdown {
                generate_markdown(&output)?;
            }
            if gen_all || config {
                generate_config_reference(&output)?;
            }
        }
    }

    Ok(())
}

/// Render one man page into `dir/<name>.1`.
fn write_man_page(dir: &Path, name: &str, cmd: &Command) -> Result<()> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buffer)?;
    let path = dir.join(format!("{}.1", name));
    fs::write(&path, buffer).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated: {}", path.display());
    Ok(())
}

/// Generate man pages using clap_mangen
fn generate_man_pages(output: &Path) -> Result<()> {
    let man_dir = output.join("man");
    fs::create_dir_all(&man_dir).context("Failed to create man directory")?;

    let cmd = Cli::command();
    write_man_page(&man_dir, "promptbatch", &cmd)?;

    for sub in cmd.get_subcommands().filter(|c| !c.is_hide_set()) {
        let name = format!("promptbatch-{}", sub.get_name());
        write_man_page(&man_dir, &name, sub)?;

        for nested in sub.get_subcommands().filter(|c| !c.is_hide_set()) {
            write_man_page(&man_dir, &format!("{}-{}", name, nested.get_name()), nested)?;
        }
    }

    Ok(())
}

/// Bullet list of a command's arguments, skipping help and version.
fn push_arguments(markdown: &mut String, cmd: &Command) {
    let visible: Vec<&Arg> = cmd
        .get_arguments()
        .filter(|a| !matches!(a.get_id().as_str(), "help" | "version"))
        .collect();

    for arg in visible.iter().filter(|a| a.is_positional()) {
        markdown.push_str(&format!("- `<{}>`", arg.get_id().as_str().to_uppercase()));
        if let Some(help) = arg.get_help() {
            markdown.push_str(&format!(": {}", help));
        }
        markdown.push('\n');
    }

    for arg in visible.iter().filter(|a| !a.is_positional()) {
        let long = arg.get_long().map(|l| format!("--{}", l));
        let short = arg.get_short().map(|s| format!("-{}", s));
        let flag = match (long, short) {
            (Some(l), Some(s)) => format!("{}, {}", s, l),
            (Some(l), None) => l,
            (None, Some(s)) => s,
            _ => continue,
        };
        markdown.push_str(&format!("- `{}`", flag));
        if let Some(help) = arg.get_help() {
            markdown.push_str(&format!(": {}", help));
        }
        markdown.push('\n');
    }

    if !visible.is_empty() {
        markdown.push('\n');
    }
}

fn push_long_about(markdown: &mut String, cmd: &Command) {
    if let Some(long_about) = cmd.get_long_about() {
        markdown.push_str(&format!("```\n{}\n```\n\n", long_about));
    }
}

/// Generate COMMANDS.md
fn generate_markdown(output: &Path) -> Result<()> {
    fs::create_dir_all(output).context("Failed to create output directory")?;

    let cmd = Cli::command();
    let mut markdown = String::from("# promptbatch Command Reference\n\n");
    markdown.push_str("This document is auto-generated from the CLI definitions.\n\n");

    for sub in cmd.get_subcommands().filter(|c| !c.is_hide_set()) {
        let name = sub.get_name();
        markdown.push_str(&format!("- [{}](#promptbatch-{})\n", name, name));
    }
    markdown.push_str("\n---\n\n## promptbatch\n\n");
    push_long_about(&mut markdown, &cmd);

    for sub in cmd.get_subcommands().filter(|c| !c.is_hide_set()) {
        let name = sub.get_name();
        markdown.push_str(&format!("## promptbatch {}\n\n", name));
        if let Some(about) = sub.get_about() {
            markdown.push_str(&format!("{}\n\n", about));
        }
        push_arguments(&mut markdown, sub);
        push_long_about(&mut markdown, sub);

        for nested in sub.get_subcommands().filter(|c| !c.is_hide_set()) {
            markdown.push_str(&format!("### promptbatch {} {}\n\n", name, nested.get_name()));
            if let Some(about) = nested.get_about() {
                markdown.push_str(&format!("{}\n\n", about));
            }
            push_arguments(&mut markdown, nested);
            push_long_about(&mut markdown, nested);
        }

        markdown.push_str("---\n\n");
    }

    markdown.push_str("\n*Generated by `cargo xtask gen-docs`*\n");

    let output_path = output.join("COMMANDS.md");
    fs::write(&output_path, markdown)?;
    println!("Generated: {}", output_path.display());
    Ok(())
}

/// Generate CONFIGURATION.md from the config field docs
fn generate_config_reference(output: &Path) -> Result<()> {
    fs::create_dir_all(output).context("Failed to create output directory")?;
    let output_path = output.join("CONFIGURATION.md");
    fs::write(&output_path, generate_config_markdown())?;
    println!("Generated: {}", output_path.display());
    Ok(())
}
