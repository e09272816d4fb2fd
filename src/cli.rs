//! CLI definitions for promptbatch
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so they can be accessed by xtask for documentation generation (man pages, markdown).

use std::path::PathBuf;
use std::sync::OnceLock;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

use crate::analyzer::ProviderKind;
use crate::config::{FailurePolicy, RetryPolicyChoice};

/// Build clap styles.
///
/// - Green: headers, usage, command names
/// - White: descriptions, placeholders (renders as light gray on dark terminals)
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "promptbatch")]
#[command(about = "Send text files to Gemini, Kimi or DeepSeek and save the analyses as markdown")]
#[command(
    long_about = "promptbatch - batch LLM analysis of text files.

Each input file is rendered into a prompt template, sent to one provider,
and the reply is written to <output>/<Provider>/<name>_<tag>.md. Calls are
spaced by a configurable wait, transient provider errors are retried with
backoff, and failed files can be retried at the end of the batch.

QUICK START:
    export GEMINI_API_KEY=...
    promptbatch prompts                          List prompt templates
    promptbatch run --prompt summary             Analyse every file in book_1/
    promptbatch run ch01.md ch02.md -p summary --provider deepseek

CONFIGURATION:
    promptbatch config init                      Write ~/.config/promptbatch/config.toml
    promptbatch config show                      Show the effective settings"
)]
#[command(version = crate_version_string())]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Version string, with the git commit for development builds.
pub fn crate_version_string() -> &'static str {
    static VERSION: OnceLock<String> = OnceLock::new();
    VERSION.get_or_init(|| match option_env!("VERGEN_GIT_SHA") {
        Some(sha) if !sha.is_empty() && sha != "unknown" => {
            let short: String = sha.chars().take(7).collect();
            format!("{} ({})", env!("CARGO_PKG_VERSION"), short)
        }
        _ => env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyse a batch of files
    #[command(long_about = "Send each file to the selected provider and write the results.

Files are processed one at a time. Between two files the tool waits
--wait-minutes (default from config: 1.0). After three failures in a row
it asks whether to continue; at the end it offers to retry the failed
files. When stdin is not a terminal these questions are answered by
--on-failures (default halt) and --retry (default never).

Press Ctrl+C during a wait to end the current pass.

EXAMPLES:
    promptbatch run -p summary                     All .md/.txt files in the input dir
    promptbatch run a.md b.md -p literary/themes   Specific files
    promptbatch run -p summary --provider kimi --wait-minutes 2
    promptbatch run -p summary --model gemini-1.5-pro --retry slower")]
    Run(RunArgs),

    /// List providers, their default models and API key variables
    #[command(long_about = "List the supported providers.

Shows each provider's default model, the environment variable read for
its API key, whether a key is currently available, and the known Gemini
models.

EXAMPLE:
    promptbatch providers")]
    Providers,

    /// List prompt templates
    #[command(long_about = "List the prompt templates found in the prompts directory.

Template ids are paths relative to the prompts directory. The extension
may be omitted when passing an id to --prompt.

EXAMPLES:
    promptbatch prompts
    promptbatch prompts --dir ./my-prompts")]
    Prompts {
        /// Prompts directory (overrides config)
        #[arg(long, help = "Prompts directory (overrides config)")]
        dir: Option<PathBuf>,
    },

    /// Configuration management
    #[command(
        subcommand,
        long_about = "View and create the promptbatch configuration file.

Configuration is stored in ~/.config/promptbatch/config.toml.

EXAMPLES:
    promptbatch config show      Display the effective configuration
    promptbatch config path      Print the config file location
    promptbatch config init      Write a config file with defaults"
    )]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(long_about = "Print a completion script for the given shell.

EXAMPLES:
    promptbatch completions bash > ~/.local/share/bash-completion/completions/promptbatch
    promptbatch completions zsh > ~/.zfunc/_promptbatch")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct RunArgs {
    /// Input files (default: every .md/.txt file in the input directory)
    #[arg(help = "Input files (default: every .md/.txt file in the input directory)")]
    pub files: Vec<PathBuf>,

    /// Prompt template id
    #[arg(long, short, help = "Prompt template id (see `promptbatch prompts`)")]
    pub prompt: String,

    /// Provider to use
    #[arg(long, value_enum, help = "Provider (overrides config)")]
    pub provider: Option<ProviderKind>,

    /// Model to use
    #[arg(long, short, help = "Model identifier (overrides config)")]
    pub model: Option<String>,

    /// Minutes between two files
    #[arg(long, short = 'w', help = "Minutes to wait between files (overrides config)")]
    pub wait_minutes: Option<f64>,

    /// Disable progress bars
    #[arg(long, help = "Do not draw progress bars")]
    pub no_progress: bool,

    /// Output root directory
    #[arg(long, short, help = "Output root directory (overrides config)")]
    pub output: Option<PathBuf>,

    /// Input directory scanned when no files are given
    #[arg(long, help = "Input directory (overrides config)")]
    pub input_dir: Option<PathBuf>,

    /// Prompts directory
    #[arg(long, help = "Prompts directory (overrides config)")]
    pub prompts_dir: Option<PathBuf>,

    /// Answer to "continue after repeated failures?"
    #[arg(long, value_enum, help = "What to do after repeated failures")]
    pub on_failures: Option<FailurePolicy>,

    /// Answer to "retry failed files?"
    #[arg(long, value_enum, help = "What to do with failed files at the end")]
    pub retry: Option<RetryPolicyChoice>,

    /// Skip the fixed pauses around each request
    #[arg(long, help = "Skip the fixed pauses before and after each request")]
    pub no_pacing: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    #[command(long_about = "Display the effective configuration as TOML.

Shows all settings including defaults, with a comment describing each
field and commented-out templates for unset optional fields.

EXAMPLE:
    promptbatch config show")]
    Show,

    /// Print the config file location
    Path,

    /// Write a config file with default settings
    #[command(long_about = "Write ~/.config/promptbatch/config.toml with default settings.

Refuses to overwrite an existing file unless --force is given.

EXAMPLES:
    promptbatch config init
    promptbatch config init --force")]
    Init {
        /// Overwrite an existing file
        #[arg(long, help = "Overwrite an existing config file")]
        force: bool,
    },
}
