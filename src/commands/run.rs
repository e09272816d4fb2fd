//! Run command handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressDrawTarget};
use tracing::info;

use promptbatch::analyzer::{
    discover_inputs, BatchOrchestrator, BatchProgress, Job, OutputLayout, Pacing,
    PresetDecisions, PromptLibrary, ProviderKind, ProviderOptions, RemoteCaller, RetryPolicy,
    TerminalDecisions,
};
use promptbatch::cli::RunArgs;
use promptbatch::config::PacingConfig;
use promptbatch::{Config, InterruptFlag, RateLimiter, SystemClock};

/// Analyse a batch of files.
#[cfg(not(tarpaulin_include))]
pub fn handle(args: &RunArgs) -> Result<()> {
    let mut config = Config::load()?;
    apply_overrides(&mut config, args)?;

    let kind = select_provider(&config, args)?;
    let files = collect_inputs(&config, args)?;

    let prompts = PromptLibrary::new(config.prompts_directory());
    prompts
        .load(&args.prompt)
        .with_context(|| format!("Cannot use prompt '{}'", args.prompt))?;

    let clock = SystemClock::shared();
    let options = ProviderOptions::resolve(kind, &config, args.model.as_deref())?;
    let provider = kind
        .create_provider(options, clock.clone())
        .context("Failed to set up the provider")?;

    let interrupt = InterruptFlag::new();
    interrupt.register_ctrlc();

    let show_progress = config.rate_limit.show_progress;
    let display = if show_progress {
        MultiProgress::new()
    } else {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    };

    let limiter = RateLimiter::new(config.rate_limit, clock.clone(), interrupt)
        .with_display(display.clone());
    let caller = RemoteCaller::new(
        RetryPolicy::from(&config.retry),
        Pacing::from(&config.pacing),
        clock,
    );
    let decisions = TerminalDecisions::new(PresetDecisions::new(
        config.batch.on_consecutive_failures,
        config.batch.on_failed_jobs,
    ))
    .with_display(display.clone());

    let mut orchestrator = BatchOrchestrator::new(
        provider,
        caller,
        limiter,
        prompts,
        OutputLayout::new(config.output_directory()),
        Box::new(decisions),
    )
    .with_failure_threshold(config.batch.failure_threshold)
    .with_progress(BatchProgress::new(display, show_progress));

    info!(files = files.len(), prompt = %args.prompt, "Running batch");
    let jobs = Job::for_files(files, &args.prompt);
    let report = orchestrator.run(&jobs);
    drop(orchestrator);

    eprint!("\n{}", report.summary());
    if !report.is_complete() {
        anyhow::bail!("Batch finished with unprocessed files");
    }
    Ok(())
}

/// Apply command-line overrides on top of the loaded config.
pub fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if let Some(minutes) = args.wait_minutes {
        config.rate_limit.wait_minutes = minutes;
    }
    if args.no_progress {
        config.rate_limit.show_progress = false;
    }
    if args.no_pacing {
        config.pacing = PacingConfig::none();
    }
    if let Some(dir) = &args.output {
        config.paths.output_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(dir) = &args.input_dir {
        config.paths.input_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(dir) = &args.prompts_dir {
        config.paths.prompts_dir = dir.to_string_lossy().into_owned();
    }
    if let Some(policy) = args.on_failures {
        config.batch.on_consecutive_failures = policy;
    }
    if let Some(policy) = args.retry {
        config.batch.on_failed_jobs = policy;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid settings: {}", e))
}

/// Provider from `--provider`, else `[providers].default`.
pub fn select_provider(config: &Config, args: &RunArgs) -> Result<ProviderKind> {
    match args.provider {
        Some(kind) => Ok(kind),
        None => config
            .providers
            .default
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e)),
    }
}

/// Files named on the command line, else every input file in the input directory.
pub fn collect_inputs(config: &Config, args: &RunArgs) -> Result<Vec<PathBuf>> {
    if !args.files.is_empty() {
        return Ok(args.files.clone());
    }
    let dir = config.input_directory();
    let files = discover_inputs(&dir)
        .with_context(|| format!("Failed to read input directory {}", dir.display()))?;
    if files.is_empty() {
        anyhow::bail!(
            "No .md or .txt files found in {}\nHint: pass files explicitly or use --input-dir.",
            dir.display()
        );
    }
    Ok(files)
}
