//! Progress reporting for a batch.
//!
//! One bar per pass, drawn in a shared [`MultiProgress`] so the rate
//! limiter's wait bar can sit underneath it. Per-file result lines are
//! printed above the bars.

use std::path::PathBuf;

use humansize::{format_size, DECIMAL};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::analyzer::error::JobError;
use crate::analyzer::job::Job;

pub struct BatchProgress {
    display: MultiProgress,
    show_bars: bool,
    show_lines: bool,
    bar: Option<ProgressBar>,
}

impl BatchProgress {
    /// Report into `display`. `show_bars` controls the bars only; result
    /// lines are always printed.
    pub fn new(display: MultiProgress, show_bars: bool) -> Self {
        Self {
            display,
            show_bars,
            show_lines: true,
            bar: None,
        }
    }

    /// Report nothing at all.
    pub fn hidden() -> Self {
        Self {
            display: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            show_bars: false,
            show_lines: false,
            bar: None,
        }
    }

    /// Begin a pass over `total` files.
    pub fn start_pass(&mut self, label: &str, total: usize) {
        self.finish_pass();
        if !self.show_bars {
            return;
        }
        let bar = self.display.add(ProgressBar::new(total as u64));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        bar.set_prefix(label.to_string());
        self.bar = Some(bar);
    }

    /// A file is about to be sent.
    pub fn job_started(&self, job: &Job, size_bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{} ({})", job, format_size(size_bytes, DECIMAL)));
        }
    }

    /// A file is done, successfully or not.
    pub fn job_finished(&self, job: &Job, result: &Result<PathBuf, JobError>) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
        if !self.show_lines {
            return;
        }
        let line = match result {
            Ok(path) => format!("  ok    {} -> {}", job, path.display()),
            Err(e) => format!("  FAIL  {}: {}", job, e),
        };
        self.display.suspend(|| eprintln!("{}", line));
    }

    /// Remove the current pass bar, if any.
    pub fn finish_pass(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
            self.display.remove(&bar);
        }
    }
}

impl Drop for BatchProgress {
    fn drop(&mut self) {
        self.finish_pass();
    }
}
