//! Where results are written.
//!
//! Layout: `<root>/<ProviderDir>/<title>_<variant-tag>.md`, for example
//! `book_2/Gemini/chapter01_gemini2.0.md`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::analyzer::job::Job;
use crate::analyzer::provider::AnalysisProvider;

#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Target file for `job` when analysed by `provider`.
    pub fn path_for(&self, job: &Job, provider: &dyn AnalysisProvider) -> PathBuf {
        self.root
            .join(provider.output_dir_name())
            .join(format!("{}_{}.md", job.title(), provider.variant_tag()))
    }

    /// Write `contents` to `path`, creating parent directories.
    ///
    /// Writes to a temporary sibling first, then renames, so an interrupted
    /// run never leaves a half-written result behind.
    pub fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("result.md");
        let temp_path = parent.join(format!(".{}.tmp", file_name));
        fs::write(&temp_path, contents)?;
        fs::rename(&temp_path, path).inspect_err(|_| {
            let _ = fs::remove_file(&temp_path);
        })
    }
}
