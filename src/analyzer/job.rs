//! Units of work in a batch.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Extensions picked up when scanning an input directory.
pub const INPUT_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// One input file to be analysed with one prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    path: PathBuf,
    prompt_id: String,
}

impl Job {
    pub fn new(path: impl Into<PathBuf>, prompt_id: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            prompt_id: prompt_id.into(),
        }
    }

    /// Build one job per path, all sharing `prompt_id`.
    pub fn for_files<I, P>(paths: I, prompt_id: &str) -> Vec<Job>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .map(|p| Job::new(p, prompt_id))
            .collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn prompt_id(&self) -> &str {
        &self.prompt_id
    }

    /// File name without extension; used as document title and output base name.
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path.file_name() {
            Some(name) => write!(f, "{}", name.to_string_lossy()),
            None => write!(f, "{}", self.path.display()),
        }
    }
}

/// Every `.md`/`.txt` file directly inside `dir`, sorted by path.
///
/// Hidden files are skipped.
pub fn discover_inputs(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| INPUT_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)));
        if wanted && !hidden {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
