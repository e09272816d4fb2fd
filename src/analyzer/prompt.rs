//! Prompt templates and markdown rendering.
//!
//! Templates are plain text files under the prompts directory. A template id
//! is the file's path relative to that directory, with or without its
//! extension (`summary`, `summary.txt`, `literary/themes.md`).
//!
//! Two placeholders are substituted:
//! - `{title}` - the input file name without extension
//! - `{content}` - the full input text

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;

/// Extensions tried when an id names no existing file.
const TEMPLATE_EXTENSIONS: &[&str] = &["txt", "md"];

/// Body written when a provider returned only whitespace.
pub const EMPTY_ANALYSIS: &str = "_No analysis returned._";

/// Errors resolving or reading a prompt template.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Invalid prompt id '{0}': must be a relative path inside the prompts directory")]
    InvalidId(String),

    #[error("Prompt template '{id}' not found in {}", dir.display())]
    NotFound { id: String, dir: PathBuf },

    #[error("Failed to read prompt template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A loaded template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    id: String,
    body: String,
}

impl PromptTemplate {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            body: body.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether the template embeds the input text itself.
    pub fn embeds_content(&self) -> bool {
        self.body.contains("{content}")
    }

    /// Substitute `{title}` and `{content}`.
    pub fn render(&self, title: &str, content: &str) -> String {
        self.body
            .replace("{title}", title)
            .replace("{content}", content)
    }
}

/// The directory of available templates.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    root: PathBuf,
}

impl PromptLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an id to a file inside the library.
    ///
    /// Absolute ids and ids that climb out with `..` are rejected.
    pub fn resolve(&self, id: &str) -> Result<PathBuf, PromptError> {
        let relative = Path::new(id.trim());
        let is_contained = !id.trim().is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !is_contained {
            return Err(PromptError::InvalidId(id.to_string()));
        }

        let direct = self.root.join(relative);
        if direct.is_file() {
            return Ok(direct);
        }
        if relative.extension().is_none() {
            for ext in TEMPLATE_EXTENSIONS {
                let candidate = direct.with_extension(ext);
                if candidate.is_file() {
                    return Ok(candidate);
                }
            }
        }

        Err(PromptError::NotFound {
            id: id.to_string(),
            dir: self.root.clone(),
        })
    }

    /// Resolve and read a template.
    pub fn load(&self, id: &str) -> Result<PromptTemplate, PromptError> {
        let path = self.resolve(id)?;
        let body = fs::read_to_string(&path).map_err(|source| PromptError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(PromptTemplate::new(id, body))
    }

    /// Ids of every template, sorted, using `/` as separator.
    ///
    /// A missing directory yields an empty list.
    pub fn list(&self) -> Result<Vec<String>, PromptError> {
        let mut ids = Vec::new();
        if self.root.is_dir() {
            self.collect(&self.root, &mut ids)?;
        }
        ids.sort();
        Ok(ids)
    }

    fn collect(&self, dir: &Path, ids: &mut Vec<String>) -> Result<(), PromptError> {
        let io_err = |source| PromptError::Io {
            path: dir.to_path_buf(),
            source,
        };
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_hidden = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if is_hidden {
                continue;
            }
            if path.is_dir() {
                self.collect(&path, ids)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let id: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                ids.push(id.join("/"));
            }
        }
        Ok(())
    }
}

/// Render a provider reply as the markdown document written to disk.
pub fn render_markdown(
    provider: &str,
    model: &str,
    raw: &str,
    title: &str,
    generated_at: DateTime<Local>,
) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let body = normalized.trim();
    let body = if body.is_empty() { EMPTY_ANALYSIS } else { body };

    format!(
        "# {}\n\n> Provider: {} | Model: {} | Generated: {}\n\n{}\n",
        title,
        provider,
        model,
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        body
    )
}
