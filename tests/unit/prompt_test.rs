//! Unit tests for prompt templates

use std::fs;

use promptbatch::analyzer::{PromptError, PromptLibrary};
use tempfile::TempDir;

fn library_with(files: &[(&str, &str)]) -> (TempDir, PromptLibrary) {
    let temp = TempDir::new().unwrap();
    for (name, body) in files {
        let path = temp.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }
    let library = PromptLibrary::new(temp.path());
    (temp, library)
}

#[test]
fn nested_ids_resolve_and_list() {
    let (_temp, library) = library_with(&[
        ("summary.txt", "Summarize {title}"),
        ("literary/themes.md", "Themes of {title}:\n{content}"),
    ]);

    assert_eq!(library.list().unwrap(), vec!["literary/themes.md", "summary.txt"]);

    let template = library.load("literary/themes").unwrap();
    assert!(template.embeds_content());
    assert_eq!(
        template.render("Chapter 1", "It was a dark night."),
        "Themes of Chapter 1:\nIt was a dark night."
    );
}

#[test]
fn template_without_content_placeholder() {
    let (_temp, library) = library_with(&[("summary.txt", "Summarize {title}")]);
    let template = library.load("summary").unwrap();
    assert!(!template.embeds_content());
    assert_eq!(template.render("Intro", "ignored"), "Summarize Intro");
}

#[test]
fn parent_directory_ids_are_rejected() {
    let (_temp, library) = library_with(&[("summary.txt", "x")]);
    assert!(matches!(
        library.load("../summary"),
        Err(PromptError::InvalidId(_))
    ));
}

#[test]
fn missing_template_names_directory() {
    let (temp, library) = library_with(&[]);
    let err = library.load("nope").unwrap_err();
    assert!(matches!(err, PromptError::NotFound { .. }));
    assert!(err.to_string().contains(&temp.path().display().to_string()));
}
