//! `run` failures that happen before any request is sent

use predicates::prelude::*;

use super::helpers::Sandbox;

fn with_inputs() -> Sandbox {
    let sandbox = Sandbox::new();
    sandbox.write("prompts/summary.txt", "Summarize {title}");
    sandbox.write("book_1/ch01.md", "It was a dark and stormy night.");
    sandbox
}

#[test]
fn missing_api_key_names_the_variable() {
    let sandbox = with_inputs();
    sandbox
        .cmd()
        .args(["run", "-p", "summary", "--provider", "deepseek"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEEPSEEK_API_KEY"));
    assert!(!sandbox.path().join("book_2").exists());
}

#[test]
fn custom_key_variable_from_config() {
    let sandbox = with_inputs();
    sandbox.write(
        ".config/promptbatch/config.toml",
        "[providers.kimi]\napi_key_env = \"MY_KIMI_KEY\"\n",
    );
    sandbox
        .cmd()
        .args(["run", "-p", "summary", "--provider", "kimi"])
        .env_remove("MY_KIMI_KEY")
        .assert()
        .failure()
        .stderr(predicate::str::contains("MY_KIMI_KEY"));
}

#[test]
fn unknown_prompt_fails_before_credentials() {
    let sandbox = with_inputs();
    sandbox
        .cmd()
        .args(["run", "-p", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot use prompt 'nope'"));
}

#[test]
fn empty_input_directory() {
    let sandbox = Sandbox::new();
    sandbox.write("prompts/summary.txt", "Summarize {title}");
    std::fs::create_dir_all(sandbox.path().join("book_1")).unwrap();
    sandbox
        .cmd()
        .args(["run", "-p", "summary"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No .md or .txt files found"));
}

#[test]
fn negative_wait_is_rejected() {
    let sandbox = with_inputs();
    sandbox
        .cmd()
        .args(["run", "-p", "summary", "--wait-minutes=-2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("wait_minutes"));
}
