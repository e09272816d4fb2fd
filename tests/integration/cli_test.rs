//! Help, version, providers, prompts and completions output

use predicates::prelude::*;

use super::helpers::Sandbox;

#[test]
fn help_lists_subcommands() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("providers"))
        .stdout(predicate::str::contains("prompts"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn run_help_documents_overrides() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--wait-minutes"))
        .stdout(predicate::str::contains("--provider"))
        .stdout(predicate::str::contains("--retry"));
}

#[test]
fn version_starts_with_package_version() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "promptbatch {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn providers_without_keys() {
    let sandbox = Sandbox::new();
    let output = sandbox.cmd().arg("providers").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    insta::assert_snapshot!(stdout, @r"
    PROVIDER  MODEL                   API KEY VARIABLE    KEY
    gemini    gemini-2.0-flash-exp    GEMINI_API_KEY      missing
    kimi      moonshot-v1-auto        MOONSHOT_API_KEY    missing
    deepseek  deepseek-chat           DEEPSEEK_API_KEY    missing

    Default provider: gemini

    Gemini models:
      gemini-2.0-flash-exp
      gemini-exp-1206
      gemini-2.0-flash-thinking-exp-1219
      gemini-1.5-pro
      gemini-1.5-flash
      gemini-1.5-flash-8b
    ");
}

#[test]
fn providers_reports_key_from_environment() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .arg("providers")
        .env("DEEPSEEK_API_KEY", "sk-test")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"deepseek\s+deepseek-chat\s+DEEPSEEK_API_KEY\s+set\n").unwrap());
}

#[test]
fn prompts_lists_templates() {
    let sandbox = Sandbox::new();
    sandbox.write("prompts/summary.txt", "Summarize {title}");
    sandbox.write("prompts/literary/themes.md", "Themes");
    sandbox.write("prompts/.draft.txt", "hidden");

    sandbox
        .cmd()
        .arg("prompts")
        .assert()
        .success()
        .stdout(predicate::str::contains("Prompt templates in prompts:"))
        .stdout(predicate::str::contains("  literary/themes.md\n  summary.txt\n"))
        .stdout(predicate::str::contains(".draft").not());
}

#[test]
fn prompts_in_empty_directory() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.path().join("mine")).unwrap();
    sandbox
        .cmd()
        .args(["prompts", "--dir", "mine"])
        .assert()
        .success()
        .stdout("No prompt templates found in mine\n");
}

#[test]
fn completions_for_bash() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_promptbatch"));
}
