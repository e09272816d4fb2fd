//! Unit tests for the batch orchestrator

use std::fs;
use std::time::Duration;

use promptbatch::analyzer::{JobError, RetryDecision};
use promptbatch::{InterruptFlag, ManualClock};

use super::helpers::{orchestrator, Behavior, KeyedProvider, RecordingDecisions, Workspace};

fn texts(log: &std::sync::Mutex<Vec<String>>) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn mixed_batch_recovers_transient_failures_and_retries_rejected_file() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[
        ("ch1", "one"),
        ("ch2", "two"),
        ("ch3", "three"),
        ("ch4", "four"),
        ("ch5", "five"),
    ]);
    let provider = KeyedProvider::new()
        .with("two", Behavior::Unavailable { times: 1 })
        .with("three", Behavior::Blocked { times: Behavior::ALWAYS })
        .with("four", Behavior::Unavailable { times: 2 });
    let log = provider.log();
    let decisions = RecordingDecisions::new(true, RetryDecision::Now);
    let breaker_asks = decisions.breaker_asks.clone();
    let retry_asks = decisions.retry_asks.clone();

    let clock = ManualClock::starting_at(1_000.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, InterruptFlag::new(), 0.0);
    let report = orch.run(&jobs);

    assert_eq!(report.first_pass.failed_jobs(), vec![jobs[2].clone()]);
    assert_eq!(report.retry_decision, Some(RetryDecision::Now));
    let retry = report.retry_pass.as_ref().unwrap();
    assert_eq!(retry.failed_jobs(), vec![jobs[2].clone()]);

    assert_eq!(report.successes().len(), 4);
    let failures = report.permanent_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].job, jobs[2]);
    assert!(matches!(failures[0].result, Err(JobError::Rejected { .. })));
    assert!(!report.is_complete());

    assert_eq!(
        texts(&log),
        vec!["one", "two", "two", "three", "four", "four", "four", "five", "three"]
    );
    assert!(breaker_asks.lock().unwrap().is_empty());
    assert_eq!(*retry_asks.lock().unwrap(), vec![vec![jobs[2].clone()]]);

    let attempts: Vec<u32> = report.first_pass.outcomes.iter().map(|o| o.attempts).collect();
    assert_eq!(attempts, vec![1, 2, 1, 3, 1]);
}

#[test]
fn results_are_written_as_markdown() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("chapter01", "call me ishmael")]);
    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(
        &ws,
        KeyedProvider::new(),
        RecordingDecisions::new(false, RetryDecision::Cancel),
        clock,
        InterruptFlag::new(),
        0.0,
    );
    let report = orch.run(&jobs);
    assert!(report.is_complete());

    let path = ws.output_root().join("DeepSeek").join("chapter01_deepseek.md");
    assert_eq!(report.successes()[0].result.as_ref().unwrap(), &path);
    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("# chapter01\n\n> Provider: DeepSeek | Model: test-model | Generated: "));
    assert!(written.ends_with("Analysis of call me ishmael\n"));
}

#[test]
fn breaker_asks_once_and_halt_leaves_rest_untouched() {
    let ws = Workspace::new();
    let files: Vec<(String, String)> = (1..=5)
        .map(|i| (format!("ch{}", i), format!("text {}", i)))
        .collect();
    let pairs: Vec<(&str, &str)> = files.iter().map(|(n, t)| (n.as_str(), t.as_str())).collect();
    let jobs = ws.jobs(&pairs);

    let mut provider = KeyedProvider::new();
    for (_, text) in &files {
        provider = provider.with(text, Behavior::Blocked { times: Behavior::ALWAYS });
    }
    let log = provider.log();
    let decisions = RecordingDecisions::new(false, RetryDecision::Cancel);
    let breaker_asks = decisions.breaker_asks.clone();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, InterruptFlag::new(), 0.0);
    let report = orch.run(&jobs);

    assert_eq!(*breaker_asks.lock().unwrap(), vec![3]);
    assert!(report.halted());
    assert_eq!(report.skipped(), 2);
    assert_eq!(report.first_pass.outcomes.len(), 3);
    assert_eq!(texts(&log), vec!["text 1", "text 2", "text 3"]);
    assert_eq!(report.retry_decision, Some(RetryDecision::Cancel));
    assert!(report.retry_pass.is_none());
    assert_eq!(report.permanent_failures().len(), 3);

    let summary = report.summary();
    assert!(summary.starts_with("Done: 0 succeeded, 3 failed, 2 not attempted\n"));
    assert!(summary.contains("Stopped after repeated failures."));
    assert!(summary.contains("  ch1.md: DeepSeek rejected the request"));
}

#[test]
fn breaker_resets_after_continuing() {
    let ws = Workspace::new();
    let files: Vec<(String, String)> = (1..=7)
        .map(|i| (format!("ch{}", i), format!("text {}", i)))
        .collect();
    let pairs: Vec<(&str, &str)> = files.iter().map(|(n, t)| (n.as_str(), t.as_str())).collect();
    let jobs = ws.jobs(&pairs);

    let mut provider = KeyedProvider::new();
    for (_, text) in &files {
        provider = provider.with(text, Behavior::Blocked { times: Behavior::ALWAYS });
    }
    let decisions = RecordingDecisions::new(true, RetryDecision::Cancel);
    let breaker_asks = decisions.breaker_asks.clone();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, InterruptFlag::new(), 0.0);
    let report = orch.run(&jobs);

    assert_eq!(*breaker_asks.lock().unwrap(), vec![3, 3]);
    assert!(!report.halted());
    assert_eq!(report.first_pass.outcomes.len(), 7);
}

#[test]
fn breaker_does_not_ask_after_the_last_job() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b"), ("c", "c")]);
    let provider = KeyedProvider::new()
        .with("a", Behavior::Blocked { times: Behavior::ALWAYS })
        .with("b", Behavior::Blocked { times: Behavior::ALWAYS })
        .with("c", Behavior::Blocked { times: Behavior::ALWAYS });
    let decisions = RecordingDecisions::new(false, RetryDecision::Cancel);
    let breaker_asks = decisions.breaker_asks.clone();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, InterruptFlag::new(), 0.0);
    let report = orch.run(&jobs);

    assert!(breaker_asks.lock().unwrap().is_empty());
    assert!(!report.halted());
    assert_eq!(report.skipped(), 0);
}

#[test]
fn success_resets_the_failure_count() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b"), ("c", "c"), ("d", "d"), ("e", "e")]);
    let provider = KeyedProvider::new()
        .with("a", Behavior::Blocked { times: Behavior::ALWAYS })
        .with("b", Behavior::Blocked { times: Behavior::ALWAYS })
        .with("d", Behavior::Blocked { times: Behavior::ALWAYS })
        .with("e", Behavior::Blocked { times: Behavior::ALWAYS });
    let decisions = RecordingDecisions::new(false, RetryDecision::Cancel);
    let breaker_asks = decisions.breaker_asks.clone();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, InterruptFlag::new(), 0.0);
    let report = orch.run(&jobs);

    assert!(breaker_asks.lock().unwrap().is_empty());
    assert_eq!(report.first_pass.outcomes.len(), 5);
    assert_eq!(report.successes().len(), 1);
}

#[test]
fn retry_pass_never_trips_the_breaker() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b"), ("c", "c"), ("d", "d")]);
    let mut provider = KeyedProvider::new();
    for text in ["a", "b", "c", "d"] {
        provider = provider.with(text, Behavior::Blocked { times: Behavior::ALWAYS });
    }
    let log = provider.log();
    let decisions = RecordingDecisions::new(true, RetryDecision::Now);
    let breaker_asks = decisions.breaker_asks.clone();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, InterruptFlag::new(), 0.0);
    let report = orch.run(&jobs);

    assert_eq!(*breaker_asks.lock().unwrap(), vec![3]);
    assert_eq!(report.retry_pass.as_ref().unwrap().outcomes.len(), 4);
    assert_eq!(texts(&log).len(), 8);
    assert_eq!(report.permanent_failures().len(), 4);
}

#[test]
fn slower_retry_doubles_the_wait() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b"), ("c", "c")]);
    let provider = KeyedProvider::new()
        .with("a", Behavior::Blocked { times: 1 })
        .with("b", Behavior::Blocked { times: 1 });
    let decisions = RecordingDecisions::new(false, RetryDecision::AfterLongerWait);

    let clock = ManualClock::starting_at(1_000.0);
    let mut orch = orchestrator(
        &ws,
        provider,
        decisions,
        clock.clone(),
        InterruptFlag::new(),
        1.0,
    );
    let report = orch.run(&jobs);

    assert_eq!(orch.rate_limiter().config().wait_minutes, 2.0);
    assert!(report.is_complete());
    assert_eq!(report.successes().len(), 3);
    // 60s before "c" in the first pass, 120s before "b" in the retry pass
    assert_eq!(clock.total_slept(), Duration::from_secs(180));
}

#[test]
fn calls_are_spaced_by_wait_minutes() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b"), ("c", "c")]);
    let clock = ManualClock::starting_at(1_000.0);
    let mut orch = orchestrator(
        &ws,
        KeyedProvider::new(),
        RecordingDecisions::new(false, RetryDecision::Cancel),
        clock.clone(),
        InterruptFlag::new(),
        0.5,
    );
    let report = orch.run(&jobs);

    assert!(report.is_complete());
    assert_eq!(clock.total_slept(), Duration::from_secs(60));
    assert_eq!(orch.rate_limiter().last_call_time(), 1_060.0);
}

#[test]
fn interrupt_ends_the_pass_at_the_next_wait() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b"), ("c", "c"), ("d", "d"), ("e", "e")]);
    let interrupt = InterruptFlag::new();
    let provider = KeyedProvider::new().interrupting_on("b", interrupt.clone());
    let log = provider.log();
    let decisions = RecordingDecisions::new(false, RetryDecision::Now);
    let retry_asks = decisions.retry_asks.clone();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, interrupt, 0.0);
    let report = orch.run(&jobs);

    assert!(report.interrupted());
    assert_eq!(report.first_pass.outcomes.len(), 2);
    assert_eq!(report.skipped(), 3);
    assert_eq!(texts(&log), vec!["a", "b"]);
    assert!(retry_asks.lock().unwrap().is_empty());
    assert!(!report.is_complete());
    assert!(report.summary().contains("Interrupted."));
}

#[test]
fn interrupt_during_last_job_cancels_the_retry_offer() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b"), ("c", "c")]);
    let interrupt = InterruptFlag::new();
    let provider = KeyedProvider::new()
        .with("a", Behavior::Blocked { times: 1 })
        .interrupting_on("c", interrupt.clone());
    let log = provider.log();
    let decisions = RecordingDecisions::new(false, RetryDecision::Now);
    let retry_asks = decisions.retry_asks.clone();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, provider, decisions, clock, interrupt, 0.0);
    let report = orch.run(&jobs);

    assert!(report.first_pass.interrupted);
    assert_eq!(report.first_pass.outcomes.len(), 3);
    assert_eq!(report.skipped(), 0);
    assert!(retry_asks.lock().unwrap().is_empty());
    assert_eq!(report.retry_decision, Some(RetryDecision::Cancel));
    assert!(report.retry_pass.is_none());
    assert_eq!(texts(&log), vec!["a", "b", "c"]);
    assert_eq!(report.permanent_failures().len(), 1);
    assert!(report.summary().contains("Interrupted."));
}

#[test]
fn stale_interrupt_is_cleared_before_the_first_pass() {
    let ws = Workspace::new();
    let jobs = ws.jobs(&[("a", "a"), ("b", "b")]);
    let interrupt = InterruptFlag::new();
    interrupt.trigger();
    let decisions = RecordingDecisions::new(false, RetryDecision::Cancel);

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(&ws, KeyedProvider::new(), decisions, clock, interrupt, 0.0);
    let report = orch.run(&jobs);

    assert!(!report.interrupted());
    assert_eq!(report.first_pass.successes().count(), 2);
    assert!(report.is_complete());
}

#[test]
fn unreadable_input_fails_without_calling_out() {
    let ws = Workspace::new();
    let missing = promptbatch::Job::new(ws.dir.path().join("input").join("gone.md"), "summary");
    let provider = KeyedProvider::new();
    let log = provider.log();

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(
        &ws,
        provider,
        RecordingDecisions::new(false, RetryDecision::Cancel),
        clock,
        InterruptFlag::new(),
        0.0,
    );
    let report = orch.run(&[missing]);

    let outcome = &report.first_pass.outcomes[0];
    assert_eq!(outcome.attempts, 0);
    assert!(matches!(outcome.result, Err(JobError::ReadInput { .. })));
    assert!(texts(&log).is_empty());
}

#[test]
fn unknown_prompt_fails_the_job() {
    let ws = Workspace::new();
    let path = ws.add_input("a", "a");
    let job = promptbatch::Job::new(path, "does-not-exist");

    let clock = ManualClock::starting_at(0.0);
    let mut orch = orchestrator(
        &ws,
        KeyedProvider::new(),
        RecordingDecisions::new(false, RetryDecision::Cancel),
        clock,
        InterruptFlag::new(),
        0.0,
    );
    let report = orch.run(&[job]);

    assert!(matches!(
        report.first_pass.outcomes[0].result,
        Err(JobError::Prompt { .. })
    ));
}
