use super::{run, validate_command, CommandSpec, RunLimits, MAX_ARGS};
use crate::error::ToolError;
use std::time::{Duration, Instant};

fn has_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

#[test]
fn rejects_empty_vector() {
    let reasons =
        validate_command(&CommandSpec::new(Vec::new())).expect("empty vector must be rejected");
    assert!(reasons.iter().any(|reason| reason.contains("non-empty")));
}

#[test]
fn rejects_degenerate_args() {
    let spec = CommandSpec::new(vec![
        "tool".to_string(),
        String::new(),
        "with\0nul".to_string(),
    ]);
    let reasons = validate_command(&spec).expect("degenerate args must be rejected");
    assert!(reasons.iter().any(|reason| reason.contains("args[1] is empty")));
    assert!(reasons.iter().any(|reason| reason.contains("NUL")));
}

#[test]
fn rejects_oversized_vector() {
    let spec = CommandSpec::new(vec!["x".to_string(); MAX_ARGS + 1]);
    let reasons = validate_command(&spec).expect("oversized vector must be rejected");
    assert!(reasons.iter().any(|reason| reason.contains("max count")));
}

#[test]
fn rejects_zero_timeout() {
    let spec =
        CommandSpec::new(vec!["tool".to_string()]).with_timeout(Duration::from_millis(0));
    let reasons = validate_command(&spec).expect("zero timeout must be rejected");
    assert!(reasons.iter().any(|reason| reason.contains("timeout")));
}

#[test]
fn missing_executable_fails_before_start() {
    let spec = CommandSpec::new(vec!["no-such-binary-7f3a91".to_string()]);
    match run(&spec, &RunLimits::default()) {
        Err(ToolError::ExecutableNotFound { name }) => assert_eq!(name, "no-such-binary-7f3a91"),
        other => panic!("expected ExecutableNotFound, got {other:?}"),
    }
}

#[test]
fn captures_stdout_and_exit_code() {
    if !has_binary("echo") {
        return;
    }
    let spec = CommandSpec::new(vec!["echo".to_string(), "hello".to_string()]);
    let result = run(&spec, &RunLimits::default()).expect("echo runs");
    assert_eq!(result.exit_code, Some(0));
    assert!(result.success());
    assert_eq!(result.stdout.trim(), "hello");
    assert!(!result.timed_out);
    assert!(!result.stdout_truncated);
}

#[test]
fn nonzero_exit_is_a_normal_result() {
    if !has_binary("false") {
        return;
    }
    let spec = CommandSpec::new(vec!["false".to_string()]);
    let result = run(&spec, &RunLimits::default()).expect("false runs");
    assert_ne!(result.exit_code, Some(0));
    assert!(!result.success());
    assert!(!result.timed_out);
}

#[test]
fn deadline_kills_long_running_process() {
    if !has_binary("sleep") {
        return;
    }
    let spec = CommandSpec::new(vec!["sleep".to_string(), "100".to_string()])
        .with_timeout(Duration::from_millis(200));
    let start = Instant::now();
    let result = run(&spec, &RunLimits::default()).expect("sleep spawns");
    assert!(result.timed_out);
    assert_eq!(result.exit_code, None);
    assert!(start.elapsed() < Duration::from_secs(10));
}

#[test]
fn output_beyond_cap_is_truncated() {
    if !has_binary("seq") {
        return;
    }
    let limits = RunLimits {
        timeout: Duration::from_secs(30),
        max_output_bytes: 512,
    };
    let spec = CommandSpec::new(vec![
        "seq".to_string(),
        "1".to_string(),
        "100000".to_string(),
    ]);
    let result = run(&spec, &limits).expect("seq runs");
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout_truncated);
    assert!(result.stdout.len() <= 512);
    assert!(!result.stderr_truncated);
}
