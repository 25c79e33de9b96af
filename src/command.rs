//! Argument-vector execution with bounded capture and a deadline kill.
//!
//! Commands are always explicit token sequences handed straight to process
//! creation; no shell line ever exists, so nothing is expanded or split.
//! One call is exactly one process start; the runner performs no retries.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::ToolError;

/// Default deadline for a single invocation.
pub const DEFAULT_TIMEOUT_MS: u64 = 300_000;
/// Default per-stream capture cap.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1_048_576;
/// Maximum number of args accepted by the runner.
pub const MAX_ARGS: usize = 256;
/// Maximum length of a single arg accepted by the runner.
pub const MAX_ARG_LEN: usize = 4096;

/// A single invocation: the full argument vector (first token is the
/// program), an optional working directory, and an optional deadline.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(args: Vec<String>) -> Self {
        Self {
            args,
            current_dir: None,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_current_dir(mut self, dir: PathBuf) -> Self {
        self.current_dir = Some(dir);
        self
    }
}

/// Capture limits applied to every invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    pub timeout: Duration,
    pub max_output_bytes: usize,
}

impl Default for RunLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// Outcome of one external process start. Immutable once produced.
///
/// `exit_code` is `None` when the process did not exit on its own (killed
/// at the deadline), never a fabricated zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub args: Vec<String>,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub duration_ms: u128,
    pub stdout: String,
    pub stderr: String,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

impl ExecutionResult {
    /// Whether the process exited on its own with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Validate an argument vector, returning the reasons if any.
pub fn validate_command(spec: &CommandSpec) -> Option<Vec<String>> {
    let mut errors = Vec::new();
    if spec.args.is_empty() {
        errors.push("args must be non-empty".to_string());
    }
    if spec.args.len() > MAX_ARGS {
        errors.push(format!("args exceeds max count ({MAX_ARGS})"));
    }
    for (idx, arg) in spec.args.iter().enumerate() {
        if arg.is_empty() {
            errors.push(format!("args[{idx}] is empty"));
        }
        if arg.len() > MAX_ARG_LEN {
            errors.push(format!("args[{idx}] exceeds max length ({MAX_ARG_LEN})"));
        }
        if arg.contains('\0') {
            errors.push(format!("args[{idx}] contains NUL"));
        }
    }
    if let Some(timeout) = spec.timeout {
        if timeout.is_zero() {
            errors.push("timeout must be > 0".to_string());
        }
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

/// Resolve a program name to an executable without shell interpretation.
pub fn resolve_executable(name: &str) -> Result<PathBuf, ToolError> {
    match which::which(name) {
        Ok(path) => Ok(path),
        Err(_) => {
            if Path::new(name).is_file() {
                Err(ToolError::PermissionDenied {
                    name: name.to_string(),
                })
            } else {
                Err(ToolError::ExecutableNotFound {
                    name: name.to_string(),
                })
            }
        }
    }
}

/// Run one external process to completion or deadline.
///
/// Non-zero exit is a normal result. A deadline hit force-kills the child
/// and reports `timed_out` with no exit code. Streams are drained
/// concurrently into capped buffers; excess bytes are dropped and flagged.
pub fn run(spec: &CommandSpec, limits: &RunLimits) -> Result<ExecutionResult, ToolError> {
    if let Some(reasons) = validate_command(spec) {
        return Err(ToolError::InvalidCommand { reasons });
    }
    let program = resolve_executable(&spec.args[0])?;
    let timeout = spec.timeout.unwrap_or(limits.timeout);

    let mut command = Command::new(&program);
    command
        .args(&spec.args[1..])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.current_dir {
        command.current_dir(dir);
    }

    let start = Instant::now();
    let mut child = command.spawn().map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => ToolError::ExecutableNotFound {
            name: spec.args[0].clone(),
        },
        std::io::ErrorKind::PermissionDenied => ToolError::PermissionDenied {
            name: spec.args[0].clone(),
        },
        _ => ToolError::Io(err),
    })?;

    let stdout = drain_stream(child.stdout.take(), limits.max_output_bytes);
    let stderr = drain_stream(child.stderr.take(), limits.max_output_bytes);

    let mut timed_out = false;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {}
            Err(err) => {
                let _ = child.kill();
                return Err(ToolError::Io(err));
            }
        }
        if start.elapsed() > timeout {
            timed_out = true;
            let _ = child.kill();
            break;
        }
        thread::sleep(Duration::from_millis(25));
    }
    let status = child.wait()?;

    let (stdout, stdout_truncated) = join_capture(stdout);
    let (stderr, stderr_truncated) = join_capture(stderr);
    let exit_code = if timed_out { None } else { status.code() };
    let duration_ms = start.elapsed().as_millis();

    tracing::debug!(
        program = %program.display(),
        exit_code = ?exit_code,
        timed_out,
        duration_ms,
        "external command finished"
    );

    Ok(ExecutionResult {
        args: spec.args.clone(),
        exit_code,
        timed_out,
        duration_ms,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

type Capture = JoinHandle<(Vec<u8>, bool)>;

/// Drain a child stream on its own thread so the pipe never backs up,
/// keeping at most `cap` bytes.
fn drain_stream<R: Read + Send + 'static>(stream: Option<R>, cap: usize) -> Option<Capture> {
    let mut reader = stream?;
    Some(thread::spawn(move || {
        let mut buf = Vec::new();
        let mut truncated = false;
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    let take = n.min(cap.saturating_sub(buf.len()));
                    buf.extend_from_slice(&chunk[..take]);
                    if take < n {
                        truncated = true;
                    }
                }
            }
        }
        (buf, truncated)
    }))
}

fn join_capture(handle: Option<Capture>) -> (String, bool) {
    match handle.and_then(|handle| handle.join().ok()) {
        Some((bytes, truncated)) => (String::from_utf8_lossy(&bytes).into_owned(), truncated),
        None => (String::new(), false),
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
