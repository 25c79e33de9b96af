//! Error taxonomy for the toolkit.
//!
//! Process-level failure (a non-zero exit) is not an error here; it is a
//! normal [`crate::command::ExecutionResult`] surfaced verbatim for the
//! caller to interpret. Only infrastructural failures get a variant, and
//! each variant carries the offending path, token, or deadline so an
//! automated caller can decide between retry and abandon.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    /// The first token of an argument vector did not resolve to an
    /// executable on the search path.
    #[error("executable not found: {name}")]
    ExecutableNotFound { name: String },

    #[error("permission denied executing {name}")]
    PermissionDenied { name: String },

    /// The argument vector violated a structural constraint before spawn.
    #[error("invalid command: {}", .reasons.join("; "))]
    InvalidCommand { reasons: Vec<String> },

    /// A secondary inspect/extract invocation exceeded its deadline.
    #[error("{command} timed out after {}ms", .timeout.as_millis())]
    Timeout { command: String, timeout: Duration },

    /// A secondary inspect/extract invocation failed.
    #[error("inspection of {} failed: {detail}", .path.display())]
    InspectionFailed { path: PathBuf, detail: String },

    /// `duration` is `None` when the overrun was detected from the
    /// extraction itself rather than a prior inspect.
    #[error("timestamp {requested}s exceeds the media duration")]
    TimestampOutOfRange {
        requested: f64,
        duration: Option<f64>,
    },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("not a file: {path}")]
    NotAFile { path: String },

    #[error("not a directory: {path}")]
    NotADirectory { path: String },

    /// The path escapes the configured source root; rejected, never clamped.
    #[error("path escapes the source root: {path}")]
    OutsideRoot { path: String },

    /// A source operation was invoked without a configured source root.
    #[error("source index is not built (no source root configured)")]
    IndexNotBuilt,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
