//! Agent-facing ffmpeg execution, inspection, and source cross-reference.
//!
//! The crate exposes the operations an automated caller needs to drive
//! ffmpeg safely: execute an explicit argument vector, inspect produced
//! artifacts, capture a single frame, browse the materialized ffmpeg
//! source snapshot, and map a failed command back to candidate source
//! locations for the next retry. Argument vectors are passed straight to
//! process creation; no shell is ever involved.

pub mod artifact;
pub mod command;
pub mod config;
pub mod error;
pub mod source;
pub mod suggest;
pub mod tools;

pub use artifact::ArtifactDescriptor;
pub use command::{CommandSpec, ExecutionResult, RunLimits};
pub use config::ToolsConfig;
pub use error::ToolError;
pub use source::{IndexConfig, NodeKind, SourceIndex, SourceNode};
pub use suggest::ValidationHint;
pub use tools::Tools;
