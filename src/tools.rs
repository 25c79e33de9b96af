//! Operation facade handed to the transport layer.
//!
//! `Tools` owns the resolved executables, the execution limits, and the
//! source index. It is immutable after construction, so a surrounding
//! server may share one instance across concurrently dispatched calls
//! without synchronization.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::artifact::{self, ArtifactDescriptor};
use crate::command::{self, CommandSpec, ExecutionResult, RunLimits};
use crate::config::ToolsConfig;
use crate::error::ToolError;
use crate::source::{SourceIndex, SourceNode};
use crate::suggest::{self, ValidationHint};

#[derive(Debug)]
pub struct Tools {
    config: ToolsConfig,
    limits: RunLimits,
    index: Option<SourceIndex>,
}

impl Tools {
    /// Resolve the required executables and build the source index.
    ///
    /// Fails fast and distinctly when an executable is missing or a
    /// configured source root does not exist.
    pub fn new(config: ToolsConfig) -> Result<Self, ToolError> {
        command::resolve_executable(&config.ffmpeg_bin)?;
        command::resolve_executable(&config.ffprobe_bin)?;
        let index = match &config.source_root {
            Some(root) => {
                let index = SourceIndex::build(root, &config.index)?;
                tracing::info!(
                    root = %root.display(),
                    nodes = index.len(),
                    "source index built"
                );
                Some(index)
            }
            None => None,
        };
        let limits = RunLimits {
            timeout: Duration::from_millis(config.default_timeout_ms),
            max_output_bytes: config.max_output_bytes,
        };
        Ok(Self {
            config,
            limits,
            index,
        })
    }

    /// Execution limits derived from the configuration.
    pub fn limits(&self) -> RunLimits {
        self.limits
    }

    /// Run an argument vector to completion or deadline.
    ///
    /// Vectors targeting the configured ffmpeg binary get `-v warning -y`
    /// appended so unattended runs never wait on an overwrite prompt;
    /// ffmpeg takes the last occurrence of an option, so caller-supplied
    /// values still win.
    pub fn execute(&self, mut spec: CommandSpec) -> Result<ExecutionResult, ToolError> {
        if self.targets_ffmpeg(&spec) {
            for arg in ["-v", "warning", "-y"] {
                spec.args.push(arg.to_string());
            }
        }
        command::run(&spec, &self.limits)
    }

    /// Inspect declared output paths, in order. Inspection failures are
    /// recorded per descriptor, never conflated with absence.
    pub fn probe(&self, paths: &[PathBuf]) -> Vec<ArtifactDescriptor> {
        paths
            .iter()
            .map(|path| artifact::inspect_path(&self.config.ffprobe_bin, path, &self.limits))
            .collect()
    }

    /// Extract a single frame from `path` and return the image location.
    pub fn screenshot(
        &self,
        path: &Path,
        timestamp: Option<&str>,
        output: Option<PathBuf>,
    ) -> Result<PathBuf, ToolError> {
        let known_duration = artifact::probe_media(&self.config.ffprobe_bin, path, &self.limits)
            .ok()
            .as_ref()
            .and_then(artifact::duration_seconds);
        artifact::extract_frame(
            &self.config.ffmpeg_bin,
            path,
            timestamp,
            output,
            known_duration,
            &self.limits,
        )
    }

    /// Immediate children of a source-tree path.
    pub fn list_source(&self, subpath: &str) -> Result<Vec<SourceNode>, ToolError> {
        self.index()?.list(subpath)
    }

    /// Full contents of a source file.
    pub fn read_source(&self, path: &str) -> Result<String, ToolError> {
        self.index()?.read(path)
    }

    /// Heuristic source hints for a failed command. An empty list is a
    /// normal outcome.
    pub fn validate(
        &self,
        failed_args: &[String],
        stderr: &str,
    ) -> Result<Vec<ValidationHint>, ToolError> {
        Ok(suggest::suggest(failed_args, stderr, self.index()?))
    }

    fn index(&self) -> Result<&SourceIndex, ToolError> {
        self.index.as_ref().ok_or(ToolError::IndexNotBuilt)
    }

    fn targets_ffmpeg(&self, spec: &CommandSpec) -> bool {
        spec.args
            .first()
            .is_some_and(|first| program_name(first) == program_name(&self.config.ffmpeg_bin))
    }
}

fn program_name(raw: &str) -> &str {
    Path::new(raw)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(raw)
}
