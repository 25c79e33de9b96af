//! Toolkit configuration: binaries, limits, and index policy.
//!
//! Every field has a default so an empty `{}` file (or no file at all)
//! yields a working configuration.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::command::{DEFAULT_MAX_OUTPUT_BYTES, DEFAULT_TIMEOUT_MS};
use crate::source::IndexConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Program name (or path) of the encode/transcode binary.
    #[serde(default = "default_ffmpeg_bin")]
    pub ffmpeg_bin: String,

    /// Program name (or path) of the read-only inspector.
    #[serde(default = "default_ffprobe_bin")]
    pub ffprobe_bin: String,

    /// Root of the materialized ffmpeg source snapshot. Optional; source
    /// operations report `IndexNotBuilt` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,

    /// Deadline applied when a command carries none of its own.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Per-stream capture cap for spawned processes.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,

    #[serde(default)]
    pub index: IndexConfig,
}

fn default_ffmpeg_bin() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_bin() -> String {
    "ffprobe".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_output_bytes() -> usize {
    DEFAULT_MAX_OUTPUT_BYTES
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_bin: default_ffmpeg_bin(),
            ffprobe_bin: default_ffprobe_bin(),
            source_root: None,
            default_timeout_ms: default_timeout_ms(),
            max_output_bytes: default_max_output_bytes(),
            index: IndexConfig::default(),
        }
    }
}

/// Load a configuration from a JSON file.
pub fn load_config(path: &Path) -> Result<ToolsConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: ToolsConfig =
        serde_json::from_slice(&bytes).context("parse toolkit config JSON")?;
    Ok(config)
}

/// Persist a configuration to disk in a stable JSON format.
pub fn write_config(path: &Path, config: &ToolsConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize toolkit config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate field-level constraints.
pub fn validate_config(config: &ToolsConfig) -> Result<()> {
    if config.ffmpeg_bin.trim().is_empty() {
        return Err(anyhow!("ffmpeg_bin must be non-empty"));
    }
    if config.ffprobe_bin.trim().is_empty() {
        return Err(anyhow!("ffprobe_bin must be non-empty"));
    }
    if config.default_timeout_ms == 0 {
        return Err(anyhow!("default_timeout_ms must be > 0"));
    }
    if config.max_output_bytes == 0 {
        return Err(anyhow!("max_output_bytes must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
