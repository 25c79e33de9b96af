//! Output artifact inspection and single-frame extraction.
//!
//! Both operations are secondary invocations of the external tools routed
//! through the same runner as primary commands, so there is exactly one
//! process-management code path in the crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::command::{self, CommandSpec, RunLimits};
use crate::error::ToolError;

const STDERR_SUMMARY_BYTES: usize = 512;

/// Inspection outcome for one declared output path.
///
/// An inspection failure is recorded here with `exists = true` and no
/// metadata; it is never conflated with an absent file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub path: PathBuf,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspect_error: Option<String>,
}

/// Inspect one path, folding any inspection failure into the descriptor.
pub fn inspect_path(ffprobe: &str, path: &Path, limits: &RunLimits) -> ArtifactDescriptor {
    if !path.exists() {
        return ArtifactDescriptor {
            path: path.to_path_buf(),
            exists: false,
            metadata: None,
            inspect_error: None,
        };
    }
    match probe_media(ffprobe, path, limits) {
        Ok(metadata) => ArtifactDescriptor {
            path: path.to_path_buf(),
            exists: true,
            metadata: Some(metadata),
            inspect_error: None,
        },
        Err(err) => ArtifactDescriptor {
            path: path.to_path_buf(),
            exists: true,
            metadata: None,
            inspect_error: Some(err.to_string()),
        },
    }
}

/// Run the read-only ffprobe invocation and flatten its JSON document.
pub fn probe_media(
    ffprobe: &str,
    path: &Path,
    limits: &RunLimits,
) -> Result<BTreeMap<String, String>, ToolError> {
    let args = vec![
        ffprobe.to_string(),
        "-v".to_string(),
        "quiet".to_string(),
        "-print_format".to_string(),
        "json".to_string(),
        "-show_format".to_string(),
        "-show_streams".to_string(),
        path.display().to_string(),
    ];
    let result = command::run(&CommandSpec::new(args), limits)?;
    if result.timed_out {
        return Err(ToolError::Timeout {
            command: ffprobe.to_string(),
            timeout: limits.timeout,
        });
    }
    if !result.success() {
        return Err(ToolError::InspectionFailed {
            path: path.to_path_buf(),
            detail: summarize_stderr(&result.stderr, result.exit_code),
        });
    }
    let doc: Value = serde_json::from_str(&result.stdout).map_err(|err| {
        ToolError::InspectionFailed {
            path: path.to_path_buf(),
            detail: format!("unparseable ffprobe output: {err}"),
        }
    })?;
    Ok(metadata_from_json(&doc))
}

/// Flatten an ffprobe document into a deterministic property map.
pub fn metadata_from_json(doc: &Value) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    if let Some(format) = doc.get("format") {
        copy_field(format, "format_name", "format_name", &mut metadata);
        copy_field(format, "duration", "duration", &mut metadata);
        copy_field(format, "size", "size", &mut metadata);
        copy_field(format, "bit_rate", "bit_rate", &mut metadata);
    }
    let Some(streams) = doc.get("streams").and_then(Value::as_array) else {
        return metadata;
    };
    metadata.insert("stream_count".to_string(), streams.len().to_string());
    if let Some(video) = stream_of_type(streams, "video") {
        copy_field(video, "codec_name", "video_codec", &mut metadata);
        copy_field(video, "pix_fmt", "pix_fmt", &mut metadata);
        copy_field(video, "avg_frame_rate", "frame_rate", &mut metadata);
        let width = video.get("width").and_then(Value::as_u64);
        let height = video.get("height").and_then(Value::as_u64);
        if let (Some(width), Some(height)) = (width, height) {
            metadata.insert("width".to_string(), width.to_string());
            metadata.insert("height".to_string(), height.to_string());
            metadata.insert("resolution".to_string(), format!("{width}x{height}"));
        }
    }
    if let Some(audio) = stream_of_type(streams, "audio") {
        copy_field(audio, "codec_name", "audio_codec", &mut metadata);
        copy_field(audio, "sample_rate", "sample_rate", &mut metadata);
        if let Some(channels) = audio.get("channels").and_then(Value::as_u64) {
            metadata.insert("channels".to_string(), channels.to_string());
        }
    }
    metadata
}

fn stream_of_type<'a>(streams: &'a [Value], codec_type: &str) -> Option<&'a Value> {
    streams
        .iter()
        .find(|stream| stream.get("codec_type").and_then(Value::as_str) == Some(codec_type))
}

fn copy_field(obj: &Value, key: &str, out_key: &str, metadata: &mut BTreeMap<String, String>) {
    if let Some(value) = obj.get(key).and_then(Value::as_str) {
        metadata.insert(out_key.to_string(), value.to_string());
    }
}

/// Media duration in seconds, when the probe reported one.
pub fn duration_seconds(metadata: &BTreeMap<String, String>) -> Option<f64> {
    metadata.get("duration").and_then(|raw| raw.parse::<f64>().ok())
}

/// Parse a timestamp given as plain seconds (`"12.5"`) or clock form
/// (`"HH:MM:SS[.frac]"`, `"MM:SS"`).
pub fn parse_timestamp(raw: &str) -> Result<f64, ToolError> {
    let trimmed = raw.trim();
    if let Ok(seconds) = trimmed.parse::<f64>() {
        if seconds.is_finite() && seconds >= 0.0 {
            return Ok(seconds);
        }
        return Err(invalid_timestamp(raw));
    }
    let parts: Vec<&str> = trimmed.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(invalid_timestamp(raw));
    }
    let mut seconds = 0.0;
    for part in parts {
        let value: f64 = part.parse().map_err(|_| invalid_timestamp(raw))?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid_timestamp(raw));
        }
        seconds = seconds * 60.0 + value;
    }
    Ok(seconds)
}

fn invalid_timestamp(raw: &str) -> ToolError {
    ToolError::InvalidCommand {
        reasons: vec![format!("unparseable timestamp {raw:?}")],
    }
}

/// Extract a single frame as a PNG image and return its path.
///
/// With an explicit `output` the call is deterministic and overwrites in
/// place; otherwise each call allocates a fresh temp path. `known_duration`
/// (from a prior inspect) gates the timestamp before any process starts.
pub fn extract_frame(
    ffmpeg: &str,
    path: &Path,
    timestamp: Option<&str>,
    output: Option<PathBuf>,
    known_duration: Option<f64>,
    limits: &RunLimits,
) -> Result<PathBuf, ToolError> {
    let raw_timestamp = timestamp.unwrap_or("0");
    let seconds = parse_timestamp(raw_timestamp)?;
    if let Some(duration) = known_duration {
        if seconds > duration {
            return Err(ToolError::TimestampOutOfRange {
                requested: seconds,
                duration: Some(duration),
            });
        }
    }

    let output = match output {
        Some(explicit) => explicit,
        None => {
            let file = tempfile::Builder::new()
                .prefix("frame-")
                .suffix(".png")
                .tempfile()?;
            file.into_temp_path()
                .keep()
                .map_err(|err| ToolError::Io(err.error))?
        }
    };

    let args = vec![
        ffmpeg.to_string(),
        "-ss".to_string(),
        raw_timestamp.to_string(),
        "-i".to_string(),
        path.display().to_string(),
        "-frames:v".to_string(),
        "1".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-y".to_string(),
        output.display().to_string(),
    ];
    let result = command::run(&CommandSpec::new(args), limits)?;
    if result.timed_out {
        return Err(ToolError::Timeout {
            command: ffmpeg.to_string(),
            timeout: limits.timeout,
        });
    }

    let produced = output.metadata().map(|meta| meta.len()).unwrap_or(0);
    if result.success() && produced > 0 {
        tracing::debug!(output = %output.display(), bytes = produced, "frame extracted");
        return Ok(output);
    }
    // duration unknown up front: an empty image at a valid command means the
    // seek point was past the end of the stream
    let past_end = result.stderr.contains("Output file is empty")
        || (result.success() && produced == 0);
    if known_duration.is_none() && past_end {
        return Err(ToolError::TimestampOutOfRange {
            requested: seconds,
            duration: None,
        });
    }
    Err(ToolError::InspectionFailed {
        path: path.to_path_buf(),
        detail: summarize_stderr(&result.stderr, result.exit_code),
    })
}

fn summarize_stderr(stderr: &str, exit_code: Option<i32>) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        return match exit_code {
            Some(code) => format!("exit code {code} with no diagnostic output"),
            None => "no diagnostic output".to_string(),
        };
    }
    let mut summary = String::new();
    for ch in trimmed.chars() {
        if summary.len() + ch.len_utf8() > STDERR_SUMMARY_BYTES {
            break;
        }
        summary.push(ch);
    }
    summary
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
