//! End-to-end coverage against real ffmpeg/ffprobe binaries.
//!
//! Tests return early when the binaries are not installed; the fixture
//! clip is generated on the fly from the lavfi test source so no media
//! files are checked in.

use ffmpeg_agent::{CommandSpec, ToolError, Tools, ToolsConfig};
use std::path::{Path, PathBuf};

fn ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

fn toolkit() -> Tools {
    Tools::new(ToolsConfig::default()).expect("ffmpeg and ffprobe resolve")
}

fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|token| token.to_string()).collect()
}

/// One-second synthetic clip; mpeg4 keeps the encoder dependency-free.
fn generate_clip(tools: &Tools, dir: &Path) -> PathBuf {
    let clip = dir.join("clip.mp4");
    let spec = CommandSpec::new(args(&[
        "ffmpeg",
        "-f",
        "lavfi",
        "-i",
        "testsrc=duration=1:size=128x72:rate=10",
        "-c:v",
        "mpeg4",
        "-pix_fmt",
        "yuv420p",
        clip.to_str().expect("utf-8 temp path"),
    ]));
    let result = tools.execute(spec).expect("ffmpeg spawns");
    assert!(
        result.success(),
        "fixture encode failed: {}",
        result.stderr
    );
    clip
}

#[test]
fn version_query_succeeds() {
    if !ffmpeg_available() {
        return;
    }
    let tools = toolkit();
    let result = tools
        .execute(CommandSpec::new(args(&["ffprobe", "-version"])))
        .expect("ffprobe runs");
    assert!(result.success());
    assert!(result.stdout.contains("ffprobe"));
}

#[test]
fn encode_probe_and_screenshot_round_trip() {
    if !ffmpeg_available() {
        return;
    }
    let tools = toolkit();
    let dir = tempfile::tempdir().expect("create temp dir");
    let clip = generate_clip(&tools, dir.path());

    let missing = dir.path().join("never-written.mp4");
    let descriptors = tools.probe(&[clip.clone(), missing.clone()]);
    assert_eq!(descriptors.len(), 2);

    let produced = &descriptors[0];
    assert!(produced.exists);
    let metadata = produced.metadata.as_ref().expect("clip inspects");
    let duration: f64 = metadata
        .get("duration")
        .expect("duration reported")
        .parse()
        .expect("duration parses");
    assert!((duration - 1.0).abs() < 0.3, "unexpected duration {duration}");
    assert_eq!(metadata.get("resolution").map(String::as_str), Some("128x72"));

    assert!(!descriptors[1].exists);
    assert!(descriptors[1].metadata.is_none());

    // inspection is idempotent on an unchanged file
    let again = tools.probe(&[clip.clone()]);
    assert_eq!(again[0].metadata, produced.metadata);

    let frame = tools
        .screenshot(&clip, Some("0.5"), Some(dir.path().join("frame.png")))
        .expect("frame extracts");
    let size = std::fs::metadata(&frame).expect("frame exists").len();
    assert!(size > 0);

    match tools.screenshot(&clip, Some("30"), None) {
        Err(ToolError::TimestampOutOfRange { requested, .. }) => {
            assert!((requested - 30.0).abs() < 1e-9);
        }
        other => panic!("expected TimestampOutOfRange, got {other:?}"),
    }
}

#[test]
fn source_operations_require_a_configured_root() {
    if !ffmpeg_available() {
        return;
    }
    let tools = toolkit();
    match tools.list_source("") {
        Err(ToolError::IndexNotBuilt) => {}
        other => panic!("expected IndexNotBuilt, got {other:?}"),
    }
    match tools.read_source("libavfilter/vf_scale.c") {
        Err(ToolError::IndexNotBuilt) => {}
        other => panic!("expected IndexNotBuilt, got {other:?}"),
    }
}

#[test]
fn startup_fails_fast_on_missing_executable() {
    let config = ToolsConfig {
        ffmpeg_bin: "no-such-encoder-19af".to_string(),
        ..ToolsConfig::default()
    };
    match Tools::new(config) {
        Err(ToolError::ExecutableNotFound { name }) => {
            assert_eq!(name, "no-such-encoder-19af");
        }
        Ok(_) => panic!("expected ExecutableNotFound, got a toolkit"),
        Err(other) => panic!("expected ExecutableNotFound, got {other:?}"),
    }
}

#[test]
fn startup_fails_fast_on_missing_source_root() {
    if !ffmpeg_available() {
        return;
    }
    let config = ToolsConfig {
        source_root: Some(PathBuf::from("/no/such/snapshot-41c2")),
        ..ToolsConfig::default()
    };
    match Tools::new(config) {
        Err(ToolError::PathNotFound { path }) => assert!(path.contains("snapshot-41c2")),
        Ok(_) => panic!("expected PathNotFound, got a toolkit"),
        Err(other) => panic!("expected PathNotFound, got {other:?}"),
    }
}
