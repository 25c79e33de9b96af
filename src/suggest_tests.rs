use super::{suggest, MatchKind};
use crate::source::{NodeKind, SourceIndex, SourceNode};
use std::path::Path;

fn node(path: &str, kind: NodeKind) -> SourceNode {
    SourceNode {
        path: path.to_string(),
        kind,
        size: match kind {
            NodeKind::File => Some(1024),
            NodeKind::Directory => None,
        },
    }
}

fn fake_index() -> SourceIndex {
    SourceIndex::from_entries(
        Path::new("/snapshot"),
        vec![
            node("libavfilter", NodeKind::Directory),
            node("libavfilter/vf_scale.c", NodeKind::File),
            node("libavfilter/vf_crop.c", NodeKind::File),
            node("libavfilter/af_volume.c", NodeKind::File),
            node("libavfilter/f_select.c", NodeKind::File),
            node("libswscale", NodeKind::Directory),
            node("libswscale/swscale.c", NodeKind::File),
            node("doc/filters.texi", NodeKind::File),
        ],
    )
}

fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|token| token.to_string()).collect()
}

#[test]
fn option_token_finds_exact_filter_file_first() {
    let hints = suggest(&args(&["ffmpeg", "-scale"]), "", &fake_index());
    assert!(!hints.is_empty());
    assert_eq!(hints[0].node.path, "libavfilter/vf_scale.c");
    assert_eq!(hints[0].match_kind, MatchKind::Exact);
    assert_eq!(hints[0].matched_tokens, vec!["scale".to_string()]);
    // the substring match on swscale.c ranks below the exact one
    assert!(hints
        .iter()
        .skip(1)
        .any(|hint| hint.node.path == "libswscale/swscale.c"
            && hint.match_kind == MatchKind::Substring));
}

#[test]
fn unknown_token_yields_no_hints() {
    let hints = suggest(&args(&["ffmpeg", "-unknownfilter"]), "", &fake_index());
    assert!(hints.is_empty());
}

#[test]
fn quoted_stderr_identifier_is_a_candidate() {
    let hints = suggest(&Vec::new(), "No such filter: 'crop'", &fake_index());
    assert!(!hints.is_empty());
    assert_eq!(hints[0].node.path, "libavfilter/vf_crop.c");
    assert_eq!(hints[0].matched_tokens, vec!["crop".to_string()]);
}

#[test]
fn filtergraph_value_names_are_candidates() {
    let failed = args(&[
        "ffmpeg",
        "-i",
        "in.mp4",
        "-vf",
        "[0:v]volume=0.5,select=eq(n\\,0)",
        "out.mp4",
    ]);
    let hints = suggest(&failed, "", &fake_index());
    let paths: Vec<&str> = hints.iter().map(|hint| hint.node.path.as_str()).collect();
    assert!(paths.contains(&"libavfilter/af_volume.c"));
    assert!(paths.contains(&"libavfilter/f_select.c"));
}

#[test]
fn empty_inputs_yield_no_hints() {
    assert!(suggest(&Vec::new(), "", &fake_index()).is_empty());
}

#[test]
fn suggestion_is_deterministic() {
    let failed = args(&["ffmpeg", "-i", "in.mp4", "-vf", "scale=320:-1", "out.mp4"]);
    let stderr = "Error reinitializing filters!";
    let first = suggest(&failed, stderr, &fake_index());
    let second = suggest(&failed, stderr, &fake_index());
    assert_eq!(first, second);
}

#[test]
fn path_ties_break_lexically() {
    let index = SourceIndex::from_entries(
        Path::new("/snapshot"),
        vec![
            node("a/x_scale.c", NodeKind::File),
            node("a/y_scale.c", NodeKind::File),
        ],
    );
    let hints = suggest(&args(&["-scale"]), "", &index);
    let paths: Vec<&str> = hints.iter().map(|hint| hint.node.path.as_str()).collect();
    assert_eq!(paths, vec!["a/x_scale.c", "a/y_scale.c"]);
}

#[test]
fn shorter_paths_rank_first_within_a_class() {
    let index = SourceIndex::from_entries(
        Path::new("/snapshot"),
        vec![
            node("libavfilter/x86/vf_scale_init.c", NodeKind::File),
            node("libswscale/swscale.c", NodeKind::File),
        ],
    );
    let hints = suggest(&args(&["-scale"]), "", &index);
    let paths: Vec<&str> = hints.iter().map(|hint| hint.node.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["libswscale/swscale.c", "libavfilter/x86/vf_scale_init.c"]
    );
}
