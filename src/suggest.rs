//! Heuristic mapping from a failed command to likely source locations.
//!
//! A pure function over the attempted argument vector, the captured
//! stderr, and the index snapshot: no filesystem access, no side
//! effects. An empty result is a normal outcome, never an error, and a
//! suggestion never blocks or rejects anything; it only informs the
//! caller's next retry.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::source::{SourceIndex, SourceNode};

/// Hints returned per call, best match first.
pub const MAX_HINTS: usize = 20;

/// Options whose following value is a filtergraph description.
const FILTER_OPTIONS: &[&str] = &["vf", "af", "filter", "filter_complex", "lavfi"];

/// Conventional stem prefixes of ffmpeg filter/source/sink files, so the
/// bare filter name `scale` matches `vf_scale.c` exactly.
const STEM_PREFIXES: &[&str] = &[
    "vf_", "af_", "avf_", "vsrc_", "asrc_", "vsink_", "asink_", "f_", "src_",
];

/// Exact stem matches outrank substring matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Substring,
}

/// One ranked suggestion: a source node plus the tokens that selected it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationHint {
    pub node: SourceNode,
    pub matched_tokens: Vec<String>,
    pub match_kind: MatchKind,
}

/// Rank indexed source files likely related to a failed invocation.
///
/// Ordering is deterministic: match class, then shorter relative path,
/// then lexical path order.
pub fn suggest(args: &[String], stderr: &str, index: &SourceIndex) -> Vec<ValidationHint> {
    let candidates = extract_candidates(args, stderr);
    if candidates.is_empty() {
        return Vec::new();
    }

    let mut by_path: BTreeMap<&str, ValidationHint> = BTreeMap::new();
    for node in index.files() {
        let Some(stem) = file_stem(&node.path) else {
            continue;
        };
        let mut matched: Vec<String> = Vec::new();
        let mut best: Option<MatchKind> = None;
        for token in &candidates {
            if let Some(kind) = match_stem(stem, token) {
                matched.push(token.clone());
                best = Some(best.map_or(kind, |existing| existing.min(kind)));
            }
        }
        if let Some(match_kind) = best {
            matched.sort();
            matched.dedup();
            by_path.insert(
                node.path.as_str(),
                ValidationHint {
                    node: node.clone(),
                    matched_tokens: matched,
                    match_kind,
                },
            );
        }
    }

    let mut hints: Vec<ValidationHint> = by_path.into_values().collect();
    hints.sort_by(|a, b| {
        a.match_kind
            .cmp(&b.match_kind)
            .then_with(|| a.node.path.len().cmp(&b.node.path.len()))
            .then_with(|| a.node.path.cmp(&b.node.path))
    });
    hints.truncate(MAX_HINTS);
    hints
}

/// Candidate identifiers from option tokens, filtergraph values, and
/// quoted names inside stderr. Order-stable and deduplicated.
fn extract_candidates(args: &[String], stderr: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    for (idx, arg) in args.iter().enumerate() {
        let Some(option) = option_name(arg) else {
            continue;
        };
        if FILTER_OPTIONS.contains(&option) {
            // the option itself is a carrier; the filter names live in
            // the following value
            if let Some(value) = args.get(idx + 1) {
                for name in filtergraph_names(value) {
                    push_candidate(name, &mut candidates);
                }
            }
            continue;
        }
        push_candidate(option, &mut candidates);
    }
    let quoted = Regex::new(r#"['"]([A-Za-z0-9_]{2,})['"]"#).expect("quoted identifier pattern");
    for capture in quoted.captures_iter(stderr) {
        if let Some(name) = capture.get(1) {
            push_candidate(name.as_str(), &mut candidates);
        }
    }
    candidates
}

fn push_candidate(raw: &str, candidates: &mut Vec<String>) {
    if raw.len() < 2 || raw.chars().all(|ch| ch.is_ascii_digit()) {
        return;
    }
    if !raw
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return;
    }
    if candidates.iter().any(|existing| existing == raw) {
        return;
    }
    candidates.push(raw.to_string());
}

/// `-vf`, `--vf`, and `-filter:v` all name the option `vf` / `filter`.
fn option_name(arg: &str) -> Option<&str> {
    let stripped = arg.strip_prefix('-')?;
    let stripped = stripped.strip_prefix('-').unwrap_or(stripped);
    let name = stripped.split(':').next().unwrap_or(stripped);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Leading identifier of each chain link: `[0:v]scale=320:-1,unsharp`
/// yields `scale` and `unsharp`.
fn filtergraph_names(value: &str) -> Vec<&str> {
    let mut names = Vec::new();
    for link in value.split([',', ';']) {
        let mut link = link.trim();
        while let Some(rest) = link.strip_prefix('[') {
            match rest.split_once(']') {
                Some((_, after)) => link = after.trim_start(),
                None => {
                    link = "";
                    break;
                }
            }
        }
        let name = link.split(['=', ' ']).next().unwrap_or("");
        if !name.is_empty() {
            names.push(name);
        }
    }
    names
}

fn match_stem(stem: &str, token: &str) -> Option<MatchKind> {
    if stem == token {
        return Some(MatchKind::Exact);
    }
    if STEM_PREFIXES
        .iter()
        .any(|prefix| stem.strip_prefix(prefix) == Some(token))
    {
        return Some(MatchKind::Exact);
    }
    if token.len() >= 3 && stem.contains(token) {
        return Some(MatchKind::Substring);
    }
    None
}

fn file_stem(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next()?;
    Some(name.rsplit_once('.').map_or(name, |(stem, _)| stem))
}

#[cfg(test)]
#[path = "suggest_tests.rs"]
mod tests;
