//! Read-only index over the materialized ffmpeg source snapshot.
//!
//! The index is built once at startup from a single recursive walk and
//! never mutated afterwards, so concurrent queries need no locking. All
//! lookups go through root-relative keys; anything that would resolve
//! outside the root is rejected outright.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Directory,
}

/// One entry of the source tree, addressed by its root-relative path
/// (forward-slash separated on every platform).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceNode {
    pub path: String,
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// Walk policy applied while building the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Skip files above this size, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: Option<u64>,
    /// Skip files with these extensions (no leading dot).
    #[serde(default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,
}

fn default_max_file_size() -> Option<u64> {
    Some(4 * 1024 * 1024)
}

fn default_excluded_extensions() -> Vec<String> {
    ["o", "a", "so", "dylib", "dll", "exe", "bin"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            excluded_extensions: default_excluded_extensions(),
        }
    }
}

impl IndexConfig {
    fn skips(&self, path: &Path, size: u64) -> bool {
        if self.max_file_size.is_some_and(|max| size > max) {
            return true;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => self.excluded_extensions.iter().any(|excluded| excluded == ext),
            None => false,
        }
    }
}

/// Immutable snapshot index: built once, queried many times.
#[derive(Debug, Clone)]
pub struct SourceIndex {
    root: PathBuf,
    nodes: BTreeMap<String, SourceNode>,
}

impl SourceIndex {
    /// Walk `root` once, recording every directory and every retained file.
    pub fn build(root: &Path, config: &IndexConfig) -> Result<Self, ToolError> {
        if !root.is_dir() {
            return Err(ToolError::PathNotFound {
                path: root.display().to_string(),
            });
        }
        let mut nodes = BTreeMap::new();
        walk(root, root, config, &mut nodes)?;
        Ok(Self {
            root: root.to_path_buf(),
            nodes,
        })
    }

    /// Build from an in-memory node list. Queries and suggestions work
    /// without a real tree; `read` still resolves against `root`.
    pub fn from_entries(root: &Path, entries: Vec<SourceNode>) -> Self {
        let nodes = entries
            .into_iter()
            .map(|node| (node.path.clone(), node))
            .collect();
        Self {
            root: root.to_path_buf(),
            nodes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All file-kind nodes in path order.
    pub fn files(&self) -> impl Iterator<Item = &SourceNode> {
        self.nodes
            .values()
            .filter(|node| node.kind == NodeKind::File)
    }

    /// Immediate children of `subpath` (`""` or `"/"` for the root), in
    /// path order. Never a recursive dump.
    pub fn list(&self, subpath: &str) -> Result<Vec<SourceNode>, ToolError> {
        let rel = normalize_subpath(subpath)?;
        if !rel.is_empty() {
            match self.nodes.get(&rel) {
                None => {
                    return Err(ToolError::PathNotFound { path: rel });
                }
                Some(node) if node.kind == NodeKind::File => {
                    return Err(ToolError::NotADirectory { path: rel });
                }
                Some(_) => {}
            }
        }
        let prefix = if rel.is_empty() {
            String::new()
        } else {
            format!("{rel}/")
        };
        let mut children = Vec::new();
        for (path, node) in self.nodes.range(prefix.clone()..) {
            if !path.starts_with(&prefix) {
                break;
            }
            let rest = &path[prefix.len()..];
            if !rest.contains('/') {
                children.push(node.clone());
            }
        }
        Ok(children)
    }

    /// Full contents of a file-kind node as lossy UTF-8 text.
    ///
    /// Files skipped by the walk policy are absent from the index and
    /// report `PathNotFound` like any other unknown path.
    pub fn read(&self, path: &str) -> Result<String, ToolError> {
        let rel = normalize_subpath(path)?;
        let node = self
            .nodes
            .get(&rel)
            .ok_or_else(|| ToolError::PathNotFound { path: rel.clone() })?;
        if node.kind == NodeKind::Directory {
            return Err(ToolError::NotAFile { path: rel });
        }
        let bytes = fs::read(self.root.join(&rel))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Normalize a caller-supplied subpath into an index key.
///
/// A leading `/` is root-anchored; `..` components are rejected, never
/// clamped.
fn normalize_subpath(raw: &str) -> Result<String, ToolError> {
    let trimmed = raw.trim_matches('/');
    let mut parts = Vec::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => {
                return Err(ToolError::OutsideRoot {
                    path: raw.to_string(),
                });
            }
        }
    }
    Ok(parts.join("/"))
}

fn walk(
    root: &Path,
    dir: &Path,
    config: &IndexConfig,
    nodes: &mut BTreeMap<String, SourceNode>,
) -> Result<(), ToolError> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;
        let Some(rel) = rel_key(root, &path) else {
            continue;
        };
        if file_type.is_dir() {
            nodes.insert(
                rel.clone(),
                SourceNode {
                    path: rel,
                    kind: NodeKind::Directory,
                    size: None,
                },
            );
            walk(root, &path, config, nodes)?;
        } else if file_type.is_file() {
            let size = entry.metadata()?.len();
            if config.skips(&path, size) {
                continue;
            }
            nodes.insert(
                rel.clone(),
                SourceNode {
                    path: rel,
                    kind: NodeKind::File,
                    size: Some(size),
                },
            );
        }
        // symlinks and special files are not indexed
    }
    Ok(())
}

fn rel_key(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod tests;
