use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::tree::FileNode;

/// Nested name-keyed record handed to the sandbox runtime's mount call.
/// Serializes to `{"src": {"directory": {...}}, "a.txt": {"file": {"contents": "..."}}}`.
pub type MountTree = BTreeMap<String, MountEntry>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MountEntry {
    Directory { directory: MountTree },
    File { file: FileContents },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContents {
    pub contents: String,
}

impl MountEntry {
    pub fn file(contents: impl Into<String>) -> Self {
        Self::File {
            file: FileContents {
                contents: contents.into(),
            },
        }
    }

    pub fn directory(entries: MountTree) -> Self {
        Self::Directory { directory: entries }
    }
}

/// Projects the in-memory tree into mount records keyed by node name.
/// Siblings are expected to have distinct names; on a clash the first node
/// wins and the rest are dropped with a warning.
pub fn project(tree: &[FileNode]) -> MountTree {
    let mut out = MountTree::new();
    for node in tree {
        let entry = match node {
            FileNode::File { content, .. } => MountEntry::file(content.as_str()),
            FileNode::Folder { children, .. } => MountEntry::directory(project(children)),
        };
        match out.entry(node.name().to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            Entry::Occupied(_) => {
                tracing::warn!(path = node.path(), "duplicate sibling name dropped from mount");
            }
        }
    }
    out
}

pub fn count_mounted_files(tree: &MountTree) -> usize {
    tree.values()
        .map(|entry| match entry {
            MountEntry::File { .. } => 1,
            MountEntry::Directory { directory } => count_mounted_files(directory),
        })
        .sum()
}
