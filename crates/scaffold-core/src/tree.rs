use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::diagnostics::Diagnostic;
use crate::diagnostics::DiagnosticCode;
use crate::error::TreeError;
use crate::step::Step;
use crate::step::StepKind;
use crate::step::StepStatus;

/// A node of the virtual file tree. `path` is `/`-prefixed and unique across
/// the whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FileNode {
    File {
        name: String,
        path: String,
        content: String,
    },
    Folder {
        name: String,
        path: String,
        children: Vec<FileNode>,
    },
}

impl FileNode {
    pub fn file(name: impl Into<String>, path: impl Into<String>, content: impl Into<String>) -> Self {
        Self::File {
            name: name.into(),
            path: path.into(),
            content: content.into(),
        }
    }

    pub fn folder(name: impl Into<String>, path: impl Into<String>, children: Vec<FileNode>) -> Self {
        Self::Folder {
            name: name.into(),
            path: path.into(),
            children,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Folder { name, .. } => name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File { path, .. } | Self::Folder { path, .. } => path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match self {
            Self::File { content, .. } => Some(content),
            Self::Folder { .. } => None,
        }
    }

    pub fn children(&self) -> &[FileNode] {
        match self {
            Self::File { .. } => &[],
            Self::Folder { children, .. } => children,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeUpdate {
    pub tree: Vec<FileNode>,
    pub applied: BTreeSet<u64>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
    /// Every step in the list is marked completed once a batch is applied,
    /// including run-script steps that were never executed.
    #[default]
    WholeBatch,
    /// Only create-file steps that were written to the tree are completed.
    AppliedOnly,
}

/// Splits a step path into its usable segments. Empty and `.` segments are
/// dropped; `..` and paths with nothing left are rejected.
pub fn split_path(path: &str) -> Result<Vec<&str>, TreeError> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(TreeError::InvalidPath {
                    path: path.to_string(),
                })
            }
            segment => segments.push(segment),
        }
    }
    if segments.is_empty() {
        return Err(TreeError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}

/// Writes every pending create-file step into a copy of `tree`, in input
/// order. A step whose path collides with a node of the other kind is skipped
/// with a diagnostic. An invalid path fails the whole call and the caller's
/// tree is left as it was.
pub fn apply_steps(tree: &[FileNode], steps: &[Step]) -> Result<TreeUpdate, TreeError> {
    let mut update = TreeUpdate {
        tree: tree.to_vec(),
        ..TreeUpdate::default()
    };

    for step in steps
        .iter()
        .filter(|step| step.is_pending() && step.kind == StepKind::CreateFile)
    {
        let path = step.path.as_deref().unwrap_or_default();
        let segments = split_path(path)?;
        let content = step.code.clone().unwrap_or_default();

        match write_file(&mut update.tree, &segments, content) {
            Ok(written) => {
                tracing::debug!(id = step.id, path = %written, "applied step to tree");
                update.applied.insert(step.id);
            }
            Err(Collision { path: conflict }) => update.diagnostics.push(
                Diagnostic::warn(
                    DiagnosticCode::PathCollision,
                    format!("step path {path} collides with existing node {conflict}"),
                )
                .at(step.id),
            ),
        }
    }

    Ok(update)
}

struct Collision {
    path: String,
}

fn write_file(nodes: &mut Vec<FileNode>, segments: &[&str], content: String) -> Result<String, Collision> {
    let Some((file_name, folders)) = segments.split_last() else {
        return Err(Collision {
            path: String::new(),
        });
    };

    let mut level = nodes;
    let mut prefix = String::new();

    for folder in folders {
        prefix.push('/');
        prefix.push_str(folder);

        let idx = match level.iter().position(|node| node.path() == prefix) {
            Some(idx) => idx,
            None => {
                level.push(FileNode::folder(*folder, prefix.clone(), Vec::new()));
                level.len() - 1
            }
        };

        let current = level;
        level = match &mut current[idx] {
            FileNode::Folder { children, .. } => children,
            FileNode::File { .. } => return Err(Collision { path: prefix }),
        };
    }

    prefix.push('/');
    prefix.push_str(file_name);

    match level.iter().position(|node| node.path() == prefix) {
        Some(idx) => match &mut level[idx] {
            FileNode::File {
                content: existing, ..
            } => *existing = content,
            FileNode::Folder { .. } => return Err(Collision { path: prefix }),
        },
        None => level.push(FileNode::file(*file_name, prefix.clone(), content)),
    }

    Ok(prefix)
}

pub fn mark_batch_applied(
    steps: &mut [Step],
    applied: &BTreeSet<u64>,
    policy: CompletionPolicy,
) -> usize {
    let mut changed = 0;
    for step in steps.iter_mut() {
        let complete = match policy {
            CompletionPolicy::WholeBatch => true,
            CompletionPolicy::AppliedOnly => applied.contains(&step.id),
        };
        if complete && step.status != StepStatus::Completed {
            step.status = StepStatus::Completed;
            changed += 1;
        }
    }
    changed
}

pub fn find_node<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
    for node in nodes {
        if node.path() == path {
            return Some(node);
        }
        if let Some(found) = find_node(node.children(), path) {
            return Some(found);
        }
    }
    None
}

pub fn find_file<'a>(nodes: &'a [FileNode], path: &str) -> Option<&'a FileNode> {
    find_node(nodes, path).filter(|node| node.is_file())
}

pub fn first_file(nodes: &[FileNode]) -> Option<&FileNode> {
    for node in nodes {
        match node {
            FileNode::File { .. } => return Some(node),
            FileNode::Folder { children, .. } => {
                if let Some(found) = first_file(children) {
                    return Some(found);
                }
            }
        }
    }
    None
}

pub fn update_file_content(nodes: &mut [FileNode], path: &str, content: &str) -> bool {
    for node in nodes.iter_mut() {
        match node {
            FileNode::File {
                path: node_path,
                content: existing,
                ..
            } if node_path == path => {
                *existing = content.to_string();
                return true;
            }
            FileNode::Folder { children, .. } => {
                if update_file_content(children, path, content) {
                    return true;
                }
            }
            FileNode::File { .. } => {}
        }
    }
    false
}

pub fn parent_folders(path: &str) -> Vec<String> {
    let parts: Vec<&str> = path.split('/').filter(|part| !part.is_empty()).collect();
    let mut folders = Vec::new();
    let mut current = String::new();
    for part in parts.iter().take(parts.len().saturating_sub(1)) {
        current.push('/');
        current.push_str(part);
        folders.push(current.clone());
    }
    folders
}

pub fn count_files(nodes: &[FileNode]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            FileNode::File { .. } => 1,
            FileNode::Folder { children, .. } => count_files(children),
        })
        .sum()
}
