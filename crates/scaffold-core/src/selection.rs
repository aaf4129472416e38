use std::collections::BTreeSet;

use crate::tree::find_file;
use crate::tree::find_node;
use crate::tree::first_file;
use crate::tree::parent_folders;
use crate::tree::FileNode;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected_path: Option<String>,
    pub open_folders: BTreeSet<String>,
}

impl Selection {
    /// Brings the selection back in line with `tree`: the selected path must
    /// name a file, open folders must be existing folders, and when nothing is
    /// selected the first file is picked and its ancestors opened.
    pub fn reconcile(&mut self, tree: &[FileNode]) {
        if let Some(path) = self.selected_path.as_deref() {
            if find_file(tree, path).is_none() {
                self.selected_path = None;
            }
        }

        if self.selected_path.is_none() {
            if let Some(first) = first_file(tree) {
                let path = first.path().to_string();
                self.open_folders.extend(parent_folders(&path));
                self.selected_path = Some(path);
            }
        }

        self.open_folders
            .retain(|path| find_node(tree, path).is_some_and(FileNode::is_folder));
    }

    pub fn select_file(&mut self, tree: &[FileNode], path: &str) -> bool {
        if find_file(tree, path).is_none() {
            return false;
        }
        self.selected_path = Some(path.to_string());
        true
    }

    pub fn toggle_folder(&mut self, tree: &[FileNode], path: &str) -> bool {
        if !find_node(tree, path).is_some_and(FileNode::is_folder) {
            return false;
        }
        if !self.open_folders.remove(path) {
            self.open_folders.insert(path.to_string());
        }
        true
    }

    pub fn selected_file<'a>(&self, tree: &'a [FileNode]) -> Option<&'a FileNode> {
        self.selected_path
            .as_deref()
            .and_then(|path| find_file(tree, path))
    }
}

/// Indented text outline of `tree`. With a selection, only open folders are
/// expanded and the selected file is marked with `>`; without one, every
/// folder is expanded.
pub fn render_outline(tree: &[FileNode], selection: Option<&Selection>) -> String {
    let mut out = String::new();
    render_level(tree, selection, 0, &mut out);
    out
}

fn render_level(nodes: &[FileNode], selection: Option<&Selection>, depth: usize, out: &mut String) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match node {
            FileNode::Folder { name, path, children } => {
                let open = selection.map_or(true, |s| s.open_folders.contains(path));
                let marker = if open { '▾' } else { '▸' };
                out.push_str(&format!("  {indent}{marker} {name}/\n"));
                if open {
                    render_level(children, selection, depth + 1, out);
                }
            }
            FileNode::File { name, path, .. } => {
                let active = selection
                    .and_then(|s| s.selected_path.as_deref())
                    .is_some_and(|selected| selected == path);
                let cursor = if active { '>' } else { ' ' };
                out.push_str(&format!("{cursor} {indent}• {name}\n"));
            }
        }
    }
}
