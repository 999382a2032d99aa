//! In-memory project file tree.
//!
//! The tree is an ordered list of [`FileNode`]s. Sibling names are unique; names across the
//! whole tree are not. Nodes are addressed by their `/`-joined path from the root
//! (`src/App.tsx`).

mod export;
mod patch;

pub use export::{ARCHIVE_NAME, export_archive};
pub use patch::{ActiveFile, Activation, PatchOutcome, apply_blocks, apply_updates};

use serde::{Deserialize, Serialize};

/// A file or folder.
///
/// Serialized with a `type` tag (`"file"` / `"folder"`) and a camel-cased `isOpen`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNode {
    /// A leaf with text content.
    File {
        /// Leaf name.
        name: String,
        /// File content.
        #[serde(default)]
        content: String,
    },
    /// A folder with ordered children.
    Folder {
        /// Folder name.
        name: String,
        /// Whether the folder is expanded in the explorer.
        #[serde(rename = "isOpen", default)]
        is_open: bool,
        /// Ordered children.
        #[serde(default)]
        children: Vec<FileNode>,
    },
}

impl FileNode {
    /// Creates a file node.
    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::File { name: name.into(), content: content.into() }
    }

    /// Creates a folder node.
    pub fn folder(name: impl Into<String>, is_open: bool, children: Vec<FileNode>) -> Self {
        Self::Folder { name: name.into(), is_open, children }
    }

    /// The node's name.
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Folder { name, .. } => name,
        }
    }

    /// File content, `None` for folders.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::File { content, .. } => Some(content),
            Self::Folder { .. } => None,
        }
    }

    /// Whether this is a file.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File { .. })
    }
}

/// Joins a parent path and a child name.
pub(crate) fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() { name.to_string() } else { format!("{parent}/{name}") }
}

/// The project tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTree {
    nodes: Vec<FileNode>,
}

impl FileTree {
    /// Creates a tree from top-level nodes.
    pub fn new(nodes: Vec<FileNode>) -> Self {
        Self { nodes }
    }

    /// The starter project every new workspace opens with.
    pub fn seed() -> Self {
        Self::new(vec![
            FileNode::folder(
                "src",
                true,
                vec![
                    FileNode::file(
                        "App.tsx",
                        "import React from 'react';\n\nexport default function App() {\n  return (\n    <div className=\"flex flex-col items-center justify-center h-screen bg-slate-900 text-white\">\n      <h1 className=\"text-4xl font-bold mb-4\">Hello Omniverse</h1>\n      <button className=\"px-6 py-2 bg-blue-600 rounded-lg\">Get Started</button>\n    </div>\n  );\n}",
                    ),
                    FileNode::file("index.css", "@tailwind base;\n@tailwind components;\n@tailwind utilities;"),
                    FileNode::file(
                        "utils.ts",
                        "export const cn = (...classes: string[]) => classes.filter(Boolean).join(' ');",
                    ),
                ],
            ),
            FileNode::folder(
                "public",
                false,
                vec![FileNode::file(
                    "index.html",
                    "<!DOCTYPE html>\n<html lang=\"en\">\n  <body>\n    <div id=\"root\"></div>\n  </body>\n</html>",
                )],
            ),
            FileNode::file("package.json", "{\n  \"name\": \"omniverse-app\",\n  \"version\": \"1.0.0\"\n}"),
        ])
    }

    /// Path of the file opened when a workspace starts.
    pub const SEED_ACTIVE_PATH: &'static str = "src/App.tsx";

    /// Parses a tree from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Top-level nodes.
    pub fn nodes(&self) -> &[FileNode] {
        &self.nodes
    }

    /// Consumes the tree, returning its top-level nodes.
    pub fn into_nodes(self) -> Vec<FileNode> {
        self.nodes
    }

    /// Looks a node up by its `/`-separated path.
    pub fn find(&self, path: &str) -> Option<&FileNode> {
        let mut level = self.nodes.as_slice();
        let mut found = None;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let node = level.iter().find(|n| n.name() == segment)?;
            level = match node {
                FileNode::Folder { children, .. } => children.as_slice(),
                FileNode::File { .. } => &[],
            };
            found = Some(node);
        }
        found
    }

    /// Content of the file at `path`.
    pub fn file_content(&self, path: &str) -> Option<&str> {
        self.find(path).and_then(FileNode::content)
    }

    /// Flips `isOpen` on the top-level folder called `name`.
    ///
    /// Only top-level folders can be toggled. Returns whether a folder was found.
    pub fn toggle_folder(&mut self, name: &str) -> bool {
        let mut toggled = false;
        for node in &mut self.nodes {
            if let FileNode::Folder { name: folder, is_open, .. } = node {
                if folder == name {
                    *is_open = !*is_open;
                    toggled = true;
                }
            }
        }
        toggled
    }

    /// Top-level files plus the direct children of top-level folders, with their paths.
    pub fn flatten_one_level(&self) -> Vec<(String, &FileNode)> {
        self.nodes
            .iter()
            .flat_map(|node| match node {
                FileNode::Folder { name, children, .. } => {
                    children.iter().map(|child| (join_path(name, child.name()), child)).collect::<Vec<_>>()
                }
                FileNode::File { name, .. } => vec![(name.clone(), node)],
            })
            .collect()
    }

    /// Every file, depth first, as `(path, content)`.
    pub fn files(&self) -> Vec<(String, &str)> {
        fn walk<'a>(nodes: &'a [FileNode], parent: &str, out: &mut Vec<(String, &'a str)>) {
            for node in nodes {
                let path = join_path(parent, node.name());
                match node {
                    FileNode::File { content, .. } => out.push((path, content.as_str())),
                    FileNode::Folder { children, .. } => walk(children, &path, out),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.nodes, "", &mut out);
        out
    }

    /// Renders the tree as an indented listing (folders end in `/`).
    pub fn render(&self) -> String {
        fn walk(nodes: &[FileNode], depth: usize, out: &mut String) {
            for node in nodes {
                out.push_str(&"  ".repeat(depth));
                match node {
                    FileNode::File { name, .. } => {
                        out.push_str(name);
                        out.push('\n');
                    }
                    FileNode::Folder { name, is_open, children } => {
                        out.push_str(name);
                        out.push('/');
                        if !is_open {
                            out.push_str(" (closed)");
                        }
                        out.push('\n');
                        walk(children, depth + 1, out);
                    }
                }
            }
        }

        let mut out = String::new();
        walk(&self.nodes, 0, &mut out);
        out
    }
}

/// Editor gutter text: one number per `\n`-separated line of `content`.
pub fn line_numbers(content: &str) -> String {
    (1..=content.split('\n').count()).map(|n| n.to_string()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_layout() {
        let tree = FileTree::seed();
        let paths: Vec<_> = tree.files().into_iter().map(|(path, _)| path).collect();
        assert_eq!(
            paths,
            vec!["src/App.tsx", "src/index.css", "src/utils.ts", "public/index.html", "package.json"]
        );
        assert!(tree.file_content(FileTree::SEED_ACTIVE_PATH).unwrap().contains("Hello Omniverse"));
        assert!(matches!(tree.find("public"), Some(FileNode::Folder { is_open: false, .. })));
    }

    #[test]
    fn test_json_shape() {
        let tree = FileTree::new(vec![FileNode::folder("src", true, vec![FileNode::file("a.ts", "x")])]);
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "type": "folder",
                "name": "src",
                "isOpen": true,
                "children": [{"type": "file", "name": "a.ts", "content": "x"}]
            }])
        );

        let parsed = FileTree::from_json(&json.to_string()).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn test_find() {
        let tree = FileTree::seed();
        assert_eq!(tree.find("src/utils.ts").map(FileNode::name), Some("utils.ts"));
        assert_eq!(tree.find("src").map(FileNode::name), Some("src"));
        assert!(tree.find("src/missing.ts").is_none());
        assert!(tree.find("package.json/child").is_none());
        assert!(tree.find("").is_none());
    }

    #[test]
    fn test_toggle_folder_top_level_only() {
        let mut tree = FileTree::new(vec![FileNode::folder(
            "src",
            true,
            vec![FileNode::folder("components", false, vec![])],
        )]);

        assert!(tree.toggle_folder("src"));
        assert!(matches!(tree.find("src"), Some(FileNode::Folder { is_open: false, .. })));

        assert!(!tree.toggle_folder("components"));
        assert!(matches!(tree.find("src/components"), Some(FileNode::Folder { is_open: false, .. })));
    }

    #[test]
    fn test_flatten_one_level() {
        let tree = FileTree::new(vec![
            FileNode::folder(
                "src",
                true,
                vec![FileNode::file("App.tsx", ""), FileNode::folder("lib", true, vec![FileNode::file("deep.ts", "")])],
            ),
            FileNode::file("package.json", "{}"),
        ]);

        let flat: Vec<_> = tree.flatten_one_level().into_iter().map(|(path, _)| path).collect();
        assert_eq!(flat, vec!["src/App.tsx", "src/lib", "package.json"]);
    }

    #[test]
    fn test_render() {
        let rendered = FileTree::seed().render();
        assert!(rendered.starts_with("src/\n  App.tsx\n"));
        assert!(rendered.contains("public/ (closed)\n  index.html\n"));
        assert!(rendered.ends_with("package.json\n"));
    }

    #[test]
    fn test_line_numbers() {
        assert_eq!(line_numbers("a\nb\nc"), "1\n2\n3");
        assert_eq!(line_numbers(""), "1");
        assert_eq!(line_numbers("trailing\n"), "1\n2");
    }
}
