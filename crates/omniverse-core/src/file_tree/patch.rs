//! Applies a [`FileUpdates`] map to a [`FileTree`].
//!
//! Bare keys (`App.tsx`) replace every file with that leaf name, wherever it sits. Keys that
//! contain a `/` (`src/App.tsx`) replace only the file at exactly that path. When both kinds
//! target the same file, the path key wins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FileNode, FileTree, join_path};
use crate::code_blocks::{CodeBlock, FileUpdates, is_path_key};

/// The file shown in the editor pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveFile {
    /// Path from the root.
    pub path: String,
    /// Leaf name.
    pub name: String,
    /// Displayed content.
    pub content: String,
}

impl ActiveFile {
    /// Snapshots the file at `path`. `None` if it is missing or a folder.
    pub fn from_tree(tree: &FileTree, path: &str) -> Option<Self> {
        let node = tree.find(path)?;
        let content = node.content()?;
        Some(Self { path: path.to_string(), name: node.name().to_string(), content: content.to_string() })
    }
}

/// What happened to the active file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Left as it was.
    Unchanged,
    /// Same file, new content.
    Refreshed,
    /// Another file became active.
    Switched,
}

/// Result of a patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The patched tree.
    pub tree: FileTree,
    /// The active file after the patch.
    pub active: Option<ActiveFile>,
    /// How the active file changed.
    pub activation: Activation,
    /// Paths of files whose content was replaced, in tree order.
    pub updated: Vec<String>,
    /// Update keys that matched no file.
    pub unmatched: Vec<String>,
}

impl PatchOutcome {
    fn unchanged(tree: &FileTree, active: Option<&ActiveFile>) -> Self {
        Self {
            tree: tree.clone(),
            active: active.cloned(),
            activation: Activation::Unchanged,
            updated: Vec::new(),
            unmatched: Vec::new(),
        }
    }
}

/// Resolves `blocks` into an update map and applies it.
pub fn apply_blocks(
    tree: &FileTree,
    active: Option<&ActiveFile>,
    blocks: impl IntoIterator<Item = CodeBlock>,
) -> PatchOutcome {
    apply_updates(tree, active, &FileUpdates::from_blocks(blocks))
}

/// Applies `updates` to `tree` and works out the newly active file.
///
/// An empty map leaves everything untouched.
pub fn apply_updates(tree: &FileTree, active: Option<&ActiveFile>, updates: &FileUpdates) -> PatchOutcome {
    if updates.is_empty() {
        return PatchOutcome::unchanged(tree, active);
    }

    let mut updated = Vec::new();
    let mut matched = HashSet::new();
    let nodes = patch_nodes(tree.nodes(), "", updates, &mut updated, &mut matched);

    let unmatched: Vec<String> =
        updates.keys().filter(|key| !matched.contains(*key)).map(ToString::to_string).collect();
    if !unmatched.is_empty() {
        debug!(unmatched = ?unmatched, "Some code blocks target files that are not in the tree");
    }

    let (active, activation) = next_active(tree, active, updates);

    PatchOutcome { tree: FileTree::new(nodes), active, activation, updated, unmatched }
}

fn lookup<'u>(updates: &'u FileUpdates, path: &str, name: &str) -> Option<(&'u str, &'u str)> {
    if is_path_key(path) {
        if let Some(hit) = updates.iter().find(|(key, _)| *key == path) {
            return Some(hit);
        }
    }
    updates.iter().find(|(key, _)| *key == name)
}

fn patch_nodes(
    nodes: &[FileNode],
    parent: &str,
    updates: &FileUpdates,
    updated: &mut Vec<String>,
    matched: &mut HashSet<String>,
) -> Vec<FileNode> {
    nodes
        .iter()
        .map(|node| {
            let path = join_path(parent, node.name());
            match node {
                FileNode::File { name, content } => match lookup(updates, &path, name) {
                    Some((key, new_content)) => {
                        matched.insert(key.to_string());
                        if new_content != content {
                            updated.push(path);
                        }
                        FileNode::file(name.clone(), new_content)
                    }
                    None => node.clone(),
                },
                FileNode::Folder { name, is_open, children } => FileNode::Folder {
                    name: name.clone(),
                    is_open: *is_open,
                    children: patch_nodes(children, &path, updates, updated, matched),
                },
            }
        })
        .collect()
}

/// Works out the active file from the pre-patch `tree`.
fn next_active(
    tree: &FileTree,
    active: Option<&ActiveFile>,
    updates: &FileUpdates,
) -> (Option<ActiveFile>, Activation) {
    if let Some(current) = active {
        if let Some((_, content)) = lookup(updates, &current.path, &current.name) {
            let refreshed = ActiveFile { content: content.to_string(), ..current.clone() };
            return (Some(refreshed), Activation::Refreshed);
        }
    }

    let Some(first) = updates.first_key() else {
        return (active.cloned(), Activation::Unchanged);
    };
    let content = updates.get(first).unwrap_or_default();

    let target = if is_path_key(first) {
        tree.find(first).filter(|node| node.is_file()).map(|node| (first.to_string(), node))
    } else {
        tree.flatten_one_level().into_iter().find(|(_, node)| node.is_file() && node.name() == first)
    };

    match target {
        Some((path, node)) => {
            let switched = ActiveFile { path, name: node.name().to_string(), content: content.to_string() };
            (Some(switched), Activation::Switched)
        }
        None => {
            debug!(filename = %first, "First updated file is not in the tree; active file unchanged");
            (active.cloned(), Activation::Unchanged)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_blocks::extract;

    fn seed_active(tree: &FileTree) -> ActiveFile {
        ActiveFile::from_tree(tree, FileTree::SEED_ACTIVE_PATH).unwrap()
    }

    #[test]
    fn test_hint_overwrites_leaf_and_leaves_siblings() {
        let tree = FileTree::seed();
        let active = seed_active(&tree);
        let blocks = vec![CodeBlock::new("tsx", "export default function App() { return null; }\n").with_filename("App.tsx")];

        let outcome = apply_blocks(&tree, Some(&active), blocks);

        assert_eq!(
            outcome.tree.file_content("src/App.tsx"),
            Some("export default function App() { return null; }\n")
        );
        assert_eq!(outcome.tree.file_content("src/index.css"), tree.file_content("src/index.css"));
        assert_eq!(outcome.tree.file_content("src/utils.ts"), tree.file_content("src/utils.ts"));
        assert_eq!(outcome.tree.file_content("package.json"), tree.file_content("package.json"));
        assert_eq!(outcome.updated, vec!["src/App.tsx"]);
        assert!(outcome.unmatched.is_empty());
    }

    #[test]
    fn test_active_file_refreshed_in_place() {
        let tree = FileTree::seed();
        let active = seed_active(&tree);
        let blocks = vec![CodeBlock::new("tsx", "new app\n").with_filename("App.tsx")];

        let outcome = apply_blocks(&tree, Some(&active), blocks);

        assert_eq!(outcome.activation, Activation::Refreshed);
        let now = outcome.active.unwrap();
        assert_eq!(now.path, "src/App.tsx");
        assert_eq!(now.content, "new app\n");
    }

    #[test]
    fn test_first_updated_file_becomes_active() {
        let tree = FileTree::seed();
        let active = seed_active(&tree);
        let blocks = vec![
            CodeBlock::new("css", "@tailwind base;\n"),
            CodeBlock::new("json", "{}\n"),
        ];

        let outcome = apply_blocks(&tree, Some(&active), blocks);

        assert_eq!(outcome.activation, Activation::Switched);
        let now = outcome.active.unwrap();
        assert_eq!(now.path, "src/index.css");
        assert_eq!(now.name, "index.css");
        assert_eq!(now.content, "@tailwind base;\n");
        assert_eq!(outcome.tree.file_content("package.json"), Some("{}\n"));
    }

    #[test]
    fn test_unknown_target_keeps_active_file() {
        let tree = FileTree::seed();
        let active = seed_active(&tree);
        let blocks = vec![CodeBlock::new("python", "print('hi')\n")];

        let outcome = apply_blocks(&tree, Some(&active), blocks);

        assert_eq!(outcome.activation, Activation::Unchanged);
        assert_eq!(outcome.active, Some(active));
        assert_eq!(outcome.tree, tree);
        assert_eq!(outcome.unmatched, vec!["generated.txt"]);
    }

    #[test]
    fn test_empty_updates_skip_patch() {
        let tree = FileTree::seed();
        let outcome = apply_updates(&tree, None, &FileUpdates::new());
        assert_eq!(outcome.tree, tree);
        assert_eq!(outcome.active, None);
        assert_eq!(outcome.activation, Activation::Unchanged);
    }

    #[test]
    fn test_leaf_name_matches_every_depth() {
        let tree = FileTree::new(vec![
            FileNode::folder(
                "src",
                true,
                vec![FileNode::folder("lib", false, vec![FileNode::file("utils.ts", "deep")])],
            ),
            FileNode::file("utils.ts", "top"),
        ]);
        let blocks = vec![CodeBlock::new("ts", "both\n").with_filename("utils.ts")];

        let outcome = apply_blocks(&tree, None, blocks);

        assert_eq!(outcome.tree.file_content("src/lib/utils.ts"), Some("both\n"));
        assert_eq!(outcome.tree.file_content("utils.ts"), Some("both\n"));
        assert!(matches!(outcome.tree.find("src/lib"), Some(FileNode::Folder { is_open: false, .. })));
    }

    #[test]
    fn test_path_key_targets_one_file() {
        let tree = FileTree::new(vec![
            FileNode::folder(
                "src",
                true,
                vec![FileNode::folder("lib", true, vec![FileNode::file("utils.ts", "deep")])],
            ),
            FileNode::file("utils.ts", "top"),
        ]);
        let blocks = vec![CodeBlock::new("ts", "only deep\n").with_filename("src/lib/utils.ts")];

        let outcome = apply_blocks(&tree, None, blocks);

        assert_eq!(outcome.tree.file_content("src/lib/utils.ts"), Some("only deep\n"));
        assert_eq!(outcome.tree.file_content("utils.ts"), Some("top"));
        // Path keys are located by exact path, however deep.
        assert_eq!(outcome.activation, Activation::Switched);
        assert_eq!(outcome.active.unwrap().path, "src/lib/utils.ts");
    }

    #[test]
    fn test_path_key_beats_leaf_key() {
        let tree = FileTree::seed();
        let mut updates = FileUpdates::new();
        updates.insert("src/App.tsx", "by path");
        updates.insert("App.tsx", "by leaf");

        let outcome = apply_updates(&tree, None, &updates);
        assert_eq!(outcome.tree.file_content("src/App.tsx"), Some("by path"));
    }

    #[test]
    fn test_leaf_lookup_flattens_one_level_only() {
        let tree = FileTree::new(vec![FileNode::folder(
            "src",
            true,
            vec![FileNode::folder("lib", true, vec![FileNode::file("deep.ts", "old")])],
        )]);
        let blocks = vec![CodeBlock::new("ts", "new").with_filename("deep.ts")];

        let outcome = apply_blocks(&tree, None, blocks);

        assert_eq!(outcome.tree.file_content("src/lib/deep.ts"), Some("new"));
        assert_eq!(outcome.activation, Activation::Unchanged);
        assert!(outcome.active.is_none());
    }

    #[test]
    fn test_applying_twice_is_idempotent() {
        let tree = FileTree::seed();
        let response = "Updated styles:\n\n```css index.css\nbody { margin: 0; }\n```\n";

        let once = apply_blocks(&tree, None, extract(response));
        let twice = apply_blocks(&once.tree, once.active.as_ref(), extract(response));

        assert_eq!(once.tree, twice.tree);
        assert_eq!(once.active, twice.active);
        assert!(twice.updated.is_empty());
    }

    #[test]
    fn test_second_block_wins_for_same_target() {
        let tree = FileTree::new(vec![FileNode::file("generated.txt", "")]);
        let response = "```\nfirst\n```\n\n```\nsecond\n```";

        let outcome = apply_blocks(&tree, None, extract(response));

        assert_eq!(outcome.tree.file_content("generated.txt"), Some("second\n"));
        assert_eq!(outcome.active.unwrap().content, "second\n");
    }
}
