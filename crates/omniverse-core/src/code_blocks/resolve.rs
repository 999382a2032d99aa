//! Target filename resolution and the update map.
//!
//! Resolution order for a block:
//! 1. the filename hint on the opening fence line,
//! 2. a `// file: <name>` or `# file: <name>` directive in the first lines of the body,
//! 3. content sniffing, then a synthesized `generated<ext>` name.
//!
//! Steps 1 and 2 are explicit directives. Step 3 is a guess and is always logged.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, warn};

use super::CodeBlock;

/// Number of leading body lines searched for a filename directive.
const DIRECTIVE_SCAN_LINES: usize = 5;

const APP_ENTRY_MARKER: &str = "export default function App";
const STYLESHEET_MARKER: &str = "@tailwind";
const MANIFEST_MARKER: &str = "package.json";

/// Maps a fence language tag to the extension used for synthesized filenames.
///
/// Lookup is case-insensitive; unknown languages map to `.txt`.
pub fn extension_for(language: &str) -> &'static str {
    match language.to_ascii_lowercase().as_str() {
        "typescript" | "tsx" => ".tsx",
        "javascript" | "jsx" => ".jsx",
        "ts" => ".ts",
        "js" => ".js",
        "css" => ".css",
        "html" => ".html",
        "json" => ".json",
        _ => ".txt",
    }
}

/// Content heuristic that picked a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    /// Body contains the default app entry export.
    AppEntry,
    /// Body contains a stylesheet directive.
    Stylesheet,
    /// Body mentions the package manifest or the block is tagged `json`.
    PackageManifest,
}

impl Heuristic {
    /// The filename this heuristic resolves to.
    pub const fn filename(self) -> &'static str {
        match self {
            Self::AppEntry => "App.tsx",
            Self::Stylesheet => "index.css",
            Self::PackageManifest => "package.json",
        }
    }

    fn detect(block: &CodeBlock) -> Option<Self> {
        if block.code.contains(APP_ENTRY_MARKER) {
            Some(Self::AppEntry)
        } else if block.code.contains(STYLESHEET_MARKER) {
            Some(Self::Stylesheet)
        } else if block.code.contains(MANIFEST_MARKER) || block.language == "json" {
            Some(Self::PackageManifest)
        } else {
            None
        }
    }
}

/// Where a resolved filename came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "heuristic", rename_all = "snake_case")]
pub enum FilenameSource {
    /// Filename hint on the opening fence line.
    FenceHint,
    /// `file:` directive comment inside the body.
    Directive,
    /// Content sniffing.
    Sniffed(Heuristic),
    /// Synthesized from the language extension.
    Generated,
}

impl FilenameSource {
    /// Whether the filename was stated by the model rather than guessed.
    pub const fn is_explicit(self) -> bool {
        matches!(self, Self::FenceHint | Self::Directive)
    }
}

/// A resolved target filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Target filename or `/`-separated path.
    pub filename: String,
    /// How it was determined.
    pub source: FilenameSource,
}

/// Determines the file a code block targets.
pub fn resolve_filename(block: &CodeBlock) -> Resolution {
    if let Some(hint) = block.filename.as_deref() {
        return Resolution { filename: normalize(hint), source: FilenameSource::FenceHint };
    }

    if let Some(directive) = detect_directive(&block.code) {
        debug!(filename = %directive, "Resolved code block filename from body directive");
        return Resolution { filename: normalize(directive), source: FilenameSource::Directive };
    }

    if let Some(heuristic) = Heuristic::detect(block) {
        warn!(
            language = %block.language,
            filename = heuristic.filename(),
            heuristic = ?heuristic,
            "Code block has no filename directive; guessed target from content"
        );
        return Resolution {
            filename: heuristic.filename().to_string(),
            source: FilenameSource::Sniffed(heuristic),
        };
    }

    let filename = format!("generated{}", extension_for(&block.language));
    warn!(
        language = %block.language,
        filename = %filename,
        "Code block has no filename directive; synthesized a target name"
    );
    Resolution { filename, source: FilenameSource::Generated }
}

/// Finds a `// file: <name>` or `# file: <name>` line near the top of a body.
fn detect_directive(code: &str) -> Option<&str> {
    code.lines().take(DIRECTIVE_SCAN_LINES).find_map(|line| {
        let trimmed = line.trim();
        trimmed
            .strip_prefix("// file:")
            .or_else(|| trimmed.strip_prefix("# file:"))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    })
}

/// Strips a leading `./` or `/` so path keys line up with tree paths.
fn normalize(name: &str) -> String {
    let name = name.trim();
    let name = name.strip_prefix("./").unwrap_or(name);
    name.trim_start_matches('/').to_string()
}

/// Filename to content map built from code blocks.
///
/// Later blocks targeting the same filename overwrite earlier ones, but a key keeps the
/// position of its first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileUpdates {
    entries: IndexMap<String, String>,
}

impl FileUpdates {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves every block and folds them left to right.
    pub fn from_blocks(blocks: impl IntoIterator<Item = CodeBlock>) -> Self {
        let mut updates = Self::new();
        for block in blocks {
            let resolution = resolve_filename(&block);
            updates.insert(resolution.filename, block.code);
        }
        updates
    }

    /// Inserts or overwrites the content for `filename`.
    pub fn insert(&mut self, filename: impl Into<String>, content: impl Into<String>) {
        let filename = filename.into();
        if self.entries.insert(filename.clone(), content.into()).is_some() {
            debug!(filename = %filename, "Later code block overwrote earlier one");
        }
    }

    /// Content for a key.
    pub fn get(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    /// Whether `filename` is a key.
    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Entries in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The first key.
    pub fn first_key(&self) -> Option<&str> {
        self.entries.keys().next().map(String::as_str)
    }

    /// Number of distinct targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there is nothing to apply.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether an update key addresses a full path rather than a leaf name.
pub(crate) fn is_path_key(key: &str) -> bool {
    key.contains('/')
}
