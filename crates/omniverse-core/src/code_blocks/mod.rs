//! Code block extraction.
//!
//! Assistant replies carry generated files as fenced markdown blocks. This module finds those
//! blocks ([`extract`]), decides which file each one targets ([`resolve_filename`]) and folds
//! them into a single [`FileUpdates`] map that the file tree patcher consumes.

mod parser;
mod resolve;

pub use parser::{CodeBlocks, extract};
pub use resolve::{FileUpdates, FilenameSource, Heuristic, Resolution, extension_for, resolve_filename};

pub(crate) use resolve::is_path_key;

use serde::{Deserialize, Serialize};

/// Language recorded for a fence that carries no language tag.
pub const PLAIN_TEXT: &str = "plaintext";

/// A fenced code block extracted from markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language tag from the opening fence, or [`PLAIN_TEXT`].
    pub language: String,

    /// Filename hint from the rest of the opening fence line, trimmed.
    pub filename: Option<String>,

    /// The block body, verbatim.
    pub code: String,
}

impl CodeBlock {
    /// Creates a block without a filename hint.
    pub fn new(language: impl Into<String>, code: impl Into<String>) -> Self {
        Self { language: language.into(), filename: None, code: code.into() }
    }

    /// Sets the filename hint.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}
