//! Parser for extracting fenced code blocks from markdown text.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CodeBlock, PLAIN_TEXT};

/// Opening fence with optional language tag and optional filename hint on the same line,
/// then a non-greedy body up to the next closing fence.
static FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```(\w+)?(?:[ \t]+([^\r\n]+?))?[ \t]*\r?\n((?s:.)*?)```")
        .expect("fence pattern is valid")
});

/// Scans `text` for fenced code blocks.
///
/// The returned iterator is lazy and borrows `text`; clone it (or call `extract` again) to
/// restart the scan. Blocks come out in document order. A fence without a closing fence is
/// not a block.
pub fn extract(text: &str) -> CodeBlocks<'_> {
    CodeBlocks { text, pos: 0 }
}

/// Lazy iterator over the code blocks of a text. See [`extract`].
#[derive(Debug, Clone)]
pub struct CodeBlocks<'a> {
    text: &'a str,
    pos: usize,
}

impl Iterator for CodeBlocks<'_> {
    type Item = CodeBlock;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }

        let Some(caps) = FENCE.captures_at(self.text, self.pos) else {
            self.pos = self.text.len();
            return None;
        };
        let whole = caps.get(0)?;
        self.pos = whole.end();

        let language = caps.get(1).map_or(PLAIN_TEXT, |m| m.as_str()).to_string();
        let filename = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|hint| !hint.is_empty())
            .map(ToString::to_string);
        let code = caps.get(3).map_or("", |m| m.as_str()).to_string();

        Some(CodeBlock { language, filename, code })
    }
}
