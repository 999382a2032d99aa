//! `omni extract`: list the code blocks in a reply.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color, Table};
use omniverse_core::code_blocks::{FilenameSource, extract, resolve_filename};
use serde_json::json;

use super::read_input;

/// Execute the extract command.
pub fn execute(file: Option<&Path>, json_output: bool) -> Result<()> {
    let text = read_input(file)?;
    let blocks: Vec<_> = extract(&text).map(|block| (resolve_filename(&block), block)).collect();

    if json_output {
        let items: Vec<_> = blocks
            .iter()
            .map(|(resolution, block)| {
                json!({
                    "language": block.language,
                    "hint": block.filename,
                    "filename": resolution.filename,
                    "source": resolution.source,
                    "code": block.code,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if blocks.is_empty() {
        println!("  {} No code blocks found", "•".dimmed());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Language", "File", "Source", "Lines"]);
    for (index, (resolution, block)) in blocks.iter().enumerate() {
        let source_cell = match resolution.source {
            FilenameSource::FenceHint => Cell::new("fence"),
            FilenameSource::Directive => Cell::new("directive"),
            FilenameSource::Sniffed(heuristic) => Cell::new(format!("guessed ({})", heuristic.filename())).fg(Color::Yellow),
            FilenameSource::Generated => Cell::new("generated").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(index + 1).fg(Color::Cyan),
            Cell::new(&block.language),
            Cell::new(&resolution.filename).fg(Color::Green),
            source_cell,
            Cell::new(block.code.lines().count()),
        ]);
    }

    println!("{}", "Code Blocks:".bold());
    println!("{table}");
    Ok(())
}
