//! `omni export`: write the project as a tar.gz archive.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use omniverse_core::file_tree::{ARCHIVE_NAME, export_archive};

use super::load_tree;

/// Execute the export command.
pub fn execute(tree_path: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let tree = load_tree(tree_path)?;
    let output = output.unwrap_or_else(|| Path::new(ARCHIVE_NAME));

    let file = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = export_archive(&tree, BufWriter::new(file))
        .with_context(|| format!("Failed to write archive to {}", output.display()))?;
    writer.flush()?;

    println!(
        "{} Exported {} files to {}",
        "✓".green(),
        tree.files().len(),
        output.display().to_string().cyan()
    );
    Ok(())
}
