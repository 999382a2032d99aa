//! Project download: the tree as a gzip-compressed tar archive.

use std::io::{self, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{Builder, EntryType, Header};
use tracing::debug;

use super::{FileNode, FileTree, join_path};

/// Default archive filename for a downloaded project.
pub const ARCHIVE_NAME: &str = "project-alpha.tar.gz";

/// Writes every file and folder of `tree` into a `.tar.gz` stream.
///
/// Returns the inner writer once the gzip stream is finished.
pub fn export_archive<W: Write>(tree: &FileTree, writer: W) -> io::Result<W> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = Builder::new(enc);

    let mut entries = 0usize;
    append_nodes(&mut tar, tree.nodes(), "", &mut entries)?;
    debug!(entries, "Wrote project archive");

    tar.into_inner()?.finish()
}

fn append_nodes<W: Write>(
    tar: &mut Builder<W>,
    nodes: &[FileNode],
    parent: &str,
    entries: &mut usize,
) -> io::Result<()> {
    for node in nodes {
        let path = join_path(parent, node.name());
        match node {
            FileNode::File { content, .. } => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Regular);
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                tar.append_data(&mut header, &path, content.as_bytes())?;
            }
            FileNode::Folder { children, .. } => {
                let mut header = Header::new_gnu();
                header.set_entry_type(EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                tar.append_data(&mut header, format!("{path}/"), io::empty())?;
                append_nodes(tar, children, &path, entries)?;
            }
        }
        *entries += 1;
    }
    Ok(())
}
