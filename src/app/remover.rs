use std::fs;
use std::io;
use std::path::Path;

use crate::app::error::TransferError;
use crate::app::models::{EntryKind, TransferReport, TreeEntry};
use crate::app::walker::{TreeWalker, WalkOrder};

/// Deletes the whole tree at `root`, children before parents, calling
/// `remove` on each entry. Nothing is filtered. Failed removals are recorded
/// and the walk goes on.
pub fn remove_tree_with<F>(root: &Path, mut remove: F) -> Result<TransferReport, TransferError>
where
    F: FnMut(&TreeEntry) -> io::Result<()>,
{
    let mut report = TransferReport::default();
    let walker = TreeWalker::new(root).order(WalkOrder::PostOrder);

    for entry in walker.walk() {
        let entry = entry?;
        match remove(&entry) {
            Ok(()) => report.entries_removed += 1,
            Err(source) => report.add_failure(TransferError::FileRemoveFailed {
                path: entry.path,
                source,
            }),
        }
    }

    log::info!("Removed {}: {}", root.display(), report);
    Ok(report)
}

/// Unlinks one entry. Symlinks and special files go the same way as files.
pub fn remove_entry(entry: &TreeEntry) -> io::Result<()> {
    match entry.kind {
        EntryKind::Directory => {
            log::debug!("Removing directory: {}", entry.path.display());
            fs::remove_dir(&entry.path)
        }
        EntryKind::File | EntryKind::Symlink | EntryKind::Other => {
            log::debug!("Removing file: {}", entry.path.display());
            fs::remove_file(&entry.path)
        }
    }
}
