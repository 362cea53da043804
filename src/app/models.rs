use std::fmt;
use std::fs::FileType;
use std::path::{Path, PathBuf};

use crate::app::error::TransferError;

/// Copy keeps the source tree, move deletes it after a clean copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    pub fn flag(self) -> &'static str {
        match self {
            Self::Copy => "-cp",
            Self::Move => "-mv",
        }
    }
}

/// Represents the final configuration after merging presets and CLI args.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// `destination/<basename of source>`, the root of the mirrored tree.
    pub output_root: PathBuf,
    pub mode: TransferMode,
    /// Allowed extensions without the leading dot. Empty means "everything".
    pub extensions: Vec<String>,
}

impl RuntimeConfig {
    pub fn new(
        source: PathBuf,
        destination: PathBuf,
        mode: TransferMode,
        extensions: Vec<String>,
    ) -> Result<Self, TransferError> {
        let output_root = output_root(&source, &destination)?;
        Ok(Self {
            source,
            destination,
            output_root,
            mode,
            extensions,
        })
    }
}

/// Joins the source's base name onto the destination.
pub fn output_root(source: &Path, destination: &Path) -> Result<PathBuf, TransferError> {
    let base = source.file_name().ok_or_else(|| {
        TransferError::usage(format!("source {} has no base name", source.display()))
    })?;
    Ok(destination.join(base))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    /// Sockets, fifos, devices.
    Other,
}

impl From<FileType> for EntryKind {
    fn from(file_type: FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        }
    }
}

/// Represents a single entry yielded during a walk of the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    /// 0 for the walk root.
    pub depth: usize,
}

/// Counters and per-entry failures of one replication or removal walk.
#[derive(Debug, Default)]
pub struct TransferReport {
    pub dirs_created: u64,
    pub files_copied: u64,
    pub bytes_copied: u64,
    pub files_filtered: u64,
    pub entries_skipped: u64,
    pub entries_removed: u64,
    pub failures: Vec<TransferError>,
}

impl TransferReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn add_failure(&mut self, err: TransferError) {
        debug_assert!(err.is_per_entry(), "walk-level error recorded as entry failure");
        log::error!("{}", err.describe());
        self.failures.push(err);
    }

    /// Folds the counters and failures of a later phase into this one.
    pub fn absorb(&mut self, other: TransferReport) {
        self.dirs_created += other.dirs_created;
        self.files_copied += other.files_copied;
        self.bytes_copied += other.bytes_copied;
        self.files_filtered += other.files_filtered;
        self.entries_skipped += other.entries_skipped;
        self.entries_removed += other.entries_removed;
        self.failures.extend(other.failures);
    }
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dirs={} files={} bytes={} filtered={} skipped={} removed={} failures={}",
            self.dirs_created,
            self.files_copied,
            self.bytes_copied,
            self.files_filtered,
            self.entries_skipped,
            self.entries_removed,
            self.failure_count()
        )
    }
}
