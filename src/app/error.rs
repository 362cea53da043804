use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every way a transfer can fail, from argument checks down to single entries.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error("Path is longer than {max} bytes: {path}")]
    PathTooLong { path: String, max: usize },

    #[error("Source directory does not exist: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Source is not a directory: {}", .0.display())]
    SourceNotDirectory(PathBuf),

    #[error(
        "Source and destination overlap ({} -> {}); the copy would recurse into itself",
        source_dir.display(),
        destination.display()
    )]
    OverlappingPaths {
        source_dir: PathBuf,
        destination: PathBuf,
    },

    #[error(
        "{} is outside the trusted root {}; both directories must belong to the home directory hierarchy",
        path.display(),
        root.display()
    )]
    OutsideTrustRoot { path: PathBuf, root: PathBuf },

    #[error("Could not determine the home directory")]
    TrustRootUnavailable,

    #[error("Failed to create directory {}", path.display())]
    DirectoryCreateFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to copy {} to {}", from.display(), to.display())]
    FileCopyFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to remove {}", path.display())]
    FileRemoveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Tree walk failed: {0}")]
    TraversalFailed(String),

    #[error("{failed} entries failed during {phase}; see messages above")]
    Incomplete { failed: usize, phase: &'static str },
}

impl TransferError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    /// The message followed by every underlying cause, on one line.
    pub fn describe(&self) -> String {
        anyhow::Chain::new(self)
            .map(|cause| cause.to_string())
            .collect::<Vec<_>>()
            .join(": ")
    }

    /// True for failures scoped to one tree entry (the walk keeps going).
    pub fn is_per_entry(&self) -> bool {
        matches!(
            self,
            Self::DirectoryCreateFailed { .. }
                | Self::FileCopyFailed { .. }
                | Self::FileRemoveFailed { .. }
        )
    }
}
