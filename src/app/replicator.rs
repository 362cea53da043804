use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use pathdiff::diff_paths;

use crate::app::error::TransferError;
use crate::app::filter::ExtensionFilter;
use crate::app::models::{EntryKind, RuntimeConfig, TransferReport, TreeEntry};
use crate::app::walker::{TreeWalker, WalkOrder};

/// Mirrors the source tree under the output root, one pre-order pass.
pub struct Replicator<'a> {
    config: &'a RuntimeConfig,
    filter: ExtensionFilter,
}

impl<'a> Replicator<'a> {
    pub fn new(config: &'a RuntimeConfig) -> Self {
        Self {
            config,
            filter: ExtensionFilter::new(&config.extensions),
        }
    }

    /// Per-entry failures land in the report and the walk continues;
    /// only a failed walk returns `Err`.
    pub fn run(&self) -> Result<TransferReport, TransferError> {
        let mut report = TransferReport::default();
        let walker = TreeWalker::new(&self.config.source).order(WalkOrder::PreOrder);

        // Directories that could not be created; nothing is written below them.
        let mut blocked: Vec<PathBuf> = Vec::new();

        for entry in walker.walk() {
            let entry = entry?;
            let target = self.destination_for(&entry.path)?;
            if blocked.iter().any(|dir| target.starts_with(dir)) {
                log::warn!("Parent not created, skipped: {}", entry.path.display());
                report.entries_skipped += 1;
                continue;
            }

            let failed_before = report.failure_count();
            self.process_entry(&entry, &target, &mut report);
            if matches!(entry.kind, EntryKind::Directory) && report.failure_count() > failed_before {
                blocked.push(target);
            }
        }

        log::info!("Replicated into {}: {}", self.config.output_root.display(), report);
        Ok(report)
    }

    /// Swaps the source-root prefix of `path` for the output root.
    pub fn destination_for(&self, path: &Path) -> Result<PathBuf, TransferError> {
        let relative = diff_paths(path, &self.config.source)
            .filter(|rel| rel.components().all(|c| matches!(c, Component::Normal(_))))
            .ok_or_else(|| {
                TransferError::TraversalFailed(format!(
                    "{} is not inside {}",
                    path.display(),
                    self.config.source.display()
                ))
            })?;
        if relative.as_os_str().is_empty() {
            return Ok(self.config.output_root.clone());
        }
        Ok(self.config.output_root.join(relative))
    }

    fn process_entry(&self, entry: &TreeEntry, target: &Path, report: &mut TransferReport) {
        match entry.kind {
            EntryKind::Directory => {
                log::debug!("Creating: {}", target.display());
                let existed = fs::symlink_metadata(target).is_ok_and(|meta| meta.is_dir());
                match refuse_symlink(target).and_then(|()| create_directory(target)) {
                    Ok(()) if existed => {}
                    Ok(()) => report.dirs_created += 1,
                    Err(source) => report.add_failure(TransferError::DirectoryCreateFailed {
                        path: target.to_path_buf(),
                        source,
                    }),
                }
            }
            EntryKind::File => {
                let name = entry.path.file_name().unwrap_or_default();
                if !self.filter.admits(name) {
                    log::debug!("Skipping: {}", entry.path.display());
                    report.files_filtered += 1;
                    return;
                }

                log::debug!("Copying: {} -> {}", entry.path.display(), target.display());
                match copy_file(&entry.path, target) {
                    Ok(bytes) => {
                        report.files_copied += 1;
                        report.bytes_copied += bytes;
                    }
                    Err(source) => report.add_failure(TransferError::FileCopyFailed {
                        from: entry.path.clone(),
                        to: target.to_path_buf(),
                        source,
                    }),
                }
            }
            EntryKind::Symlink | EntryKind::Other => {
                log::warn!(
                    "Not a regular file or directory, skipped: {}",
                    entry.path.display()
                );
                report.entries_skipped += 1;
            }
        }
    }
}

/// Creates `path` and any missing ancestors, owner-only, root to leaf.
/// An existing directory is not an error.
pub fn create_directory(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}

/// A symlink already sitting at a destination path would redirect the write
/// outside the output root.
fn refuse_symlink(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(io::Error::other(format!(
            "destination {} is a symbolic link",
            path.display()
        ))),
        _ => Ok(()),
    }
}

/// Byte-for-byte copy; the destination is created or truncated. A partial
/// destination is removed again when the copy fails midway.
fn copy_file(from: &Path, to: &Path) -> io::Result<u64> {
    refuse_symlink(to)?;
    let mut reader = File::open(from)?;
    let mut writer = File::create(to)?;
    let copied = io::copy(&mut reader, &mut writer).and_then(|n| writer.flush().map(|()| n));
    if copied.is_err() {
        drop(writer);
        if let Err(err) = fs::remove_file(to) {
            log::warn!("Could not remove partial copy {}: {}", to.display(), err);
        }
    }
    copied
}
