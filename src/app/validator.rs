use std::fs;
use std::path::Path;

use crate::app::error::TransferError;
use crate::app::models::output_root;
use crate::app::resolver::physical_path;

/// Checks run before anything touches the filesystem, in a fixed order:
/// existence, overlap, trust root. All paths must already be resolved.
pub fn validate(source: &Path, destination: &Path, trust_root: &Path) -> Result<(), TransferError> {
    fs::metadata(source).map_err(|e| TransferError::SourceNotFound {
        path: source.to_path_buf(),
        source: e,
    })?;
    let is_real_dir = fs::symlink_metadata(source)
        .map(|meta| meta.file_type().is_dir())
        .unwrap_or(false);
    if !is_real_dir {
        return Err(TransferError::SourceNotDirectory(source.to_path_buf()));
    }

    // Compared through symlinks: `~/link/out` with `~/link -> /tmp` lands in /tmp.
    let real_source = physical_path(source);
    let real_destination = physical_path(destination);

    if is_overlapping(&real_source, &real_destination)? {
        return Err(TransferError::OverlappingPaths {
            source_dir: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }

    let real_root = physical_path(trust_root);
    for (path, real) in [(source, &real_source), (destination, &real_destination)] {
        if !real.starts_with(&real_root) {
            return Err(TransferError::OutsideTrustRoot {
                path: path.to_path_buf(),
                root: trust_root.to_path_buf(),
            });
        }
    }

    Ok(())
}

// Destination inside the source recurses forever; a destination that is the
// source's parent maps the output root onto the source itself.
fn is_overlapping(source: &Path, destination: &Path) -> Result<bool, TransferError> {
    if destination.starts_with(source) {
        return Ok(true);
    }
    let out = output_root(source, destination)?;
    Ok(out.starts_with(source) || source.starts_with(&out))
}
