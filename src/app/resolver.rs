use std::env;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::app::error::TransferError;

/// Longest resolved path accepted, in bytes.
pub const MAX_PATH_LEN: usize = 4096;

/// Lexical resolution against the working directory; symlinks are left alone.
pub fn resolve(input: &Path) -> Result<PathBuf, TransferError> {
    let cwd = env::current_dir().map_err(|e| {
        TransferError::usage(format!("cannot read the current directory: {e}"))
    })?;
    resolve_from(input, &cwd)
}

/// Resolves `input` against `cwd`. `..` at the filesystem root stays at the root.
pub fn resolve_from(input: &Path, cwd: &Path) -> Result<PathBuf, TransferError> {
    if input.as_os_str().is_empty() {
        return Err(TransferError::usage("empty path"));
    }

    let joined = if input.is_absolute() {
        input.to_path_buf()
    } else {
        cwd.join(input)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                resolved.push(component.as_os_str())
            }
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
        }
    }

    if resolved.as_os_str().len() > MAX_PATH_LEN {
        return Err(TransferError::PathTooLong {
            path: input.to_string_lossy().into_owned(),
            max: MAX_PATH_LEN,
        });
    }

    Ok(resolved)
}

/// `path` with symlinks resolved as far as the filesystem goes: the deepest
/// existing ancestor is canonicalized and the missing tail is appended.
pub fn physical_path(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut tail = Vec::new();
    loop {
        if let Ok(real) = fs::canonicalize(existing) {
            return tail.iter().rev().fold(real, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name);
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
