// Declare modules
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod remover;
pub mod replicator;
pub mod resolver;
pub mod validator;
pub mod walker;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::io;

use self::cli::Cli;
use self::config::{load_presets_file, resolve_config, trust_root};
use self::error::TransferError;
use self::models::{RuntimeConfig, TransferMode, TransferReport, TreeEntry};
use self::remover::{remove_entry, remove_tree_with};
use self::replicator::Replicator;

/// Parses arguments, validates, then replicates and (for `-mv`) removes.
pub fn run() -> Result<()> {
    // 1. Parse Args
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) if !err.use_stderr() => {
            // --help / --version
            err.print()?;
            return Ok(());
        }
        Err(err) => {
            let rendered = err.render().to_string();
            let message = rendered.trim_start_matches("error: ").trim_end();
            return Err(TransferError::usage(message).into());
        }
    };

    init_logging(args.debug);

    // 2. Resolve Configuration
    let current_dir = env::current_dir().context("Failed to get current directory")?;
    let trust_root = trust_root()?;
    let presets = load_presets_file(&trust_root)?;
    let config = resolve_config(args, &current_dir, &trust_root, &presets)?;

    // 3. Transfer
    log::info!(
        "{} {} -> {}",
        config.mode.flag(),
        config.source.display(),
        config.destination.display()
    );
    let report = transfer(&config)?;
    log::info!("{} finished: {}", config.mode.flag(), report);
    Ok(())
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Runs the replication walk and, in move mode, the removal walk.
///
/// Removal only starts after a replication without any failed entry, so a
/// source file whose copy failed is never deleted.
pub fn transfer(config: &RuntimeConfig) -> Result<TransferReport, TransferError> {
    transfer_with(config, remove_entry)
}

fn transfer_with<F>(config: &RuntimeConfig, remove: F) -> Result<TransferReport, TransferError>
where
    F: FnMut(&TreeEntry) -> io::Result<()>,
{
    let mut report = Replicator::new(config).run()?;
    if !report.is_clean() {
        if config.mode == TransferMode::Move {
            log::warn!(
                "Source {} left in place because the copy was incomplete",
                config.source.display()
            );
        }
        return Err(TransferError::Incomplete {
            failed: report.failure_count(),
            phase: "copy",
        });
    }

    if config.mode == TransferMode::Move {
        report.absorb(remove_tree_with(&config.source, remove)?);
        if !report.is_clean() {
            return Err(TransferError::Incomplete {
                failed: report.failure_count(),
                phase: "removal",
            });
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_text(path: &Path, txt: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, txt).unwrap();
    }

    fn config(tmp: &TempDir, mode: TransferMode, exts: &[&str]) -> RuntimeConfig {
        let src = tmp.path().join("src");
        write_text(&src.join("a.txt"), "a");
        write_text(&src.join("b.log"), "b");
        write_text(&src.join("sub").join("c.txt"), "c");
        RuntimeConfig::new(
            src,
            tmp.path().join("dst"),
            mode,
            exts.iter().map(|s| s.to_string()).collect(),
        )
        .unwrap()
    }

    #[test]
    fn copy_keeps_source_tree() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, TransferMode::Copy, &["txt"]);

        let report = transfer(&config).expect("transfer");

        assert_eq!(report.files_copied, 2);
        assert!(config.output_root.join("a.txt").exists());
        assert!(config.output_root.join("sub/c.txt").exists());
        assert!(!config.output_root.join("b.log").exists());
        assert!(config.source.join("b.log").exists());
    }

    #[test]
    fn move_removes_source_after_clean_copy() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, TransferMode::Move, &[]);

        let report = transfer(&config).expect("transfer");

        assert_eq!(report.files_copied, 3);
        assert_eq!(report.entries_removed, 5);
        assert!(!config.source.exists());
        assert_eq!(
            fs::read_to_string(config.output_root.join("sub/c.txt")).unwrap(),
            "c"
        );
    }

    #[test]
    fn move_with_filter_still_removes_unmatched_files() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, TransferMode::Move, &["txt"]);

        transfer(&config).expect("transfer");

        assert!(!config.source.exists());
        assert!(!config.output_root.join("b.log").exists());
    }

    #[test]
    fn failed_copy_suppresses_removal() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, TransferMode::Move, &[]);
        fs::create_dir_all(config.output_root.join("b.log")).unwrap();

        let err = transfer(&config).unwrap_err();

        assert!(matches!(
            err,
            TransferError::Incomplete { failed: 1, phase: "copy" }
        ));
        assert!(config.source.join("b.log").exists());
        assert!(config.source.join("sub/c.txt").exists());
    }

    #[test]
    fn failed_removal_makes_move_incomplete() {
        let tmp = TempDir::new().unwrap();
        let config = config(&tmp, TransferMode::Move, &[]);

        let err = transfer_with(&config, |entry| {
            if entry.path.ends_with("a.txt") {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            } else {
                remover::remove_entry(entry)
            }
        })
        .unwrap_err();

        // a.txt and the source root it keeps alive
        assert!(matches!(
            err,
            TransferError::Incomplete { failed: 2, phase: "removal" }
        ));
        assert!(config.source.join("a.txt").exists());
        assert!(!config.source.join("sub").exists());
        assert!(config.output_root.join("a.txt").exists());
    }
}
