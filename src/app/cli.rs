use clap::Parser;
use std::path::PathBuf;

use crate::app::models::TransferMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Copy or move a directory tree, optionally keeping only some file extensions",
    override_usage = "dirshift [OPTIONS] <SOURCE_DIR> <DESTINATION_DIR> <-cp|-mv> [EXTENSION]..."
)]
pub struct Cli {
    /// Directory to transfer (absolute, or relative to the working directory)
    pub source: PathBuf,

    /// Directory that receives the tree as DESTINATION_DIR/<source name>
    pub destination: PathBuf,

    /// -cp keeps the source, -mv deletes it after a complete copy
    #[arg(value_name = "-cp|-mv", allow_hyphen_values = true, value_parser = parse_mode)]
    pub mode: TransferMode,

    /// Extensions to transfer, without the dot (e.g. 'txt' 'md'); default is every file
    #[arg(value_name = "EXTENSION")]
    pub extensions: Vec<String>,

    /// Prepend the extension list of a preset from presets.toml
    #[arg(long)]
    pub preset: Option<String>,

    /// Log every copied, skipped and removed entry
    #[arg(long)]
    pub debug: bool,
}

fn parse_mode(flag: &str) -> Result<TransferMode, String> {
    match flag {
        "-cp" => Ok(TransferMode::Copy),
        "-mv" => Ok(TransferMode::Move),
        other => Err(format!("invalid option '{other}', use -cp or -mv")),
    }
}
