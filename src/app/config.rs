use crate::app::cli::Cli;
use crate::app::error::TransferError;
use crate::app::models::RuntimeConfig;
use crate::app::resolver::{resolve, resolve_from};
use crate::app::validator::validate;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Most extensions a single run may filter on.
pub const MAX_EXTENSIONS: usize = 6;

#[derive(Deserialize, Debug)]
struct PresetsFile {
    #[serde(flatten)]
    presets: HashMap<String, PresetConfig>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct PresetConfig {
    pub extensions: Option<Vec<String>>,
}

fn presets_path(home: &Path) -> PathBuf {
    home.join(".config").join("dirshift").join("presets.toml")
}

/// A missing presets file is the same as an empty one.
pub fn load_presets_file(home: &Path) -> Result<HashMap<String, PresetConfig>> {
    let config_path = presets_path(home);
    if !config_path.exists() {
        return Ok(HashMap::new());
    }

    let content = fs::read_to_string(&config_path)
        .context(format!("Failed to read config at {:?}", config_path))?;
    let parsed: PresetsFile = toml::from_str(&content)
        .context(format!("Failed to parse {}", config_path.display()))?;

    Ok(parsed.presets)
}

/// Preset entries first, then CLI entries; duplicates keep their first slot.
fn merge_vecs(preset_vec: Option<Vec<String>>, cli_vec: Vec<String>) -> Vec<String> {
    let mut combined = preset_vec.unwrap_or_default();
    combined.extend(cli_vec);
    let mut seen = std::collections::HashSet::new();
    combined.retain(|item| seen.insert(item.clone()));
    combined
}

fn normalize_extensions(raw: Vec<String>) -> Result<Vec<String>, TransferError> {
    let mut normalized = Vec::with_capacity(raw.len());
    for ext in raw {
        let trimmed = ext.strip_prefix('.').unwrap_or(ext.as_str());
        if trimmed.is_empty() || trimmed.contains(['.', '/', '\\']) {
            return Err(TransferError::usage(format!(
                "invalid extension '{ext}', give the part after the last dot (e.g. 'txt')"
            )));
        }
        normalized.push(trimmed.to_string());
    }

    let extensions = merge_vecs(None, normalized);
    if extensions.len() > MAX_EXTENSIONS {
        return Err(TransferError::usage(format!(
            "Maximum of {MAX_EXTENSIONS} extensions are allowed"
        )));
    }
    Ok(extensions)
}

/// Home directory, resolved like any other input path.
pub fn trust_root() -> Result<PathBuf, TransferError> {
    let home = dirs::home_dir().ok_or(TransferError::TrustRootUnavailable)?;
    resolve(&home)
}

/// Builds and validates the run configuration. Nothing is written to disk.
pub fn resolve_config(
    cli: Cli,
    cwd: &Path,
    trust_root: &Path,
    presets: &HashMap<String, PresetConfig>,
) -> Result<RuntimeConfig> {
    let preset = match cli.preset.as_deref() {
        Some(name) => presets
            .get(name)
            .cloned()
            .ok_or_else(|| TransferError::usage(format!("unknown preset '{name}'")))?,
        None => PresetConfig::default(),
    };
    let extensions = normalize_extensions(merge_vecs(preset.extensions, cli.extensions))?;

    let source = resolve_from(&cli.source, cwd)?;
    let destination = resolve_from(&cli.destination, cwd)?;
    validate(&source, &destination, trust_root)?;

    let config = RuntimeConfig::new(source, destination, cli.mode, extensions)?;
    log::debug!("Resolved configuration: {:?}", config);
    Ok(config)
}
