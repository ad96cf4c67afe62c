//! CLI command implementations.

pub mod dump;
pub mod hex_utils;
pub mod hexdump;
pub mod inspect;
pub mod repack;

use std::path::Path;

use anyhow::{Context, Result, bail};
use romtext::{Config, DEFAULT_CONFIG_FILE, save_json};
use serde::Serialize;
use tracing::{debug, info};

/// Load the config named on the command line, or `romtext.toml` if it exists
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Config::load(path).with_context(|| format!("loading {}", path.display()))
        }
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                info!("Using {}", DEFAULT_CONFIG_FILE);
                Ok(Config::load(default)?)
            } else {
                debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE);
                Ok(Config::default())
            }
        }
    }
}

/// Fail early when a required input file is missing
pub fn require_inputs(paths: &[&Path]) -> Result<()> {
    let missing: Vec<_> = paths
        .iter()
        .filter(|p| !p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if !missing.is_empty() {
        bail!("Required input not found: {}", missing.join(", "));
    }
    Ok(())
}

/// Save a report as pretty-printed JSON
pub fn save_report<T: Serialize>(path: &Path, report: &T) -> Result<()> {
    save_json(path, report).with_context(|| format!("writing {}", path.display()))?;
    info!("Report saved to {}", path.display());
    Ok(())
}
