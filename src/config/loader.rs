use std::path::Path;

use anyhow::{Context, Result};

use super::types::Config;

/// Name of the optional project file.
pub const CONFIG_FILE: &str = ".with-connect.yaml";

/// Load `.with-connect.yaml` from `dir`, falling back to defaults when absent.
pub fn load(dir: &Path) -> Result<Config> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}
