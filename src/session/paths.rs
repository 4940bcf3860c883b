use std::path::{Path, PathBuf};

use crate::error::{Result, SessionError};

/// Expand a leading `~` and make `raw` absolute against the working directory.
pub fn resolve(raw: &str) -> PathBuf {
    let expanded = expand_home(raw);
    std::path::absolute(&expanded).unwrap_or(expanded)
}

fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

/// The license file must exist before anything is allocated.
pub fn require_license(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SessionError::LicenseNotFound(path.to_path_buf()))
    }
}

pub fn require_config(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(SessionError::ConfigNotFound(path.to_path_buf()))
    }
}
