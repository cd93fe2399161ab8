use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// `$HOME/.sniffer` unless overridden by `--home` / `SNIFFER_HOME`.
pub fn sniffer_home(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".sniffer"))
}

pub fn ensure_sniffer_home(override_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = sniffer_home(override_dir)?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
