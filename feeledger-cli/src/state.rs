use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$FEELEDGER_HOME`, else `~/.feeledger`
pub fn feeledger_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os("FEELEDGER_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".feeledger"))
}

pub fn ensure_feeledger_home() -> Result<PathBuf> {
    let dir = feeledger_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
