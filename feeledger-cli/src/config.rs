use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::state::ensure_feeledger_home;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub school: SchoolSection,
    #[serde(default)]
    pub feed: FeedSection,
    /// Class → monthly tuition from the fee structure that predates the rule catalog
    #[serde(default)]
    pub legacy_fees: BTreeMap<String, f64>,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolSection {
    pub id: String,
    /// IANA timezone used to decide what "today" is
    pub timezone: String,
}

impl Default for SchoolSection {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Directory,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    pub kind: FeedKind,
    /// For kind = "directory": folder holding the JSON/CSV export
    pub path: Option<PathBuf>,
    /// For kind = "http": gateway base URL
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Environment variable holding the gateway bearer token
    pub token_env: Option<String>,
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_token_env() -> Option<String> {
    Some("FEELEDGER_TOKEN".to_string())
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            kind: FeedKind::Directory,
            path: Some(PathBuf::from("data")),
            base_url: None,
            timeout_secs: default_timeout_secs(),
            token_env: default_token_env(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSection {
    #[serde(default)]
    pub format: OutputFormat,
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_feeledger_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let p = save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
