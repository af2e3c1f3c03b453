use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sift_core::MatcherConfig;
use sift_ingest::DirectoryColumns;
use sift_recon::filters::DEFAULT_INVOICE_PATTERN;
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_sift_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub coverage: CoverageSection,
    pub matcher: MatcherSection,
    pub directory: DirectorySection,
    pub recon: ReconSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageSection {
    pub months_back: u32,
    /// Archives taken by `--recent` when no count is given
    pub recent: usize,
    /// IANA zone used to compute "today"
    pub timezone: String,
}

impl Default for CoverageSection {
    fn default() -> Self {
        Self {
            months_back: 3,
            recent: 2,
            timezone: "Europe/Berlin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherSection {
    #[serde(flatten)]
    pub scoring: MatcherConfig,
    /// Ranked results printed by `sift search`
    pub limit: usize,
}

impl Default for MatcherSection {
    fn default() -> Self {
        Self {
            scoring: MatcherConfig::default(),
            limit: 6,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorySection {
    /// Customer directory used when `--customers` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub columns: DirectoryColumns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconSection {
    pub invoice_pattern: String,
}

impl Default for ReconSection {
    fn default() -> Self {
        Self {
            invoice_pattern: DEFAULT_INVOICE_PATTERN.to_string(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_sift_home()?.join("config.toml"))
}

/// Load `path`, or `~/.sift/config.toml` when none is given. A missing file means defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if !p.exists() {
        tracing::debug!(path = %p.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: Option<&Path>) -> Result<()> {
    let p = match path {
        Some(p) => p.to_path_buf(),
        None => config_path()?,
    };
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// Print the effective config: file values over defaults.
pub fn show_config(path: Option<&Path>) -> Result<()> {
    let cfg = load_config(path)?;
    let s = toml::to_string_pretty(&cfg).context("serialize config")?;
    println!("{}", s.trim_end());
    Ok(())
}
