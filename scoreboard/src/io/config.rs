//! Scoreboard configuration stored in `scoreboard.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "scoreboard.toml";

/// Scoreboard configuration (TOML).
///
/// Missing fields fall back to defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScoreboardConfig {
    pub storage: StorageConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `participants.jsonl` and `awards.jsonl`.
    pub data_dir: PathBuf,

    /// fsync every journal append before acknowledging it.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".scoreboard"),
            sync_writes: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl ScoreboardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must not be empty"));
        }
        if self.server.port == 0 {
            return Err(anyhow!("server.port must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `ScoreboardConfig::default()`.
pub fn load_config(path: &Path) -> Result<ScoreboardConfig> {
    if !path.exists() {
        let cfg = ScoreboardConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: ScoreboardConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &ScoreboardConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
