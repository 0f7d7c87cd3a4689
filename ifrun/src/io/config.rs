//! Engine configuration stored in `ifrun.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::format::EngineFamily;

/// Engine configuration (TOML).
///
/// Missing fields default to values suitable for local play. Interpreter paths
/// are plain paths: locating the binaries is up to whoever writes this file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one sub-directory per game.
    pub games_dir: PathBuf,

    /// Glulxe binary (RemGlk build) for Glulx games.
    pub glulxe_path: Option<PathBuf>,

    /// Bocfel binary (RemGlk build) for Z-code games.
    pub bocfel_path: Option<PathBuf>,

    /// Wall-clock limit for one interpreter invocation, in seconds.
    pub turn_timeout_secs: u64,

    /// Cap on captured interpreter stdout/stderr, in bytes.
    pub output_limit_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            games_dir: PathBuf::from("games"),
            glulxe_path: None,
            bocfel_path: None,
            turn_timeout_secs: 10,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.turn_timeout_secs == 0 {
            return Err(anyhow!("turn_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    /// Configured interpreter binary for a family.
    pub fn interpreter_path(&self, family: EngineFamily) -> Option<&Path> {
        match family {
            EngineFamily::Glulx => self.glulxe_path.as_deref(),
            EngineFamily::Zcode => self.bocfel_path.as_deref(),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EngineConfig::default()`.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        let cfg = EngineConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EngineConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
