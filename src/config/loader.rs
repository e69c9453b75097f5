//! Configuration loading from file system
//!
//! Loading never fails: a missing or malformed file is logged and the
//! defaults are used.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::defaults::{CONFIG_DIR_NAME, CONFIG_FILE_NAME};
use super::types::Config;
use crate::accelerator::Accelerator;
use crate::error::{GatekeeperError, Result};

/// `$XDG_CONFIG_HOME/gatekeeper/config.json`, falling back to `~/.config`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(std::env::temp_dir)
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Read and parse `path`. `Ok(None)` when the file does not exist.
fn read_config(path: &Path) -> Result<Option<Config>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GatekeeperError::Config(format!("read failed: {}", e))),
    };
    serde_json::from_str::<Config>(&contents)
        .map(Some)
        .map_err(|e| {
            GatekeeperError::Config(format!(
                "invalid JSON at line {} column {}: {}",
                e.line(),
                e.column(),
                e
            ))
        })
}

/// Load configuration from `path`.
///
/// A `fallbackTrigger` that does not parse is dropped with a warning so it
/// never turns into a per-shortcut failure later.
#[instrument(name = "load_config", skip(path), fields(path = %path.display()))]
pub fn load_config_from(path: &Path) -> Config {
    let mut config = match read_config(path) {
        Ok(Some(config)) => config,
        Ok(None) => {
            info!("Config file not found, using defaults");
            return Config::default();
        }
        Err(e) => {
            warn!(error = %e, "Using default config");
            return Config::default();
        }
    };

    if let Some(trigger) = &config.fallback_trigger {
        if let Err(e) = Accelerator::parse(trigger) {
            warn!(fallback_trigger = %trigger, error = %e, "Ignoring invalid fallbackTrigger");
            config.fallback_trigger = None;
        }
    }

    info!(
        bus_name = %config.bus_name,
        prompt = ?config.prompt,
        "Successfully loaded config"
    );
    config
}
