// Configuration loading: RYZENMON_CONFIG, then the user path, then the
// system path; defaults when nothing parses.
use std::fs;
use std::path::PathBuf;

use log::{debug, warn};

use crate::config::types::{AppConfig, ConfigError};

const SYSTEM_CONFIG_PATH: &str = "/etc/ryzenmon/config.toml";

/// Candidate config paths in priority order.
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("RYZENMON_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".config/ryzenmon/config.toml"));
    } else {
        warn!("could not determine home directory; user config will not be loaded");
    }

    paths.push(PathBuf::from(SYSTEM_CONFIG_PATH));
    paths
}

/// Load and validate a config file from an explicit path.
pub fn load_config_from_path(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

/// Load application configuration from the first usable candidate path,
/// falling back to defaults when none exists or all fail to parse.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    for path in config_search_paths() {
        if !path.exists() {
            continue;
        }
        debug!("attempting to load config from {}", path.display());
        match load_config_from_path(&path.display().to_string()) {
            Ok(config) => return Ok(config),
            Err(e) => {
                warn!("skipping config file {}: {e}", path.display());
            }
        }
    }

    debug!("no configuration file found; using defaults");
    Ok(AppConfig::default())
}
