// Configuration types for ryzenmon
use serde::{Deserialize, Serialize};

use crate::core::MAX_CORES;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct PollConfig {
    /// Refresh cadence for every mode.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Size of the per-core buffer handed to the sensing library. The
    /// library populates fewer entries on smaller parts.
    #[serde(default = "default_max_cores")]
    pub max_cores: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct LibraryConfig {
    /// Override path to libryzen_monitor.so; the dynamic linker search
    /// path applies when unset.
    pub path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    /// Optional key=value stats file rewritten every cycle in daemon mode.
    #[serde(default)]
    pub stats_file_path: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

pub const MIN_INTERVAL_MS: u64 = 200;
pub const MAX_INTERVAL_MS: u64 = 60_000;

const fn default_interval_ms() -> u64 {
    2000
}

fn default_max_cores() -> usize {
    num_cpus::get_physical().clamp(1, MAX_CORES)
}

const fn default_log_level() -> LogLevel {
    LogLevel::Info
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_cores: default_max_cores(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            stats_file_path: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&self.poll.interval_ms) {
            return Err(ConfigError::Validation(format!(
                "poll.interval_ms ({}) must be between {MIN_INTERVAL_MS} and {MAX_INTERVAL_MS}",
                self.poll.interval_ms
            )));
        }
        if self.poll.max_cores == 0 || self.poll.max_cores > MAX_CORES {
            return Err(ConfigError::Validation(format!(
                "poll.max_cores ({}) must be between 1 and {MAX_CORES}",
                self.poll.max_cores
            )));
        }
        Ok(())
    }
}

// Error type for config loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll.interval_ms, 2000);
        assert!(config.poll.max_cores >= 1 && config.poll.max_cores <= MAX_CORES);
        assert!(config.library.path.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [poll]
            interval_ms = 500

            [library]
            path = "/opt/ryzen/libryzen_monitor.so"

            [daemon]
            log_level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(
            config.library.path.as_deref(),
            Some("/opt/ryzen/libryzen_monitor.so")
        );
        assert_eq!(config.daemon.log_level, LogLevel::Debug);
        // Unspecified section keeps its default
        assert!(config.poll.max_cores >= 1);
    }

    #[test]
    fn rejects_out_of_range_interval() {
        let mut config = AppConfig::default();
        config.poll.interval_ms = 50;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn rejects_oversized_core_buffer() {
        let mut config = AppConfig::default();
        config.poll.max_cores = MAX_CORES + 1;
        assert!(config.validate().is_err());

        config.poll.max_cores = 0;
        assert!(config.validate().is_err());
    }
}
