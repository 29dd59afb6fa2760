//! Configuration loading and types

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use patchscan_pkg::FetcherConfig;
use serde::{Deserialize, Serialize};

/// Environment variable pointing at a configuration file
pub const CONFIG_ENV: &str = "PATCHSCAN_CONFIG";

/// Top-level configuration for the patchscan binary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Package manager query settings
    #[serde(default)]
    pub fetcher: FetcherConfig,
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human readable logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("reading {}", path.display()))?;
        let config: Config =
            toml::from_str(&content).wrap_err_with(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Load from `explicit`, the environment, default paths, or use defaults
    ///
    /// # Errors
    /// Returns error if a selected file cannot be read or parsed
    pub fn load_default(explicit: Option<&Path>) -> eyre::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }

        let mut paths = vec![
            PathBuf::from("patchscan.toml"),
            PathBuf::from("/etc/patchscan/patchscan.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("patchscan/patchscan.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        Ok(Config::default())
    }
}
