//! Configuration system
//!
//! Centralized configuration with runtime defaults, optional TOML config
//! file loading, and environment variable overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Activity window sizing
    pub window: WindowConfig,

    /// Input ordering tolerance
    pub ordering: OrderingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Output configuration
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// Days before an update check its installation still counts as active.
    pub days_before: u32,
    /// Days after an update check its installation still counts as active.
    pub days_after: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Maximum backwards timestamp jitter tolerated between records.
    pub tolerance_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: WindowConfig {
                days_before: 6,
                days_after: 6,
            },
            ordering: OrderingConfig { tolerance_ms: 60_000 },
            logging: LoggingConfig {
                level: "ERROR".to_string(),
                format: "pretty".to_string(),
                output: "console".to_string(),
                directory: PathBuf::from("logs"),
            },
            output: OutputConfig { color: true },
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        let config_paths = [
            PathBuf::from("update-census.toml"),
            PathBuf::from(".update-census.toml"),
            dirs::config_dir()
                .map(|d| d.join("update-census").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                info!(config_file = %path.display(), "Loading configuration from file");
                config = Self::load_from_file(path)?;
                break;
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        // Logging overrides
        if let Ok(val) = env::var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env::var("LOG_FORMAT") {
            self.logging.format = val;
        }
        if let Ok(val) = env::var("LOG_OUTPUT") {
            self.logging.output = val;
        }
        if let Ok(val) = env::var("UPDATE_CENSUS_LOG_DIR") {
            self.logging.directory = PathBuf::from(val);
        }

        // Window overrides
        if let Ok(val) = env::var("UPDATE_CENSUS_DAYS_BEFORE") {
            self.window.days_before = val.parse().context("Invalid UPDATE_CENSUS_DAYS_BEFORE")?;
        }
        if let Ok(val) = env::var("UPDATE_CENSUS_DAYS_AFTER") {
            self.window.days_after = val.parse().context("Invalid UPDATE_CENSUS_DAYS_AFTER")?;
        }

        // Ordering overrides
        if let Ok(val) = env::var("UPDATE_CENSUS_TOLERANCE_MS") {
            self.ordering.tolerance_ms =
                val.parse().context("Invalid UPDATE_CENSUS_TOLERANCE_MS")?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ordering.tolerance_ms < 0 {
            return Err(anyhow::anyhow!("Ordering tolerance cannot be negative"));
        }

        // A zero-sized window is the single-day tally; large windows only
        // stretch the report delay, so warn rather than reject.
        if self.window.days_before > 31 || self.window.days_after > 31 {
            warn!(
                days_before = self.window.days_before,
                days_after = self.window.days_after,
                "Very large activity window, reports will lag the input by weeks"
            );
        }

        if self.logging.output != "console" && !self.logging.directory.exists() {
            fs::create_dir_all(&self.logging.directory)
                .context("Failed to create log directory")?;
        }

        Ok(())
    }
}

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration instance
pub fn get_config() -> &'static Config {
    CONFIG.get_or_init(|| Config::load().expect("Failed to load configuration"))
}
