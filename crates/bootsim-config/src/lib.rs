//! Configuration management for Bootsim
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. CLI arguments (highest precedence)
//! 2. Environment variables (BOOTSIM_* prefix)
//! 3. bootsim.local.toml (gitignored, local overrides)
//! 4. bootsim.toml (git-tracked, project config)
//! 5. ~/.config/bootsim/config.toml (user defaults)
//! 6. Built-in defaults (lowest precedence)

use anyhow::Result;
use bootsim_types::{BootMode, Speed};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Log levels accepted by `[logging] level`.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main Bootsim configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootSimConfig {
    pub simulation: SimulationConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub mode: BootMode,
    /// Playback multiplier, `0.25..=3.0` in steps of `0.25`.
    pub speed: f64,
    /// Advance on timers. When off, stages are stepped through manually.
    pub autoplay: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mode: BootMode::Normal,
            speed: Speed::NORMAL.as_f64(),
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: ColorMode,
    pub show_registers: bool,
    pub show_memory: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            show_registers: true,
            show_memory: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ColorMode {
    /// Color when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorMode::Auto => "auto",
            ColorMode::Always => "always",
            ColorMode::Never => "never",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl BootSimConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Read a single TOML file, bypassing the layered sources.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Create a development configuration
    pub fn development() -> Self {
        Self {
            simulation: SimulationConfig {
                autoplay: false,
                ..Default::default()
            },
            display: DisplayConfig {
                show_registers: true,
                show_memory: true,
                ..Default::default()
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
        }
    }

    /// Create a configuration for unattended demonstrations
    pub fn demo() -> Self {
        Self {
            simulation: SimulationConfig {
                speed: 2.0,
                autoplay: true,
                ..Default::default()
            },
            display: DisplayConfig {
                color: ColorMode::Always,
                show_registers: true,
                show_memory: true,
            },
            logging: LoggingConfig {
                level: "error".to_string(),
            },
        }
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.speed()?;

        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "unknown log level '{}', expected one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// The configured playback speed.
    pub fn speed(&self) -> Result<Speed, ConfigError> {
        Speed::new(self.simulation.speed)
            .map_err(|e| ConfigError::ValidationError(format!("simulation.speed: {e}")))
    }

    /// Renders the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BootSimConfig::default();
        assert_eq!(config.simulation.mode, BootMode::Normal);
        assert!((config.simulation.speed - 1.0).abs() < f64::EPSILON);
        assert!(config.simulation.autoplay);
        assert_eq!(config.display.color, ColorMode::Auto);
        assert_eq!(config.logging.level, "warn");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_config() {
        let config = BootSimConfig::development();
        assert!(!config.simulation.autoplay);
        assert!(config.display.show_memory);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_demo_config() {
        let config = BootSimConfig::demo();
        assert!(config.simulation.autoplay);
        assert_eq!(config.speed().unwrap(), Speed::new(2.0).unwrap());
        assert_eq!(config.display.color, ColorMode::Always);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_out_of_range_speed() {
        let mut config = BootSimConfig::default();
        config.simulation.speed = 4.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert!(err.to_string().contains("simulation.speed"));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut config = BootSimConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = BootSimConfig::demo();
        let text = config.to_toml().unwrap();
        assert!(text.contains("[simulation]"));
        assert!(text.contains("autoplay = true"));

        let parsed: BootSimConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_from_file_errors_name_the_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.toml");
        let err = BootSimConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError { .. }));

        let broken = temp_dir.path().join("broken.toml");
        std::fs::write(&broken, "[simulation\nspeed = ").unwrap();
        let err = BootSimConfig::from_file(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_from_file_reads_partial_config() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(&path, "[simulation]\nmode = \"tampered\"\n").unwrap();

        let config = BootSimConfig::from_file(&path).unwrap();
        assert_eq!(config.simulation.mode, BootMode::Tampered);
        assert_eq!(config.display, DisplayConfig::default());
    }
}
