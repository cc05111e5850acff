//! Configuration file support for wktc.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/wktc/config.toml`.

use crate::text::MAX_UTF8_LEN;
use crate::types::{ControllerCount, HrOffsetMode, Intensity, RepeatMode, WorkoutOptions};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub capacities: Capacities,

    #[serde(default)]
    pub repeat: RepeatConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Fallbacks for workout options the description leaves out
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub hr_offset_mode: HrOffsetMode,

    #[serde(default)]
    pub default_intensity: Intensity,

    #[serde(default)]
    pub repeat_mode: RepeatMode,
}

/// Device field capacities in bytes
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capacities {
    #[serde(default = "default_step_name")]
    pub step_name: usize,

    #[serde(default = "default_workout_name")]
    pub workout_name: usize,

    #[serde(default = "default_description")]
    pub description: usize,

    #[serde(default = "default_step_note")]
    pub step_note: usize,

    #[serde(default = "default_chunk_payload")]
    pub chunk_payload: usize,
}

impl Default for Capacities {
    fn default() -> Self {
        Self {
            step_name: default_step_name(),
            workout_name: default_workout_name(),
            description: default_description(),
            step_note: default_step_note(),
            chunk_payload: default_chunk_payload(),
        }
    }
}

/// Repeat controller encoding
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RepeatConfig {
    #[serde(default)]
    pub controller_count: ControllerCount,
}

/// Where handoff files are written
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Settings a single compilation needs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CompileSettings {
    pub capacities: Capacities,
    pub controller_count: ControllerCount,
}

// Default value functions
fn default_step_name() -> usize {
    15
}

fn default_workout_name() -> usize {
    30
}

fn default_description() -> usize {
    161
}

fn default_step_note() -> usize {
    50
}

fn default_chunk_payload() -> usize {
    250
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let base = match dirs::config_dir() {
            Some(dir) => dir,
            None => std::env::var_os("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .ok_or_else(|| Error::Config("HOME environment variable not set".into()))?,
        };
        Ok(base.join("wktc").join("config.toml"))
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reject capacities the compiler cannot honor
    pub fn validate(&self) -> Result<()> {
        let caps = &self.capacities;
        let named = [
            ("step_name", caps.step_name),
            ("workout_name", caps.workout_name),
            ("description", caps.description),
            ("step_note", caps.step_note),
            ("chunk_payload", caps.chunk_payload),
        ];
        if let Some((name, _)) = named.iter().find(|(_, cap)| *cap == 0) {
            return Err(Error::Config(format!("capacities.{} must be positive", name)));
        }
        if caps.chunk_payload < MAX_UTF8_LEN {
            return Err(Error::Config(format!(
                "capacities.chunk_payload must be at least {} bytes, got {}",
                MAX_UTF8_LEN, caps.chunk_payload
            )));
        }
        Ok(())
    }

    /// Workout options used when a description leaves them out
    pub fn workout_defaults(&self) -> WorkoutOptions {
        WorkoutOptions {
            hr_offset_mode: self.defaults.hr_offset_mode,
            default_intensity: self.defaults.default_intensity,
            repeat_mode_default: self.defaults.repeat_mode,
        }
    }

    pub fn compile_settings(&self) -> CompileSettings {
        CompileSettings {
            capacities: self.capacities,
            controller_count: self.repeat.controller_count,
        }
    }
}
