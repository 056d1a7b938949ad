//! Settings discovery and loading for cdnflow
//!
//! Settings are optional: with no settings file every value falls back to its
//! default, and the API token always comes from the environment.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_CANDIDATES: [&str; 2] = ["cdnflow.local.yaml", "cdnflow.yaml"];

/// Locate the settings file
///
/// Search order:
/// 1. `CDNFLOW_CONFIG_PATH` (direct path)
/// 2. current directory: cdnflow.local.yaml, cdnflow.yaml
/// 3. `./.cdnflow/`, same order
/// 4. `~/.config/cdnflow/cdnflow.yaml` (global)
pub fn find_settings_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("CDNFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for filename in &SETTINGS_CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".cdnflow");
    if project_dir.is_dir() {
        for filename in &SETTINGS_CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global = config_dir.join("cdnflow").join("cdnflow.yaml");
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::SettingsFileNotFound)
}

/// Load settings from the discovered file, or defaults when there is none
pub fn load_settings() -> Result<Settings> {
    match find_settings_file() {
        Ok(path) => load_settings_from(&path),
        Err(ConfigError::SettingsFileNotFound) => Ok(Settings::default()),
        Err(e) => Err(e),
    }
}

/// Load and validate settings from an explicit path
pub fn load_settings_from(path: &Path) -> Result<Settings> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = if content.trim().is_empty() {
        Settings::default()
    } else {
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };
    settings.validate()?;
    Ok(settings)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// API base URL; `CDN_API_URL` or the built-in default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    /// Default project for `create`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub poll: PollSettings,
    pub timeouts: TimeoutSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.poll.initial_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll.initial_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.poll.max_interval_ms < self.poll.initial_interval_ms {
            return Err(ConfigError::Invalid(
                "poll.max_interval_ms must not be less than poll.initial_interval_ms".to_string(),
            ));
        }
        if !self.poll.multiplier.is_finite() || self.poll.multiplier < 1.0 {
            return Err(ConfigError::Invalid(
                "poll.multiplier must be at least 1.0".to_string(),
            ));
        }
        for (name, secs) in [
            ("create_secs", self.timeouts.create_secs),
            ("update_secs", self.timeouts.update_secs),
            ("read_secs", self.timeouts.read_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "timeouts.{} must be greater than 0",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollSettings {
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub multiplier: f64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            initial_interval_ms: 2_000,
            max_interval_ms: 30_000,
            multiplier: 1.5,
        }
    }
}

impl PollSettings {
    pub fn initial_interval(&self) -> Duration {
        Duration::from_millis(self.initial_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutSettings {
    pub create_secs: u64,
    pub update_secs: u64,
    pub read_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            create_secs: 1_200,
            update_secs: 1_200,
            read_secs: 300,
        }
    }
}

impl TimeoutSettings {
    pub fn create(&self) -> Duration {
        Duration::from_secs(self.create_secs)
    }

    pub fn update(&self) -> Duration {
        Duration::from_secs(self.update_secs)
    }

    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }
}
