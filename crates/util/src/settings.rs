//! Settings persistence for the otpgate CLI/TUI.
//!
//! Settings live in a small JSON file in the standard configuration
//! directory (`~/.config/otpgate/settings.json` on most platforms). Every
//! field is optional in the file; missing fields fall back to defaults.
//! Command-line flags are applied on top by the binary, environment
//! variables by [`Settings::with_env_overrides`].

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "OTPGATE_SETTINGS_PATH";
/// Environment variable overriding the API base URL.
pub const API_BASE_ENV: &str = "OTPGATE_API_BASE";
/// Environment variable overriding the theme.
pub const THEME_ENV: &str = "TUI_THEME";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
pub const DEFAULT_CODE_LENGTH: usize = 6;
pub const MAX_CODE_LENGTH: usize = 12;
pub const DEFAULT_COOLDOWN_SECONDS: u32 = 30;

/// Error surfaced when reading or validating settings fails.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Deserialization failure.
    #[error("settings file {path} is malformed: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A value is outside its accepted range.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Persisted settings values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the authentication API.
    pub api_base: Option<String>,
    /// Number of digits in a one-time code.
    pub code_length: usize,
    /// Seconds a user must wait between resend requests.
    pub cooldown_seconds: u32,
    /// Canonical identifier of the preferred theme.
    pub theme: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: None,
            code_length: DEFAULT_CODE_LENGTH,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            theme: None,
        }
    }
}

impl Settings {
    /// Load settings from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from `path`. A missing file yields defaults; a file that
    /// exists but cannot be parsed is an error.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        match fs::read_to_string(path) {
            Ok(data) => {
                let settings: Settings = serde_json::from_str(&data).map_err(|source| SettingsError::Serialization {
                    path: path.to_path_buf(),
                    source,
                })?;
                debug!(path = %path.display(), "loaded settings");
                Ok(settings)
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(error) => Err(SettingsError::Io(error)),
        }
    }

    /// Apply `OTPGATE_API_BASE` and `TUI_THEME` when they are set and non-empty.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(api_base) = non_empty_env(API_BASE_ENV) {
            self.api_base = Some(api_base);
        }
        if let Some(theme) = non_empty_env(THEME_ENV) {
            self.theme = Some(theme);
        }
        self
    }

    /// Check value ranges: code length in `1..=12`, cooldown at least one second.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(1..=MAX_CODE_LENGTH).contains(&self.code_length) {
            return Err(SettingsError::Invalid(format!(
                "code_length must be between 1 and {MAX_CODE_LENGTH}, got {}",
                self.code_length
            )));
        }
        if self.cooldown_seconds == 0 {
            return Err(SettingsError::Invalid("cooldown_seconds must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Effective API base URL.
    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Directory holding otpgate's settings and log file.
pub fn config_root() -> PathBuf {
    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("otpgate")
}

/// Resolved settings path, honoring `OTPGATE_SETTINGS_PATH`.
pub fn default_settings_path() -> PathBuf {
    if let Some(path) = non_empty_env(SETTINGS_PATH_ENV) {
        return expand_tilde(&path);
    }
    config_root().join(SETTINGS_FILE_NAME)
}
