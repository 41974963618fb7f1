//! Utility helpers shared by the otpgate crates.
//!
//! - [`settings`]: the JSON settings file and its environment overrides
//! - [`validation`]: email and code validation plus digit extraction
//! - path and redaction helpers used by logging

pub mod settings;
pub mod validation;

use std::path::PathBuf;

use dirs_next::home_dir;

pub use settings::{Settings, SettingsError};
pub use validation::{ValidationError, extract_digits, is_valid_email, validate_code, validate_email};

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let p = path.trim();
    if p == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = p.strip_prefix("~/") {
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    if let Some(rest) = p.strip_prefix("~\\") {
        // Windows-style
        return home_dir().unwrap_or_else(|| PathBuf::from("~")).join(rest);
    }
    PathBuf::from(p)
}

/// Masks a one-time code for log output, keeping only its length visible.
pub fn redact_code(code: &str) -> String {
    "*".repeat(code.chars().count())
}
