//! Theme styling module for the TUI UI layer.
//!
//! This module defines the Dracula palette, an ANSI 256-color fallback,
//! semantic theme roles, and helper builders for Ratatui widgets and styles.
//! Prefer these helpers over hard-coding colors to keep the UI consistent.

use std::env;

use tracing::debug;

pub mod ansi256;
pub mod catalog;
pub mod dracula;
pub mod roles;
pub mod theme_helpers;

pub use ansi256::Ansi256Theme;
pub use catalog::ThemeDefinition;
pub use dracula::DraculaTheme;
pub use roles::Theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorCapability {
    Truecolor,
    Ansi256,
}

/// Selects a theme based on the preferred name and terminal capabilities.
///
/// ANSI-only terminals always get the fallback palette; otherwise the
/// preferred theme wins when it resolves, and Dracula is the default.
pub fn load(preferred_theme: Option<&str>) -> Box<dyn Theme> {
    resolve_definition(preferred_theme, detect_color_capability()).build()
}

fn resolve_definition(preferred_theme: Option<&str>, capability: ColorCapability) -> &'static ThemeDefinition {
    if matches!(capability, ColorCapability::Ansi256) {
        debug!("ANSI-only terminal detected; ignoring theme overrides and forcing fallback palette.");
        return catalog::default_ansi();
    }

    if let Some(name) = preferred_theme
        && let Some(definition) = catalog::resolve(name.trim())
    {
        return definition;
    }

    catalog::default_truecolor()
}

fn detect_color_capability() -> ColorCapability {
    if let Some(mode) = env::var("TUI_COLOR_MODE").ok().and_then(|value| parse_color_mode(value.trim())) {
        return mode;
    }

    let color_term = env::var("COLORTERM").unwrap_or_default().to_ascii_lowercase();
    if color_term.contains("truecolor") || color_term.contains("24bit") {
        return ColorCapability::Truecolor;
    }

    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term.contains("truecolor") {
        return ColorCapability::Truecolor;
    }

    ColorCapability::Ansi256
}

fn parse_color_mode(value: &str) -> Option<ColorCapability> {
    match value.to_ascii_lowercase().as_str() {
        "truecolor" | "24bit" => Some(ColorCapability::Truecolor),
        "ansi256" | "256" | "8bit" => Some(ColorCapability::Ansi256),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_terminals_force_the_fallback() {
        let definition = resolve_definition(Some("dracula"), ColorCapability::Ansi256);
        assert_eq!(definition.id, "ansi256");
    }

    #[test]
    fn preferred_theme_wins_on_truecolor() {
        assert_eq!(resolve_definition(Some(" ansi "), ColorCapability::Truecolor).id, "ansi256");
        assert_eq!(resolve_definition(Some("unknown"), ColorCapability::Truecolor).id, "dracula");
        assert_eq!(resolve_definition(None, ColorCapability::Truecolor).id, "dracula");
    }

    #[test]
    fn color_mode_env_is_honored() {
        temp_env::with_vars([("TUI_COLOR_MODE", Some("truecolor")), ("COLORTERM", None::<&str>)], || {
            assert_eq!(detect_color_capability(), ColorCapability::Truecolor);
        });
        temp_env::with_vars([("TUI_COLOR_MODE", Some("8bit")), ("COLORTERM", Some("truecolor"))], || {
            assert_eq!(detect_color_capability(), ColorCapability::Ansi256);
        });
    }
}
