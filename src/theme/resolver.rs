//! Pure resolution rules. No I/O happens here; callers feed in whatever the
//! store and the system monitor produced.

use super::{ResolvedTheme, ThemePreference};

pub fn is_valid_preference(raw: &str) -> bool {
    ThemePreference::parse(raw).is_some()
}

/// Explicit preferences always win; `System` follows the platform signal.
pub fn resolve(preference: ThemePreference, system_signal: ResolvedTheme) -> ResolvedTheme {
    match preference {
        ThemePreference::Light => ResolvedTheme::Light,
        ThemePreference::Dark => ResolvedTheme::Dark,
        ThemePreference::System => system_signal,
    }
}

/// Preference to start from given the raw stored value.
///
/// A missing value and a value that is not one of the canonical forms are
/// indistinguishable here: both fall back to `System`.
pub fn initial_preference(stored: Option<&str>) -> ThemePreference {
    stored
        .and_then(ThemePreference::parse)
        .unwrap_or(ThemePreference::System)
}

/// Resolve a raw preference without consulting the platform.
///
/// Used where no system signal exists yet (server render, pre-paint). Missing,
/// invalid and `"system"` values all land on `Light`, the same default the
/// fully initialized state reaches when no environment facility is present.
pub fn resolved_theme_for(preference: Option<&str>) -> ResolvedTheme {
    match preference.and_then(ThemePreference::parse) {
        Some(ThemePreference::Dark) => ResolvedTheme::Dark,
        Some(ThemePreference::Light | ThemePreference::System) | None => ResolvedTheme::Light,
    }
}
