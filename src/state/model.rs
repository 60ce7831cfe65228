use crate::error::ErrorKind;
use crate::theme::{ResolvedTheme, ThemePreference};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ThemePhase {
    #[default]
    Uninitialized,
    Resolving,
    Applied,
}

/// Snapshot of everything the theme pipeline knows for one application root.
///
/// `resolved` is only ever produced by the resolver from `preference` and
/// `system_signal`; nothing sets it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeState {
    pub preference: ThemePreference,
    pub resolved: ResolvedTheme,
    pub system_signal: ResolvedTheme,
    pub ready: bool,
    pub last_error: Option<ErrorKind>,
}

impl Default for ThemeState {
    /// The pre-paint state: follow the system, render light until told otherwise.
    fn default() -> Self {
        Self {
            preference: ThemePreference::System,
            resolved: ResolvedTheme::Light,
            system_signal: ResolvedTheme::Light,
            ready: false,
            last_error: None,
        }
    }
}
