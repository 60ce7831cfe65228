use std::fmt;

use crate::a11y::ColorError;
use crate::config::ConfigError;
use crate::theme::InvalidPreference;
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

/// Diagnostic classification of every fault the theming pipeline can hit.
///
/// Only `InvalidColorFormat` ever reaches a caller as an error; every other
/// kind is recovered where it happens and surfaces solely through
/// `ThemeState::last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    StorageUnavailable,
    StorageWriteFailed,
    InvalidStoredValue,
    MonitorUnsupported,
    MonitorSubscribeFailed,
    RenderTargetUnavailable,
    RenderMutationFailed,
    InvalidColorFormat,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::StorageUnavailable => "storage-unavailable",
            ErrorKind::StorageWriteFailed => "storage-write-failed",
            ErrorKind::InvalidStoredValue => "invalid-stored-value",
            ErrorKind::MonitorUnsupported => "monitor-unsupported",
            ErrorKind::MonitorSubscribeFailed => "monitor-subscribe-failed",
            ErrorKind::RenderTargetUnavailable => "render-target-unavailable",
            ErrorKind::RenderMutationFailed => "render-mutation-failed",
            ErrorKind::InvalidColorFormat => "invalid-color-format",
        }
    }

    /// Whether the condition comes from the environment rather than from a
    /// malformed argument.
    pub const fn is_environmental(self) -> bool {
        !matches!(self, ErrorKind::InvalidColorFormat)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error(transparent)]
    Preference(#[from] InvalidPreference),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Color(err) => Some(err.kind()),
            AppError::Preference(_) => None,
            AppError::Config(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_color_format_is_a_caller_error() {
        assert!(!ErrorKind::InvalidColorFormat.is_environmental());
        assert!(ErrorKind::StorageUnavailable.is_environmental());
        assert!(ErrorKind::RenderMutationFailed.is_environmental());
    }

    #[test]
    fn app_error_wraps_color_error_with_kind() {
        let err: AppError = ColorError::InvalidColorFormat {
            value: "rgb(0,0,0)".into(),
        }
        .into();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidColorFormat));
        assert!(err.to_string().contains("rgb(0,0,0)"));
    }
}
