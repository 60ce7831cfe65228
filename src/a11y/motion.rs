use std::rc::Rc;

use crate::system::MonitorError;

pub const REDUCED_MOTION_ENV: &str = "FOLIO_REDUCED_MOTION";

/// Platform facility answering "does the user want less motion?".
pub trait MotionSource {
    fn reduced_motion(&self) -> Result<bool, MonitorError>;
}

/// Fixed answer, for server rendering and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticMotion(pub bool);

impl MotionSource for StaticMotion {
    fn reduced_motion(&self) -> Result<bool, MonitorError> {
        Ok(self.0)
    }
}

/// Reads `FOLIO_REDUCED_MOTION` (`1`, `true`, `reduce`, `yes` mean reduced).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvMotion;

impl MotionSource for EnvMotion {
    fn reduced_motion(&self) -> Result<bool, MonitorError> {
        let raw = std::env::var(REDUCED_MOTION_ENV).map_err(|_| MonitorError::Unsupported)?;
        Ok(parse_reduced_motion_flag(&raw))
    }
}

fn parse_reduced_motion_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "reduce"
    )
}

/// Never-failing view over an optional [`MotionSource`].
#[derive(Clone, Default)]
pub struct MotionPreference {
    source: Option<Rc<dyn MotionSource>>,
}

impl MotionPreference {
    pub fn new(source: Rc<dyn MotionSource>) -> Self {
        Self {
            source: Some(source),
        }
    }

    pub fn unsupported() -> Self {
        Self { source: None }
    }

    /// `false` whenever the facility is missing or errors.
    pub fn prefers_reduced_motion(&self) -> bool {
        let Some(source) = self.source.as_ref() else {
            return false;
        };
        source.reduced_motion().unwrap_or_else(|err| {
            tracing::debug!(%err, "reduced-motion query failed; assuming full motion");
            false
        })
    }

    pub fn transition_duration(&self, default_ms: u32) -> u32 {
        if self.prefers_reduced_motion() {
            0
        } else {
            default_ms
        }
    }
}

impl std::fmt::Debug for MotionPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionPreference")
            .field("supported", &self.source.is_some())
            .finish()
    }
}
