use super::model::ThemePhase;

/// Inputs driving the theme lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeEvent {
    /// Phase two of start-up: the full environment is present.
    Initialize,
    PreferenceChanged,
    SystemSignalChanged,
    /// The resolved theme has been handed to the render root.
    Applied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Option<ThemePhase>,
    pub event: ThemeEvent,
    pub to: ThemePhase,
}

impl PhaseTransition {
    pub const fn new(from: Option<ThemePhase>, event: ThemeEvent, to: ThemePhase) -> Self {
        Self { from, event, to }
    }
}
