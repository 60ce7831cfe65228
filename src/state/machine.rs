use std::collections::VecDeque;

use super::error::{StateError, StateResult};
use super::{PhaseTransition, ThemeEvent, ThemePhase};

const HISTORY_LIMIT: usize = 32;

#[derive(Debug)]
pub struct PhaseMachine {
    phase: ThemePhase,
    transition_history: VecDeque<PhaseTransition>,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self {
            phase: ThemePhase::default(),
            transition_history: VecDeque::new(),
        }
    }

    pub fn phase(&self) -> ThemePhase {
        self.phase
    }

    pub fn can_transition(&self, event: ThemeEvent) -> bool {
        self.next_phase(event).is_some()
    }

    pub fn next_phase(&self, event: ThemeEvent) -> Option<ThemePhase> {
        use ThemeEvent::*;
        match (self.phase, event) {
            (ThemePhase::Uninitialized, Initialize) => Some(ThemePhase::Resolving),
            (ThemePhase::Resolving, Applied) => Some(ThemePhase::Applied),
            (ThemePhase::Applied, PreferenceChanged) => Some(ThemePhase::Resolving),
            (ThemePhase::Applied, SystemSignalChanged) => Some(ThemePhase::Resolving),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: ThemeEvent) -> StateResult<ThemePhase> {
        tracing::debug!(from = ?self.phase, event = ?event, "request theme phase transition");
        let next = self.next_phase(event).ok_or_else(|| {
            let from = self.phase;
            tracing::warn!(from = ?from, event = ?event, "invalid theme phase transition requested");
            StateError::InvalidTransition { from, event }
        })?;

        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.pop_front();
        }
        self.transition_history
            .push_back(PhaseTransition::new(Some(self.phase), event, next));
        self.phase = next;

        Ok(self.phase)
    }

    /// Most recent transitions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &PhaseTransition> {
        self.transition_history.iter()
    }
}

impl Default for PhaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PhaseMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ThemePhase::{:?}", self.phase)
    }
}
