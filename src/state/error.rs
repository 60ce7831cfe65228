use super::event::ThemeEvent;
use super::model::ThemePhase;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("invalid theme phase transition: from {from:?} using event {event:?}")]
    InvalidTransition { from: ThemePhase, event: ThemeEvent },
}
