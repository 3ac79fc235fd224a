use super::event::AppEvent;
use super::model::AppState;
use thiserror::Error;

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("cannot apply {event:?} while {from:?}")]
    InvalidStateTransition { from: AppState, event: AppEvent },
}
