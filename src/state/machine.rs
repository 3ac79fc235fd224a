use super::error::{StateError, StateResult};
use super::{event::StateTransition, AppEvent, AppState};

#[derive(Debug)]
pub struct StateMachine {
    state: AppState,
    transition_history: Vec<StateTransition>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: AppState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }

    pub fn can_transition(&self, event: AppEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: AppEvent) -> Option<AppState> {
        use AppEvent::*;
        match (self.state, event) {
            (AppState::Browsing, Start) => Some(AppState::Browsing),
            (AppState::Browsing, OpenCropper) => Some(AppState::Cropping),
            (AppState::Cropping, ConfirmCrop) => Some(AppState::Browsing),
            (AppState::Cropping, CancelCrop) => Some(AppState::Browsing),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: AppEvent) -> StateResult<AppState> {
        tracing::debug!(from = ?self.state, event = ?event, "request state transition");
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::warn!(from = ?from, event = ?event, "invalid state transition requested");
            StateError::InvalidStateTransition { from, event }
        })?;

        let record = StateTransition::new(Some(self.state), event, next);
        self.state = next;
        self.transition_history.push(record);

        Ok(self.state)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AppState::{:?}", self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cropper_can_only_open_while_browsing() {
        let mut machine = StateMachine::new();
        assert!(machine.can_transition(AppEvent::Start));
        assert!(machine.can_transition(AppEvent::OpenCropper));
        assert!(!machine.can_transition(AppEvent::ConfirmCrop));
        assert!(!machine.can_transition(AppEvent::CancelCrop));

        machine
            .transition(AppEvent::OpenCropper)
            .expect("browsing -> cropping should transition");

        assert!(!machine.can_transition(AppEvent::OpenCropper));
        assert!(machine.can_transition(AppEvent::ConfirmCrop));
        assert!(machine.can_transition(AppEvent::CancelCrop));
    }

    #[test]
    fn confirm_and_cancel_both_return_to_browsing_and_record_history() {
        let mut machine = StateMachine::new();
        machine.transition(AppEvent::Start).expect("start");
        machine.transition(AppEvent::OpenCropper).expect("open");
        machine.transition(AppEvent::ConfirmCrop).expect("confirm");
        machine.transition(AppEvent::OpenCropper).expect("reopen");
        machine.transition(AppEvent::CancelCrop).expect("cancel");

        assert_eq!(machine.state(), AppState::Browsing);
        assert_eq!(machine.history().len(), 5);
        assert_eq!(
            machine.history()[2],
            StateTransition::new(
                Some(AppState::Cropping),
                AppEvent::ConfirmCrop,
                AppState::Browsing
            )
        );
        assert_eq!(
            machine.history()[4],
            StateTransition::new(
                Some(AppState::Cropping),
                AppEvent::CancelCrop,
                AppState::Browsing
            )
        );
        assert_eq!(machine.to_string(), "AppState::Browsing");
    }

    #[test]
    fn invalid_transition_returns_error_without_mutating_history() {
        let mut machine = StateMachine::new();
        let err = machine
            .transition(AppEvent::ConfirmCrop)
            .expect_err("browsing -> confirm should fail");
        assert_eq!(
            err,
            StateError::InvalidStateTransition {
                from: AppState::Browsing,
                event: AppEvent::ConfirmCrop
            }
        );
        assert_eq!(machine.state(), AppState::Browsing);
        assert!(machine.history().is_empty());
    }
}
