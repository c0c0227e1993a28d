//! Per-screen action state machine

use std::fmt::Display;

/// `Idle -> Loading -> {Success, Error}`, reset on the next action.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActionState<T> {
    #[default]
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> ActionState<T> {
    /// Enter `Loading`, dropping the previous outcome.
    pub fn begin(&mut self) {
        *self = ActionState::Loading;
    }

    pub fn succeed(&mut self, value: T) {
        *self = ActionState::Success(value);
    }

    /// Enter `Error` with the action prefix, e.g. "Swap failed: ...".
    pub fn fail(&mut self, prefix: &str, err: impl Display) {
        *self = ActionState::Error(format!("{}: {}", prefix, err));
    }

    /// Enter `Error` with a message shown as-is, for failed preconditions.
    pub fn reject(&mut self, message: impl Into<String>) {
        *self = ActionState::Error(message.into());
    }

    pub fn reset(&mut self) {
        *self = ActionState::Idle;
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, ActionState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            ActionState::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ActionState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let mut state: ActionState<u32> = ActionState::default();
        assert_eq!(state, ActionState::Idle);

        state.begin();
        assert!(state.is_busy());

        state.fail("Swap failed", "no route");
        assert_eq!(state.error(), Some("Swap failed: no route"));
        assert!(!state.is_busy());

        state.begin();
        assert!(state.error().is_none());
        state.succeed(7);
        assert_eq!(state.value(), Some(&7));

        state.reset();
        assert_eq!(state, ActionState::Idle);
    }
}
