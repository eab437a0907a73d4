//! Stage lifecycle state machine.

use action_stage_core::{StageOutcome, StageState};

/// Tracks the lifecycle of one stage instance.
#[derive(Clone, Debug)]
pub(crate) struct StageMachine {
    state: StageState,
}

impl StageMachine {
    pub(crate) const fn new() -> Self {
        Self {
            state: StageState::NotStarted,
        }
    }

    pub(crate) const fn state(&self) -> StageState {
        self.state
    }

    /// Enters play from the not-started state.
    pub(crate) fn start(&mut self) -> bool {
        if self.state != StageState::NotStarted {
            return false;
        }
        self.state = StageState::Playing;
        true
    }

    /// Pauses or resumes an active stage. Returns `true` when the state changed.
    pub(crate) fn set_paused(&mut self, paused: bool) -> bool {
        let next = match (self.state, paused) {
            (StageState::Playing, true) => StageState::Paused,
            (StageState::Paused, false) => StageState::Playing,
            _ => return false,
        };
        self.state = next;
        true
    }

    /// Moves an active stage into its terminal state.
    ///
    /// Only the first call has an effect; later calls return `false`.
    pub(crate) fn conclude(&mut self, outcome: StageOutcome) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state = match outcome {
            StageOutcome::Won => StageState::Won,
            StageOutcome::Lost => StageState::Lost,
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_only_leaves_not_started() {
        let mut machine = StageMachine::new();
        assert!(machine.start());
        assert!(!machine.start());
        assert_eq!(machine.state(), StageState::Playing);
    }

    #[test]
    fn pause_toggles_only_while_active() {
        let mut machine = StageMachine::new();
        assert!(!machine.set_paused(true));
        assert!(machine.start());
        assert!(machine.set_paused(true));
        assert!(!machine.set_paused(true));
        assert_eq!(machine.state(), StageState::Paused);
        assert!(machine.set_paused(false));
        assert_eq!(machine.state(), StageState::Playing);
    }

    #[test]
    fn conclusion_is_terminal_and_idempotent() {
        let mut machine = StageMachine::new();
        assert!(!machine.conclude(StageOutcome::Won));
        assert!(machine.start());
        assert!(machine.conclude(StageOutcome::Won));
        assert!(!machine.conclude(StageOutcome::Lost));
        assert!(!machine.set_paused(true));
        assert_eq!(machine.state(), StageState::Won);
    }
}
