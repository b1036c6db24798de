//! Lifecycle of a single upload or download exchange.
//!
//! `Idle -> Validating -> (Rejected | Requesting) -> (Succeeded | Failed)`.
//! Nothing is retried: once a terminal state is reached the exchange is over.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Validating,
    /// Input was refused before any network call.
    Rejected,
    Requesting,
    Succeeded,
    Failed,
}

impl RequestState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Succeeded | Self::Failed)
    }

    pub fn can_transition_to(self, next: RequestState) -> bool {
        use RequestState::*;

        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Rejected)
                | (Validating, Requesting)
                | (Requesting, Succeeded)
                | (Requesting, Failed)
        )
    }
}

/// Tracks the state of one exchange and logs every transition.
#[derive(Debug)]
pub struct Lifecycle {
    operation: &'static str,
    state: RequestState,
}

impl Lifecycle {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            state: RequestState::Idle,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    fn transition(&mut self, next: RequestState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {:?} -> {next:?}",
            self.state
        );
        debug!(
            operation = self.operation,
            from = ?self.state,
            to = ?next,
            terminal = next.is_terminal(),
            "state transition"
        );
        self.state = next;
    }

    pub fn validating(&mut self) {
        self.transition(RequestState::Validating);
    }

    pub fn rejected(&mut self) {
        self.transition(RequestState::Rejected);
    }

    pub fn requesting(&mut self) {
        self.transition(RequestState::Requesting);
    }

    /// Moves to `Succeeded` or `Failed` depending on the outcome.
    pub fn finish<T, E>(&mut self, outcome: &Result<T, E>) {
        match outcome {
            Ok(_) => self.transition(RequestState::Succeeded),
            Err(_) => self.transition(RequestState::Failed),
        }
    }
}
