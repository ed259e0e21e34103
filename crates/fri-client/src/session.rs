use std::fmt;

use fri_message::SessionState;
use tracing::info;

/// A change of session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub old: SessionState,
    pub new: SessionState,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.old, self.new)
    }
}

/// Client-side mirror of the controller's session state.
///
/// The controller is authoritative: any observed state is accepted, there is
/// no local transition table. Only successfully decoded cycles may be fed
/// in; a rejected cycle leaves the state untouched.
#[derive(Debug)]
pub struct SessionStateMachine {
    state: SessionState,
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Record the state carried by a decoded monitoring message.
    ///
    /// When it differs from the current state, `on_change` runs exactly once
    /// while [`state`](Self::state) still reports the old value, then the new
    /// state is committed. An unchanged state does nothing.
    pub fn observe(
        &mut self,
        observed: SessionState,
        on_change: impl FnOnce(Transition),
    ) -> Option<Transition> {
        if observed == self.state {
            return None;
        }
        let transition = Transition {
            old: self.state,
            new: observed,
        };
        info!(from = %transition.old, to = %transition.new, "session state changed");
        on_change(transition);
        self.state = observed;
        Some(transition)
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
