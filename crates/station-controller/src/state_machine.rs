//! Polling state machine.
//!
//! The station alternates between two states:
//! - `Idle`: no card selected, polling the reader
//! - `CardPresent`: a MIFARE Classic card is selected and being reported
//!
//! # Valid Transitions
//!
//! - Idle → CardPresent (a poll returned a card)
//! - CardPresent → Idle (the card was released, whatever the report outcome)
//!
//! # Examples
//!
//! ```
//! use station_controller::{PollState, PollStateMachine};
//!
//! let mut machine = PollStateMachine::new();
//! assert_eq!(machine.current_state(), &PollState::Idle);
//!
//! machine.transition_to(PollState::CardPresent).unwrap();
//! machine.transition_to(PollState::Idle).unwrap();
//! assert_eq!(machine.history().len(), 2);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{Result, StationError};

/// Maximum number of state transitions to keep in history.
///
/// One card read produces two transitions, so this covers the last 50 reads.
const MAX_HISTORY_SIZE: usize = 100;

/// States of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollState {
    /// Waiting for a card.
    Idle,

    /// A card is selected; it is reported, then released.
    CardPresent,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::CardPresent => write!(f, "CardPresent"),
        }
    }
}

impl PollState {
    /// Whether moving from this state to `target` is allowed.
    pub fn can_transition_to(&self, target: &PollState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::CardPresent) | (Self::CardPresent, Self::Idle)
        )
    }
}

/// Record of one state change.
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: PollState,
    pub to: PollState,
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: PollState, to: PollState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time since the transition happened.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// State machine of the polling loop with a bounded transition history.
///
/// Not thread-safe; owned by the station.
#[derive(Debug)]
pub struct PollStateMachine {
    current_state: PollState,
    state_entered_at: Instant,
    history: VecDeque<StateTransition>,
}

impl PollStateMachine {
    /// Create a machine in the `Idle` state.
    pub fn new() -> Self {
        Self {
            current_state: PollState::Idle,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> &PollState {
        &self.current_state
    }

    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The `count` most recent transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        let skip = self.history.len().saturating_sub(count);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Move to `new_state`.
    ///
    /// # Errors
    ///
    /// Returns [`StationError::InvalidStateTransition`] if the move is not
    /// allowed; the machine is left unchanged.
    pub fn transition_to(&mut self, new_state: PollState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(StationError::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());
        Ok(transition)
    }

    /// Force the machine back to `Idle`, recording the transition.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state, PollState::Idle);
        self.perform_state_change(PollState::Idle, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: PollState, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for PollStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
