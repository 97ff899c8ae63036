//! Connection state machine.
//!
//! ```text
//! Disconnected ──► Connecting ──► Open
//!                    ▲    │        │
//!                    │    ▼        ▼
//!                    └─── Closed ◄─┘
//! ```
//!
//! `Closed → Connecting` is only allowed while reconnection is not
//! exhausted. A torn-down link rejects every transition.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

use super::backoff::ReconnectPolicy;

// ============================================================================
// ConnectionState
// ============================================================================

/// Lifecycle state of the channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Never connected.
    #[default]
    Disconnected,
    /// Channel being established.
    Connecting,
    /// Channel established.
    Open,
    /// Channel gone; may reconnect.
    Closed,
}

impl ConnectionState {
    /// Returns `true` if moving from `self` to `to` is a legal edge.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Disconnected, Self::Connecting)
                | (Self::Closed, Self::Connecting)
                | (Self::Connecting, Self::Open)
                | (Self::Connecting, Self::Closed)
                | (Self::Open, Self::Closed)
        )
    }
}

// ============================================================================
// LinkState
// ============================================================================

/// Guarded connection state plus reconnection bookkeeping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkState {
    state: ConnectionState,
    attempts: u32,
    exhausted: bool,
    torn_down: bool,
}

impl LinkState {
    /// Creates a link in `Disconnected`.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the reconnection attempts made since the last open.
    #[inline]
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns `true` once reconnection gave up.
    #[inline]
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Returns `true` once the link was torn down.
    #[inline]
    #[must_use]
    pub const fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Moves to `to` if the edge is legal.
    ///
    /// # Errors
    ///
    /// - [`Error::TornDown`] after [`tear_down`](Self::tear_down)
    /// - [`Error::InvalidTransition`] for an illegal edge or a reconnect
    ///   after exhaustion
    pub fn transition(&mut self, to: ConnectionState) -> Result<()> {
        if self.torn_down {
            return Err(Error::TornDown);
        }

        let reconnect_after_exhaustion =
            self.exhausted && self.state == ConnectionState::Closed && to == ConnectionState::Connecting;

        if reconnect_after_exhaustion || !self.state.can_transition_to(to) {
            return Err(Error::invalid_transition(self.state, to));
        }

        self.state = to;
        Ok(())
    }

    /// Enters `Open` and resets the attempt counter.
    ///
    /// # Errors
    ///
    /// Same as [`transition`](Self::transition).
    pub fn open(&mut self) -> Result<()> {
        self.transition(ConnectionState::Open)?;
        self.attempts = 0;
        Ok(())
    }

    /// Reserves the next reconnection attempt.
    ///
    /// Returns the attempt number and delay, or `None` (and marks the link
    /// exhausted) when the policy allows no more attempts.
    pub fn reserve_attempt(&mut self, policy: &ReconnectPolicy) -> Option<(u32, Duration)> {
        if self.torn_down || self.exhausted {
            return None;
        }

        match policy.next(self.attempts) {
            Some((attempt, delay)) => {
                self.attempts = attempt;
                Some((attempt, delay))
            }
            None => {
                self.exhausted = true;
                None
            }
        }
    }

    /// Marks the link torn down and closed.
    ///
    /// Returns `false` if it already was.
    pub fn tear_down(&mut self) -> bool {
        if self.torn_down {
            return false;
        }

        self.torn_down = true;
        self.state = ConnectionState::Closed;
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
