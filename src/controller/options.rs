//! Controller configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use button_overlay::{ControllerOptions, Endpoint};
//!
//! let options = ControllerOptions::new()
//!     .with_endpoint(Endpoint::parse("ws://127.0.0.1:8000/ws/hid/").unwrap())
//!     .with_max_reconnect_attempts(8)
//!     .with_frame_budget(Duration::from_millis(8));
//!
//! assert!(options.validate().is_ok());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::display::DEFAULT_FRAME_BUDGET;
use crate::error::{Error, Result};
use crate::transport::{Endpoint, ReconnectPolicy};

// ============================================================================
// ControllerOptions
// ============================================================================

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Channel endpoint. Required.
    pub endpoint: Option<Endpoint>,

    /// Reconnection policy.
    pub reconnect: ReconnectPolicy,

    /// Advisory receive-to-applied latency budget.
    pub frame_budget: Duration,

    /// Send the performance handshake after each open.
    pub send_handshake: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ControllerOptions {
    /// Creates options with defaults and no endpoint.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoint: None,
            reconnect: ReconnectPolicy::default(),
            frame_budget: DEFAULT_FRAME_BUDGET,
            send_handshake: true,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ControllerOptions {
    /// Sets the channel endpoint.
    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the whole reconnection policy.
    #[inline]
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Sets the number of reconnection attempts.
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect.max_attempts = attempts;
        self
    }

    /// Sets the latency budget.
    #[inline]
    #[must_use]
    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    /// Disables the performance handshake.
    #[inline]
    #[must_use]
    pub fn without_handshake(mut self) -> Self {
        self.send_handshake = false;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ControllerOptions {
    /// Checks the options for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the endpoint is missing or the
    /// reconnection policy is unusable.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_none() {
            return Err(Error::config(
                "Channel endpoint is required. Use .page_url() or .endpoint() to set it.",
            ));
        }

        let policy = &self.reconnect;

        if policy.max_attempts == 0 {
            return Err(Error::config("max_attempts must be at least 1"));
        }

        if policy.base_delay.is_zero() {
            return Err(Error::config("base_delay must be greater than zero"));
        }

        if policy.max_delay < policy.base_delay {
            return Err(Error::config(format!(
                "max_delay ({:?}) is shorter than base_delay ({:?})",
                policy.max_delay, policy.base_delay
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
