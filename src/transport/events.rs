//! Observer notifications.
//!
//! The host registers one [`EventHandler`] to learn about connectivity and
//! server notifications. Display updates are not reported here; they go to
//! the [`DisplaySurface`](crate::DisplaySurface).

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

// ============================================================================
// ControllerEvent
// ============================================================================

/// Notification emitted by the connection event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Channel opened. Emitted before the handshake is sent.
    Connected,

    /// Channel closed or failed.
    Disconnected,

    /// A reconnection attempt was scheduled.
    ReconnectScheduled {
        /// Attempt number, starting at 1.
        attempt: u32,
        /// Delay before the attempt.
        delay: Duration,
    },

    /// No more reconnection attempts will be made.
    ReconnectExhausted {
        /// Attempts that were made.
        attempts: u32,
    },

    /// `processing_result` text from the server.
    Notification {
        /// Message text.
        message: String,
    },

    /// `error` text from the server.
    ServerError {
        /// Message text.
        message: String,
    },
}

// ============================================================================
// EventHandler
// ============================================================================

/// Event handler callback type.
///
/// Called on the event loop task. The handler must not install or clear
/// handlers itself.
pub type EventHandler = Box<dyn Fn(ControllerEvent) + Send + Sync>;

/// Handler slot shared between the host and the event loop.
#[derive(Clone, Default)]
pub struct EventSink {
    handler: Arc<Mutex<Option<EventHandler>>>,
}

impl EventSink {
    /// Creates an empty sink.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the handler, replacing any previous one.
    pub fn set(&self, handler: EventHandler) {
        *self.handler.lock() = Some(handler);
    }

    /// Removes the handler.
    pub fn clear(&self) {
        *self.handler.lock() = None;
    }

    /// Delivers `event` to the handler, if any.
    pub fn emit(&self, event: ControllerEvent) {
        let guard = self.handler.lock();
        if let Some(ref handler) = *guard {
            handler(event);
        }
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink")
            .field("installed", &self.handler.lock().is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
