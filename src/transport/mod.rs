//! WebSocket transport layer.
//!
//! This module owns the channel to the server: where it points, how its
//! state moves, how it retries and what it tells observers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                       ┌─────────────────┐
//! │  ConnectionManager   │       WebSocket       │  Server         │
//! │  └─ EventLoop task   │◄─────────────────────►│  /ws/hid/       │
//! │     ├─ LinkState     │  performance_config → │                 │
//! │     └─ Synchronizer  │  ← batch_display_update                 │
//! └──────────────────────┘                       └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `backoff` | Reconnection delay policy |
//! | `connection` | Connection manager and event loop |
//! | `endpoint` | Channel URL derivation |
//! | `events` | Observer notifications |
//! | `state` | Guarded connection state machine |

// ============================================================================
// Submodules
// ============================================================================

/// Reconnection delay policy.
pub mod backoff;

/// Connection manager and event loop.
pub mod connection;

/// Channel URL derivation.
pub mod endpoint;

/// Observer notifications.
pub mod events;

/// Connection state machine.
pub mod state;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::ReconnectPolicy;
pub use connection::ConnectionManager;
pub use endpoint::{DEFAULT_CHANNEL_PATH, Endpoint};
pub use events::{ControllerEvent, EventHandler, EventSink};
pub use state::{ConnectionState, LinkState};
