//! Button Overlay - WebSocket-driven overlay controller.
//!
//! This library mirrors the state of a physical input device (buttons,
//! levers) onto a set of overlay images, driven entirely by frames pushed
//! from a server over a persistent WebSocket.
//!
//! # Architecture
//!
//! ```text
//! Server ──frames──► ConnectionManager ──► parse ──► DisplaySynchronizer
//!                     (reconnect policy)               │
//!                                                      ▼
//!                                   ElementRegistry ──► DisplaySurface
//! ```
//!
//! Key design principles:
//!
//! - One tokio task per controller owns the socket and applies every batch
//! - A batch is applied under one registry lock and committed once
//! - Unknown keys, bad frames and bad payloads are logged and dropped
//! - Reconnection is linear, capped and bounded; exhaustion is terminal
//!
//! # Quick Start
//!
//! ```no_run
//! use button_overlay::{ButtonCatalog, Controller, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let catalog = ButtonCatalog::from_json(
//!         r#"[{"key": "btn_a", "image_url": "/static/images/buttons/a.png"}]"#,
//!     )?;
//!
//!     let controller = Controller::builder()
//!         .catalog(catalog)
//!         .page_url("http://127.0.0.1:8000/")
//!         .on_event(|event| println!("{event:?}"))
//!         .build()?;
//!
//!     controller.start();
//!     tokio::signal::ctrl_c().await.ok();
//!     controller.shutdown().await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`controller`] | [`Controller`] and its configuration |
//! | [`display`] | Catalog, registry, surface and synchronizer |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | WebSocket message types |
//! | [`transport`] | Connection manager and reconnection |

// ============================================================================
// Modules
// ============================================================================

/// Controller factory and configuration.
///
/// Use [`Controller::builder()`] to create a configured controller.
pub mod controller;

/// Overlay display state.
///
/// - [`ElementRegistry`] - Key-addressed overlay elements
/// - [`DisplaySynchronizer`] - Atomic batch application
/// - [`DisplaySurface`] - Host rendering backend
pub mod display;

/// Error types and result aliases.
pub mod error;

/// WebSocket protocol message types.
pub mod protocol;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Controller types
pub use controller::{Controller, ControllerBuilder, ControllerOptions};

// Display types
pub use display::{
    ButtonCatalog, ButtonDescriptor, DisplayState, DisplaySurface, DisplaySynchronizer,
    ElementHandle, ElementRegistry, HeadlessSurface, Layer, LinkStatus, SyncResult,
};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{DisplayBatch, DisplayEvent, InboundMessage, PerformanceConfig};

// Transport types
pub use transport::{
    ConnectionManager, ConnectionState, ControllerEvent, Endpoint, EventHandler, LinkState,
    ReconnectPolicy,
};
