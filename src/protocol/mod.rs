//! WebSocket protocol message types.
//!
//! This module defines the JSON frames exchanged with the server.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `PerformanceConfig` | Local → Server | Handshake, once per open |
//! | `InboundMessage` | Server → Local | Display batches and notifications |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `inbound` | Inbound message classification |
//! | `outbound` | Handshake frame |

// ============================================================================
// Submodules
// ============================================================================

/// Inbound message types and the frame classifier.
pub mod inbound;

/// Outbound control frames.
pub mod outbound;

// ============================================================================
// Re-exports
// ============================================================================

pub use inbound::{DisplayBatch, DisplayEvent, InboundMessage, parse};
pub use outbound::PerformanceConfig;
