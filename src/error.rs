//! Error types for the overlay controller.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible setup operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use button_overlay::{ButtonCatalog, Result};
//!
//! fn load(json: &str) -> Result<ButtonCatalog> {
//!     let catalog = ButtonCatalog::from_json(json)?;
//!     Ok(catalog)
//! }
//! ```
//!
//! Errors raised inside the connection event loop never escape it. They are
//! logged and turned into state transitions (reconnect, dropped frame).
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidCatalog`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionClosed`], [`Error::InvalidTransition`], [`Error::TornDown`] |
//! | Protocol | [`Error::MalformedFrame`] |
//! | External | [`Error::Json`], [`Error::Url`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::ConnectionState;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when controller options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Button catalog could not be used.
    #[error("Invalid button catalog: {message}")]
    InvalidCatalog {
        /// Description of the catalog problem.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// Channel could not be established.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Channel closed while an operation needed it.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A connection state change was rejected by the state guard.
    #[error("Illegal connection transition: {from:?} -> {to:?}")]
    InvalidTransition {
        /// State the manager was in.
        from: ConnectionState,
        /// State that was requested.
        to: ConnectionState,
    },

    /// The controller was torn down and accepts no further work.
    #[error("Controller has been torn down")]
    TornDown,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Inbound frame could not be decoded.
    ///
    /// The frame is dropped; the channel stays open.
    #[error("Malformed frame: {message}")]
    MalformedFrame {
        /// Raw frame text as received.
        raw: String,
        /// Decoder message.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid catalog error.
    #[inline]
    pub fn invalid_catalog(message: impl Into<String>) -> Self {
        Self::InvalidCatalog {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a malformed frame error.
    #[inline]
    pub fn malformed_frame(raw: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            raw: raw.into(),
            message: message.into(),
        }
    }

    /// Creates an illegal transition error.
    #[inline]
    pub fn invalid_transition(from: ConnectionState, to: ConnectionState) -> Self {
        Self::InvalidTransition { from, to }
    }
}

// ============================================================================
// Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::ConnectionClosed | Self::WebSocket(_)
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Channel failures recover through the reconnection policy and bad
    /// frames are simply dropped.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
                | Self::MalformedFrame { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
