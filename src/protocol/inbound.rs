//! Inbound message types.
//!
//! Frames pushed by the server are JSON objects discriminated by a `type`
//! tag. [`parse`] turns one raw frame into an [`InboundMessage`], validating
//! the payload shape of each variant before any field is trusted.
//!
//! # Message Types
//!
//! | `type` | Variant | Effect |
//! |--------|---------|--------|
//! | `batch_display_update` | [`InboundMessage::BatchDisplayUpdate`] | visibility batch |
//! | `processing_result` | [`InboundMessage::ProcessingResult`] | notification |
//! | `error` | [`InboundMessage::ServerError`] | error notification |
//! | `connection_established` | [`InboundMessage::ConnectionEstablished`] | logged |
//! | `performance_mode` | [`InboundMessage::PerformanceMode`] | logged |
//! | `performance_ack` | [`InboundMessage::PerformanceAck`] | logged |
//! | anything else | [`InboundMessage::Unknown`] | logged, ignored |

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Tag of the visibility batch message.
pub const BATCH_DISPLAY_UPDATE: &str = "batch_display_update";

/// Tag of the processing result notification.
pub const PROCESSING_RESULT: &str = "processing_result";

/// Tag of the server error notification.
pub const ERROR: &str = "error";

/// Tag of the server's connection greeting.
pub const CONNECTION_ESTABLISHED: &str = "connection_established";

/// Tag of the server's performance mode announcement.
pub const PERFORMANCE_MODE: &str = "performance_mode";

/// Tag of the server's reply to our handshake.
pub const PERFORMANCE_ACK: &str = "performance_ack";

// ============================================================================
// DisplayEvent
// ============================================================================

/// One `(key, visible)` pair inside a batch.
///
/// `key` is `None` when the server sent an event without a usable key; such
/// events are counted as skipped by the synchronizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayEvent {
    /// Registry key of the element.
    pub key: Option<String>,
    /// Target visibility.
    pub visible: bool,
}

impl DisplayEvent {
    /// Creates an event for `key`.
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, visible: bool) -> Self {
        Self {
            key: Some(key.into()),
            visible,
        }
    }

    /// Reads an event out of one element of the `events` array.
    ///
    /// Non-object elements, missing keys and non-string keys all yield an
    /// event without a key. A missing or non-boolean `visible` means hidden.
    fn from_value(value: &Value) -> Self {
        let key = value
            .get("key")
            .and_then(Value::as_str)
            .map(str::to_string);
        let visible = value
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or_default();

        Self { key, visible }
    }
}

// ============================================================================
// DisplayBatch
// ============================================================================

/// Payload of a `batch_display_update` frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayBatch {
    /// Events in server order.
    pub events: Vec<DisplayEvent>,
    /// Event count as announced by the server, if any.
    pub total_events: Option<u64>,
}

impl DisplayBatch {
    /// Creates a batch from events.
    #[inline]
    #[must_use]
    pub fn new(events: Vec<DisplayEvent>) -> Self {
        Self {
            events,
            total_events: None,
        }
    }

    /// Returns the number of events in the batch.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the batch carries no events.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

// ============================================================================
// InboundMessage
// ============================================================================

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Visibility updates to apply atomically.
    BatchDisplayUpdate(DisplayBatch),

    /// Informational result from the server.
    ProcessingResult {
        /// Human-readable text.
        message: String,
    },

    /// Error reported by the server.
    ServerError {
        /// Human-readable text.
        message: String,
    },

    /// Greeting sent right after the server accepts the channel.
    ConnectionEstablished {
        /// Client type the server assigned to us.
        client_type: String,
        /// Greeting text.
        message: String,
    },

    /// Server announced its performance mode.
    PerformanceMode {
        /// Whether high-performance mode is on.
        enabled: bool,
    },

    /// Server acknowledged our handshake.
    PerformanceAck {
        /// Status reported by the server.
        status: String,
    },

    /// Known tag with a payload that failed validation.
    Rejected {
        /// The `type` tag.
        kind: String,
        /// Why the payload was rejected.
        reason: String,
    },

    /// Unrecognized or missing tag.
    Unknown {
        /// The `type` tag, if the frame had a string one.
        kind: Option<String>,
        /// The full decoded frame.
        payload: Value,
    },
}

impl InboundMessage {
    /// Returns the wire tag for this message, if it has one.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        match self {
            Self::BatchDisplayUpdate(_) => Some(BATCH_DISPLAY_UPDATE),
            Self::ProcessingResult { .. } => Some(PROCESSING_RESULT),
            Self::ServerError { .. } => Some(ERROR),
            Self::ConnectionEstablished { .. } => Some(CONNECTION_ESTABLISHED),
            Self::PerformanceMode { .. } => Some(PERFORMANCE_MODE),
            Self::PerformanceAck { .. } => Some(PERFORMANCE_ACK),
            Self::Rejected { kind, .. } => Some(kind.as_str()),
            Self::Unknown { kind, .. } => kind.as_deref(),
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Classifies one raw frame.
///
/// # Errors
///
/// Returns [`Error::MalformedFrame`] if `raw` is not a JSON object. Every
/// decodable object classifies successfully, possibly as
/// [`InboundMessage::Rejected`] or [`InboundMessage::Unknown`].
pub fn parse(raw: &str) -> Result<InboundMessage> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| Error::malformed_frame(raw, e.to_string()))?;

    let Value::Object(object) = value else {
        return Err(Error::malformed_frame(raw, "frame is not a JSON object"));
    };

    Ok(classify(object))
}

/// Dispatches a decoded object by its `type` tag.
fn classify(object: Map<String, Value>) -> InboundMessage {
    let kind = object
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_string);

    match kind.as_deref() {
        Some(BATCH_DISPLAY_UPDATE) => parse_batch(&object),

        Some(PROCESSING_RESULT) => match get_str(&object, "message") {
            Some(message) => InboundMessage::ProcessingResult { message },
            None => rejected(PROCESSING_RESULT, "`message` is not a string"),
        },

        Some(ERROR) => match get_str(&object, "message") {
            Some(message) => InboundMessage::ServerError { message },
            None => rejected(ERROR, "`message` is not a string"),
        },

        Some(CONNECTION_ESTABLISHED) => InboundMessage::ConnectionEstablished {
            client_type: get_str(&object, "client_type").unwrap_or_default(),
            message: get_str(&object, "message").unwrap_or_default(),
        },

        Some(PERFORMANCE_MODE) => InboundMessage::PerformanceMode {
            enabled: object
                .get("enabled")
                .and_then(Value::as_bool)
                .unwrap_or_default(),
        },

        Some(PERFORMANCE_ACK) => InboundMessage::PerformanceAck {
            status: get_str(&object, "status").unwrap_or_default(),
        },

        _ => InboundMessage::Unknown {
            kind,
            payload: Value::Object(object),
        },
    }
}

/// Validates and extracts a `batch_display_update` payload.
fn parse_batch(object: &Map<String, Value>) -> InboundMessage {
    let Some(events) = object.get("events").and_then(Value::as_array) else {
        return rejected(BATCH_DISPLAY_UPDATE, "`events` is not an array");
    };

    InboundMessage::BatchDisplayUpdate(DisplayBatch {
        events: events.iter().map(DisplayEvent::from_value).collect(),
        total_events: object.get("total_events").and_then(Value::as_u64),
    })
}

#[inline]
fn get_str(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

#[inline]
fn rejected(kind: &str, reason: &str) -> InboundMessage {
    InboundMessage::Rejected {
        kind: kind.to_string(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
