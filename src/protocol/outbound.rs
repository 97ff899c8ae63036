//! Outbound control frames.
//!
//! The controller only ever sends one frame per successful open: the
//! performance handshake.
//!
//! # Format
//!
//! ```json
//! { "type": "performance_config", "high_priority": true, "timestamp": 1700000000000 }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::Result;

// ============================================================================
// PerformanceConfig
// ============================================================================

/// Handshake frame asking the server for high-priority delivery.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PerformanceConfig {
    /// Message tag (always `performance_config`).
    #[serde(rename = "type")]
    pub message_type: &'static str,

    /// Request high-priority delivery.
    pub high_priority: bool,

    /// Send time in milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl PerformanceConfig {
    /// Creates a handshake stamped with the current time.
    #[must_use]
    pub fn now() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self::at(timestamp)
    }

    /// Creates a handshake with an explicit timestamp.
    #[inline]
    #[must_use]
    pub const fn at(timestamp: u64) -> Self {
        Self {
            message_type: "performance_config",
            high_priority: true,
            timestamp,
        }
    }

    /// Serializes the frame to JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    #[test]
    fn test_handshake_shape() {
        let json = PerformanceConfig::at(1_700_000_000_000)
            .to_json()
            .expect("serialize");
        let value: Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(
            value,
            json!({
                "type": "performance_config",
                "high_priority": true,
                "timestamp": 1_700_000_000_000u64
            })
        );
    }

    #[test]
    fn test_handshake_now_is_recent() {
        let handshake = PerformanceConfig::now();
        // 2020-01-01 in epoch milliseconds
        assert!(handshake.timestamp > 1_577_836_800_000);
    }
}
