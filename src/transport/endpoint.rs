//! Channel endpoint derivation.
//!
//! The channel lives on the same host as the page that hosts the overlay.
//! Its scheme mirrors the page's: `http` pages use `ws`, `https` pages use
//! `wss`.
//!
//! # Example
//!
//! ```
//! use button_overlay::Endpoint;
//!
//! let endpoint = Endpoint::from_page_url("https://cabinet.local:8443/overlay/").unwrap();
//! assert_eq!(endpoint.as_str(), "wss://cabinet.local:8443/ws/hid/");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Path the server routes the display channel to.
pub const DEFAULT_CHANNEL_PATH: &str = "/ws/hid/";

// ============================================================================
// Endpoint
// ============================================================================

/// WebSocket URL of the display channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    /// Derives the endpoint from the hosting page URL and the default path.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `page_url` does not parse
    /// - [`Error::Config`] if the page is not served over http(s) or has no host
    pub fn from_page_url(page_url: &str) -> Result<Self> {
        Self::from_page_url_with_path(page_url, DEFAULT_CHANNEL_PATH)
    }

    /// Derives the endpoint from the hosting page URL and a channel path.
    ///
    /// # Errors
    ///
    /// Same as [`from_page_url`](Self::from_page_url).
    pub fn from_page_url_with_path(page_url: &str, path: &str) -> Result<Self> {
        let page = Url::parse(page_url)?;

        let scheme = match page.scheme() {
            "https" => "wss",
            "http" => "ws",
            other => {
                return Err(Error::config(format!(
                    "Cannot derive channel scheme from page scheme '{other}'"
                )));
            }
        };

        let host = page
            .host_str()
            .ok_or_else(|| Error::config(format!("Page URL has no host: {page_url}")))?;

        let authority = match page.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        Self::parse(&format!("{scheme}://{authority}{path}"))
    }

    /// Uses a channel URL as-is.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if `ws_url` does not parse
    /// - [`Error::Config`] if the scheme is not `ws` or `wss`
    pub fn parse(ws_url: &str) -> Result<Self> {
        let url = Url::parse(ws_url)?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::config(format!(
                "Channel URL must use ws:// or wss://, got {ws_url}"
            )));
        }

        Ok(Self { url })
    }

    /// Returns the URL text.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the parsed URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns `true` if the channel is encrypted.
    #[inline]
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "wss"
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
