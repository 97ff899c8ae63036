//! Builder pattern for controller configuration.
//!
//! Provides a fluent API for configuring and creating [`Controller`] instances.
//!
//! # Example
//!
//! ```no_run
//! use button_overlay::{ButtonCatalog, Controller};
//!
//! # async fn example() -> button_overlay::Result<()> {
//! let catalog = ButtonCatalog::from_json(r#"[{"key":"btn_a","image_url":"/a.png"}]"#)?;
//!
//! let controller = Controller::builder()
//!     .catalog(catalog)
//!     .page_url("http://127.0.0.1:8000/")
//!     .build()?;
//!
//! controller.start();
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::warn;

use crate::display::{ButtonCatalog, DisplaySurface, HeadlessSurface, SharedSurface};
use crate::error::Result;
use crate::transport::{ControllerEvent, Endpoint, EventHandler, ReconnectPolicy};

use super::core::Controller;
use super::options::ControllerOptions;

// ============================================================================
// ControllerBuilder
// ============================================================================

/// Builder for configuring a [`Controller`] instance.
///
/// Use [`Controller::builder()`] to create a new builder.
#[derive(Default)]
pub struct ControllerBuilder {
    /// Button catalog.
    catalog: Option<ButtonCatalog>,
    /// Page URL the endpoint is derived from.
    page_url: Option<String>,
    /// Explicit channel URL.
    endpoint_url: Option<String>,
    /// Remaining options.
    options: ControllerOptions,
    /// Rendering backend.
    surface: Option<SharedSurface>,
    /// Observer callback.
    handler: Option<EventHandler>,
}

// ============================================================================
// ControllerBuilder Implementation
// ============================================================================

impl ControllerBuilder {
    /// Creates a new builder with no configuration.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the button catalog.
    #[inline]
    #[must_use]
    pub fn catalog(mut self, catalog: impl Into<ButtonCatalog>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Derives the channel endpoint from the hosting page URL.
    #[inline]
    #[must_use]
    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    /// Sets the channel URL directly (`ws://` or `wss://`).
    ///
    /// Takes precedence over [`page_url`](Self::page_url).
    #[inline]
    #[must_use]
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ControllerOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the reconnection policy.
    #[inline]
    #[must_use]
    pub fn reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.options.reconnect = policy;
        self
    }

    /// Sets the latency budget.
    #[inline]
    #[must_use]
    pub fn frame_budget(mut self, budget: Duration) -> Self {
        self.options.frame_budget = budget;
        self
    }

    /// Enables or disables the performance handshake.
    #[inline]
    #[must_use]
    pub fn handshake(mut self, enabled: bool) -> Self {
        self.options.send_handshake = enabled;
        self
    }

    /// Sets the rendering backend.
    ///
    /// Defaults to a [`HeadlessSurface`].
    #[inline]
    #[must_use]
    pub fn surface<S: DisplaySurface>(self, surface: S) -> Self {
        self.shared_surface(Arc::new(Mutex::new(surface)))
    }

    /// Sets a rendering backend the caller keeps a handle to.
    #[inline]
    #[must_use]
    pub fn shared_surface(mut self, surface: SharedSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    /// Sets the observer callback.
    #[inline]
    #[must_use]
    pub fn on_event<F>(mut self, handler: F) -> Self
    where
        F: Fn(ControllerEvent) + Send + Sync + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Builds the controller with validation.
    ///
    /// The registry is built and mounted here; nothing connects until
    /// [`Controller::start`].
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Url`] if a URL does not parse
    /// - [`crate::Error::Config`] if no endpoint is set or options are invalid
    pub fn build(self) -> Result<Controller> {
        let mut options = self.options;

        if let Some(url) = &self.endpoint_url {
            options.endpoint = Some(Endpoint::parse(url)?);
        } else if let Some(url) = &self.page_url {
            options.endpoint = Some(Endpoint::from_page_url(url)?);
        }

        options.validate()?;

        let catalog = self.catalog.unwrap_or_default();
        if catalog.is_empty() {
            warn!("Button catalog is empty, no overlay elements will be created");
        }

        let surface = self
            .surface
            .unwrap_or_else(|| Arc::new(Mutex::new(HeadlessSurface::new())));

        Controller::new(&catalog, options, surface, self.handler)
    }
}

impl std::fmt::Debug for ControllerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerBuilder")
            .field("catalog", &self.catalog)
            .field("page_url", &self.page_url)
            .field("endpoint_url", &self.endpoint_url)
            .field("options", &self.options)
            .field("surface", &self.surface.is_some())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::display::ButtonDescriptor;
    use crate::error::Error;
    use crate::transport::ConnectionState;

    #[test]
    fn test_build_requires_endpoint() {
        let err = ControllerBuilder::new().build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_build_from_page_url() {
        let controller = ControllerBuilder::new()
            .catalog(vec![ButtonDescriptor::new("btn_a", "/a.png")])
            .page_url("https://cabinet.local/")
            .build()
            .expect("build");

        assert_eq!(controller.endpoint().as_str(), "wss://cabinet.local/ws/hid/");
        assert_eq!(controller.state(), ConnectionState::Disconnected);
        assert_eq!(controller.element_count(), 1);
    }

    #[test]
    fn test_endpoint_overrides_page_url() {
        let controller = ControllerBuilder::new()
            .page_url("https://cabinet.local/")
            .endpoint("ws://10.0.0.2:8000/custom/")
            .build()
            .expect("build");

        assert_eq!(controller.endpoint().as_str(), "ws://10.0.0.2:8000/custom/");
    }

    #[test]
    fn test_build_rejects_bad_urls() {
        assert!(matches!(
            ControllerBuilder::new().page_url("not a url").build(),
            Err(Error::Url(_))
        ));
        assert!(matches!(
            ControllerBuilder::new().endpoint("http://x/").build(),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_surface_receives_mounts() {
        let surface = Arc::new(Mutex::new(HeadlessSurface::new()));

        let _controller = ControllerBuilder::new()
            .catalog(vec![
                ButtonDescriptor::new("btn_a", "/a.png"),
                ButtonDescriptor::new("btn_b", "/b.png"),
            ])
            .endpoint("ws://127.0.0.1:8000/ws/hid/")
            .shared_surface(surface.clone())
            .build()
            .expect("build");

        assert_eq!(surface.lock().mounted(), ["btn_a", "btn_b"]);
    }
}
