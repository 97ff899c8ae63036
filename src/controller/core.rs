//! Controller implementation.
//!
//! The [`Controller`] ties the pieces together: it owns the element
//! registry, the host surface and the connection manager. The host creates
//! it, calls [`start`](Controller::start) once the surface is ready and
//! [`stop`](Controller::stop) when the overlay goes away.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::display::{
    ButtonCatalog, DisplaySynchronizer, ElementHandle, ElementRegistry, SharedRegistry,
    SharedSurface,
};
use crate::error::{Error, Result};
use crate::transport::{
    ConnectionManager, ConnectionState, Endpoint, EventHandler, EventSink, LinkState,
};

use super::builder::ControllerBuilder;
use super::options::ControllerOptions;

// ============================================================================
// Controller
// ============================================================================

/// Overlay controller.
///
/// Mirrors device state pushed by the server onto the overlay elements.
/// There is no global instance: the host owns the controller and its
/// lifetime. Dropping it tears the connection down.
pub struct Controller {
    /// Elements by key.
    registry: SharedRegistry,
    /// Rendering backend.
    surface: SharedSurface,
    /// Observer slot.
    events: EventSink,
    /// Channel owner.
    connection: ConnectionManager,
    /// Channel endpoint.
    endpoint: Endpoint,
    /// Resolved configuration.
    options: ControllerOptions,
}

// ============================================================================
// Controller - Constructor
// ============================================================================

impl Controller {
    /// Creates a new controller builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    /// Builds the registry, mounts it and prepares the connection.
    pub(crate) fn new(
        catalog: &ButtonCatalog,
        options: ControllerOptions,
        surface: SharedSurface,
        handler: Option<EventHandler>,
    ) -> Result<Self> {
        let endpoint = options
            .endpoint
            .clone()
            .ok_or_else(|| Error::config("Channel endpoint is required"))?;

        let registry = ElementRegistry::build(catalog);
        {
            let mut surface = surface.lock();
            for element in registry.iter() {
                surface.mount(element);
            }
        }

        info!(
            elements = registry.len(),
            skipped = registry.skipped(),
            endpoint = %endpoint,
            "Overlay controller created"
        );

        let registry: SharedRegistry = Arc::new(RwLock::new(registry));

        let events = EventSink::new();
        if let Some(handler) = handler {
            events.set(handler);
        }

        let sync = DisplaySynchronizer::new(Arc::clone(&registry), Arc::clone(&surface))
            .with_frame_budget(options.frame_budget);

        let connection = ConnectionManager::new(
            endpoint.clone(),
            options.reconnect,
            options.send_handshake,
            sync,
            Arc::clone(&surface),
            events.clone(),
        );

        Ok(Self {
            registry,
            surface,
            events,
            connection,
            endpoint,
            options,
        })
    }
}

// ============================================================================
// Controller - Lifecycle
// ============================================================================

impl Controller {
    /// Starts connecting to the server.
    ///
    /// Returns `false` (and does nothing) if already started or stopped.
    /// Must be called within a tokio runtime.
    pub fn start(&self) -> bool {
        self.connection.connect()
    }

    /// Closes the channel, cancels reconnection and releases all elements.
    ///
    /// Returns `false` if the controller was already stopped.
    pub fn stop(&self) -> bool {
        if !self.connection.teardown() {
            return false;
        }

        self.registry.write().clear();
        self.surface.lock().unmount_all();
        debug!("Overlay elements released");
        true
    }

    /// Stops the controller and waits for the event loop to exit.
    pub async fn shutdown(&self) {
        self.stop();
        self.connection.join().await;
    }
}

// ============================================================================
// Controller - Accessors
// ============================================================================

impl Controller {
    /// Returns the channel endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the resolved options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Returns the current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Returns a snapshot of the link state.
    #[inline]
    #[must_use]
    pub fn link(&self) -> LinkState {
        self.connection.link()
    }

    /// Returns `true` if the channel is open.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Returns the shared registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> SharedRegistry {
        Arc::clone(&self.registry)
    }

    /// Returns a copy of the element registered under `key`.
    #[must_use]
    pub fn element(&self, key: &str) -> Option<ElementHandle> {
        self.registry.read().get(key).cloned()
    }

    /// Returns `true` if the element under `key` is shown.
    #[inline]
    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        self.registry.read().is_visible(key)
    }

    /// Returns the number of registered elements.
    #[inline]
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.registry.read().len()
    }
}

// ============================================================================
// Controller - Event Handlers
// ============================================================================

impl Controller {
    /// Sets the observer callback.
    pub fn set_event_handler(&self, handler: EventHandler) {
        self.events.set(handler);
    }

    /// Clears the observer callback.
    pub fn clear_event_handler(&self) {
        self.events.clear();
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("endpoint", &self.endpoint)
            .field("connection", &self.connection)
            .field("elements", &self.element_count())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
