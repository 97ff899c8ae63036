//! Host display surface.
//!
//! The controller never renders anything itself. Whatever actually draws the
//! overlay (a web view, a compositor, a test double) implements
//! [`DisplaySurface`] and receives the few effects the controller produces.

// ============================================================================
// Imports
// ============================================================================

use tracing::trace;

use super::registry::{ElementHandle, ElementRegistry};

// ============================================================================
// LinkStatus
// ============================================================================

/// Connectivity indicator shown to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Channel open.
    Connected,
    /// Channel down, reconnection may still happen.
    #[default]
    Disconnected,
    /// Reconnection exhausted; stays until the controller is rebuilt.
    Lost,
}

impl LinkStatus {
    /// Returns the indicator label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Lost => "connection lost",
        }
    }
}

// ============================================================================
// DisplaySurface
// ============================================================================

/// Rendering backend driven by the controller.
///
/// All methods are called from the controller's event loop, one at a time.
pub trait DisplaySurface: Send + 'static {
    /// Mounts a freshly created element. Called once per registry entry.
    fn mount(&mut self, element: &ElementHandle);

    /// Flags the host container on the first batch received.
    fn reveal_stage(&mut self) {}

    /// Makes the state of `registry` visible as one update.
    ///
    /// Called once after every batch.
    fn commit(&mut self, registry: &ElementRegistry);

    /// Updates the connectivity indicator.
    fn show_link_status(&mut self, _status: LinkStatus) {}

    /// Releases all mounted elements.
    fn unmount_all(&mut self) {}
}

// ============================================================================
// HeadlessSurface
// ============================================================================

/// Surface that only records what it was asked to do.
///
/// Useful for running the controller without a renderer and in tests.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    mounted: Vec<String>,
    visible: Vec<String>,
    commits: usize,
    stage_revealed: bool,
    link_status: LinkStatus,
}

impl HeadlessSurface {
    /// Creates an empty surface.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns mounted keys in mount order.
    #[inline]
    #[must_use]
    pub fn mounted(&self) -> &[String] {
        &self.mounted
    }

    /// Returns the keys that were visible at the last commit.
    #[inline]
    #[must_use]
    pub fn visible(&self) -> &[String] {
        &self.visible
    }

    /// Returns how many commits happened.
    #[inline]
    #[must_use]
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Returns `true` once the stage was revealed.
    #[inline]
    #[must_use]
    pub fn stage_revealed(&self) -> bool {
        self.stage_revealed
    }

    /// Returns the last indicator state.
    #[inline]
    #[must_use]
    pub fn link_status(&self) -> LinkStatus {
        self.link_status
    }
}

impl DisplaySurface for HeadlessSurface {
    fn mount(&mut self, element: &ElementHandle) {
        self.mounted.push(element.key().to_string());
    }

    fn reveal_stage(&mut self) {
        self.stage_revealed = true;
    }

    fn commit(&mut self, registry: &ElementRegistry) {
        self.commits += 1;
        self.visible = registry
            .iter()
            .filter(|e| e.is_visible())
            .map(|e| e.key().to_string())
            .collect();
        trace!(commit = self.commits, visible = self.visible.len(), "Headless commit");
    }

    fn show_link_status(&mut self, status: LinkStatus) {
        self.link_status = status;
    }

    fn unmount_all(&mut self) {
        self.mounted.clear();
        self.visible.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
