//! Display synchronizer.
//!
//! Applies visibility batches to the [`ElementRegistry`] and signals the
//! surface once per batch, so a batch is never shown half-applied.
//!
//! # Batch Application
//!
//! 1. Take the registry write lock
//! 2. Apply every event in order (later events for a key win)
//! 3. Downgrade to a read lock and [`commit`](DisplaySurface::commit) the result
//!
//! Readers of the registry therefore see either the state before the batch
//! or the state after it.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use tracing::{debug, trace, warn};

use crate::protocol::{DisplayBatch, DisplayEvent};

use super::registry::ElementRegistry;
use super::surface::DisplaySurface;

// ============================================================================
// Constants
// ============================================================================

/// One display frame at 60 Hz.
pub const DEFAULT_FRAME_BUDGET: Duration = Duration::from_millis(16);

// ============================================================================
// Types
// ============================================================================

/// Registry shared between the event loop and the host.
pub type SharedRegistry = Arc<RwLock<ElementRegistry>>;

/// Surface shared between the event loop and the host.
pub type SharedSurface = Arc<Mutex<dyn DisplaySurface>>;

// ============================================================================
// SyncResult
// ============================================================================

/// Outcome of applying one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Events that matched a registered element.
    pub applied: usize,
    /// Events without a key or with an unregistered key.
    pub skipped: usize,
}

impl SyncResult {
    /// Returns the number of events looked at.
    #[inline]
    #[must_use]
    pub const fn total(&self) -> usize {
        self.applied + self.skipped
    }
}

// ============================================================================
// DisplaySynchronizer
// ============================================================================

/// Applies display batches to the registry and surface.
pub struct DisplaySynchronizer {
    registry: SharedRegistry,
    surface: SharedSurface,
    frame_budget: Duration,
    stage_revealed: bool,
}

impl DisplaySynchronizer {
    /// Creates a synchronizer over a registry and surface.
    #[must_use]
    pub fn new(registry: SharedRegistry, surface: SharedSurface) -> Self {
        Self {
            registry,
            surface,
            frame_budget: DEFAULT_FRAME_BUDGET,
            stage_revealed: false,
        }
    }

    /// Sets the advisory latency budget.
    #[inline]
    #[must_use]
    pub fn with_frame_budget(mut self, budget: Duration) -> Self {
        self.frame_budget = budget;
        self
    }

    /// Returns the advisory latency budget.
    #[inline]
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        self.frame_budget
    }

    /// Applies `events` as one visual update.
    pub fn apply(&mut self, events: &[DisplayEvent]) -> SyncResult {
        if !self.stage_revealed {
            self.surface.lock().reveal_stage();
            self.stage_revealed = true;
        }

        let mut registry = self.registry.write();
        let result = Self::apply_locked(&mut registry, events);

        let registry = RwLockWriteGuard::downgrade(registry);
        self.surface.lock().commit(&registry);

        result
    }

    /// Applies a received batch and checks the latency budget.
    ///
    /// `received_at` is when the frame carrying the batch arrived.
    pub fn apply_batch(&mut self, batch: &DisplayBatch, received_at: Instant) -> SyncResult {
        if let Some(announced) = batch.total_events
            && announced != batch.len() as u64
        {
            debug!(announced, actual = batch.len(), "Batch size differs from total_events");
        }

        let result = self.apply(&batch.events);
        let elapsed = received_at.elapsed();

        if elapsed > self.frame_budget {
            warn!(
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = self.frame_budget.as_millis() as u64,
                events = batch.len(),
                "Batch exceeded frame budget"
            );
        }

        debug!(
            applied = result.applied,
            skipped = result.skipped,
            elapsed_us = elapsed.as_micros() as u64,
            "Batch applied"
        );

        result
    }

    fn apply_locked(registry: &mut ElementRegistry, events: &[DisplayEvent]) -> SyncResult {
        let mut result = SyncResult::default();

        for event in events {
            let Some(key) = event.key.as_deref().filter(|k| !k.is_empty()) else {
                trace!("Skipping display event without key");
                result.skipped += 1;
                continue;
            };

            if registry.set_visible(key, event.visible) {
                trace!(key, visible = event.visible, "Display event applied");
                result.applied += 1;
            } else {
                trace!(key, "Skipping display event for unknown key");
                result.skipped += 1;
            }
        }

        result
    }
}

// ============================================================================
// Tests
// ============================================================================
