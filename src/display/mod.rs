//! Overlay display state.
//!
//! # Architecture
//!
//! ```text
//! ButtonCatalog ──build──► ElementRegistry ◄──apply── DisplaySynchronizer
//!                               │                            │
//!                               └──────── DisplaySurface ◄───┘
//!                                   (mount, commit, indicator)
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `catalog` | Button descriptors supplied at startup |
//! | `registry` | Key-addressed overlay elements |
//! | `surface` | Rendering backend trait |
//! | `sync` | Atomic batch application |

// ============================================================================
// Submodules
// ============================================================================

/// Button descriptors.
pub mod catalog;

/// Key-addressed overlay elements.
pub mod registry;

/// Rendering backend trait and headless implementation.
pub mod surface;

/// Batch application.
pub mod sync;

// ============================================================================
// Re-exports
// ============================================================================

pub use catalog::{ButtonCatalog, ButtonDescriptor};
pub use registry::{DisplayState, ElementHandle, ElementRegistry, Layer};
pub use surface::{DisplaySurface, HeadlessSurface, LinkStatus};
pub use sync::{DEFAULT_FRAME_BUDGET, DisplaySynchronizer, SharedRegistry, SharedSurface, SyncResult};
