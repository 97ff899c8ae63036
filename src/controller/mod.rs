//! Controller factory and configuration.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | Fluent controller construction |
//! | `core` | Controller lifecycle and accessors |
//! | `options` | Configuration values |

// ============================================================================
// Submodules
// ============================================================================

/// Builder pattern for controller configuration.
pub mod builder;

/// Controller implementation.
pub mod core;

/// Controller configuration.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ControllerBuilder;
pub use self::core::Controller;
pub use options::ControllerOptions;
