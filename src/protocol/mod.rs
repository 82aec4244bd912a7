//! Value types exchanged with the coordinator.
//!
//! # Overview
//!
//! | Type | Direction | Purpose |
//! |------|-----------|---------|
//! | [`Command`] | Caller → Device | One control byte plus interval |
//! | [`Event`] | Worker → Subscribers | Connection lifecycle |
//! | [`Selector`] | Caller → Transport | Which device to open |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Gesture table and commands |
//! | `device` | Device identities and selectors |
//! | `event` | Lifecycle events |

// ============================================================================
// Submodules
// ============================================================================

/// Gesture table and command values.
pub mod command;

/// Device identities and selection.
pub mod device;

/// Lifecycle events.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, CommandAction, Gesture};
pub use device::{DeviceKind, Selector};
pub use event::Event;
