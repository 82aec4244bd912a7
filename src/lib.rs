//! armhub - Command and event coordination for motorized-arm USB hubs.
//!
//! This library drives a small USB novelty hub whose arms move in
//! response to single-byte vendor commands, and reports connection
//! lifecycle to any number of observers.
//!
//! # Architecture
//!
//! The engine is a single serialized worker:
//!
//! - **Commands**: fire-and-forget into a bounded queue that keeps the newest
//! - **Worker**: one task per run; connects lazily, sends, tears down on failure
//! - **Events**: `connected`, `disconnected`, `sendFailed`, fanned out to every subscriber
//!
//! Key design principles:
//!
//! - One lock guards all shared state; it is never held across an `.await`
//! - Transport failures become events, never returned errors
//! - The device handle never leaves the worker
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use armhub::{Coordinator, Event, Gesture, MockTransport, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let coordinator = Coordinator::builder(MockTransport::new())
//!         .capacity(3)
//!         .build()?;
//!
//!     let mut events = coordinator.subscribe();
//!     coordinator.start();
//!
//!     coordinator.submit_gesture(Gesture::Wave, Duration::from_millis(50));
//!     coordinator.stop_graceful().await;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{}", event.name());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`coordinator`] | [`Coordinator`], queue, worker, subscribers |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | [`Command`], [`Gesture`], [`Event`], [`Selector`] |
//! | [`transport`] | [`Transport`] trait and implementations |
//!
//! # Features
//!
//! - **`usb`**: real hardware backend ([`transport::UsbTransport`]) over `nusb`

// ============================================================================
// Modules
// ============================================================================

/// Command/event coordination engine.
///
/// - [`Coordinator`] - Public entry point
/// - [`CommandChannel`] - Drop-oldest command queue
/// - [`EventSource`] - Per-subscriber event stream
pub mod coordinator;

/// Error types and result aliases.
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Commands, device identities, and events.
pub mod protocol;

/// Device transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Coordinator types
pub use coordinator::{
    Admission, CommandChannel, Coordinator, CoordinatorBuilder, CoordinatorOptions, EventSource,
};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::{Epoch, SubscriberId};

// Protocol types
pub use protocol::{Command, CommandAction, DeviceKind, Event, Gesture, Selector};

// Transport types
pub use transport::{MockTransport, Transport};
