//! Device transport layer.
//!
//! The coordinator never touches hardware directly. It drives a
//! [`Transport`] implementation through four calls and owns the
//! resulting handle for as long as the device stays connected.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐                       ┌─────────────────┐
//! │  Worker (Rust)   │     connect/send      │  Transport      │
//! │                  │──────────────────────►│                 │
//! │  owns Handle     │◄──────────────────────│  MockTransport  │
//! │                  │     Ok / Error        │  UsbTransport   │
//! └──────────────────┘                       └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `mock` | Scripted in-memory transport for tests |
//! | `usb` | `nusb` control-transfer backend (feature `usb`) |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{DeviceKind, Selector};

// ============================================================================
// Submodules
// ============================================================================

/// Scripted in-memory transport.
pub mod mock;

/// USB control-transfer transport.
#[cfg(feature = "usb")]
pub mod usb;

// ============================================================================
// Re-exports
// ============================================================================

pub use mock::{MockHandle, MockTransport, SentCommand};
#[cfg(feature = "usb")]
pub use usb::{UsbHandle, UsbTransport};

// ============================================================================
// Transport
// ============================================================================

/// Connection to the physical device.
///
/// Implementations are shared with the worker task, so they must be
/// `Send + Sync`. The [`Handle`](Transport::Handle) is moved into the
/// worker and never leaves it.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Ownership token for one open session.
    type Handle: Send + 'static;

    /// Opens a device matching `selector`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`](crate::Error::NotFound) if no matching device is present
    /// - [`Error::ConnectionFailed`](crate::Error::ConnectionFailed) if opening failed
    async fn connect(&self, selector: Selector) -> Result<Self::Handle>;

    /// Sends one control byte with a timing interval.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`](crate::Error::NotConnected) if the handle is stale
    /// - [`Error::RequestFailed`](crate::Error::RequestFailed) on transfer failure
    async fn send(&self, handle: &mut Self::Handle, command: u8, interval_ms: u16) -> Result<()>;

    /// Releases the handle. Best-effort and idempotent.
    async fn disconnect(&self, handle: Self::Handle);

    /// Returns `true` if the handle still refers to an open device.
    fn is_connected(&self, handle: &Self::Handle) -> bool;

    /// Returns which kind of device the handle refers to.
    fn device_kind(&self, handle: &Self::Handle) -> DeviceKind;
}
