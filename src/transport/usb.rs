//! USB control-transfer transport.
//!
//! Uses `nusb` to find the hub on the bus, claim interface 0, and send
//! one vendor control-out transfer per command. The command byte travels
//! in `bRequest` and the interval in `wValue`.

// ============================================================================
// Imports
// ============================================================================

use std::io;

use async_trait::async_trait;
use nusb::transfer::{ControlOut, ControlType, Recipient};
use nusb::{Device, Interface};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::protocol::{DeviceKind, Selector};

use super::Transport;

// ============================================================================
// Constants
// ============================================================================

/// Interface carrying the vendor control endpoint.
const CONTROL_INTERFACE: u8 = 0;

// ============================================================================
// UsbHandle
// ============================================================================

/// An open hub.
pub struct UsbHandle {
    /// Kept alive for the lifetime of the interface claim.
    _device: Device,
    /// Claimed control interface.
    interface: Interface,
    /// Which kind answered.
    kind: DeviceKind,
    /// Set once a transfer fails.
    stale: bool,
}

impl std::fmt::Debug for UsbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsbHandle")
            .field("kind", &self.kind)
            .field("stale", &self.stale)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// UsbTransport
// ============================================================================

/// [`Transport`] over the host USB stack.
#[derive(Debug, Default, Clone, Copy)]
pub struct UsbTransport;

impl UsbTransport {
    /// Creates a USB transport.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Maps an open/claim error to [`Error::ConnectionFailed`].
fn open_error(kind: DeviceKind, err: &io::Error) -> Error {
    Error::connection_failed(err.raw_os_error(), format!("{kind}: {err}"))
}

#[async_trait]
impl Transport for UsbTransport {
    type Handle = UsbHandle;

    async fn connect(&self, selector: Selector) -> Result<UsbHandle> {
        let devices: Vec<_> = nusb::list_devices()
            .map_err(|e| Error::connection_failed(e.raw_os_error(), e.to_string()))?
            .collect();

        let (kind, info) = selector
            .candidates()
            .iter()
            .find_map(|kind| {
                devices
                    .iter()
                    .find(|d| kind.matches(d.vendor_id(), d.product_id()))
                    .map(|d| (*kind, d))
            })
            .ok_or_else(Error::not_found)?;

        debug!(%kind, bus = info.bus_number(), address = info.device_address(), "Opening hub");

        let device = info.open().map_err(|e| open_error(kind, &e))?;
        let interface = device
            .claim_interface(CONTROL_INTERFACE)
            .map_err(|e| open_error(kind, &e))?;

        Ok(UsbHandle {
            _device: device,
            interface,
            kind,
            stale: false,
        })
    }

    async fn send(&self, handle: &mut UsbHandle, command: u8, interval_ms: u16) -> Result<()> {
        if handle.stale {
            return Err(Error::not_connected());
        }

        let completion = handle
            .interface
            .control_out(ControlOut {
                control_type: ControlType::Vendor,
                recipient: Recipient::Device,
                request: command,
                value: interval_ms,
                index: 0,
                data: &[],
            })
            .await;

        if let Err(e) = completion.into_result() {
            warn!(kind = %handle.kind, error = %e, "Control transfer failed");
            handle.stale = true;
            return Err(Error::request_failed(None, e.to_string()));
        }
        Ok(())
    }

    async fn disconnect(&self, handle: UsbHandle) {
        debug!(kind = %handle.kind, "Releasing hub");
        drop(handle);
    }

    fn is_connected(&self, handle: &UsbHandle) -> bool {
        !handle.stale
    }

    fn device_kind(&self, handle: &UsbHandle) -> DeviceKind {
        handle.kind
    }
}
