//! Lifecycle events broadcast to subscribers.
//!
//! # Event Types
//!
//! | Event | When |
//! |-------|------|
//! | `connected` | The worker opened a device |
//! | `disconnected` | The worker released a device it held |
//! | `sendFailed` | A control transfer failed; always followed by `disconnected` |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::error::Error;

use super::device::DeviceKind;

// ============================================================================
// Event
// ============================================================================

/// A connection lifecycle notification.
///
/// # Format
///
/// ```json
/// { "event": "connected", "device": "standard" }
/// { "event": "disconnected" }
/// { "event": "sendFailed", "error": { "kind": "requestFailed", "code": 5, "message": "..." } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    /// A device was opened.
    Connected {
        /// Which kind answered.
        device: DeviceKind,
    },

    /// A held device was released.
    Disconnected,

    /// A send failed. The connection is torn down next.
    SendFailed {
        /// The transport error.
        error: Error,
    },
}

impl Event {
    /// Returns the event name as it appears on the wire.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected => "disconnected",
            Self::SendFailed { .. } => "sendFailed",
        }
    }

    /// Returns `true` if a one-shot caller should treat this as failure.
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Disconnected | Self::SendFailed { .. })
    }

    /// Returns the wrapped error for `SendFailed`.
    #[inline]
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::SendFailed { error } => Some(error),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let connected = Event::Connected {
            device: DeviceKind::Standard,
        };
        assert_eq!(connected.name(), "connected");
        assert_eq!(Event::Disconnected.name(), "disconnected");
    }

    #[test]
    fn test_is_failure() {
        let failed = Event::SendFailed {
            error: Error::not_connected(),
        };
        assert!(failed.is_failure());
        assert!(Event::Disconnected.is_failure());
        assert!(
            !Event::Connected {
                device: DeviceKind::Compact
            }
            .is_failure()
        );
        assert_eq!(failed.error(), Some(&Error::NotConnected));
    }

    #[test]
    fn test_serialize_tagged() {
        let value = serde_json::to_value(Event::Connected {
            device: DeviceKind::Compact,
        })
        .unwrap();
        assert_eq!(value["event"], "connected");
        assert_eq!(value["device"], "compact");

        let value = serde_json::to_value(Event::SendFailed {
            error: Error::not_connected(),
        })
        .unwrap();
        assert_eq!(value["event"], "sendFailed");
        assert_eq!(value["error"]["kind"], "notConnected");
    }
}
