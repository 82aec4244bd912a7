//! Scripted in-memory transport.
//!
//! [`MockTransport`] stands in for the hub in tests. Clones share state,
//! so a test can keep one clone for scripting and inspection while the
//! coordinator owns another.
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.fail_next_connect(Error::not_found());
//! transport.fail_send_attempt(1, Error::request_failed(Some(5), "stall"));
//!
//! let coordinator = Coordinator::new(transport.clone());
//! // ...
//! assert_eq!(transport.connect_attempts(), 2);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::protocol::{DeviceKind, Selector};

use super::Transport;

// ============================================================================
// Types
// ============================================================================

/// Handle returned by [`MockTransport::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockHandle {
    /// Session number, unique per connect.
    pub id: u64,
    /// Which kind answered.
    pub kind: DeviceKind,
}

/// One successfully delivered command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentCommand {
    /// Control byte.
    pub byte: u8,
    /// Interval in milliseconds.
    pub interval_ms: u16,
    /// Session it was sent on.
    pub session: u64,
}

/// Shared mock state.
#[derive(Debug)]
struct MockState {
    /// Devices currently plugged in.
    present: Vec<DeviceKind>,
    /// Errors returned by upcoming connects, in order.
    connect_failures: VecDeque<Error>,
    /// Errors keyed by zero-based send attempt index.
    send_failures: FxHashMap<usize, Error>,
    /// Delay applied to every send.
    send_delay: Option<Duration>,
    /// Session currently open, if any.
    live: Option<u64>,
    /// Next session number.
    next_session: u64,
    /// Total connect calls.
    connect_attempts: usize,
    /// Total send calls.
    send_attempts: usize,
    /// Total disconnect calls.
    disconnects: usize,
    /// Delivered commands.
    sent: Vec<SentCommand>,
}

// ============================================================================
// MockTransport
// ============================================================================

/// In-memory [`Transport`] with scripted failures.
///
/// By default a single [`DeviceKind::Standard`] hub is present and
/// every call succeeds.
#[derive(Debug, Clone)]
pub struct MockTransport {
    /// State shared between clones.
    state: Arc<Mutex<MockState>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MockTransport - Constructor
// ============================================================================

impl MockTransport {
    /// Creates a mock with one standard hub plugged in.
    #[must_use]
    pub fn new() -> Self {
        Self::with_devices([DeviceKind::Standard])
    }

    /// Creates a mock with the given devices plugged in.
    #[must_use]
    pub fn with_devices(devices: impl IntoIterator<Item = DeviceKind>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                present: devices.into_iter().collect(),
                connect_failures: VecDeque::new(),
                send_failures: FxHashMap::default(),
                send_delay: None,
                live: None,
                next_session: 1,
                connect_attempts: 0,
                send_attempts: 0,
                disconnects: 0,
                sent: Vec::new(),
            })),
        }
    }
}

// ============================================================================
// MockTransport - Scripting
// ============================================================================

impl MockTransport {
    /// Makes the next connect that is not already scripted fail with `error`.
    pub fn fail_next_connect(&self, error: Error) {
        self.state.lock().connect_failures.push_back(error);
    }

    /// Makes the send attempt at zero-based `index` fail with `error`.
    pub fn fail_send_attempt(&self, index: usize, error: Error) {
        self.state.lock().send_failures.insert(index, error);
    }

    /// Delays every send by `delay`.
    pub fn set_send_delay(&self, delay: Duration) {
        self.state.lock().send_delay = Some(delay);
    }

    /// Plugs a device in.
    pub fn plug(&self, kind: DeviceKind) {
        let mut state = self.state.lock();
        if !state.present.contains(&kind) {
            state.present.push(kind);
        }
    }

    /// Removes every device and invalidates the open session.
    pub fn unplug(&self) {
        let mut state = self.state.lock();
        state.present.clear();
        state.live = None;
    }
}

// ============================================================================
// MockTransport - Inspection
// ============================================================================

impl MockTransport {
    /// Returns every delivered command, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentCommand> {
        self.state.lock().sent.clone()
    }

    /// Returns the bytes of every delivered command, in order.
    #[must_use]
    pub fn sent_bytes(&self) -> Vec<u8> {
        self.state.lock().sent.iter().map(|s| s.byte).collect()
    }

    /// Returns the number of connect calls.
    #[must_use]
    pub fn connect_attempts(&self) -> usize {
        self.state.lock().connect_attempts
    }

    /// Returns the number of send calls, failed ones included.
    #[must_use]
    pub fn send_attempts(&self) -> usize {
        self.state.lock().send_attempts
    }

    /// Returns the number of disconnect calls.
    #[must_use]
    pub fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }

    /// Returns `true` if a session is currently open.
    #[must_use]
    pub fn has_live_session(&self) -> bool {
        self.state.lock().live.is_some()
    }
}

// ============================================================================
// MockTransport - Transport
// ============================================================================

#[async_trait]
impl Transport for MockTransport {
    type Handle = MockHandle;

    async fn connect(&self, selector: Selector) -> Result<MockHandle> {
        let mut state = self.state.lock();
        state.connect_attempts += 1;

        if let Some(error) = state.connect_failures.pop_front() {
            return Err(error);
        }

        let kind = selector
            .candidates()
            .iter()
            .copied()
            .find(|kind| state.present.contains(kind))
            .ok_or_else(Error::not_found)?;

        let id = state.next_session;
        state.next_session += 1;
        state.live = Some(id);

        trace!(session = id, %kind, "Mock connected");
        Ok(MockHandle { id, kind })
    }

    async fn send(&self, handle: &mut MockHandle, command: u8, interval_ms: u16) -> Result<()> {
        let delay = self.state.lock().send_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        let attempt = state.send_attempts;
        state.send_attempts += 1;

        if state.live != Some(handle.id) {
            return Err(Error::not_connected());
        }
        if let Some(error) = state.send_failures.remove(&attempt) {
            return Err(error);
        }

        state.sent.push(SentCommand {
            byte: command,
            interval_ms,
            session: handle.id,
        });
        Ok(())
    }

    async fn disconnect(&self, handle: MockHandle) {
        let mut state = self.state.lock();
        state.disconnects += 1;
        if state.live == Some(handle.id) {
            state.live = None;
        }
    }

    fn is_connected(&self, handle: &MockHandle) -> bool {
        self.state.lock().live == Some(handle.id)
    }

    fn device_kind(&self, handle: &MockHandle) -> DeviceKind {
        handle.kind
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_and_send() {
        let transport = MockTransport::new();
        let mut handle = transport.connect(Selector::Auto).await.unwrap();
        assert_eq!(handle.kind, DeviceKind::Standard);
        assert!(transport.is_connected(&handle));

        transport.send(&mut handle, 0x05, 20).await.unwrap();
        assert_eq!(
            transport.sent(),
            vec![SentCommand {
                byte: 0x05,
                interval_ms: 20,
                session: handle.id
            }]
        );
    }

    #[tokio::test]
    async fn test_explicit_selector_not_present() {
        let transport = MockTransport::new();
        let err = transport
            .connect(Selector::Explicit(DeviceKind::Compact))
            .await
            .unwrap_err();
        assert_eq!(err, Error::NotFound);
    }

    #[tokio::test]
    async fn test_auto_prefers_probe_order() {
        let transport = MockTransport::with_devices([DeviceKind::Compact, DeviceKind::Standard]);
        let handle = transport.connect(Selector::Auto).await.unwrap();
        assert_eq!(transport.device_kind(&handle), DeviceKind::Standard);
    }

    #[tokio::test]
    async fn test_scripted_failures() {
        let transport = MockTransport::new();
        transport.fail_next_connect(Error::connection_failed(Some(16), "busy"));
        transport.fail_send_attempt(0, Error::request_failed(None, "stall"));

        assert!(transport.connect(Selector::Auto).await.is_err());
        let mut handle = transport.connect(Selector::Auto).await.unwrap();
        assert!(transport.send(&mut handle, 1, 0).await.is_err());
        assert!(transport.send(&mut handle, 1, 0).await.is_ok());
        assert_eq!(transport.connect_attempts(), 2);
        assert_eq!(transport.send_attempts(), 2);
    }

    #[tokio::test]
    async fn test_unplug_stales_handle() {
        let transport = MockTransport::new();
        let mut handle = transport.connect(Selector::Auto).await.unwrap();
        transport.unplug();

        assert!(!transport.is_connected(&handle));
        let err = transport.send(&mut handle, 1, 0).await.unwrap_err();
        assert_eq!(err, Error::NotConnected);
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let transport = MockTransport::new();
        let handle = transport.connect(Selector::Auto).await.unwrap();
        transport.disconnect(handle).await;
        transport.disconnect(handle).await;
        assert!(!transport.has_live_session());
        assert_eq!(transport.disconnects(), 2);
    }
}
