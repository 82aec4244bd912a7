//! Command/event coordination engine.
//!
//! The [`Coordinator`] owns one piece of mutable state behind a single
//! lock: the current command channel, the current worker, and the
//! subscriber registry. Every public operation is a short critical
//! section on that lock. The lock is never held across an `.await`.
//!
//! # Architecture
//!
//! ```text
//!  submit ──► CommandChannel (N, drop-oldest) ──► Worker ──► Transport
//!                                                   │
//!                                                   ▼ broadcast
//!  subscribe ◄── EventSource ◄── SubscriberRegistry ┘
//! ```
//!
//! # Lifecycle
//!
//! 1. `start` - replace any previous run with a fresh channel and worker
//! 2. `submit` - fire-and-forget; a no-op while stopped
//! 3. `stop_now` - cancel, discard buffered commands, return at once
//! 4. `stop_graceful` - close intake, wait for drain and teardown
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `builder` | [`CoordinatorBuilder`] |
//! | `channel` | [`CommandChannel`] drop-oldest queue |
//! | `options` | [`CoordinatorOptions`] |
//! | `registry` | Subscriber registry and [`EventSource`] |
//! | `worker` | The serialized device worker |

// ============================================================================
// Submodules
// ============================================================================

/// Builder for coordinator configuration.
pub mod builder;

/// Bounded drop-oldest command queue.
pub mod channel;

/// Coordinator options.
pub mod options;

/// Subscriber registry and event sources.
pub mod registry;

/// The serialized device worker.
mod worker;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CoordinatorBuilder;
pub use channel::{Admission, CommandChannel, DEFAULT_CAPACITY};
pub use options::CoordinatorOptions;
pub use registry::EventSource;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::identifiers::Epoch;
use crate::protocol::{Command, Gesture};
use crate::transport::Transport;

use registry::SubscriberRegistry;
use worker::Worker;

// ============================================================================
// CoordinatorState
// ============================================================================

/// Handle to the running worker task.
#[derive(Debug)]
struct WorkerHandle {
    /// Spawned task.
    task: JoinHandle<()>,
    /// Cooperative cancellation for the task.
    cancel: CancellationToken,
    /// Generation the task was started in.
    epoch: Epoch,
}

/// Completion signal of one worker run.
///
/// Set once the run has released the device and finished its cleanup.
/// Any number of tasks may wait on it, before or after it is set.
#[derive(Debug, Clone)]
pub(crate) struct RunDone(watch::Receiver<bool>);

impl RunDone {
    /// Creates a signal and the sender the worker sets on exit.
    fn new() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self(rx))
    }

    /// Waits until the run has completed.
    ///
    /// Returns `false` if the worker went away without completing.
    pub(crate) async fn wait(&self) -> bool {
        let mut rx = self.0.clone();
        rx.wait_for(|done| *done).await.is_ok()
    }
}

/// Mutable state shared by the coordinator and its worker.
///
/// Only ever accessed under the one state lock.
#[derive(Debug, Default)]
pub(crate) struct CoordinatorState {
    /// Channel of the current run.
    channel: Option<Arc<CommandChannel>>,
    /// Current worker.
    worker: Option<WorkerHandle>,
    /// Subscribers. Persist across runs.
    pub(crate) subscribers: SubscriberRegistry,
    /// Generation of the most recent `start`.
    pub(crate) epoch: Epoch,
    /// Completion of the most recent run. Kept after the worker detaches.
    last_run: Option<RunDone>,
}

impl CoordinatorState {
    /// Closes the channel and detaches the worker, cancelling it if asked.
    ///
    /// Returns the detached worker.
    fn detach(&mut self, cancel: bool) -> Option<WorkerHandle> {
        if let Some(channel) = self.channel.take() {
            channel.close();
            if cancel {
                let discarded = channel.clear();
                if discarded > 0 {
                    debug!(discarded, "Discarded buffered commands");
                }
            }
        }

        let worker = self.worker.take();
        if cancel && let Some(worker) = &worker {
            worker.cancel.cancel();
        }
        worker
    }
}

// ============================================================================
// Coordinator
// ============================================================================

/// Shared coordinator internals.
struct CoordinatorInner<T: Transport> {
    /// Device transport, shared with each worker.
    transport: Arc<T>,
    /// Applied to every run.
    options: CoordinatorOptions,
    /// The one lock.
    state: Arc<Mutex<CoordinatorState>>,
}

/// Drives a hub through a single serialized worker.
///
/// Cheap to clone; clones share the same worker and subscribers.
///
/// # Thread Safety
///
/// All methods may be called concurrently from any task. `start` must be
/// called from within a Tokio runtime.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use armhub::{Coordinator, Event, Gesture, MockTransport};
///
/// let coordinator = Coordinator::new(MockTransport::new());
/// let mut events = coordinator.subscribe();
///
/// coordinator.start();
/// coordinator.submit_gesture(Gesture::Wave, Duration::from_millis(50));
/// coordinator.stop_graceful().await;
///
/// assert!(matches!(events.recv().await, Some(Event::Connected { .. })));
/// ```
pub struct Coordinator<T: Transport> {
    /// Shared inner state.
    inner: Arc<CoordinatorInner<T>>,
}

impl<T: Transport> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> fmt::Debug for Coordinator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("Coordinator")
            .field("options", &self.inner.options)
            .field("epoch", &state.epoch)
            .field("running", &state.worker.is_some())
            .field("subscribers", &state.subscribers.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Coordinator - Constructor
// ============================================================================

impl<T: Transport> Coordinator<T> {
    /// Creates an idle coordinator with default options.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, CoordinatorOptions::new())
    }

    /// Creates a builder for custom options.
    #[inline]
    #[must_use]
    pub fn builder(transport: T) -> CoordinatorBuilder<T> {
        CoordinatorBuilder::new(transport)
    }

    /// Creates an idle coordinator. Options are assumed validated.
    pub(crate) fn with_options(transport: T, options: CoordinatorOptions) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                transport: Arc::new(transport),
                options,
                state: Arc::new(Mutex::new(CoordinatorState::default())),
            }),
        }
    }
}

// ============================================================================
// Coordinator - Accessors
// ============================================================================

impl<T: Transport> Coordinator<T> {
    /// Returns the options applied to each run.
    #[inline]
    #[must_use]
    pub fn options(&self) -> CoordinatorOptions {
        self.inner.options
    }

    /// Returns the transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    /// Returns `true` while a worker is attached.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .state
            .lock()
            .worker
            .as_ref()
            .is_some_and(|w| !w.task.is_finished())
    }

    /// Returns the number of buffered commands.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner
            .state
            .lock()
            .channel
            .as_ref()
            .map_or(0, |c| c.len())
    }

    /// Returns the number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }
}

// ============================================================================
// Coordinator - Lifecycle
// ============================================================================

impl<T: Transport> Coordinator<T> {
    /// Starts a fresh run, superseding any previous one.
    ///
    /// The previous worker is cancelled and its channel closed. The new
    /// worker buffers commands but touches the device only after the
    /// previous run has released it.
    ///
    /// Ignored, with a warning, outside a Tokio runtime.
    pub fn start(&self) {
        let Ok(runtime) = Handle::try_current() else {
            warn!("Start requested outside a Tokio runtime, ignored");
            return;
        };

        let mut state = self.inner.state.lock();

        if let Some(previous) = state.detach(true) {
            debug!(epoch = %previous.epoch, "Superseding previous worker");
        }

        let epoch = state.epoch.next();
        let channel = Arc::new(CommandChannel::new(self.inner.options.capacity));
        let cancel = CancellationToken::new();
        let (done, run_done) = RunDone::new();

        let worker = Worker {
            transport: Arc::clone(&self.inner.transport),
            channel: Arc::clone(&channel),
            state: Arc::clone(&self.inner.state),
            cancel: cancel.clone(),
            selector: self.inner.options.selector,
            epoch,
            predecessor: state.last_run.replace(run_done),
            done,
        };
        let task = runtime.spawn(worker.run());

        state.epoch = epoch;
        state.channel = Some(channel);
        state.worker = Some(WorkerHandle {
            task,
            cancel,
            epoch,
        });

        info!(%epoch, capacity = self.inner.options.capacity, "Coordinator started");
    }

    /// Stops immediately.
    ///
    /// Buffered commands are discarded. Returns once cancellation is
    /// requested; the worker releases the device in the background.
    pub fn stop_now(&self) {
        let detached = self.inner.state.lock().detach(true);
        if let Some(worker) = detached {
            info!(epoch = %worker.epoch, "Coordinator stopping now");
        }
    }

    /// Stops after every accepted command has been attempted.
    ///
    /// Closes intake, then waits until the worker has drained the channel
    /// and released the device, and every event source is finished.
    ///
    /// Concurrent callers all wait for the same run.
    pub async fn stop_graceful(&self) {
        let last_run = {
            let mut state = self.inner.state.lock();
            if let Some(worker) = state.detach(false) {
                info!(epoch = %worker.epoch, "Coordinator draining");
            }
            state.last_run.clone()
        };

        let Some(last_run) = last_run else {
            return;
        };
        if !last_run.wait().await {
            warn!("Worker exited without completing cleanup");
        }
    }
}

// ============================================================================
// Coordinator - Commands & Events
// ============================================================================

impl<T: Transport> Coordinator<T> {
    /// Queues a command. Never blocks, never fails.
    ///
    /// Silently dropped while no run is active.
    pub fn submit(&self, command: Command) {
        let channel = self.inner.state.lock().channel.clone();
        match channel {
            Some(channel) => {
                channel.push(command);
            }
            None => trace!(%command, "Not running, command dropped"),
        }
    }

    /// Queues a named gesture.
    pub fn submit_gesture(&self, gesture: Gesture, interval: Duration) {
        self.submit(Command::gesture(gesture).with_interval(interval));
    }

    /// Queues a raw vendor byte.
    pub fn submit_raw(&self, byte: u8, interval: Duration) {
        self.submit(Command::raw(byte).with_interval(interval));
    }

    /// Registers a new, independent event source.
    ///
    /// The source sees only events broadcast after this call.
    #[must_use]
    pub fn subscribe(&self) -> EventSource {
        let (id, receiver) = self.inner.state.lock().subscribers.register();
        debug!(subscriber = %id, "Subscriber registered");
        EventSource::new(id, receiver, Arc::downgrade(&self.inner.state))
    }
}

// ============================================================================
// Drop
// ============================================================================

impl<T: Transport> Drop for CoordinatorInner<T> {
    fn drop(&mut self) {
        // The worker holds the state, so it would otherwise wait forever.
        if self.state.lock().detach(true).is_some() {
            debug!("Coordinator dropped, worker cancelled");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::{DeviceKind, Event};
    use crate::transport::MockTransport;

    fn current(coordinator: &Coordinator<MockTransport>) -> (Arc<CommandChannel>, CancellationToken) {
        let state = coordinator.inner.state.lock();
        let channel = state.channel.clone().expect("channel");
        let cancel = state.worker.as_ref().expect("worker").cancel.clone();
        (channel, cancel)
    }

    #[test]
    fn test_coordinator_is_clone_and_debug() {
        fn assert_clone<T: Clone>() {}
        fn assert_debug<T: std::fmt::Debug>() {}
        assert_clone::<Coordinator<MockTransport>>();
        assert_debug::<Coordinator<MockTransport>>();
    }

    #[test]
    fn test_submit_before_start_is_noop() {
        let transport = MockTransport::new();
        let coordinator = Coordinator::new(transport.clone());

        coordinator.submit_gesture(Gesture::Left, Duration::ZERO);
        coordinator.submit_raw(0x10, Duration::from_millis(5));

        assert_eq!(coordinator.pending(), 0);
        assert!(!coordinator.is_running());
        assert_eq!(transport.connect_attempts(), 0);
    }

    #[test]
    fn test_start_outside_runtime_is_noop() {
        let transport = MockTransport::new();
        let coordinator = Coordinator::new(transport.clone());

        coordinator.start();
        coordinator.submit(Command::raw(1));

        assert!(!coordinator.is_running());
        assert_eq!(coordinator.pending(), 0);
        assert_eq!(coordinator.inner.state.lock().epoch.as_u64(), 0);
    }

    #[tokio::test]
    async fn test_stop_graceful_completes_superseded_run() {
        let coordinator = Coordinator::new(MockTransport::new());

        coordinator.start();
        let first = coordinator.inner.state.lock().last_run.clone().expect("run");
        coordinator.start();
        let second = coordinator.inner.state.lock().last_run.clone().expect("run");

        coordinator.stop_graceful().await;
        assert!(second.wait().await);
        assert!(first.wait().await);
    }

    #[tokio::test]
    async fn test_start_twice_supersedes() {
        let coordinator = Coordinator::new(MockTransport::new());

        coordinator.start();
        let (first_channel, first_cancel) = current(&coordinator);
        coordinator.start();
        let (second_channel, second_cancel) = current(&coordinator);

        assert!(!Arc::ptr_eq(&first_channel, &second_channel));
        assert!(first_channel.is_closed());
        assert!(first_cancel.is_cancelled());
        assert!(!second_channel.is_closed());
        assert!(!second_cancel.is_cancelled());
        assert_eq!(coordinator.inner.state.lock().epoch.as_u64(), 2);

        coordinator.stop_graceful().await;
    }

    #[tokio::test]
    async fn test_stop_now_discards_buffered() {
        let transport = MockTransport::new();
        let coordinator = Coordinator::new(transport.clone());
        let mut events = coordinator.subscribe();

        coordinator.start();
        coordinator.submit(Command::raw(1));
        coordinator.submit(Command::raw(2));
        coordinator.stop_now();

        assert!(!coordinator.is_running());
        assert_eq!(coordinator.pending(), 0);

        // Source ends once the worker has cleaned up.
        assert_eq!(events.recv().await, None);
        assert!(transport.sent().is_empty());
        assert_eq!(transport.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_stop_graceful_drains() {
        let transport = MockTransport::new();
        let coordinator = Coordinator::new(transport.clone());
        let mut events = coordinator.subscribe();

        coordinator.start();
        coordinator.submit_gesture(Gesture::Left, Duration::ZERO);
        coordinator.submit_gesture(Gesture::Right, Duration::from_millis(30));
        coordinator.stop_graceful().await;

        assert_eq!(transport.sent_bytes(), vec![0x01, 0x02]);
        assert_eq!(transport.sent()[1].interval_ms, 30);
        assert!(!transport.has_live_session());

        assert_eq!(
            events.recv().await,
            Some(Event::Connected {
                device: DeviceKind::Standard
            })
        );
        assert_eq!(events.recv().await, Some(Event::Disconnected));
        assert_eq!(events.recv().await, None);
        assert_eq!(coordinator.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_after_stop_is_noop() {
        let transport = MockTransport::new();
        let coordinator = Coordinator::new(transport.clone());

        coordinator.start();
        coordinator.stop_graceful().await;
        coordinator.submit(Command::raw(9));

        assert_eq!(coordinator.pending(), 0);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_stop_without_start() {
        let coordinator = Coordinator::new(MockTransport::new());
        coordinator.stop_now();
        coordinator.stop_graceful().await;
        assert!(!coordinator.is_running());
    }

    #[tokio::test]
    async fn test_dropped_source_unsubscribes() {
        let coordinator = Coordinator::new(MockTransport::new());
        let a = coordinator.subscribe();
        let _b = coordinator.subscribe();
        assert_eq!(coordinator.subscriber_count(), 2);

        drop(a);
        assert_eq!(coordinator.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let transport = MockTransport::new();
        let coordinator = Coordinator::new(transport.clone());

        coordinator.start();
        coordinator.submit(Command::raw(1));
        coordinator.stop_graceful().await;

        coordinator.start();
        coordinator.submit(Command::raw(2));
        coordinator.stop_graceful().await;

        assert_eq!(transport.sent_bytes(), vec![1, 2]);
        assert_eq!(transport.connect_attempts(), 2);
    }

    #[tokio::test]
    async fn test_drop_cancels_worker() {
        let transport = MockTransport::new();
        let coordinator = Coordinator::new(transport.clone());
        coordinator.start();
        let (channel, cancel) = current(&coordinator);

        drop(coordinator);
        assert!(channel.is_closed());
        assert!(cancel.is_cancelled());
    }
}
