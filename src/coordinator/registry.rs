//! Subscriber registry and event sources.
//!
//! Each subscriber owns an unbounded sink keyed by [`SubscriberId`]. The
//! registry lives inside the coordinator state and is only touched under
//! the state lock. An [`EventSource`] removes its own entry when dropped,
//! holding only its key and a weak reference to the state.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::pin::Pin;
use std::sync::Weak;
use std::task::{Context, Poll};

use futures_util::Stream;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, trace};

use crate::identifiers::SubscriberId;
use crate::protocol::Event;

use super::CoordinatorState;

// ============================================================================
// SubscriberRegistry
// ============================================================================

/// Map of subscriber identities to their sinks.
#[derive(Debug, Default)]
pub(crate) struct SubscriberRegistry {
    /// Live sinks.
    sinks: FxHashMap<SubscriberId, mpsc::UnboundedSender<Event>>,
}

impl SubscriberRegistry {
    /// Registers a fresh sink and returns its key and receiving end.
    pub(crate) fn register(&mut self) -> (SubscriberId, mpsc::UnboundedReceiver<Event>) {
        let id = SubscriberId::next();
        let (tx, rx) = mpsc::unbounded_channel();
        self.sinks.insert(id, tx);
        (id, rx)
    }

    /// Removes a sink. Returns `true` if it was registered.
    pub(crate) fn unregister(&mut self, id: SubscriberId) -> bool {
        self.sinks.remove(&id).is_some()
    }

    /// Delivers `event` to every sink.
    ///
    /// Sinks whose receiver is gone are pruned. Returns the number of
    /// sinks that accepted the event.
    pub(crate) fn broadcast(&mut self, event: &Event) -> usize {
        self.sinks.retain(|id, tx| {
            let delivered = tx.send(event.clone()).is_ok();
            if !delivered {
                trace!(subscriber = %id, "Pruned detached subscriber");
            }
            delivered
        });
        self.sinks.len()
    }

    /// Drops every sink, ending each source's stream.
    ///
    /// Returns the number of sinks finished.
    pub(crate) fn finish_all(&mut self) -> usize {
        let count = self.sinks.len();
        self.sinks.clear();
        count
    }

    /// Returns the number of registered sinks.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.sinks.len()
    }
}

// ============================================================================
// EventSource
// ============================================================================

/// Independently-paced stream of lifecycle events.
///
/// Created by [`Coordinator::subscribe`](crate::Coordinator::subscribe).
/// Yields events in broadcast order and ends when the worker shuts down.
/// Dropping the source unsubscribes it.
///
/// # Example
///
/// ```ignore
/// let mut events = coordinator.subscribe();
/// coordinator.submit_gesture(Gesture::Wave, Duration::ZERO);
///
/// while let Some(event) = events.recv().await {
///     if event.is_failure() {
///         eprintln!("hub: {}", event.name());
///     }
/// }
/// ```
pub struct EventSource {
    /// Registry key.
    id: SubscriberId,
    /// Receiving end of the sink.
    receiver: mpsc::UnboundedReceiver<Event>,
    /// State holding the registry. Weak so a source never keeps it alive.
    state: Weak<Mutex<CoordinatorState>>,
}

impl EventSource {
    /// Wraps a registered receiver.
    pub(crate) fn new(
        id: SubscriberId,
        receiver: mpsc::UnboundedReceiver<Event>,
        state: Weak<Mutex<CoordinatorState>>,
    ) -> Self {
        Self {
            id,
            receiver,
            state,
        }
    }

    /// Returns this subscriber's identity.
    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the source has been finished and drained.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Takes the next event without waiting.
    ///
    /// Returns `None` if nothing is pending or the source is finished.
    pub fn try_recv(&mut self) -> Option<Event> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Returns `true` once the coordinator finished this source.
    ///
    /// Buffered events may still be pending.
    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.receiver.is_closed()
    }
}

impl Stream for EventSource {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.receiver.poll_recv(cx)
    }
}

impl fmt::Debug for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSource")
            .field("id", &self.id)
            .field("finished", &self.receiver.is_closed())
            .finish_non_exhaustive()
    }
}

impl Drop for EventSource {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade()
            && state.lock().subscribers.unregister(self.id)
        {
            debug!(subscriber = %self.id, "Subscriber detached");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
