//! The serialized device worker.
//!
//! One worker runs per `start()` epoch. It owns the transport handle,
//! drains the command channel one command at a time, and broadcasts
//! lifecycle events.
//!
//! # State Machine
//!
//! ```text
//!              command, no handle
//! Disconnected ──────────────────► Connecting
//!      ▲                               │
//!      │ connect failed (drop cmd)     │ connect ok → `connected`
//!      ◄───────────────────────────────┤
//!      │                               ▼
//!      │  send failed →            Connected ◄─┐
//!      │  `sendFailed`, `disconnected`  │       │ send ok
//!      └────────────────────────────────┴───────┘
//! ```
//!
//! Cancellation is checked at the dequeue point and after every
//! transport call. Every exit path releases the handle.
//!
//! A run waits for its predecessor to complete before its first dequeue,
//! so at most one run ever holds the device.

// ============================================================================
// Imports
// ============================================================================

use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::identifiers::Epoch;
use crate::protocol::{Command, Event, Selector};
use crate::transport::Transport;

use super::{CoordinatorState, RunDone};
use super::channel::CommandChannel;

// ============================================================================
// Worker
// ============================================================================

/// Everything one worker run needs. Moved into the spawned task.
pub(crate) struct Worker<T: Transport> {
    /// Device transport.
    pub(crate) transport: Arc<T>,
    /// Channel this run drains.
    pub(crate) channel: Arc<CommandChannel>,
    /// Shared coordinator state, for broadcasting.
    pub(crate) state: Arc<Mutex<CoordinatorState>>,
    /// Set by `stop_now` or a superseding `start`.
    pub(crate) cancel: CancellationToken,
    /// Which device to connect to.
    pub(crate) selector: Selector,
    /// Generation of this run.
    pub(crate) epoch: Epoch,
    /// Completion of the run this one superseded.
    pub(crate) predecessor: Option<RunDone>,
    /// Set once this run has completed.
    pub(crate) done: watch::Sender<bool>,
}

impl<T: Transport> Worker<T> {
    /// Runs until the channel is closed and drained, or cancellation.
    pub(crate) async fn run(self) {
        info!(epoch = %self.epoch, selector = ?self.selector, "Worker started");

        // Awaited even when cancelled: runs complete in start order.
        if let Some(predecessor) = &self.predecessor {
            debug!(epoch = %self.epoch, "Waiting for previous run to release the device");
            predecessor.wait().await;
        }

        let mut session: Option<T::Handle> = None;

        loop {
            let command = tokio::select! {
                biased;

                () = self.cancel.cancelled() => {
                    let discarded = self.channel.clear();
                    debug!(epoch = %self.epoch, discarded, "Cancellation observed at dequeue");
                    break;
                }

                next = self.channel.pop() => match next {
                    Some(command) => command,
                    None => {
                        debug!(epoch = %self.epoch, "Channel closed and drained");
                        break;
                    }
                },
            };

            if self.dispatch(command, &mut session).await.is_break() {
                let discarded = self.channel.clear();
                debug!(epoch = %self.epoch, %command, discarded, "Command abandoned on cancellation");
                break;
            }
        }

        self.shutdown(session).await;
    }

    /// Processes one command.
    ///
    /// Breaks if cancellation was observed after a transport call.
    async fn dispatch(
        &self,
        command: Command,
        session: &mut Option<T::Handle>,
    ) -> ControlFlow<()> {
        if let Some(handle) = session.take_if(|h| !self.transport.is_connected(h)) {
            debug!(epoch = %self.epoch, "Held handle went stale");
            self.transport.disconnect(handle).await;
            self.broadcast(Event::Disconnected);
        }

        if session.is_none() {
            match self.transport.connect(self.selector).await {
                Ok(handle) => {
                    let device = self.transport.device_kind(&handle);
                    info!(epoch = %self.epoch, %device, "Device connected");
                    *session = Some(handle);
                    self.broadcast(Event::Connected { device });
                }
                Err(error) => {
                    warn!(epoch = %self.epoch, %error, %command, "Connect failed, command dropped");
                }
            }
            if self.cancel.is_cancelled() {
                return ControlFlow::Break(());
            }
        }

        let Some(handle) = session.as_mut() else {
            return ControlFlow::Continue(());
        };

        match self
            .transport
            .send(handle, command.byte(), command.interval_ms)
            .await
        {
            Ok(()) => {
                debug!(epoch = %self.epoch, %command, "Command sent");
            }
            Err(error) => {
                warn!(epoch = %self.epoch, %error, %command, "Send failed, tearing down connection");
                self.broadcast(Event::SendFailed { error });
                if let Some(handle) = session.take() {
                    self.transport.disconnect(handle).await;
                }
                self.broadcast(Event::Disconnected);
            }
        }

        self.check_cancelled()
    }

    /// Releases the device and finishes subscribers.
    async fn shutdown(&self, session: Option<T::Handle>) {
        let held = session.is_some();
        if let Some(handle) = session {
            self.transport.disconnect(handle).await;
        }

        let finished = {
            let mut state = self.state.lock();
            if held {
                state.subscribers.broadcast(&Event::Disconnected);
            }
            // A superseded run leaves subscribers to its successor.
            if state.epoch == self.epoch {
                state.subscribers.finish_all()
            } else {
                0
            }
        };

        self.done.send_replace(true);
        info!(epoch = %self.epoch, released = held, finished, "Worker stopped");
    }

    /// Delivers an event to every subscriber.
    fn broadcast(&self, event: Event) {
        let delivered = self.state.lock().subscribers.broadcast(&event);
        debug!(epoch = %self.epoch, event = event.name(), delivered, "Event broadcast");
    }

    /// Breaks if cancellation has been requested.
    #[inline]
    fn check_cancelled(&self) -> ControlFlow<()> {
        if self.cancel.is_cancelled() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}
