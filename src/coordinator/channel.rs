//! Bounded drop-oldest command queue.
//!
//! Producers never wait. When the buffer is full the oldest pending
//! command is evicted to admit the new one, so a slow device only ever
//! sees the most recent intent.
//!
//! ```text
//! capacity = 3
//!
//! push A  → [A]
//! push B  → [A, B]
//! push C  → [A, B, C]
//! push D  → [B, C, D]    (A evicted)
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::protocol::Command;

// ============================================================================
// Constants
// ============================================================================

/// Default number of pending commands retained.
pub const DEFAULT_CAPACITY: usize = 3;

// ============================================================================
// Admission
// ============================================================================

/// Outcome of [`CommandChannel::push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Appended without eviction.
    Queued,
    /// Appended after evicting the contained oldest command.
    Evicted(Command),
    /// Channel is closed; the contained command was not accepted.
    Rejected(Command),
}

// ============================================================================
// CommandChannel
// ============================================================================

/// Buffer guarded by the channel lock.
#[derive(Debug)]
struct Buffer {
    /// Pending commands, oldest first.
    queue: VecDeque<Command>,
    /// No further pushes accepted once set.
    closed: bool,
}

/// Bounded, drop-oldest, single-consumer command queue.
///
/// # Thread Safety
///
/// Any number of producers may call [`push`](Self::push) concurrently.
/// Only one task may call [`pop`](Self::pop).
#[derive(Debug)]
pub struct CommandChannel {
    /// Maximum retained commands.
    capacity: usize,
    /// Queue and closed flag.
    buffer: Mutex<Buffer>,
    /// Wakes the consumer on push or close.
    notify: Notify,
}

impl CommandChannel {
    /// Creates an empty channel.
    ///
    /// A zero `capacity` is raised to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buffer: Mutex::new(Buffer {
                queue: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            notify: Notify::new(),
        }
    }

    /// Appends a command, evicting the oldest if full.
    ///
    /// Never blocks.
    pub fn push(&self, command: Command) -> Admission {
        let admission = {
            let mut buffer = self.buffer.lock();
            if buffer.closed {
                return Admission::Rejected(command);
            }

            let evicted = if buffer.queue.len() >= self.capacity {
                buffer.queue.pop_front()
            } else {
                None
            };
            buffer.queue.push_back(command);

            match evicted {
                Some(old) => Admission::Evicted(old),
                None => Admission::Queued,
            }
        };

        if let Admission::Evicted(old) = admission {
            debug!(evicted = %old, admitted = %command, "Channel full, dropped oldest");
        } else {
            trace!(%command, "Command queued");
        }

        // Stores a permit if the consumer is not waiting yet.
        self.notify.notify_one();
        admission
    }

    /// Waits for the next command.
    ///
    /// Returns `None` once the channel is closed and drained.
    pub async fn pop(&self) -> Option<Command> {
        loop {
            {
                let mut buffer = self.buffer.lock();
                if let Some(command) = buffer.queue.pop_front() {
                    return Some(command);
                }
                if buffer.closed {
                    return None;
                }
            }
            self.notify.notified().await;
        }
    }

    /// Takes the next command without waiting.
    pub fn try_pop(&self) -> Option<Command> {
        self.buffer.lock().queue.pop_front()
    }

    /// Stops accepting pushes. Idempotent.
    ///
    /// Commands already buffered stay available to [`pop`](Self::pop).
    pub fn close(&self) {
        let was_open = {
            let mut buffer = self.buffer.lock();
            !std::mem::replace(&mut buffer.closed, true)
        };
        if was_open {
            trace!("Command channel closed");
        }
        self.notify.notify_one();
    }

    /// Discards every buffered command, returning how many were dropped.
    pub fn clear(&self) -> usize {
        let mut buffer = self.buffer.lock();
        let dropped = buffer.queue.len();
        buffer.queue.clear();
        dropped
    }

    /// Returns the number of buffered commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.lock().queue.len()
    }

    /// Returns `true` if nothing is buffered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once [`close`](Self::close) was called.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.buffer.lock().closed
    }

    /// Returns the retention limit.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CommandChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ============================================================================
// Tests
// ============================================================================
