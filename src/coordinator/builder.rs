//! Builder pattern for coordinator configuration.
//!
//! # Example
//!
//! ```ignore
//! use armhub::{Coordinator, DeviceKind, MockTransport};
//!
//! let coordinator = Coordinator::builder(MockTransport::new())
//!     .capacity(5)
//!     .device(DeviceKind::Standard)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::Result;
use crate::protocol::{DeviceKind, Selector};
use crate::transport::Transport;

use super::Coordinator;
use super::options::CoordinatorOptions;

// ============================================================================
// CoordinatorBuilder
// ============================================================================

/// Builder for a [`Coordinator`].
///
/// Use [`Coordinator::builder()`] to create one.
#[derive(Debug)]
pub struct CoordinatorBuilder<T> {
    /// Device transport.
    transport: T,
    /// Accumulated options.
    options: CoordinatorOptions,
}

impl<T: Transport> CoordinatorBuilder<T> {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            options: CoordinatorOptions::new(),
        }
    }

    /// Sets the queue capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Pending commands kept before the oldest is dropped
    #[inline]
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.options = self.options.with_capacity(capacity);
        self
    }

    /// Sets the device selector.
    #[inline]
    #[must_use]
    pub fn selector(mut self, selector: Selector) -> Self {
        self.options = self.options.with_selector(selector);
        self
    }

    /// Restricts connects to one device kind.
    #[inline]
    #[must_use]
    pub fn device(mut self, kind: DeviceKind) -> Self {
        self.options = self.options.with_device(kind);
        self
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the coordinator with validation.
    ///
    /// The coordinator is idle until [`Coordinator::start`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the options are invalid.
    pub fn build(self) -> Result<Coordinator<T>> {
        self.options.validate()?;
        Ok(Coordinator::with_options(self.transport, self.options))
    }
}

// ============================================================================
// Tests
// ============================================================================
