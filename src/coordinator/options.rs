//! Coordinator configuration.
//!
//! # Example
//!
//! ```ignore
//! use armhub::{CoordinatorOptions, DeviceKind};
//!
//! let options = CoordinatorOptions::new()
//!     .with_capacity(5)
//!     .with_device(DeviceKind::Compact);
//! options.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};
use crate::protocol::{DeviceKind, Selector};

use super::channel::DEFAULT_CAPACITY;

// ============================================================================
// CoordinatorOptions
// ============================================================================

/// Settings applied to every worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Pending commands retained before the oldest is dropped.
    pub capacity: usize,

    /// Which device the worker connects to.
    pub selector: Selector,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl CoordinatorOptions {
    /// Creates options with capacity 3 and auto-detection.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            selector: Selector::Auto,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl CoordinatorOptions {
    /// Sets the queue capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the device selector.
    #[inline]
    #[must_use]
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Restricts connects to one device kind.
    #[inline]
    #[must_use]
    pub fn with_device(self, kind: DeviceKind) -> Self {
        self.with_selector(Selector::Explicit(kind))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl CoordinatorOptions {
    /// Checks the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::config("capacity must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CoordinatorOptions::default();
        assert_eq!(options.capacity, 3);
        assert_eq!(options.selector, Selector::Auto);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let options = CoordinatorOptions::new()
            .with_capacity(8)
            .with_device(DeviceKind::Compact);
        assert_eq!(options.capacity, 8);
        assert_eq!(options.selector, Selector::Explicit(DeviceKind::Compact));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = CoordinatorOptions::new().with_capacity(0).validate().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
