//! Error types for armhub.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! Fallible construction returns [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use armhub::{Coordinator, Result};
//!
//! fn example(transport: MockTransport) -> Result<()> {
//!     let coordinator = Coordinator::builder(transport).capacity(5).build()?;
//!     coordinator.start();
//!     Ok(())
//! }
//! ```
//!
//! Transport failures never surface as returned errors from the
//! [`Coordinator`](crate::Coordinator). They reach callers only as
//! [`Event::SendFailed`](crate::Event::SendFailed) values.
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Connect | [`Error::NotFound`], [`Error::ConnectionFailed`] |
//! | Send | [`Error::NotConnected`], [`Error::RequestFailed`] |
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Cloneable so a failure can travel inside a broadcast event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // ========================================================================
    // Connect Errors
    // ========================================================================
    /// No matching device is present on the bus.
    #[error("Device not found")]
    NotFound,

    /// Device is present but opening it failed.
    #[error("Connection failed{}: {message}", fmt_code(.code))]
    ConnectionFailed {
        /// Lower-level error code, if the platform reported one.
        code: Option<i32>,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Send Errors
    // ========================================================================
    /// Send attempted on a stale or closed handle.
    #[error("Device not connected")]
    NotConnected,

    /// Control transfer failed while connected.
    #[error("Request failed{}: {message}", fmt_code(.code))]
    RequestFailed {
        /// Transfer-level error code, if any.
        code: Option<i32>,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid coordinator configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument, such as an unknown gesture name.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },
}

/// Formats an optional error code as ` (code N)`.
fn fmt_code(code: &Option<i32>) -> String {
    code.map(|c| format!(" (code {c})")).unwrap_or_default()
}

// ============================================================================
// ErrorKind
// ============================================================================

/// Fieldless discriminant of [`enum@Error`], for reporting layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// See [`Error::NotFound`].
    NotFound,
    /// See [`Error::ConnectionFailed`].
    ConnectionFailed,
    /// See [`Error::NotConnected`].
    NotConnected,
    /// See [`Error::RequestFailed`].
    RequestFailed,
    /// See [`Error::Config`].
    Config,
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a not found error.
    #[inline]
    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Creates a connection failed error.
    #[inline]
    pub fn connection_failed(code: Option<i32>, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            code,
            message: message.into(),
        }
    }

    /// Creates a not connected error.
    #[inline]
    pub fn not_connected() -> Self {
        Self::NotConnected
    }

    /// Creates a request failed error.
    #[inline]
    pub fn request_failed(code: Option<i32>, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            code,
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Accessors & Predicates
// ============================================================================

impl Error {
    /// Returns the fieldless kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::ConnectionFailed { .. } => ErrorKind::ConnectionFailed,
            Self::NotConnected => ErrorKind::NotConnected,
            Self::RequestFailed { .. } => ErrorKind::RequestFailed,
            Self::Config { .. } => ErrorKind::Config,
            Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// Returns the platform error code, if any.
    #[inline]
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            Self::ConnectionFailed { code, .. } | Self::RequestFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns `true` if this error came from the transport.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound
                | Self::ConnectionFailed { .. }
                | Self::NotConnected
                | Self::RequestFailed { .. }
        )
    }

    /// Returns `true` if this error came from a connect attempt.
    #[inline]
    #[must_use]
    pub fn is_connect_error(&self) -> bool {
        matches!(self, Self::NotFound | Self::ConnectionFailed { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Send failures may succeed after a fresh connect. A missing device
    /// needs to be plugged in first.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::RequestFailed { .. } | Self::ConnectionFailed { .. }
        )
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for Error {
    fn serialize<S: Serializer>(&self, serializer: S) -> StdResult<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Error", 3)?;
        state.serialize_field("kind", &self.kind())?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

// ============================================================================
// Tests
// ============================================================================
