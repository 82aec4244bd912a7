//! Device identities and selection.
//!
//! Each [`DeviceKind`] is one vendor/product id pair. Auto-detection
//! probes [`DeviceKind::ALL`] in order and takes the first that answers.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// DeviceKind
// ============================================================================

/// A known hub model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Four-port hub with two arms.
    Standard,
    /// Two-port hub with two arms.
    Compact,
}

impl DeviceKind {
    /// Known kinds, in auto-detect probe order.
    pub const ALL: [DeviceKind; 2] = [Self::Standard, Self::Compact];

    /// USB vendor id.
    #[inline]
    #[must_use]
    pub const fn vendor_id(self) -> u16 {
        match self {
            Self::Standard | Self::Compact => 0x1130,
        }
    }

    /// USB product id.
    #[inline]
    #[must_use]
    pub const fn product_id(self) -> u16 {
        match self {
            Self::Standard => 0x6806,
            Self::Compact => 0x6807,
        }
    }

    /// Returns the kind name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Compact => "compact",
        }
    }

    /// Returns `true` if `vendor_id:product_id` identifies this kind.
    #[inline]
    #[must_use]
    pub const fn matches(self, vendor_id: u16, product_id: u16) -> bool {
        self.vendor_id() == vendor_id && self.product_id() == product_id
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:04x}:{:04x})",
            self.as_str(),
            self.vendor_id(),
            self.product_id()
        )
    }
}

impl FromStr for DeviceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_argument(format!("unknown device kind: {name}")))
    }
}

// ============================================================================
// Selector
// ============================================================================

/// Which device a connect attempt should open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Selector {
    /// First present device of any known kind, probed in [`DeviceKind::ALL`] order.
    #[default]
    Auto,
    /// Only this kind.
    Explicit(DeviceKind),
}

impl Selector {
    /// Returns the kinds to probe, in order.
    #[must_use]
    pub fn candidates(self) -> &'static [DeviceKind] {
        match self {
            Self::Auto => &DeviceKind::ALL,
            Self::Explicit(DeviceKind::Standard) => &DeviceKind::ALL[..1],
            Self::Explicit(DeviceKind::Compact) => &DeviceKind::ALL[1..],
        }
    }
}

impl From<DeviceKind> for Selector {
    fn from(kind: DeviceKind) -> Self {
        Self::Explicit(kind)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_probe_order() {
        assert_eq!(
            Selector::Auto.candidates(),
            &[DeviceKind::Standard, DeviceKind::Compact]
        );
    }

    #[test]
    fn test_explicit_skips_search() {
        for kind in DeviceKind::ALL {
            assert_eq!(Selector::Explicit(kind).candidates(), &[kind]);
        }
    }

    #[test]
    fn test_matches() {
        assert!(DeviceKind::Compact.matches(0x1130, 0x6807));
        assert!(!DeviceKind::Standard.matches(0x1130, 0x6807));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("Compact".parse::<DeviceKind>().unwrap(), DeviceKind::Compact);
        assert!("jumbo".parse::<DeviceKind>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceKind::Standard.to_string(), "standard (1130:6806)");
    }
}
