//! Command definitions.
//!
//! A [`Command`] is one vendor control byte plus a timing interval.
//! The byte comes either from the named [`Gesture`] table or is given raw.
//!
//! # Gesture Table
//!
//! | Gesture | Byte | Motion |
//! |---------|------|--------|
//! | `stop` | `0x00` | Arms return to rest |
//! | `left` | `0x01` | Left arm raises |
//! | `right` | `0x02` | Right arm raises |
//! | `both` | `0x03` | Both arms raise together |
//! | `alternate` | `0x04` | Arms raise in turn |
//! | `wave` | `0x05` | Both arms wave |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Gesture
// ============================================================================

/// Named motion patterns understood by the hub firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    /// Arms return to rest.
    Stop,
    /// Left arm raises.
    Left,
    /// Right arm raises.
    Right,
    /// Both arms raise together.
    Both,
    /// Arms raise in turn.
    Alternate,
    /// Both arms wave.
    Wave,
}

impl Gesture {
    /// Every gesture, in byte order.
    pub const ALL: [Gesture; 6] = [
        Self::Stop,
        Self::Left,
        Self::Right,
        Self::Both,
        Self::Alternate,
        Self::Wave,
    ];

    /// Returns the vendor control byte for this gesture.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Stop => 0x00,
            Self::Left => 0x01,
            Self::Right => 0x02,
            Self::Both => 0x03,
            Self::Alternate => 0x04,
            Self::Wave => 0x05,
        }
    }

    /// Returns the gesture name.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Left => "left",
            Self::Right => "right",
            Self::Both => "both",
            Self::Alternate => "alternate",
            Self::Wave => "wave",
        }
    }

    /// Looks up the gesture that maps to `byte`, if any.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.byte() == byte)
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gesture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::invalid_argument(format!("unknown gesture: {name}")))
    }
}

// ============================================================================
// CommandAction
// ============================================================================

/// What a command asks the device to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum CommandAction {
    /// A named gesture from the table.
    Gesture(Gesture),
    /// A raw vendor byte.
    Raw(u8),
}

impl CommandAction {
    /// Returns the control byte sent on the wire.
    #[inline]
    #[must_use]
    pub const fn byte(self) -> u8 {
        match self {
            Self::Gesture(gesture) => gesture.byte(),
            Self::Raw(byte) => byte,
        }
    }
}

// ============================================================================
// Command
// ============================================================================

/// One control command: an action plus a timing interval.
///
/// The interval is held in milliseconds as `u16`, the width of the
/// transfer field. Longer durations are clamped. Zero means fastest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Command {
    /// What to do.
    pub action: CommandAction,
    /// Timing interval in milliseconds.
    pub interval_ms: u16,
}

impl Command {
    /// Creates a gesture command with a zero interval.
    #[inline]
    #[must_use]
    pub const fn gesture(gesture: Gesture) -> Self {
        Self {
            action: CommandAction::Gesture(gesture),
            interval_ms: 0,
        }
    }

    /// Creates a raw byte command with a zero interval.
    #[inline]
    #[must_use]
    pub const fn raw(byte: u8) -> Self {
        Self {
            action: CommandAction::Raw(byte),
            interval_ms: 0,
        }
    }

    /// Sets the interval in milliseconds, clamped to `u16::MAX`.
    #[inline]
    #[must_use]
    pub fn with_interval_ms(mut self, millis: u64) -> Self {
        self.interval_ms = u16::try_from(millis).unwrap_or(u16::MAX);
        self
    }

    /// Sets the interval from a [`Duration`], clamped to `u16::MAX` ms.
    #[inline]
    #[must_use]
    pub fn with_interval(self, interval: Duration) -> Self {
        let millis = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self.with_interval_ms(millis)
    }

    /// Returns the control byte.
    #[inline]
    #[must_use]
    pub const fn byte(&self) -> u8 {
        self.action.byte()
    }

    /// Returns the interval as a [`Duration`].
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.interval_ms))
    }
}

impl From<Gesture> for Command {
    fn from(gesture: Gesture) -> Self {
        Self::gesture(gesture)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            CommandAction::Gesture(gesture) => write!(f, "{gesture}")?,
            CommandAction::Raw(byte) => write!(f, "raw(0x{byte:02x})")?,
        }
        write!(f, " @{}ms", self.interval_ms)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gesture_bytes_are_distinct() {
        for (i, a) in Gesture::ALL.iter().enumerate() {
            for b in &Gesture::ALL[i + 1..] {
                assert_ne!(a.byte(), b.byte());
            }
        }
    }

    #[test]
    fn test_gesture_from_str() {
        assert_eq!("wave".parse::<Gesture>().unwrap(), Gesture::Wave);
        assert_eq!(" LEFT ".parse::<Gesture>().unwrap(), Gesture::Left);

        let err = "dance".parse::<Gesture>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_gesture_from_byte() {
        assert_eq!(Gesture::from_byte(0x03), Some(Gesture::Both));
        assert_eq!(Gesture::from_byte(0xff), None);
    }

    #[test]
    fn test_raw_byte_passthrough() {
        assert_eq!(Command::raw(0xab).byte(), 0xab);
        assert_eq!(Command::gesture(Gesture::Right).byte(), 0x02);
    }

    #[test]
    fn test_interval_clamped() {
        let cmd = Command::raw(1).with_interval(Duration::from_secs(3600));
        assert_eq!(cmd.interval_ms, u16::MAX);

        let cmd = Command::raw(1).with_interval_ms(250);
        assert_eq!(cmd.interval(), Duration::from_millis(250));
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::gesture(Gesture::Wave).with_interval_ms(100);
        assert_eq!(cmd.to_string(), "wave @100ms");
        assert_eq!(Command::raw(0x0f).to_string(), "raw(0x0f) @0ms");
    }

    #[test]
    fn test_command_deserialize() {
        let json = r#"{"action":{"type":"gesture","value":"both"},"interval_ms":40}"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, Command::gesture(Gesture::Both).with_interval_ms(40));
    }
}
