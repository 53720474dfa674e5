//! Commands understood by the LED controller firmware.
//!
//! Each command is written to the device as a single ASCII line:
//! ```text
//! R<r> G<g> B<b>\n     set colour, each channel 0-255
//! L<level>\n           set brightness 0-255
//! ```
//! The firmware parses exactly this form, so the encoding must not change on its own.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

/// Line terminator expected by the firmware.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Ready-made commands offered to the control surface.
pub const PRESETS: [&str; 6] = [
    "R255 G0 B0",
    "R0 G255 B0",
    "R0 G0 B255",
    "L0",
    "L128",
    "L255",
];

/// A validated device command.
///
/// Values are `u8`, so a constructed command can never carry an
/// out-of-range channel or level. Outside this crate commands come only
/// from [`parse`](crate::protocol::parse); the variants can be matched
/// with `..` but not built.
///
/// ```compile_fail
/// let cmd = ledgate::Command::SetBrightness { level: 3 };
/// ```
///
/// ```
/// let cmd = ledgate::parse("L3").unwrap();
/// assert!(matches!(cmd, ledgate::Command::SetBrightness { level: 3, .. }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Set the LED colour.
    #[non_exhaustive]
    SetRgb { r: u8, g: u8, b: u8 },
    /// Set the LED brightness.
    #[non_exhaustive]
    SetBrightness { level: u8 },
}

impl Command {
    /// Encodes the command into its wire line, terminator included.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let line = self.to_string();
        let mut buf = BytesMut::with_capacity(line.len() + 1);
        buf.put_slice(line.as_bytes());
        buf.put_u8(LINE_TERMINATOR);
        buf.freeze()
    }

    /// Human-readable confirmation returned after the command was sent.
    #[must_use]
    pub fn confirmation(&self) -> String {
        match self {
            Self::SetRgb { r, g, b } => format!("RGB set: {r}, {g}, {b}"),
            Self::SetBrightness { level } => format!("Brightness set: {level}"),
        }
    }
}

/// Displays the wire form without the terminator.
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetRgb { r, g, b } => write!(f, "R{r} G{g} B{b}"),
            Self::SetBrightness { level } => write!(f, "L{level}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_rgb() {
        let cmd = Command::SetRgb {
            r: 10,
            g: 20,
            b: 30,
        };
        assert_eq!(cmd.encode(), Bytes::from_static(b"R10 G20 B30\n"));
    }

    #[test]
    fn test_encode_brightness() {
        let cmd = Command::SetBrightness { level: 5 };
        assert_eq!(cmd.encode(), Bytes::from_static(b"L5\n"));
    }

    #[test]
    fn test_encode_extremes_have_no_padding() {
        let cmd = Command::SetRgb { r: 0, g: 255, b: 7 };
        assert_eq!(cmd.encode(), Bytes::from_static(b"R0 G255 B7\n"));
    }

    #[test]
    fn test_confirmation() {
        let cmd = Command::SetRgb { r: 1, g: 2, b: 3 };
        assert_eq!(cmd.confirmation(), "RGB set: 1, 2, 3");
        let cmd = Command::SetBrightness { level: 128 };
        assert_eq!(cmd.confirmation(), "Brightness set: 128");
    }
}
