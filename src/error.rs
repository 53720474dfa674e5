//! Error types for the ledgate library.

use thiserror::Error;

/// The main error type for gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The text did not parse into a command.
    #[error("invalid command: {0}")]
    Parse(#[from] ParseError),

    /// The caller is not allowed to drive the device.
    #[error("caller is not authorized")]
    Unauthorized,

    /// The device could not be reached for this request.
    #[error("device link unavailable: {reason}")]
    LinkUnavailable { reason: String },

    /// The serial port could not be opened.
    #[error("serial port unavailable: {0}")]
    PortUnavailable(#[from] tokio_serial::Error),

    /// The list of serial ports could not be read.
    #[error("could not enumerate serial ports: {0}")]
    PortEnumeration(#[source] tokio_serial::Error),

    /// Writing to the serial port failed.
    #[error("serial write failed: {0}")]
    WriteFailure(#[source] std::io::Error),

    /// Reading from the serial port failed.
    #[error("serial read failed: {0}")]
    ReadFailure(#[source] std::io::Error),

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// An I/O call did not finish in time.
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl Error {
    /// Returns the coarse kind callers branch on.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse(ParseError::UnrecognizedFormat) => ErrorKind::UnrecognizedFormat,
            Self::Parse(ParseError::OutOfRange { .. }) => ErrorKind::OutOfRange,
            Self::Unauthorized => ErrorKind::Unauthorized,
            Self::ReadFailure(_) => ErrorKind::ReadFailure,
            Self::LinkUnavailable { .. }
            | Self::PortUnavailable(_)
            | Self::PortEnumeration(_)
            | Self::WriteFailure(_)
            | Self::NotConnected
            | Self::Timeout { .. } => ErrorKind::LinkUnavailable,
        }
    }

    /// Collapses a link-level failure into the per-request form.
    #[must_use]
    pub fn into_link_unavailable(self) -> Self {
        match self {
            Self::LinkUnavailable { .. } => self,
            other => Self::LinkUnavailable {
                reason: other.to_string(),
            },
        }
    }
}

/// Coarse error classification exposed to the control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Text matched no command grammar.
    UnrecognizedFormat,
    /// A grammar matched but a value was outside 0..=255.
    OutOfRange,
    /// Caller id rejected.
    Unauthorized,
    /// Port missing, busy, or write failed.
    LinkUnavailable,
    /// Hard failure while reading the device.
    ReadFailure,
}

/// Command parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Neither the RGB nor the brightness grammar matched.
    #[error("unrecognized format, expected `R<0-255> G<0-255> B<0-255>` or `L<0-255>`")]
    UnrecognizedFormat,

    /// A field value does not fit in 0..=255.
    #[error("{field} value {value} is out of range 0-255")]
    OutOfRange { field: char, value: String },
}

/// Result type alias for ledgate operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_errors_map_to_link_unavailable() {
        let err = Error::WriteFailure(std::io::Error::other("unplugged"));
        assert_eq!(err.kind(), ErrorKind::LinkUnavailable);

        let err = err.into_link_unavailable();
        assert!(matches!(err, Error::LinkUnavailable { ref reason } if reason.contains("unplugged")));
    }

    #[test]
    fn test_port_enumeration_error() {
        let err = Error::PortEnumeration(tokio_serial::Error::new(
            tokio_serial::ErrorKind::Unknown,
            "no sysfs",
        ));
        assert_eq!(err.to_string(), "could not enumerate serial ports: no sysfs");
        assert_eq!(err.kind(), ErrorKind::LinkUnavailable);
    }

    #[test]
    fn test_parse_error_kinds() {
        assert_eq!(
            Error::from(ParseError::UnrecognizedFormat).kind(),
            ErrorKind::UnrecognizedFormat
        );
        let err = Error::from(ParseError::OutOfRange {
            field: 'L',
            value: "300".into(),
        });
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(err.to_string(), "invalid command: L value 300 is out of range 0-255");
    }
}
