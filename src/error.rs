//! Crate-wide error types
//!
//! All fallible operations in this crate return [`Result`]. Connection
//! setup failures and protocol violations are fatal to the connection
//! that produced them; capacity exhaustion fails the current frame only.

use std::io;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// I/O error (socket setup, read, write)
    Io(io::Error),
    /// Wire protocol violation
    Protocol(ProtocolError),
    /// An encode or frame would exceed the fixed scratch capacity.
    ///
    /// This fails the current frame; the connection and process survive.
    CapacityExceeded {
        /// Bytes the operation needed
        needed: usize,
        /// Bytes available
        capacity: usize,
    },
}

/// Wire protocol violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Server received a command byte it does not understand
    UnexpectedCommand(u8),
    /// Peer closed the connection mid-frame
    Truncated,
    /// Frame contents violate the wire layout
    Malformed(&'static str),
    /// Declared payload length exceeds the maximum frame size
    Oversized(usize),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Protocol(e) => write!(f, "Protocol error: {}", e),
            Error::CapacityExceeded { needed, capacity } => {
                write!(
                    f,
                    "Capacity exceeded: needed {} bytes, capacity {} bytes",
                    needed, capacity
                )
            }
        }
    }
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::UnexpectedCommand(b) => {
                write!(f, "Unexpected command byte: 0x{:02x}", b)
            }
            ProtocolError::Truncated => write!(f, "Connection closed mid-frame"),
            ProtocolError::Malformed(what) => write!(f, "Malformed frame: {}", what),
            ProtocolError::Oversized(len) => {
                write!(f, "Declared payload length {} exceeds maximum", len)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Protocol(e) => Some(e),
            Error::CapacityExceeded { .. } => None,
        }
    }
}

impl std::error::Error for ProtocolError {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Error::Protocol(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_capacity() {
        let e = Error::CapacityExceeded {
            needed: 20,
            capacity: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("20"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn test_display_unexpected_command() {
        let e = ProtocolError::UnexpectedCommand(b'Q');
        assert!(e.to_string().contains("0x51"));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let e: Error = io_err.into();
        assert!(matches!(e, Error::Io(_)));
    }
}
