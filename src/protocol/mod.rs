//! Frame-streaming wire protocol
//!
//! A strictly half-duplex, pull-based request/response exchange over an
//! established TCP stream:
//!
//! ```text
//! Consumer                                 Camera server
//!    |                                          |
//!    |------- command byte 'Z' (1 byte) ------->|
//!    |                                          |
//!    |<------ i32 payloadLength (LE) -----------|
//!    |<------ payload (payloadLength bytes) ----|
//!    |                                          |
//!    |          [repeat: one frame in flight]   |
//! ```
//!
//! The payload is `payloadLength / 10` point records, each five
//! consecutive little-endian `i16` words (see [`crate::cloud`]). The
//! consumer never pulls again before fully consuming the previous
//! frame.
//!
//! All multi-byte integers are little-endian on the wire regardless of
//! host byte order.

pub mod framing;

pub use framing::{read_command, read_frame, write_command, write_frame};

/// Pull one color point-cloud frame (XYZRGB)
pub const PULL_XYZRGB: u8 = b'Z';

/// Reserved: pull one colorless frame (XYZ only).
///
/// Recognized on the wire but not wired into the encoder in this
/// version; servers reject it as unsupported. Kept as a compatible
/// extension point.
pub const PULL_XYZ: u8 = b'Y';

/// Maximum frame payload in 16-bit words (about 1,000,000 points)
pub const MAX_PAYLOAD_WORDS: usize = 5_000_000;

/// Maximum frame payload in bytes
pub const MAX_PAYLOAD_BYTES: usize = MAX_PAYLOAD_WORDS * 2;

/// Byte length of the payload length header
pub const LENGTH_HEADER_BYTES: usize = 4;
