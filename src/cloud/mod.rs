//! Point-cloud data model
//!
//! Defines the wire-level point record, the capacity-bounded encode
//! scratch buffer, and the decoded floating-point cloud used on the
//! consumer side.
//!
//! Wire record layout (five consecutive little-endian `i16` words):
//!
//! ```text
//! [ x_mm | y_mm | z_mm | colorWord0 | colorWord1 ]
//!
//! colorWord0 = R | (G << 8)
//! colorWord1 = B
//! ```
//!
//! Positions are fixed-point millimeters: quantization truncates
//! `meters * 1000.0` toward zero into a signed 16-bit integer. Inputs
//! outside roughly +/-32.7 m after scaling wrap; staying in range is a
//! caller precondition.

mod image;
mod transform;

pub use image::ColorImage;
pub use transform::CameraTransform;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result};

/// i16 words per wire point record
pub const WORDS_PER_POINT: usize = 5;

/// Bytes per wire point record
pub const BYTES_PER_POINT: usize = WORDS_PER_POINT * 2;

/// Meters-to-millimeters fixed-point scale
pub const CONV_RATE: f32 = 1000.0;

/// One quantized point as it appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    /// X position in millimeters
    pub x_mm: i16,
    /// Y position in millimeters
    pub y_mm: i16,
    /// Z position in millimeters
    pub z_mm: i16,
    /// Packed color words: `[R | G<<8, B]`
    pub color: [u16; 2],
}

impl Point {
    /// Quantize a camera-space position (meters) and RGB color
    pub fn quantize(position: [f32; 3], rgb: [u8; 3]) -> Self {
        Self {
            x_mm: (position[0] * CONV_RATE) as i16,
            y_mm: (position[1] * CONV_RATE) as i16,
            z_mm: (position[2] * CONV_RATE) as i16,
            color: pack_color(rgb),
        }
    }

    /// Position in meters (reverses the fixed-point quantization)
    pub fn position_m(&self) -> [f32; 3] {
        [
            self.x_mm as f32 / CONV_RATE,
            self.y_mm as f32 / CONV_RATE,
            self.z_mm as f32 / CONV_RATE,
        ]
    }

    /// Unpacked RGB color bytes
    pub fn rgb(&self) -> [u8; 3] {
        unpack_color(self.color)
    }

    /// The five wire words of this record
    pub fn to_words(&self) -> [i16; WORDS_PER_POINT] {
        [
            self.x_mm,
            self.y_mm,
            self.z_mm,
            self.color[0] as i16,
            self.color[1] as i16,
        ]
    }
}

/// Pack RGB bytes into the two wire color words
#[inline]
pub fn pack_color(rgb: [u8; 3]) -> [u16; 2] {
    [rgb[0] as u16 | ((rgb[1] as u16) << 8), rgb[2] as u16]
}

/// Unpack the two wire color words into RGB bytes
#[inline]
pub fn unpack_color(words: [u16; 2]) -> [u8; 3] {
    [
        (words[0] & 0xFF) as u8,
        (words[0] >> 8) as u8,
        (words[1] & 0xFF) as u8,
    ]
}

/// Capacity-bounded scratch buffer of wire words
///
/// One `PointBuffer` backs one frame's encode output and is reused
/// across frames. The used region is fully overwritten on every encode,
/// so no stale words from a previous, larger frame can leak into a
/// payload.
#[derive(Debug)]
pub struct PointBuffer {
    words: Vec<i16>,
    used_words: usize,
}

impl PointBuffer {
    /// Create a buffer able to hold `points` records
    pub fn with_capacity_points(points: usize) -> Self {
        Self {
            words: vec![0; points * WORDS_PER_POINT],
            used_words: 0,
        }
    }

    /// Create a buffer with the protocol's maximum frame capacity
    pub fn with_max_capacity() -> Self {
        Self {
            words: vec![0; crate::protocol::MAX_PAYLOAD_WORDS],
            used_words: 0,
        }
    }

    /// Capacity in point records
    pub fn capacity_points(&self) -> usize {
        self.words.len() / WORDS_PER_POINT
    }

    /// Number of records currently held
    pub fn point_count(&self) -> usize {
        self.used_words / WORDS_PER_POINT
    }

    /// Payload byte length (`5 * count * 2`)
    pub fn byte_len(&self) -> usize {
        self.used_words * 2
    }

    /// Used words as a slice of records
    pub fn as_words(&self) -> &[i16] {
        &self.words[..self.used_words]
    }

    /// Reserve the region for `points` records, zeroing it first.
    ///
    /// Fails with [`Error::CapacityExceeded`] instead of growing; the
    /// capacity bound is the contract with the wire protocol.
    pub(crate) fn reset_for(&mut self, points: usize) -> Result<&mut [i16]> {
        let needed = points * WORDS_PER_POINT;
        if needed > self.words.len() {
            return Err(Error::CapacityExceeded {
                needed: needed * 2,
                capacity: self.words.len() * 2,
            });
        }
        self.used_words = 0;
        let region = &mut self.words[..needed];
        region.fill(0);
        Ok(region)
    }

    /// Commit the number of records actually written
    pub(crate) fn set_point_count(&mut self, points: usize) {
        debug_assert!(points * WORDS_PER_POINT <= self.words.len());
        self.used_words = points * WORDS_PER_POINT;
    }

    /// Serialize the used region as a little-endian wire payload
    pub fn to_payload(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.byte_len());
        for &w in self.as_words() {
            buf.put_i16_le(w);
        }
        buf.freeze()
    }
}

/// Decoded, floating-point point cloud
///
/// Rebuilt (cleared and refilled) every frame on the consumer side;
/// there is no persistent point identity across frames.
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    /// Positions in meters, in the consumer's global frame
    pub positions: Vec<[f32; 3]>,
    /// RGB colors, parallel to `positions`
    pub colors: Vec<[u8; 3]>,
}

impl PointCloud {
    /// Create an empty cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cloud with room for `points`
    pub fn with_capacity(points: usize) -> Self {
        Self {
            positions: Vec::with_capacity(points),
            colors: Vec::with_capacity(points),
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the cloud has no points
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Remove all points, keeping allocations
    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
    }

    /// Append one point
    pub fn push(&mut self, position: [f32; 3], color: [u8; 3]) {
        self.positions.push(position);
        self.colors.push(color);
    }

    /// Append all points of `other`, preserving their order
    pub fn append_cloud(&mut self, other: &PointCloud) {
        self.positions.extend_from_slice(&other.positions);
        self.colors.extend_from_slice(&other.colors);
    }
}
