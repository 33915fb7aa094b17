//! Stride-aware color image access
//!
//! Color frames arrive with a row stride that may exceed
//! `width * bytes_per_pixel` due to padding. All row addressing goes
//! through [`ColorImage`] so the stride invariant lives in one place.

/// Borrowed view of a packed color frame
///
/// Assumes a packed layout with at least 3 bytes per pixel, R first.
/// Zero-sized frames are a caller precondition violation.
#[derive(Debug, Clone, Copy)]
pub struct ColorImage<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
    stride_bytes: usize,
}

impl<'a> ColorImage<'a> {
    /// Create a view over raw frame data.
    ///
    /// `stride_bytes` is the distance between row starts and must be
    /// used for row addressing, never `width * bytes_per_pixel`.
    pub fn new(
        data: &'a [u8],
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
        stride_bytes: usize,
    ) -> Self {
        debug_assert!(width > 0 && height > 0);
        debug_assert!(bytes_per_pixel >= 3);
        debug_assert!(stride_bytes >= width * bytes_per_pixel);
        debug_assert!(data.len() >= (height - 1) * stride_bytes + width * bytes_per_pixel);
        Self {
            data,
            width,
            height,
            bytes_per_pixel,
            stride_bytes,
        }
    }

    /// Image width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Map a normalized texture coordinate to a clamped integer pixel.
    ///
    /// Round-half-up (`u * width + 0.5` truncated), matching the sensor
    /// SDK's texture mapping, then clamped into the frame.
    #[inline]
    pub fn map_tex(&self, u: f32, v: f32) -> (usize, usize) {
        let x = (u * self.width as f32 + 0.5) as i32;
        let y = (v * self.height as f32 + 0.5) as i32;
        (
            x.clamp(0, self.width as i32 - 1) as usize,
            y.clamp(0, self.height as i32 - 1) as usize,
        )
    }

    /// Byte offset of pixel `(x, y)` in the frame data
    #[inline]
    pub fn pixel_offset(&self, x: usize, y: usize) -> usize {
        x * self.bytes_per_pixel + y * self.stride_bytes
    }

    /// RGB bytes at pixel `(x, y)`
    #[inline]
    pub fn rgb_at(&self, x: usize, y: usize) -> [u8; 3] {
        let idx = self.pixel_offset(x, y);
        [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
    }
}
