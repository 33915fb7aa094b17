//! Point-cloud encoder
//!
//! Converts one raw depth+color frame into the compact wire
//! representation: per point, map the texture coordinate to a color
//! pixel, apply the configured camera transform, quantize to
//! fixed-point millimeters, and pack five `i16` words. Optionally drops
//! points outside the spatial cutoff and compacts the survivors.
//!
//! The point list is partitioned into fixed 10,000-point chunks handed
//! to a configurable number of worker threads. In filtered mode the
//! only cross-worker state is an atomic next-free-slot counter, so the
//! physical order of compacted output is unspecified (set semantics);
//! unfiltered output keeps input order.

mod scalar;
mod simd;
mod vector;

use std::sync::atomic::AtomicUsize;

use crate::cloud::{CameraTransform, ColorImage, PointBuffer, BYTES_PER_POINT, WORDS_PER_POINT};
use crate::error::Result;

/// Static chunk size for parallel partitioning
pub const CHUNK_SIZE: usize = 10_000;

/// Spatial cutoff: keep `0 < z <= FILTER_Z_MAX` (camera-local meters)
pub const FILTER_Z_MAX: f32 = 1.5;

/// Spatial cutoff: keep `-FILTER_X_LIMIT < x < FILTER_X_LIMIT`
pub const FILTER_X_LIMIT: f32 = 2.0;

/// One raw frame as borrowed slices
///
/// `positions` and `tex_coords` are parallel; texture coordinates are
/// normalized `(u, v)` in `[0, 1] x [0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
    /// Camera-local vertex positions in meters
    pub positions: &'a [[f32; 3]],
    /// Normalized texture coordinates, parallel to `positions`
    pub tex_coords: &'a [[f32; 2]],
    /// Color frame the texture coordinates index into
    pub color: ColorImage<'a>,
}

impl<'a> RawFrame<'a> {
    /// Number of points in the frame
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the frame has no points
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Owned raw frame, as produced by a frame source
#[derive(Debug, Clone, Default)]
pub struct OwnedRawFrame {
    /// Camera-local vertex positions in meters
    pub positions: Vec<[f32; 3]>,
    /// Normalized texture coordinates, parallel to `positions`
    pub tex_coords: Vec<[f32; 2]>,
    /// Packed color pixel data
    pub color_data: Vec<u8>,
    /// Color frame width in pixels
    pub width: usize,
    /// Color frame height in pixels
    pub height: usize,
    /// Bytes per color pixel (>= 3)
    pub bytes_per_pixel: usize,
    /// Color row stride in bytes
    pub stride_bytes: usize,
}

impl OwnedRawFrame {
    /// Borrow as a [`RawFrame`] for encoding
    pub fn as_frame(&self) -> RawFrame<'_> {
        RawFrame {
            positions: &self.positions,
            tex_coords: &self.tex_coords,
            color: ColorImage::new(
                &self.color_data,
                self.width,
                self.height,
                self.bytes_per_pixel,
                self.stride_bytes,
            ),
        }
    }
}

/// Encoder configuration
///
/// An explicit value passed at construction; there is no ambient global
/// configuration state.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Enable the spatial cutoff filter and output compaction
    pub filter: bool,
    /// Use the 4-wide vectorized path instead of the scalar loop
    pub vectorized: bool,
    /// Worker thread count for parallel encode (0 is treated as 1)
    pub threads: usize,
    /// Transform applied to every vertex before quantization
    pub transform: CameraTransform,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            filter: false,
            vectorized: true,
            threads: 1,
            transform: CameraTransform::identity(),
        }
    }
}

impl EncoderConfig {
    /// Enable or disable the spatial cutoff filter
    pub fn filter(mut self, enabled: bool) -> Self {
        self.filter = enabled;
        self
    }

    /// Enable or disable the vectorized path
    pub fn vectorized(mut self, enabled: bool) -> Self {
        self.vectorized = enabled;
        self
    }

    /// Set the worker thread count
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the encode-side camera transform
    pub fn transform(mut self, transform: CameraTransform) -> Self {
        self.transform = transform;
        self
    }
}

/// The point-cloud encoder
#[derive(Debug)]
pub struct PointEncoder {
    config: EncoderConfig,
}

impl PointEncoder {
    /// Create an encoder with the given configuration
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// The active configuration
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode one frame into `out`, returning the payload byte length.
    ///
    /// `out`'s used region is fully overwritten; a frame exceeding its
    /// capacity fails with [`crate::error::Error::CapacityExceeded`]
    /// without touching the buffer contents.
    ///
    /// Filtered output is compacted with no gaps; its point count is
    /// the number of points passing the cutoff, but their order in the
    /// buffer is unspecified and may vary between runs.
    pub fn encode(&self, frame: &RawFrame<'_>, out: &mut PointBuffer) -> Result<usize> {
        debug_assert_eq!(frame.positions.len(), frame.tex_coords.len());

        let n = frame.len();
        let region = out.reset_for(n)?;
        if n == 0 {
            out.set_point_count(0);
            return Ok(0);
        }

        let job = EncodeJob {
            positions: frame.positions,
            tex_coords: frame.tex_coords,
            color: frame.color,
            transform: &self.config.transform,
            columns: self.config.transform.columns(),
        };

        let threads = self.config.threads.max(1);
        let kept = if self.config.filter {
            self.encode_filtered(&job, region, n, threads)
        } else {
            self.encode_unfiltered(&job, region, n, threads);
            n
        };

        out.set_point_count(kept);
        Ok(kept * BYTES_PER_POINT)
    }

    /// Unfiltered: every input index maps to the same output index, so
    /// the output region splits into per-chunk slices distributed
    /// round-robin across workers (static schedule).
    fn encode_unfiltered(&self, job: &EncodeJob<'_>, region: &mut [i16], n: usize, threads: usize) {
        let vectorized = self.config.vectorized;
        let encode_chunk = |chunk_index: usize, out_chunk: &mut [i16]| {
            let start = chunk_index * CHUNK_SIZE;
            let end = (start + CHUNK_SIZE).min(n);
            if vectorized {
                vector::encode_range_unfiltered(job, start..end, out_chunk);
            } else {
                scalar::encode_range_unfiltered(job, start..end, out_chunk);
            }
        };

        if threads == 1 {
            for (c, out_chunk) in region.chunks_mut(CHUNK_SIZE * WORDS_PER_POINT).enumerate() {
                encode_chunk(c, out_chunk);
            }
            return;
        }

        let mut per_worker: Vec<Vec<(usize, &mut [i16])>> =
            (0..threads).map(|_| Vec::new()).collect();
        for (c, out_chunk) in region.chunks_mut(CHUNK_SIZE * WORDS_PER_POINT).enumerate() {
            per_worker[c % threads].push((c, out_chunk));
        }

        std::thread::scope(|scope| {
            for worker_chunks in per_worker {
                let encode_chunk = &encode_chunk;
                scope.spawn(move || {
                    for (c, out_chunk) in worker_chunks {
                        encode_chunk(c, out_chunk);
                    }
                });
            }
        });
    }

    /// Filtered: kept points claim output slots through a shared atomic
    /// counter, the sole synchronization point between workers.
    fn encode_filtered(
        &self,
        job: &EncodeJob<'_>,
        region: &mut [i16],
        n: usize,
        threads: usize,
    ) -> usize {
        let vectorized = self.config.vectorized;
        let counter = AtomicUsize::new(0);
        let slots = SlotWriter::new(region);

        let encode_chunk = |chunk_index: usize| {
            let start = chunk_index * CHUNK_SIZE;
            let end = (start + CHUNK_SIZE).min(n);
            if vectorized {
                vector::encode_range_filtered(job, start..end, &slots, &counter);
            } else {
                scalar::encode_range_filtered(job, start..end, &slots, &counter);
            }
        };

        let chunk_count = n.div_ceil(CHUNK_SIZE);
        if threads == 1 {
            for c in 0..chunk_count {
                encode_chunk(c);
            }
        } else {
            std::thread::scope(|scope| {
                for w in 0..threads {
                    let encode_chunk = &encode_chunk;
                    scope.spawn(move || {
                        let mut c = w;
                        while c < chunk_count {
                            encode_chunk(c);
                            c += threads;
                        }
                    });
                }
            });
        }

        counter.into_inner()
    }
}

/// Read-only inputs shared by all workers for one encode call
struct EncodeJob<'a> {
    pub positions: &'a [[f32; 3]],
    pub tex_coords: &'a [[f32; 2]],
    pub color: ColorImage<'a>,
    pub transform: &'a CameraTransform,
    /// Transform as padded column vectors for the 4-lane path
    pub columns: [[f32; 4]; 4],
}

/// Shared compacted-output writer for filtered mode.
///
/// Each slot index is claimed exactly once through the atomic counter's
/// `fetch_add`, so concurrent writes never alias.
struct SlotWriter {
    ptr: *mut i16,
    len_words: usize,
}

unsafe impl Send for SlotWriter {}
unsafe impl Sync for SlotWriter {}

impl SlotWriter {
    fn new(region: &mut [i16]) -> Self {
        Self {
            ptr: region.as_mut_ptr(),
            len_words: region.len(),
        }
    }

    /// Write one record into `slot`.
    ///
    /// `slot` must come from the shared counter; the kept count can
    /// never exceed the input count, which was capacity-checked before
    /// encoding began.
    pub fn write(&self, slot: usize, words: [i16; WORDS_PER_POINT]) {
        let offset = slot * WORDS_PER_POINT;
        assert!(offset + WORDS_PER_POINT <= self.len_words);
        // SAFETY: offset is in bounds (asserted above) and no other
        // thread holds this slot, since fetch_add hands out each index
        // exactly once.
        unsafe {
            std::ptr::copy_nonoverlapping(words.as_ptr(), self.ptr.add(offset), WORDS_PER_POINT);
        }
    }
}

/// The spatial cutoff predicate, evaluated on camera-local coordinates
/// before the transform and the fixed-point scale.
#[inline]
fn passes_filter(p: [f32; 3]) -> bool {
    0.0 < p[2] && p[2] <= FILTER_Z_MAX && -FILTER_X_LIMIT < p[0] && p[0] < FILTER_X_LIMIT
}
