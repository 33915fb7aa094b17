//! Scalar encode path
//!
//! One point at a time: texture lookup, transform, quantize, pack.
//! Also serves as the tail pass for the vectorized path when the range
//! length is not a multiple of four.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cloud::{pack_color, CONV_RATE, WORDS_PER_POINT};

use super::{passes_filter, EncodeJob, SlotWriter};

/// Encode one point into its five wire words
#[inline]
pub(super) fn encode_point(job: &EncodeJob<'_>, i: usize) -> [i16; WORDS_PER_POINT] {
    let [u, v] = job.tex_coords[i];
    let (x, y) = job.color.map_tex(u, v);
    let rgb = job.color.rgb_at(x, y);
    let color = pack_color(rgb);

    let t = job.transform.apply(job.positions[i]);
    [
        (t[0] * CONV_RATE) as i16,
        (t[1] * CONV_RATE) as i16,
        (t[2] * CONV_RATE) as i16,
        color[0] as i16,
        color[1] as i16,
    ]
}

/// Encode `range` into `out_chunk`, input order preserved.
///
/// `out_chunk` must hold exactly `range.len()` records.
pub(super) fn encode_range_unfiltered(
    job: &EncodeJob<'_>,
    range: Range<usize>,
    out_chunk: &mut [i16],
) {
    debug_assert_eq!(out_chunk.len(), range.len() * WORDS_PER_POINT);
    for (local, i) in range.enumerate() {
        let words = encode_point(job, i);
        let at = local * WORDS_PER_POINT;
        out_chunk[at..at + WORDS_PER_POINT].copy_from_slice(&words);
    }
}

/// Encode `range`, dropping points outside the cutoff and compacting
/// survivors into slots claimed from the shared counter.
pub(super) fn encode_range_filtered(
    job: &EncodeJob<'_>,
    range: Range<usize>,
    slots: &SlotWriter,
    counter: &AtomicUsize,
) {
    for i in range {
        if !passes_filter(job.positions[i]) {
            continue;
        }
        let words = encode_point(job, i);
        let slot = counter.fetch_add(1, Ordering::Relaxed);
        slots.write(slot, words);
    }
}
