//! 4-wide vectorized encode path
//!
//! Processes four points per iteration: texture mapping and the range
//! test run lane-parallel across the four points, the transform runs as
//! 4-lane column math per point, and color byte gathers stay scalar
//! (the four offsets differ per lane). A range length that is not a
//! multiple of four falls back to the scalar path for the last 0-3
//! points; dropping them would lose data.

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cloud::{pack_color, CONV_RATE, WORDS_PER_POINT};

use super::simd::Float4;
use super::{scalar, EncodeJob, SlotWriter, FILTER_X_LIMIT, FILTER_Z_MAX};

const LANES: usize = 4;

/// Encode `range` into `out_chunk`, input order preserved
pub(super) fn encode_range_unfiltered(
    job: &EncodeJob<'_>,
    range: Range<usize>,
    out_chunk: &mut [i16],
) {
    debug_assert_eq!(out_chunk.len(), range.len() * WORDS_PER_POINT);
    let base = range.start;
    let groups = range.len() / LANES;

    for g in 0..groups {
        let i = base + g * LANES;
        let records = encode_group(job, i);
        for (lane, words) in records.iter().enumerate() {
            let at = (g * LANES + lane) * WORDS_PER_POINT;
            out_chunk[at..at + WORDS_PER_POINT].copy_from_slice(words);
        }
    }

    // Scalar tail for the remainder.
    let tail = base + groups * LANES;
    scalar::encode_range_unfiltered(
        job,
        tail..range.end,
        &mut out_chunk[groups * LANES * WORDS_PER_POINT..],
    );
}

/// Encode `range` with the cutoff filter, compacting survivors through
/// the shared slot counter
pub(super) fn encode_range_filtered(
    job: &EncodeJob<'_>,
    range: Range<usize>,
    slots: &SlotWriter,
    counter: &AtomicUsize,
) {
    let base = range.start;
    let groups = range.len() / LANES;

    let z_lo = Float4::splat(0.0);
    let z_hi = Float4::splat(FILTER_Z_MAX);
    let x_lo = Float4::splat(-FILTER_X_LIMIT);
    let x_hi = Float4::splat(FILTER_X_LIMIT);

    for g in 0..groups {
        let i = base + g * LANES;
        let p = &job.positions[i..i + LANES];

        // Range test on the camera-local coordinates, lane-parallel.
        let xs = Float4::new([p[0][0], p[1][0], p[2][0], p[3][0]]);
        let zs = Float4::new([p[0][2], p[1][2], p[2][2], p[3][2]]);
        let mask = zs
            .gt(z_lo)
            .and(zs.le(z_hi))
            .and(xs.gt(x_lo))
            .and(xs.lt(x_hi));

        // The mask degrades to four independent scalar decisions; each
        // kept lane claims its own output slot.
        let records = encode_group(job, i);
        for (lane, words) in records.iter().enumerate() {
            if mask.lane(lane) {
                let slot = counter.fetch_add(1, Ordering::Relaxed);
                slots.write(slot, *words);
            }
        }
    }

    scalar::encode_range_filtered(job, base + groups * LANES..range.end, slots, counter);
}

/// Encode four consecutive points starting at `i`
#[inline]
fn encode_group(job: &EncodeJob<'_>, i: usize) -> [[i16; WORDS_PER_POINT]; LANES] {
    let tc = &job.tex_coords[i..i + LANES];
    let pos = &job.positions[i..i + LANES];

    // Pixel mapping for the four texture coordinates at once.
    let us = Float4::new([tc[0][0], tc[1][0], tc[2][0], tc[3][0]]);
    let vs = Float4::new([tc[0][1], tc[1][1], tc[2][1], tc[3][1]]);
    let half = Float4::splat(0.5);
    let px = (us * Float4::splat(job.color.width() as f32) + half).to_array();
    let py = (vs * Float4::splat(job.color.height() as f32) + half).to_array();

    let cx = Float4::new(job.columns[0]);
    let cy = Float4::new(job.columns[1]);
    let cz = Float4::new(job.columns[2]);
    let ct = Float4::new(job.columns[3]);
    let conv = Float4::splat(CONV_RATE);

    let mut records = [[0i16; WORDS_PER_POINT]; LANES];
    for lane in 0..LANES {
        // Transform one point: x*colX + y*colY + z*colZ + colT, scaled
        // to millimeters in the same step.
        let v = Float4::splat(pos[lane][0]) * cx
            + Float4::splat(pos[lane][1]) * cy
            + Float4::splat(pos[lane][2]) * cz
            + ct;
        let mm = (v * conv).to_array();

        // Color gather stays scalar; the four offsets differ per lane.
        let w = job.color.width() as i32;
        let h = job.color.height() as i32;
        let x = (px[lane] as i32).clamp(0, w - 1) as usize;
        let y = (py[lane] as i32).clamp(0, h - 1) as usize;
        let color = pack_color(job.color.rgb_at(x, y));

        records[lane] = [
            mm[0] as i16,
            mm[1] as i16,
            mm[2] as i16,
            color[0] as i16,
            color[1] as i16,
        ];
    }
    records
}
