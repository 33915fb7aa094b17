//! 4-wide f32 helper for the vectorized encode path
//!
//! A scalar representation with 16-byte alignment and
//! `#[inline(always)]` annotations, so LLVM can lower these operations
//! to SSE/NEON instructions when the target supports them. Behaves
//! identically to the scalar path on targets without vector units.

use std::ops::{Add, Mul};

/// A 4-wide f32 vector
#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(C, align(16))]
pub(super) struct Float4([f32; 4]);

impl Float4 {
    #[inline(always)]
    pub fn new(arr: [f32; 4]) -> Self {
        Self(arr)
    }

    /// All four lanes set to `v`
    #[inline(always)]
    pub fn splat(v: f32) -> Self {
        Self([v, v, v, v])
    }

    #[inline(always)]
    pub fn to_array(self) -> [f32; 4] {
        self.0
    }

    /// Lane-wise `self > other`
    #[inline(always)]
    pub fn gt(self, other: Self) -> Mask4 {
        Mask4([
            self.0[0] > other.0[0],
            self.0[1] > other.0[1],
            self.0[2] > other.0[2],
            self.0[3] > other.0[3],
        ])
    }

    /// Lane-wise `self < other`
    #[inline(always)]
    pub fn lt(self, other: Self) -> Mask4 {
        other.gt(self)
    }

    /// Lane-wise `self <= other`
    #[inline(always)]
    pub fn le(self, other: Self) -> Mask4 {
        Mask4([
            self.0[0] <= other.0[0],
            self.0[1] <= other.0[1],
            self.0[2] <= other.0[2],
            self.0[3] <= other.0[3],
        ])
    }
}

impl Add for Float4 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
            self.0[3] + rhs.0[3],
        ])
    }
}

impl Mul for Float4 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self([
            self.0[0] * rhs.0[0],
            self.0[1] * rhs.0[1],
            self.0[2] * rhs.0[2],
            self.0[3] * rhs.0[3],
        ])
    }
}

/// Lane-wise boolean mask produced by [`Float4`] comparisons
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Mask4([bool; 4]);

impl Mask4 {
    /// Lane-wise logical AND
    #[inline(always)]
    pub fn and(self, other: Self) -> Self {
        Self([
            self.0[0] && other.0[0],
            self.0[1] && other.0[1],
            self.0[2] && other.0[2],
            self.0[3] && other.0[3],
        ])
    }

    /// Whether `lane` passed
    #[inline(always)]
    pub fn lane(self, lane: usize) -> bool {
        self.0[lane]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Float4::new([1.0, 2.0, 3.0, 4.0]);
        let b = Float4::splat(2.0);
        assert_eq!((a * b).to_array(), [2.0, 4.0, 6.0, 8.0]);
        assert_eq!((a + b).to_array(), [3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_compare_masks() {
        let z = Float4::new([0.0, 0.5, 1.5, 2.0]);
        let in_range = z.gt(Float4::splat(0.0)).and(z.le(Float4::splat(1.5)));
        assert!(!in_range.lane(0));
        assert!(in_range.lane(1));
        assert!(in_range.lane(2));
        assert!(!in_range.lane(3));
    }

    #[test]
    fn test_lt_strict() {
        let x = Float4::new([-2.0, -1.9, 1.9, 2.0]);
        let m = x.gt(Float4::splat(-2.0)).and(x.lt(Float4::splat(2.0)));
        assert!(!m.lane(0));
        assert!(m.lane(1));
        assert!(m.lane(2));
        assert!(!m.lane(3));
    }
}
