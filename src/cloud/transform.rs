//! Rigid camera transforms
//!
//! A [`CameraTransform`] maps one camera's local frame into the shared
//! global frame. Transforms come out of an offline registration step
//! and stay constant for the life of the process; one is bound to each
//! camera connection.

/// A 4x4 rigid transform (rotation + translation)
///
/// Row-major storage. The last row is expected to be the homogeneous
/// `[0, 0, 0, 1]`; only the upper three rows participate in
/// [`CameraTransform::apply`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransform {
    rows: [[f32; 4]; 4],
}

impl CameraTransform {
    /// The identity transform (camera frame == global frame)
    pub fn identity() -> Self {
        Self {
            rows: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Build from row-major rows as produced by registration
    pub fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self { rows }
    }

    /// Build from a rotation matrix and a translation vector
    pub fn from_rotation_translation(rotation: [[f32; 3]; 3], translation: [f32; 3]) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for r in 0..3 {
            rows[r][..3].copy_from_slice(&rotation[r]);
            rows[r][3] = translation[r];
        }
        rows[3] = [0.0, 0.0, 0.0, 1.0];
        Self { rows }
    }

    /// Apply the transform to a position in meters
    #[inline]
    pub fn apply(&self, p: [f32; 3]) -> [f32; 3] {
        let m = &self.rows;
        [
            m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2] + m[0][3],
            m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2] + m[1][3],
            m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2] + m[2][3],
        ]
    }

    /// Column vectors `[colX, colY, colZ, colT]`, each padded to 4 lanes.
    ///
    /// Shaped for the vectorized encode path: a transformed point is
    /// `x * colX + y * colY + z * colZ + colT` with lane 3 unused.
    pub(crate) fn columns(&self) -> [[f32; 4]; 4] {
        let m = &self.rows;
        [
            [m[0][0], m[1][0], m[2][0], 0.0],
            [m[0][1], m[1][1], m[2][1], 0.0],
            [m[0][2], m[1][2], m[2][2], 0.0],
            [m[0][3], m[1][3], m[2][3], 0.0],
        ]
    }
}

impl Default for CameraTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_leaves_points_unchanged() {
        let t = CameraTransform::identity();
        let p = [0.5, -1.25, 2.0];
        assert_eq!(t.apply(p), p);
    }

    #[test]
    fn test_translation_only() {
        let t = CameraTransform::from_rotation_translation(
            [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            [1.0, -2.0, 0.5],
        );
        assert_eq!(t.apply([0.0, 0.0, 0.0]), [1.0, -2.0, 0.5]);
        assert_eq!(t.apply([1.0, 1.0, 1.0]), [2.0, -1.0, 1.5]);
    }

    #[test]
    fn test_rotation_z_90_degrees() {
        // 90 degrees about Z: (x, y, z) -> (-y, x, z)
        let t = CameraTransform::from_rotation_translation(
            [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]],
            [0.0, 0.0, 0.0],
        );
        let out = t.apply([1.0, 2.0, 3.0]);
        assert!((out[0] - -2.0).abs() < 1e-6);
        assert!((out[1] - 1.0).abs() < 1e-6);
        assert!((out[2] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_columns_match_apply() {
        let t = CameraTransform::from_rows([
            [0.59, -0.03, 0.80, -0.85],
            [0.10, 0.99, -0.03, 0.00],
            [-0.80, 0.09, 0.59, 0.43],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        let p = [0.3, -0.7, 1.1];
        let cols = t.columns();
        let mut via_cols = [0.0f32; 3];
        for lane in 0..3 {
            via_cols[lane] =
                p[0] * cols[0][lane] + p[1] * cols[1][lane] + p[2] * cols[2][lane] + cols[3][lane];
        }
        let direct = t.apply(p);
        for lane in 0..3 {
            assert!((via_cols[lane] - direct[lane]).abs() < 1e-6);
        }
    }
}
