// Copyright 2026 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major 4×4 affine transform.
//!
//! Layers carry a full 3-D transform so that the renderer can upload it
//! directly, but all geometry in this crate lives on the `z = 0` plane:
//! [`project_point`](Transform3d::project_point) maps a 2-D point through the
//! matrix and [`inverse`](Transform3d::inverse) undoes it for hit testing.

use core::ops::Mul;

use kurbo::Point;

/// Pivots smaller than this are treated as zero when inverting.
const SINGULAR_EPSILON: f64 = 1e-12;

/// A column-major 4×4 affine transform stored as `[[f64; 4]; 4]`.
///
/// Each inner array is one *column* of the matrix, matching the memory layout
/// used by GPU APIs. Multiplication composes right-to-left: `a * b` applies
/// `b` first, then `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Four columns, each a 4-element array `[x, y, z, w]`.
    pub cols: [[f64; 4]; 4],
}

impl Transform3d {
    /// The 4×4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Creates a transform from a column-major 2-D array.
    #[inline]
    #[must_use]
    pub const fn from_cols_array_2d(cols: [[f64; 4]; 4]) -> Self {
        Self { cols }
    }

    /// Returns column `i` (0-based).
    ///
    /// # Panics
    ///
    /// Panics if `i >= 4`.
    #[inline]
    #[must_use]
    pub const fn col(self, i: usize) -> [f64; 4] {
        self.cols[i]
    }

    /// Creates a pure translation transform.
    #[inline]
    #[must_use]
    pub const fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            cols: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [x, y, z, 1.0],
            ],
        }
    }

    /// Creates a non-uniform scale transform.
    #[inline]
    #[must_use]
    pub const fn from_scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            cols: [
                [sx, 0.0, 0.0, 0.0],
                [0.0, sy, 0.0, 0.0],
                [0.0, 0.0, sz, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Creates a rotation around the Z axis (radians).
    #[inline]
    #[must_use]
    pub fn from_rotation_z(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self {
            cols: [
                [c, s, 0.0, 0.0],
                [-s, c, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Returns `true` if this is exactly the identity matrix.
    #[inline]
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Is this transform [finite]?
    ///
    /// [finite]: f64::is_finite
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.cols.iter().flatten().all(|v| v.is_finite())
    }

    /// Maps a point on the `z = 0` plane through this transform.
    ///
    /// The result is divided by the homogeneous `w` component when it is
    /// neither zero nor one.
    #[must_use]
    pub fn project_point(&self, point: Point) -> Point {
        let c = &self.cols;
        let x = c[0][0] * point.x + c[1][0] * point.y + c[3][0];
        let y = c[0][1] * point.x + c[1][1] * point.y + c[3][1];
        let w = c[0][3] * point.x + c[1][3] * point.y + c[3][3];
        if w == 0.0 || w == 1.0 {
            Point::new(x, y)
        } else {
            Point::new(x / w, y / w)
        }
    }

    /// Returns the inverse transform, or `None` if the matrix is singular.
    ///
    /// Uses Gauss-Jordan elimination with partial pivoting.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        // Work in row-major form: m[row][col].
        let mut m = [[0.0_f64; 4]; 4];
        let mut inv = [[0.0_f64; 4]; 4];
        for row in 0..4 {
            for col in 0..4 {
                m[row][col] = self.cols[col][row];
            }
            inv[row][row] = 1.0;
        }

        for pivot_col in 0..4 {
            let mut pivot_row = pivot_col;
            for row in pivot_col + 1..4 {
                if m[row][pivot_col].abs() > m[pivot_row][pivot_col].abs() {
                    pivot_row = row;
                }
            }
            let pivot = m[pivot_row][pivot_col];
            if pivot.abs() < SINGULAR_EPSILON || !pivot.is_finite() {
                return None;
            }
            m.swap(pivot_col, pivot_row);
            inv.swap(pivot_col, pivot_row);

            for col in 0..4 {
                m[pivot_col][col] /= pivot;
                inv[pivot_col][col] /= pivot;
            }
            for row in 0..4 {
                if row == pivot_col {
                    continue;
                }
                let factor = m[row][pivot_col];
                if factor == 0.0 {
                    continue;
                }
                for col in 0..4 {
                    m[row][col] -= factor * m[pivot_col][col];
                    inv[row][col] -= factor * inv[pivot_col][col];
                }
            }
        }

        let mut cols = [[0.0_f64; 4]; 4];
        for row in 0..4 {
            for col in 0..4 {
                cols[col][row] = inv[row][col];
            }
        }
        Some(Self { cols })
    }

    /// Returns the matrix as 16 column-major `f32` values for GPU upload.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "GPU uniforms are single precision"
    )]
    pub fn to_cols_array_f32(&self) -> [f32; 16] {
        let mut out = [0.0_f32; 16];
        for (i, v) in self.cols.iter().flatten().enumerate() {
            out[i] = *v as f32;
        }
        out
    }
}

impl Default for Transform3d {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform3d {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let a = &self.cols;
        let b = &rhs.cols;
        let mut out = [[0.0_f64; 4]; 4];
        let mut j = 0;
        while j < 4 {
            let mut i = 0;
            while i < 4 {
                out[j][i] =
                    a[0][i] * b[j][0] + a[1][i] * b[j][1] + a[2][i] * b[j][2] + a[3][i] * b[j][3];
                i += 1;
            }
            j += 1;
        }
        Self { cols: out }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn default_is_identity() {
        assert_eq!(Transform3d::default(), Transform3d::IDENTITY);
        assert!(Transform3d::default().is_identity());
    }

    #[test]
    fn identity_multiply() {
        let t = Transform3d::from_translation(1.0, 2.0, 3.0);
        assert_eq!(Transform3d::IDENTITY * t, t);
        assert_eq!(t * Transform3d::IDENTITY, t);
    }

    #[test]
    fn scale_then_translate() {
        let s = Transform3d::from_scale(2.0, 2.0, 2.0);
        let t = Transform3d::from_translation(3.0, 4.0, 0.0);
        // Scale first, then translate: T * S
        let combined = t * s;
        assert_eq!(combined.col(0), [2.0, 0.0, 0.0, 0.0]);
        assert_eq!(combined.col(3), [3.0, 4.0, 0.0, 1.0]);
        assert_close(combined.project_point(Point::new(1.0, 1.0)), Point::new(5.0, 6.0));
    }

    #[test]
    fn rotation_z_ninety_degrees_projects() {
        let r = Transform3d::from_rotation_z(core::f64::consts::FRAC_PI_2);
        assert_close(r.project_point(Point::new(1.0, 0.0)), Point::new(0.0, 1.0));
    }

    #[test]
    fn inverse_round_trips_points() {
        let t = Transform3d::from_translation(10.0, -4.0, 0.0)
            * Transform3d::from_rotation_z(0.3)
            * Transform3d::from_scale(2.0, 0.5, 1.0);
        let inv = t.inverse().unwrap();
        let p = Point::new(7.0, 11.0);
        assert_close(inv.project_point(t.project_point(p)), p);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let t = Transform3d::from_scale(0.0, 1.0, 1.0);
        assert!(t.inverse().is_none());
    }

    #[test]
    fn nan_is_not_finite() {
        let mut t = Transform3d::IDENTITY;
        t.cols[2][1] = f64::NAN;
        assert!(!t.is_finite());
        assert!(Transform3d::IDENTITY.is_finite());
    }

    #[test]
    fn f32_export_is_column_major() {
        let t = Transform3d::from_translation(5.0, 6.0, 7.0);
        let a = t.to_cols_array_f32();
        assert_eq!(&a[12..], &[5.0, 6.0, 7.0, 1.0]);
    }
}
