// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::Vec3;

/// Column‑major 4×4 matrix in the layout uploaded as shader constants.
///
/// - Stored in column‑major order; `get(row, col)` reads `data[col * 4 + row]`.
/// - Acts on column vectors, so `a * b` applies `b` first.
///
/// # Examples
/// ```
/// use parallax_core::math::{Mat4, Vec3};
/// let t = Mat4::translation(5.0, -3.0, 2.0);
/// let p = Vec3::new(2.0, 4.0, -1.0);
/// assert_eq!(t.transform_point(&p).to_array(), [7.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mat4 {
    data: [f32; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// All sixteen entries zero. Hidden layers upload this so nothing rasterizes.
    pub const fn zero() -> Self {
        Self { data: [0.0; 16] }
    }

    /// Builds a translation matrix.
    ///
    /// Column-major layout: translation occupies the last column.
    pub const fn translation(tx: f32, ty: f32, tz: f32) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // col 0
                0.0, 1.0, 0.0, 0.0, // col 1
                0.0, 0.0, 1.0, 0.0, // col 2
                tx, ty, tz, 1.0, // col 3 (translation)
            ],
        }
    }

    /// Translation by a vector.
    pub fn translation_vec(v: Vec3) -> Self {
        let [x, y, z] = v.to_array();
        Self::translation(x, y, z)
    }

    /// Builds a non-uniform scale matrix.
    pub const fn scale(sx: f32, sy: f32, sz: f32) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // col 0
                0.0, sy, 0.0, 0.0, // col 1
                0.0, 0.0, sz, 0.0, // col 2
                0.0, 0.0, 0.0, 1.0, // col 3
            ],
        }
    }

    /// Rotation around the X axis by `angle` radians (positive pitches +Y toward +Z).
    pub fn rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        #[rustfmt::skip]
        let data = [
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   s,   0.0,
            0.0, -s,  c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        Self::new(data)
    }

    /// Creates a matrix from column-major array data.
    pub const fn new(data: [f32; 16]) -> Self {
        Self { data }
    }

    /// Creates a matrix from four rows, the way the legacy pipeline lays out
    /// its projection registers.
    pub const fn from_rows(rows: [[f32; 4]; 4]) -> Self {
        Self {
            data: [
                rows[0][0], rows[1][0], rows[2][0], rows[3][0], // col 0
                rows[0][1], rows[1][1], rows[2][1], rows[3][1], // col 1
                rows[0][2], rows[1][2], rows[2][2], rows[3][2], // col 2
                rows[0][3], rows[1][3], rows[2][3], rows[3][3], // col 3
            ],
        }
    }

    /// Returns the matrix as a column‑major array.
    pub fn to_array(self) -> [f32; 16] {
        self.data
    }

    /// Entry at `row`, `col` (both `0..4`).
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[col * 4 + row]
    }

    /// Copy with the entry at `row`, `col` replaced.
    pub fn with(mut self, row: usize, col: usize, value: f32) -> Self {
        self.data[col * 4 + row] = value;
        self
    }

    /// True when every entry is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|v| *v == 0.0)
    }

    /// Swaps rows and columns.
    pub fn transpose(&self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                out[row * 4 + col] = self.get(row, col);
            }
        }
        Self::new(out)
    }

    /// Conjugates by a reflection of `axis` (0 = x, 1 = y, 2 = z): negates
    /// the row and column of `axis` except their shared diagonal entry.
    ///
    /// Applying it to both factors of `P * V` mirrors the product the same way,
    /// since the reflection squares to identity.
    pub fn mirrored_axis(&self, axis: usize) -> Self {
        let mut out = *self;
        for i in 0..4 {
            if i != axis {
                out.data[axis * 4 + i] = -self.get(i, axis);
                out.data[i * 4 + axis] = -self.get(axis, i);
            }
        }
        out
    }

    /// Multiplies the matrix with another matrix (`self * rhs`).
    ///
    /// # Examples
    /// ```
    /// use parallax_core::math::Mat4;
    /// let a = Mat4::identity();
    /// let b = Mat4::scale(2.0, 3.0, 4.0);
    /// assert_eq!(a.multiply(&b).to_array(), b.to_array());
    /// ```
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.get(row, k) * rhs.get(k, col);
                }
                out[col * 4 + row] = sum;
            }
        }
        Self::new(out)
    }

    /// Transforms a point (assumes `w = 1`, no perspective divide).
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        let [x, y, z] = point.to_array();
        let nx = self.get(0, 0) * x + self.get(0, 1) * y + self.get(0, 2) * z + self.get(0, 3);
        let ny = self.get(1, 0) * x + self.get(1, 1) * y + self.get(1, 2) * z + self.get(1, 3);
        let nz = self.get(2, 0) * x + self.get(2, 1) * y + self.get(2, 2) * z + self.get(2, 3);
        Vec3::new(nx, ny, nz)
    }

    /// Max absolute entrywise difference; handy for tolerance checks.
    pub fn max_abs_diff(&self, other: &Self) -> f32 {
        self.data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f32::max)
    }
}

impl core::ops::Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}
