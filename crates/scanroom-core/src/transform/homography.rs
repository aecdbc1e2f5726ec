//! Planar homographies (3x3 projective transforms).
//!
//! A homography maps source coordinates `(x, y)` to output coordinates by
//! multiplying the homogeneous vector `(x, y, 1)` and dividing by the third
//! component:
//!
//! ```text
//! | u' |   | h0 h1 h2 |   | x |
//! | v' | = | h3 h4 h5 | * | y |      u = u' / w,  v = v' / w
//! | w  |   | h6 h7 h8 |   | 1 |
//! ```
//!
//! Matrices are stored row-major and normalized so that `h8 == 1` whenever
//! that entry is non-zero. The `f64` matrix is what descriptors persist and
//! what bounds checks use; resampling goes through the `imageproc`
//! [`Projection`] built by [`Homography::to_projection`].

use imageproc::geometric_transformations::Projection;

use crate::error::EditError;
use crate::ops::Point;

/// Smallest `|w|` accepted when projecting a point.
const MIN_W: f64 = 1e-12;

/// Relative tolerance for treating a determinant or pivot as zero.
const SINGULAR_EPS: f64 = 1e-12;

/// A 3x3 projective transform in row-major order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography {
    m: [f64; 9],
}

impl Homography {
    pub fn identity() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Build a homography from nine row-major values.
    ///
    /// # Errors
    ///
    /// [`EditError::DegenerateTransform`] if any value is not finite or the
    /// matrix is singular.
    pub fn from_row_major(m: [f64; 9]) -> Result<Self, EditError> {
        if m.iter().any(|v| !v.is_finite()) {
            return Err(EditError::DegenerateTransform(
                "homography contains non-finite values".to_string(),
            ));
        }

        let mut m = m;
        if m[8].abs() > SINGULAR_EPS {
            let scale = m[8];
            for v in &mut m {
                *v /= scale;
            }
        }

        let h = Self { m };
        h.check_invertible()?;
        Ok(h)
    }

    /// Solve the homography mapping four source points onto four targets.
    ///
    /// Sets `h8 = 1` and solves the remaining eight unknowns from the
    /// eight linear equations given by the point pairs.
    pub fn from_point_pairs(src: &[Point; 4], dst: &[Point; 4]) -> Result<Self, EditError> {
        // Augmented 8x9 system, one row per equation.
        let mut a = [[0.0f64; 9]; 8];
        for i in 0..4 {
            let (x, y) = (src[i].x, src[i].y);
            let (u, v) = (dst[i].x, dst[i].y);
            a[2 * i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u, u];
            a[2 * i + 1] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v, v];
        }

        let solution = solve_linear_system(&mut a).ok_or_else(|| {
            EditError::DegenerateTransform("point correspondence has no unique solution".to_string())
        })?;

        let mut m = [1.0f64; 9];
        m[..8].copy_from_slice(&solution);
        Self::from_row_major(m)
    }

    /// Homography mapping a quadrilateral onto the rectangle `[0, width] x [0, height]`.
    ///
    /// Corners are taken as top-left, top-right, bottom-right, bottom-left.
    pub fn from_quad_to_rect(quad: &[Point; 4], width: f64, height: f64) -> Result<Self, EditError> {
        let rect = [
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(width, height),
            Point::new(0.0, height),
        ];
        Self::from_point_pairs(quad, &rect)
    }

    /// The nine row-major values.
    pub fn to_array(&self) -> [f64; 9] {
        self.m
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
            + m[2] * (m[3] * m[7] - m[4] * m[6])
    }

    fn check_invertible(&self) -> Result<(), EditError> {
        let scale = self.m.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        let det = self.determinant();
        if scale == 0.0 || det.abs() <= SINGULAR_EPS * scale.powi(3) {
            return Err(EditError::DegenerateTransform(format!(
                "homography is singular (determinant {det:e})"
            )));
        }
        Ok(())
    }

    /// Map a point, or `None` if it lands on the line at infinity.
    #[inline]
    pub fn project(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let m = &self.m;
        let w = m[6] * x + m[7] * y + m[8];
        if w.abs() < MIN_W {
            return None;
        }
        Some((
            (m[0] * x + m[1] * y + m[2]) / w,
            (m[3] * x + m[4] * y + m[5]) / w,
        ))
    }

    /// The same transform as an `imageproc` projection in index space, where
    /// the centre of pixel `(i, j)` sits at `(i, j)` rather than
    /// `(i + 0.5, j + 0.5)`.
    ///
    /// `None` if the matrix is singular at `f32` precision.
    pub fn to_projection(&self) -> Option<Projection> {
        let projection = Projection::from_matrix(self.m.map(|v| v as f32))?;
        Some(Projection::translate(-0.5, -0.5) * projection * Projection::translate(0.5, 0.5))
    }

    /// Homogeneous `w` component for a point; its sign tells which side of
    /// the horizon the point falls on.
    #[inline]
    pub fn w_component(&self, x: f64, y: f64) -> f64 {
        self.m[6] * x + self.m[7] * y + self.m[8]
    }
}

/// Gaussian elimination with partial pivoting on an 8x9 augmented matrix.
///
/// Returns `None` when a pivot is numerically zero.
fn solve_linear_system(a: &mut [[f64; 9]; 8]) -> Option<[f64; 8]> {
    const N: usize = 8;

    let scale = a
        .iter()
        .flat_map(|row| row[..N].iter())
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return None;
    }

    for col in 0..N {
        let pivot_row = (col..N).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot_row][col].abs() <= SINGULAR_EPS * scale {
            return None;
        }
        a.swap(col, pivot_row);

        let pivot = a[col][col];
        for row in (col + 1)..N {
            let factor = a[row][col] / pivot;
            if factor == 0.0 {
                continue;
            }
            for k in col..=N {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut x = [0.0f64; N];
    for row in (0..N).rev() {
        let mut sum = a[row][N];
        for k in (row + 1)..N {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Some(x)
    } else {
        None
    }
}
