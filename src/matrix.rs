//! Matrix type for 2D affine transformations.

/// A 2D affine transformation matrix.
///
/// The matrix is represented as:
/// ```text
/// | a c e |
/// | b d f |
/// | 0 0 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Scale X component.
    pub a: f32,
    /// Skew Y component.
    pub b: f32,
    /// Skew X component.
    pub c: f32,
    /// Scale Y component.
    pub d: f32,
    /// Translate X component.
    pub e: f32,
    /// Translate Y component.
    pub f: f32,
}

/// Determinants below this magnitude are treated as non-invertible.
const DETERMINANT_EPSILON: f64 = 1e-20;

impl Matrix {
    /// Create a new matrix with the specified components.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Create an identity matrix.
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Multiply this matrix on the right by `other` (apply `other` first).
    pub fn pre_concat(&self, other: Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    /// Append a translation before this matrix.
    pub fn pre_translate(&self, x: f32, y: f32) -> Matrix {
        self.pre_concat(Matrix::new(1.0, 0.0, 0.0, 1.0, x, y))
    }

    /// Append a scale before this matrix.
    pub fn pre_scale(&self, x: f32, y: f32) -> Matrix {
        self.pre_concat(Matrix::new(x, 0.0, 0.0, y, 0.0, 0.0))
    }

    /// Append a rotation (radians) before this matrix.
    pub fn pre_rotate(&self, angle: f32) -> Matrix {
        let cos = angle.cos();
        let sin = angle.sin();
        self.pre_concat(Matrix::new(cos, sin, -sin, cos, 0.0, 0.0))
    }

    /// Map a point through this matrix.
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Determinant of the linear part, computed in f64.
    pub fn determinant(&self) -> f64 {
        self.a as f64 * self.d as f64 - self.b as f64 * self.c as f64
    }

    /// Whether the matrix maps areas to non-degenerate areas.
    pub fn is_invertible(&self) -> bool {
        self.determinant().abs() >= DETERMINANT_EPSILON
    }

    /// Invert the matrix, or None when it is degenerate.
    pub fn invert(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < DETERMINANT_EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        let a = self.d as f64 * inv;
        let b = -self.b as f64 * inv;
        let c = -self.c as f64 * inv;
        let d = self.a as f64 * inv;
        let e = -(a * self.e as f64 + c * self.f as f64);
        let f = -(b * self.e as f64 + d * self.f as f64);
        Some(Matrix {
            a: a as f32,
            b: b as f32,
            c: c as f32,
            d: d as f32,
            e: e as f32,
            f: f as f32,
        })
    }

    /// Average length of the two column vectors.
    ///
    /// Used to scale user-space stroke widths and dash lengths into
    /// device space, where path geometry already lives.
    pub fn mean_scale(&self) -> f32 {
        let col0 = (self.a * self.a + self.b * self.b).sqrt();
        let col1 = (self.c * self.c + self.d * self.d).sqrt();
        (col0 + col1) / 2.0
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.a.is_finite()
            && self.b.is_finite()
            && self.c.is_finite()
            && self.d.is_finite()
            && self.e.is_finite()
            && self.f.is_finite()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}
