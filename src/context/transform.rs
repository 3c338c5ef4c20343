//! Transform operations for the canvas.

use super::Canvas;
use crate::matrix::Matrix;

impl Canvas {
    /// Translate the coordinate system.
    pub fn translate(&mut self, x: f32, y: f32) {
        log::debug!(target: "canvas", "translate {} {}", x, y);
        if x.is_finite() && y.is_finite() {
            self.state.transform = self.state.transform.pre_translate(x, y);
        }
    }

    /// Rotate the coordinate system by an angle in radians.
    pub fn rotate(&mut self, angle: f32) {
        log::debug!(target: "canvas", "rotate {}", angle);
        if angle.is_finite() {
            self.state.transform = self.state.transform.pre_rotate(angle);
        }
    }

    /// Scale the coordinate system.
    pub fn scale(&mut self, x: f32, y: f32) {
        log::debug!(target: "canvas", "scale {} {}", x, y);
        if x.is_finite() && y.is_finite() {
            self.state.transform = self.state.transform.pre_scale(x, y);
        }
    }

    /// Multiply the current matrix on the right by `matrix`.
    pub fn transform(&mut self, matrix: Matrix) {
        log::debug!(target: "canvas", "transform {:?}", matrix);
        if matrix.is_finite() {
            self.state.transform = self.state.transform.pre_concat(matrix);
        }
    }

    /// Replace the current transform matrix.
    pub fn set_transform(&mut self, matrix: Matrix) {
        log::debug!(target: "canvas", "set_transform {:?}", matrix);
        if matrix.is_finite() {
            self.state.transform = matrix;
        }
    }

    /// Get the current transform matrix.
    pub fn get_transform(&self) -> Matrix {
        self.state.transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_accumulates() {
        let mut canvas = Canvas::new(50, 50).unwrap();
        canvas.translate(10.0, 20.0);
        canvas.translate(5.0, -5.0);
        let t = canvas.get_transform();
        assert_eq!(t.e, 15.0);
        assert_eq!(t.f, 15.0);
    }

    #[test]
    fn test_set_transform_replaces() {
        let mut canvas = Canvas::new(50, 50).unwrap();
        canvas.translate(10.0, 20.0);
        canvas.set_transform(Matrix::identity());
        assert_eq!(canvas.get_transform(), Matrix::identity());
    }

    #[test]
    fn test_save_restore_transform() {
        let mut canvas = Canvas::new(50, 50).unwrap();
        canvas.translate(10.0, 20.0);
        canvas.save();
        canvas.translate(30.0, 40.0);
        assert_eq!(canvas.get_transform().e, 40.0);
        canvas.restore();
        assert_eq!(canvas.get_transform().e, 10.0);
        assert_eq!(canvas.get_transform().f, 20.0);
    }

    #[test]
    fn test_non_finite_transform_ignored() {
        let mut canvas = Canvas::new(50, 50).unwrap();
        canvas.translate(f32::NAN, 0.0);
        assert_eq!(canvas.get_transform(), Matrix::identity());
        canvas.set_transform(Matrix::new(f32::INFINITY, 0.0, 0.0, 1.0, 0.0, 0.0));
        assert_eq!(canvas.get_transform(), Matrix::identity());
    }
}
