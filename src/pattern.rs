//! Bitmap pattern paint.
//!
//! Pattern pixels are copied in at set time and converted once to linear
//! premultiplied color. Sampling is bilinear; repeating axes wrap, while
//! non-repeating axes are transparent outside the pattern rectangle and
//! clamp their neighbor texels at the edges.

use crate::color::PremulColor;
use crate::error::{CanvasError, CanvasResult};
use crate::matrix::Matrix;
use crate::style::Repetition;

/// Maximum pattern size (4096x4096).
const MAX_PATTERN_SIZE: u32 = 4096;

/// Bitmap pattern for fill/stroke operations.
#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    width: usize,
    height: usize,
    /// Linear premultiplied texels, row-major.
    pixels: Vec<PremulColor>,
    repetition: Repetition,
    /// Maps pattern space to user space; sampling applies the inverse.
    inverse_transform: Matrix,
}

impl Pattern {
    /// Create a pattern from sRGB8 RGBA pixel data with a caller stride
    /// in bytes. The data is copied.
    pub fn new(
        data: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        repetition: Repetition,
    ) -> CanvasResult<Self> {
        if width == 0 || height == 0 {
            return Err(CanvasError::InvalidArgument(
                "Pattern dimensions must be non-zero".to_string(),
            ));
        }
        if width > MAX_PATTERN_SIZE || height > MAX_PATTERN_SIZE {
            return Err(CanvasError::InvalidArgument(format!(
                "Pattern size {}x{} exceeds maximum {}x{}",
                width, height, MAX_PATTERN_SIZE, MAX_PATTERN_SIZE
            )));
        }
        if stride < width as usize * 4 {
            return Err(CanvasError::InvalidArgument(format!(
                "Stride {} too small for {} pixels per row",
                stride, width
            )));
        }
        let required = stride * (height as usize - 1) + width as usize * 4;
        if data.len() < required {
            return Err(CanvasError::InvalidArgument(format!(
                "Data length {} shorter than required {}",
                data.len(),
                required
            )));
        }

        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height as usize {
            let row = &data[y * stride..];
            for x in 0..width as usize {
                let offset = x * 4;
                pixels.push(PremulColor::from_srgb_bytes(
                    row[offset],
                    row[offset + 1],
                    row[offset + 2],
                    row[offset + 3],
                ));
            }
        }

        Ok(Self {
            width: width as usize,
            height: height as usize,
            pixels,
            repetition,
            inverse_transform: Matrix::identity(),
        })
    }

    /// Build a pattern directly from premultiplied texels.
    pub fn from_premultiplied(
        pixels: Vec<PremulColor>,
        width: usize,
        height: usize,
        repetition: Repetition,
    ) -> Self {
        debug_assert_eq!(pixels.len(), width * height);
        Self {
            width,
            height,
            pixels,
            repetition,
            inverse_transform: Matrix::identity(),
        }
    }

    /// Set the local pattern transform (pattern space to user space).
    ///
    /// A non-invertible transform makes the pattern sample transparent.
    pub fn set_transform(&mut self, transform: Matrix) {
        self.inverse_transform = transform.invert().unwrap_or(Matrix::new(
            0.0,
            0.0,
            0.0,
            0.0,
            f32::NAN,
            f32::NAN,
        ));
    }

    fn texel(&self, x: i64, y: i64) -> PremulColor {
        let x = match wrap_axis(x, self.width, self.repetition, Axis::X) {
            Some(x) => x,
            None => return PremulColor::TRANSPARENT,
        };
        let y = match wrap_axis(y, self.height, self.repetition, Axis::Y) {
            Some(y) => y,
            None => return PremulColor::TRANSPARENT,
        };
        self.pixels[y * self.width + x]
    }

    /// Bilinearly sample the pattern at a user-space point.
    pub fn sample(&self, ux: f32, uy: f32) -> PremulColor {
        let (u, v) = self.inverse_transform.apply(ux, uy);
        if !u.is_finite() || !v.is_finite() {
            return PremulColor::TRANSPARENT;
        }

        // Outside a non-repeating axis the pattern contributes nothing
        if !repeats_x(self.repetition) && (u < 0.0 || u >= self.width as f32) {
            return PremulColor::TRANSPARENT;
        }
        if !repeats_y(self.repetition) && (v < 0.0 || v >= self.height as f32) {
            return PremulColor::TRANSPARENT;
        }

        // Bilinear weights between the four nearest texel centers
        let fx = u - 0.5;
        let fy = v - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let x0 = x0 as i64;
        let y0 = y0 as i64;

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let top = c00.lerp(c10, tx);
        let bottom = c01.lerp(c11, tx);
        top.lerp(bottom, ty)
    }
}

enum Axis {
    X,
    Y,
}

fn repeats_x(repetition: Repetition) -> bool {
    matches!(repetition, Repetition::Repeat | Repetition::RepeatX)
}

fn repeats_y(repetition: Repetition) -> bool {
    matches!(repetition, Repetition::Repeat | Repetition::RepeatY)
}

/// Resolve a texel index along one axis: wrap when the axis repeats,
/// clamp to the pattern edge otherwise.
fn wrap_axis(index: i64, size: usize, repetition: Repetition, axis: Axis) -> Option<usize> {
    let repeats = match axis {
        Axis::X => repeats_x(repetition),
        Axis::Y => repeats_y(repetition),
    };
    if repeats {
        Some(index.rem_euclid(size as i64) as usize)
    } else {
        Some(index.clamp(0, size as i64 - 1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x2 checkerboard: opaque white and opaque black texels.
    fn checker() -> Pattern {
        let mut data = Vec::new();
        for (r, g, b) in [(255, 255, 255), (0, 0, 0), (0, 0, 0), (255, 255, 255)] {
            data.extend_from_slice(&[r, g, b, 255]);
        }
        Pattern::new(&data, 2, 2, 8, Repetition::Repeat).unwrap()
    }

    #[test]
    fn test_texel_centers_exact() {
        let p = checker();
        // Sampling at a texel center returns that texel
        let c = p.sample(0.5, 0.5);
        assert!((c.r - 1.0).abs() < 1e-5);
        let c = p.sample(1.5, 0.5);
        assert_eq!(c.r, 0.0);
    }

    #[test]
    fn test_repeat_periodicity() {
        let p = checker();
        for (x, y) in [(0.5, 0.5), (1.25, 0.75), (0.1, 1.9)] {
            let base = p.sample(x, y);
            assert_eq!(p.sample(x + 2.0, y), base);
            assert_eq!(p.sample(x, y + 4.0), base);
            assert_eq!(p.sample(x - 6.0, y - 2.0), base);
        }
    }

    #[test]
    fn test_repeat_x_transparent_outside_y() {
        let mut data = Vec::new();
        for (r, g, b) in [(255, 255, 255), (0, 0, 0), (0, 0, 0), (255, 255, 255)] {
            data.extend_from_slice(&[r, g, b, 255]);
        }
        let p = Pattern::new(&data, 2, 2, 8, Repetition::RepeatX).unwrap();

        let inside = p.sample(0.5, 0.5);
        assert_eq!(inside.a, 1.0);
        assert_eq!(p.sample(0.5 + 2.0, 0.5), inside);
        assert_eq!(p.sample(0.5, 2.5), PremulColor::TRANSPARENT);
        assert_eq!(p.sample(0.5, -0.5), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_no_repeat_bounds() {
        let mut data = Vec::new();
        for (r, g, b) in [(255, 255, 255), (0, 0, 0), (0, 0, 0), (255, 255, 255)] {
            data.extend_from_slice(&[r, g, b, 255]);
        }
        let p = Pattern::new(&data, 2, 2, 8, Repetition::NoRepeat).unwrap();

        assert_eq!(p.sample(-0.1, 0.5), PremulColor::TRANSPARENT);
        assert_eq!(p.sample(2.0, 0.5), PremulColor::TRANSPARENT);
        // Edge samples stay fully opaque: neighbors clamp instead of fading
        assert_eq!(p.sample(0.01, 0.5).a, 1.0);
        assert_eq!(p.sample(1.99, 1.5).a, 1.0);
    }

    #[test]
    fn test_bilinear_blend() {
        let p = checker();
        // Halfway between a white and a black texel center
        let c = p.sample(1.0, 0.5);
        assert!((c.r - 0.5).abs() < 1e-5);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_stride_with_padding() {
        // Two pixels per row, stride of 12 bytes (4 bytes padding)
        let mut data = vec![0u8; 12 * 2];
        data[0..4].copy_from_slice(&[255, 0, 0, 255]);
        data[4..8].copy_from_slice(&[0, 255, 0, 255]);
        data[12..16].copy_from_slice(&[0, 0, 255, 255]);
        data[16..20].copy_from_slice(&[255, 255, 0, 255]);

        let p = Pattern::new(&data, 2, 2, 12, Repetition::NoRepeat).unwrap();
        assert!(p.sample(0.5, 0.5).r > 0.9);
        assert!(p.sample(0.5, 1.5).b > 0.9);
    }

    #[test]
    fn test_invalid_construction() {
        assert!(Pattern::new(&[0; 16], 0, 2, 8, Repetition::Repeat).is_err());
        assert!(Pattern::new(&[0; 8], 2, 2, 8, Repetition::Repeat).is_err());
        assert!(Pattern::new(&[0; 16], 2, 2, 4, Repetition::Repeat).is_err());
    }

    #[test]
    fn test_pattern_transform() {
        let mut p = checker();
        // Pattern scaled 2x: user-space (1, 1) lands on texel (0.5, 0.5)
        p.set_transform(Matrix::identity().pre_scale(2.0, 2.0));
        let c = p.sample(1.0, 1.0);
        assert!((c.r - 1.0).abs() < 1e-5);
    }
}
