//! Image drawing and pixel data transfer.
//!
//! Images cross the boundary as tightly packed sRGB8 RGBA with a caller
//! stride in bytes. draw_image goes through the normal pipeline (a
//! no-repeat pattern filled over the destination quad); put_image_data
//! and get_image_data bypass the compositor and the transform.

use super::Canvas;
use crate::color::PremulColor;
use crate::compositor::PreparedPaint;
use crate::geometry::Point;
use crate::matrix::Matrix;
use crate::path::Path;
use crate::pattern::Pattern;
use crate::raster;
use crate::style::Repetition;

impl Canvas {
    /// Draw an sRGB8 image into the destination rectangle.
    ///
    /// Negative `dw`/`dh` flip the image. A null source or a zero
    /// destination extent is a no-op. Sampling is bilinear through the
    /// pattern machinery, composited with the current operator, global
    /// alpha, clip, and shadow.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image(
        &mut self,
        src: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        dx: f32,
        dy: f32,
        dw: f32,
        dh: f32,
    ) {
        log::debug!(target: "canvas", "draw_image {}x{} -> {} {} {} {}", width, height, dx, dy, dw, dh);
        if src.is_empty() || width == 0 || height == 0 {
            return;
        }
        if !(dx.is_finite() && dy.is_finite() && dw.is_finite() && dh.is_finite()) {
            return;
        }
        if dw == 0.0 || dh == 0.0 {
            return;
        }
        if !self.state.transform.is_invertible() {
            return;
        }

        let mut pattern = match Pattern::new(src, width, height, stride, Repetition::NoRepeat) {
            Ok(pattern) => pattern,
            Err(err) => {
                log::warn!(target: "canvas", "draw_image ignored: {}", err);
                return;
            }
        };
        // Map pattern pixels onto the destination rectangle in user space
        pattern.set_transform(
            Matrix::identity()
                .pre_translate(dx, dy)
                .pre_scale(dw / width as f32, dh / height as f32),
        );

        // Destination quad, transformed to device space
        let transform = &self.state.transform;
        let corners = [
            (dx, dy),
            (dx + dw, dy),
            (dx + dw, dy + dh),
            (dx, dy + dh),
        ];
        let mut quad = Path::new();
        let (px, py) = transform.apply(corners[0].0, corners[0].1);
        quad.move_to(Point::new(px, py));
        for &(cx, cy) in &corners[1..] {
            let (px, py) = transform.apply(cx, cy);
            quad.line_to(Point::new(px, py));
        }
        quad.close();

        let inverse_ctm = match self.state.transform.invert() {
            Some(inverse) => inverse,
            None => return,
        };

        let mask = raster::rasterize(&quad, self.width as usize, self.height as usize);
        self.render_shadow_for(&quad);
        let prepared = PreparedPaint::Pattern {
            pattern: &pattern,
            inverse_ctm,
        };
        self.composite_mask_with_paint(&mask, &prepared);
    }

    /// Read back a rectangle of canvas pixels as sRGB8 RGBA.
    ///
    /// Pixels outside the canvas come back as (0, 0, 0, 0). A null
    /// destination is a no-op.
    pub fn get_image_data(
        &self,
        dst: &mut [u8],
        width: u32,
        height: u32,
        stride: usize,
        sx: i32,
        sy: i32,
    ) {
        if dst.is_empty() {
            return;
        }
        for y in 0..height as usize {
            for x in 0..width as usize {
                let offset = y * stride + x * 4;
                if offset + 4 > dst.len() {
                    return;
                }
                let src_x = sx + x as i32;
                let src_y = sy + y as i32;
                let bytes = if src_x >= 0
                    && src_x < self.width as i32
                    && src_y >= 0
                    && src_y < self.height as i32
                {
                    let index = src_y as usize * self.width as usize + src_x as usize;
                    self.buffer[index].to_srgb_bytes()
                } else {
                    [0, 0, 0, 0]
                };
                dst[offset..offset + 4].copy_from_slice(&bytes);
            }
        }
    }

    /// Write sRGB8 RGBA pixels directly into the canvas.
    ///
    /// Bypasses the compositor, the transform, the clip, and global
    /// alpha; clips to the canvas bounds. A null source is a no-op.
    pub fn put_image_data(
        &mut self,
        src: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        dx: i32,
        dy: i32,
    ) {
        if src.is_empty() {
            return;
        }
        for y in 0..height as usize {
            let dst_y = dy + y as i32;
            if dst_y < 0 || dst_y >= self.height as i32 {
                continue;
            }
            for x in 0..width as usize {
                let dst_x = dx + x as i32;
                if dst_x < 0 || dst_x >= self.width as i32 {
                    continue;
                }
                let offset = y * stride + x * 4;
                if offset + 4 > src.len() {
                    return;
                }
                let index = dst_y as usize * self.width as usize + dst_x as usize;
                self.buffer[index] = PremulColor::from_srgb_bytes(
                    src[offset],
                    src[offset + 1],
                    src[offset + 2],
                    src[offset + 3],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{CompositeOperation, StyleTarget};

    /// A 2x2 image: red, green / blue, white.
    fn test_image() -> Vec<u8> {
        let mut data = Vec::new();
        for (r, g, b) in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (255, 255, 255)] {
            data.extend_from_slice(&[r, g, b, 255]);
        }
        data
    }

    #[test]
    fn test_put_get_round_trip() {
        let mut canvas = Canvas::new(16, 16).unwrap();
        let image = test_image();
        canvas.put_image_data(&image, 2, 2, 8, 4, 4);

        let mut readback = vec![0u8; 2 * 2 * 4];
        canvas.get_image_data(&mut readback, 2, 2, 8, 4, 4);
        assert_eq!(readback, image);
    }

    #[test]
    fn test_put_image_data_clips_to_canvas() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        let image = test_image();
        // Partially off the top-left corner
        canvas.put_image_data(&image, 2, 2, 8, -1, -1);
        // Only the white pixel (bottom-right of the image) lands at (0, 0)
        assert!(canvas.buffer[0].r > 0.99);
        assert_eq!(canvas.buffer[1].a, 0.0);
    }

    #[test]
    fn test_get_image_data_outside_is_transparent() {
        let canvas = Canvas::new(4, 4).unwrap();
        let mut readback = vec![0xAAu8; 2 * 2 * 4];
        canvas.get_image_data(&mut readback, 2, 2, 8, -10, -10);
        assert!(readback.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_put_image_data_ignores_transform_and_clip() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        canvas.translate(100.0, 100.0);
        canvas.begin_path();
        canvas.rectangle(&crate::geometry::RectParams {
            x: 0.0,
            y: 0.0,
            width: 0.5,
            height: 0.5,
        });
        canvas.clip();

        let image = test_image();
        canvas.put_image_data(&image, 2, 2, 8, 2, 2);
        // Lands at (2, 2) regardless of transform and clip
        assert!(canvas.buffer[2 * 8 + 2].r > 0.99);
    }

    #[test]
    fn test_draw_image_scales() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        let image = test_image();
        // Stretch the 2x2 image over 8x8
        canvas.draw_image(&image, 2, 2, 8, 0.0, 0.0, 8.0, 8.0);

        // Quadrant centers take their source pixel's color
        assert!(canvas.buffer[1 * 8 + 1].r > 0.9); // top-left red
        assert!(canvas.buffer[1 * 8 + 6].g > 0.9); // top-right green
        assert!(canvas.buffer[6 * 8 + 1].b > 0.9); // bottom-left blue
    }

    #[test]
    fn test_draw_image_flip() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        let image = test_image();
        // Negative width flips horizontally: drawn from x=8 back to 0
        canvas.draw_image(&image, 2, 2, 8, 8.0, 0.0, -8.0, 8.0);

        // Red now appears on the right
        assert!(canvas.buffer[1 * 8 + 6].r > 0.9);
        assert!(canvas.buffer[1 * 8 + 1].g > 0.9);
    }

    #[test]
    fn test_draw_image_zero_extent_is_noop() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        let image = test_image();
        canvas.draw_image(&image, 2, 2, 8, 0.0, 0.0, 0.0, 8.0);
        canvas.draw_image(&[], 2, 2, 8, 0.0, 0.0, 8.0, 8.0);
        assert!(canvas.buffer.iter().all(|p| p.a == 0.0));
    }

    #[test]
    fn test_draw_image_respects_global_alpha() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        let image = test_image();
        canvas.set_global_alpha(0.5);
        canvas.draw_image(&image, 2, 2, 8, 0.0, 0.0, 8.0, 8.0);
        let p = canvas.buffer[1 * 8 + 1];
        assert!((p.a - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_draw_image_respects_composite_op() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        canvas.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        canvas.fill_rectangle(&crate::geometry::RectParams {
            x: 0.0,
            y: 0.0,
            width: 8.0,
            height: 8.0,
        });

        canvas.set_global_composite_operation(CompositeOperation::DestinationOver);
        let image = test_image();
        canvas.draw_image(&image, 2, 2, 8, 0.0, 0.0, 8.0, 8.0);

        // Destination is opaque black everywhere; destination_over keeps it
        assert!(canvas.buffer[1 * 8 + 1].r < 0.01);
        assert!(canvas.buffer[1 * 8 + 1].a > 0.99);
    }
}
