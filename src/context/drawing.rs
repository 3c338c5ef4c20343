//! Fill, stroke, clip, rectangle convenience calls, and the paint and
//! shadow plumbing shared by all of them.

use super::Canvas;
use crate::compositor::{self, PreparedPaint};
use crate::geometry::{Point, RectParams};
use crate::path::Path;
use crate::raster::{self, Mask};
use crate::shadow;
use crate::stroke::{expand_stroke, StrokeStyle};
use crate::style::{Paint, StyleTarget};

impl Canvas {
    // --- Clipping ---

    /// Intersect the clip region with the current path's coverage.
    ///
    /// The clip is a per-pixel coverage mask; clipping can only shrink
    /// it, never grow it.
    pub fn clip(&mut self) {
        log::debug!(target: "canvas", "clip");
        let mask = raster::rasterize(
            &self.path,
            self.width as usize,
            self.height as usize,
        );
        match &mut self.state.clip_mask {
            Some(existing) => {
                for (value, &coverage) in existing.iter_mut().zip(mask.data.iter()) {
                    *value = value.min(coverage);
                }
            }
            None => self.state.clip_mask = Some(mask.data),
        }
    }

    // --- Drawing operations ---

    /// Fill the current path with the fill style (nonzero rule).
    pub fn fill(&mut self) {
        log::debug!(target: "canvas", "fill");
        let path = std::mem::take(&mut self.path);
        self.render_fill_path(&path, StyleTarget::Fill);
        self.path = path;
    }

    /// Stroke the current path with the stroke style.
    pub fn stroke(&mut self) {
        log::debug!(target: "canvas", "stroke");
        let path = std::mem::take(&mut self.path);
        self.render_stroke_path(&path, StyleTarget::Stroke);
        self.path = path;
    }

    /// Fill a rectangle without disturbing the working path.
    pub fn fill_rectangle(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "fill_rectangle {} {} {} {}", params.x, params.y, params.width, params.height);
        if let Some(path) = self.device_rect_path(params) {
            self.render_fill_path(&path, StyleTarget::Fill);
        }
    }

    /// Stroke a rectangle without disturbing the working path.
    pub fn stroke_rectangle(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "stroke_rectangle {} {} {} {}", params.x, params.y, params.width, params.height);
        if let Some(path) = self.device_rect_path(params) {
            self.render_stroke_path(&path, StyleTarget::Stroke);
        }
    }

    /// Erase a rectangle to transparent black.
    ///
    /// Honors the transform and the clip mask, but ignores global alpha
    /// and the composite operation.
    pub fn clear_rectangle(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "clear_rectangle {} {} {} {}", params.x, params.y, params.width, params.height);
        if let Some(path) = self.device_rect_path(params) {
            let mask = raster::rasterize(&path, self.width as usize, self.height as usize);
            compositor::erase(&mut self.buffer, &mask, self.state.clip_mask.as_deref());
        }
    }

    /// Build the device-space path of a transformed rectangle.
    fn device_rect_path(&self, params: &RectParams) -> Option<Path> {
        if !params.is_finite() {
            return None;
        }
        let RectParams {
            x,
            y,
            width,
            height,
        } = *params;
        let corners = [
            (x, y),
            (x + width, y),
            (x + width, y + height),
            (x, y + height),
        ];
        let mut path = Path::new();
        let transform = &self.state.transform;
        let (dx, dy) = transform.apply(corners[0].0, corners[0].1);
        path.move_to(Point::new(dx, dy));
        for &(cx, cy) in &corners[1..] {
            let (dx, dy) = transform.apply(cx, cy);
            path.line_to(Point::new(dx, dy));
        }
        path.close();
        Some(path)
    }

    // --- Internal rendering plumbing ---

    /// Fill an arbitrary device-space path with a style target.
    pub(crate) fn render_fill_path(&mut self, path: &Path, target: StyleTarget) {
        if path.is_empty() || !self.state.transform.is_invertible() {
            return;
        }
        let mask = raster::rasterize(path, self.width as usize, self.height as usize);
        self.render_shadow_for(path);
        self.composite_mask_with_style(&mask, target);
    }

    /// Expand and fill the stroke outline of a device-space path.
    pub(crate) fn render_stroke_path(&mut self, path: &Path, target: StyleTarget) {
        if path.is_empty() || !self.state.transform.is_invertible() {
            return;
        }

        // Path geometry is pre-transformed, so user-space line widths
        // and dash lengths scale by the mean axis scale of the CTM.
        let scale = self.state.transform.mean_scale();
        if !(scale.is_finite()) || scale <= 0.0 {
            return;
        }
        let style = StrokeStyle {
            width: self.state.line_width * scale,
            cap: self.state.line_cap,
            join: self.state.line_join,
            miter_limit: self.state.miter_limit,
            dash: self.state.line_dash.iter().map(|d| d * scale).collect(),
            dash_offset: self.state.line_dash_offset * scale,
        };

        let outline = expand_stroke(path, &style);
        if outline.is_empty() {
            return;
        }
        let mask = raster::rasterize(&outline, self.width as usize, self.height as usize);
        self.render_shadow_for(&outline);
        self.composite_mask_with_style(&mask, target);
    }

    /// Composite a coverage mask using the paint of a style target.
    pub(crate) fn composite_mask_with_style(&mut self, mask: &Mask, target: StyleTarget) {
        let inverse_ctm = match self.state.transform.invert() {
            Some(inverse) => inverse,
            None => return,
        };

        // Sort gradient stops before the immutable borrow below
        {
            let paint = match target {
                StyleTarget::Fill => &mut self.state.fill_style,
                StyleTarget::Stroke => &mut self.state.stroke_style,
            };
            if let Paint::LinearGradient(gradient) | Paint::RadialGradient(gradient) = paint {
                gradient.ensure_sorted();
            }
        }

        let width = self.width as usize;
        let height = self.height as usize;
        let state = &self.state;
        let paint = match target {
            StyleTarget::Fill => &state.fill_style,
            StyleTarget::Stroke => &state.stroke_style,
        };
        // A gradient with no stops paints nothing; only the operators
        // that clear outside the source still need the compositor pass.
        if let Paint::LinearGradient(gradient) | Paint::RadialGradient(gradient) = paint {
            if !gradient.has_stops() && !state.global_composite_operation.clears_outside_source() {
                return;
            }
        }
        let prepared = match paint {
            Paint::Color(color) => PreparedPaint::Solid(*color),
            Paint::LinearGradient(gradient) | Paint::RadialGradient(gradient) => {
                PreparedPaint::Gradient {
                    gradient,
                    inverse_ctm,
                }
            }
            Paint::Pattern(pattern) => PreparedPaint::Pattern {
                pattern,
                inverse_ctm,
            },
        };

        compositor::composite(
            &mut self.buffer,
            width,
            height,
            mask,
            state.clip_mask.as_deref(),
            &prepared,
            state.global_alpha,
            state.global_composite_operation,
        );
    }

    /// Composite a coverage mask with an explicit paint (draw_image).
    pub(crate) fn composite_mask_with_paint(&mut self, mask: &Mask, prepared: &PreparedPaint) {
        compositor::composite(
            &mut self.buffer,
            self.width as usize,
            self.height as usize,
            mask,
            self.state.clip_mask.as_deref(),
            prepared,
            self.state.global_alpha,
            self.state.global_composite_operation,
        );
    }

    /// Render the shadow of a device-space silhouette, if active.
    ///
    /// The silhouette is re-rasterized at the shadow offset, colored,
    /// blurred, and composited under the source with the current
    /// operator and global alpha.
    pub(crate) fn render_shadow_for(&mut self, path: &Path) {
        let state = &self.state;
        if !shadow::shadow_active(
            state.shadow_color.a,
            state.shadow_offset_x,
            state.shadow_offset_y,
            state.shadow_blur,
        ) {
            return;
        }

        let offset_path = path.translated(state.shadow_offset_x, state.shadow_offset_y);
        let mask = raster::rasterize(&offset_path, self.width as usize, self.height as usize);
        let buffer = shadow::shadow_buffer(&mask, state.shadow_color, state.shadow_blur);
        compositor::composite_buffer(
            &mut self.buffer,
            &buffer,
            self.state.clip_mask.as_deref(),
            self.state.global_alpha,
            self.state.global_composite_operation,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PremulColor;
    use crate::style::{CompositeOperation, StyleTarget};

    fn pixel(canvas: &Canvas, x: u32, y: u32) -> PremulColor {
        canvas.buffer[(y * canvas.width + x) as usize]
    }

    #[test]
    fn test_fill_rect_pixels() {
        let mut canvas = Canvas::new(100, 100).unwrap();
        canvas.set_color(StyleTarget::Fill, 1.0, 0.0, 0.0, 1.0);
        canvas.fill_rectangle(&RectParams {
            x: 10.0,
            y: 10.0,
            width: 50.0,
            height: 50.0,
        });

        let inside = pixel(&canvas, 30, 30);
        assert!((inside.r - 1.0).abs() < 1e-4);
        assert!((inside.a - 1.0).abs() < 1e-4);
        assert_eq!(pixel(&canvas, 5, 5).a, 0.0);
    }

    #[test]
    fn test_fill_rect_preserves_working_path() {
        let mut canvas = Canvas::new(100, 100).unwrap();
        canvas.begin_path();
        canvas.move_to(1.0, 2.0);
        canvas.line_to(3.0, 4.0);
        canvas.fill_rectangle(&RectParams {
            x: 10.0,
            y: 10.0,
            width: 5.0,
            height: 5.0,
        });
        assert_eq!(canvas.path.subpaths.len(), 1);
        assert_eq!(canvas.path.subpaths[0].points.len(), 2);
    }

    #[test]
    fn test_stroke_rect_frame() {
        let mut canvas = Canvas::new(128, 128).unwrap();
        canvas.set_color(StyleTarget::Stroke, 0.0, 0.0, 0.0, 1.0);
        canvas.set_line_width(2.0);
        canvas.stroke_rectangle(&RectParams {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 100.0,
        });

        // On the frame
        assert!(pixel(&canvas, 50, 10).a > 0.9);
        assert!(pixel(&canvas, 10, 50).a > 0.9);
        // Interior transparent
        assert_eq!(pixel(&canvas, 50, 50).a, 0.0);
        // Outside the frame
        assert_eq!(pixel(&canvas, 50, 5).a, 0.0);
    }

    #[test]
    fn test_clear_rectangle_ignores_alpha_and_op() {
        let mut canvas = Canvas::new(64, 64).unwrap();
        canvas.set_color(StyleTarget::Fill, 1.0, 0.0, 0.0, 1.0);
        canvas.fill_rectangle(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 64.0,
            height: 64.0,
        });

        canvas.set_global_alpha(0.25);
        canvas.set_global_composite_operation(CompositeOperation::Lighter);
        canvas.clear_rectangle(&RectParams {
            x: 16.0,
            y: 16.0,
            width: 32.0,
            height: 32.0,
        });

        assert_eq!(pixel(&canvas, 32, 32).a, 0.0);
        assert!(pixel(&canvas, 2, 2).a > 0.99);
    }

    #[test]
    fn test_fill_under_non_invertible_transform_draws_nothing() {
        let mut canvas = Canvas::new(32, 32).unwrap();
        canvas.set_color(StyleTarget::Fill, 1.0, 0.0, 0.0, 1.0);
        canvas.begin_path();
        canvas.rectangle(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 32.0,
            height: 32.0,
        });
        canvas.set_transform(crate::matrix::Matrix::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        canvas.fill();
        assert!(canvas.buffer.iter().all(|p| p.a == 0.0));
    }

    #[test]
    fn test_clip_restricts_fill() {
        let mut canvas = Canvas::new(64, 64).unwrap();
        canvas.begin_path();
        canvas.rectangle(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 32.0,
            height: 64.0,
        });
        canvas.clip();

        canvas.set_color(StyleTarget::Fill, 0.0, 1.0, 0.0, 1.0);
        canvas.fill_rectangle(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 64.0,
            height: 64.0,
        });

        assert!(pixel(&canvas, 10, 10).a > 0.99);
        assert_eq!(pixel(&canvas, 40, 10).a, 0.0);
    }

    #[test]
    fn test_clip_monotonicity() {
        let mut canvas = Canvas::new(64, 64).unwrap();
        canvas.begin_path();
        canvas.rectangle(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 48.0,
            height: 64.0,
        });
        canvas.clip();
        let first: Vec<f32> = canvas.state.clip_mask.clone().unwrap();

        canvas.begin_path();
        canvas.rectangle(&RectParams {
            x: 16.0,
            y: 0.0,
            width: 48.0,
            height: 64.0,
        });
        canvas.clip();
        let second = canvas.state.clip_mask.as_ref().unwrap();

        // The combined clip is pointwise <= each constituent
        for (combined, single) in second.iter().zip(first.iter()) {
            assert!(combined <= single);
        }
        // Intersection only: left strip is now clipped out
        let index = 10 * 64 + 8;
        assert_eq!(second[index], 0.0);
    }

    #[test]
    fn test_dashed_stroke_gaps() {
        let mut canvas = Canvas::new(64, 8).unwrap();
        canvas.set_color(StyleTarget::Stroke, 0.0, 0.0, 0.0, 1.0);
        canvas.set_line_width(1.0);
        canvas.set_line_dash(&[4.0, 4.0]);
        canvas.begin_path();
        canvas.move_to(0.0, 4.5);
        canvas.line_to(40.0, 4.5);
        canvas.stroke();

        // On-segments around x in [0,4), gaps in [4,8)
        assert!(pixel(&canvas, 2, 4).a > 0.4);
        assert_eq!(pixel(&canvas, 6, 4).a, 0.0);
        assert!(pixel(&canvas, 10, 4).a > 0.4);
    }

    #[test]
    fn test_shadow_offset_fill() {
        let mut canvas = Canvas::new(64, 64).unwrap();
        canvas.set_color(StyleTarget::Fill, 1.0, 0.0, 0.0, 1.0);
        canvas.set_shadow_color(0.0, 0.0, 1.0, 1.0);
        canvas.set_shadow_offset_x(20.0);
        canvas.set_shadow_offset_y(0.0);
        canvas.fill_rectangle(&RectParams {
            x: 8.0,
            y: 8.0,
            width: 16.0,
            height: 16.0,
        });

        // Source on top
        let source = pixel(&canvas, 10, 10);
        assert!(source.r > 0.9);
        // Shadow visible to the right of the source rectangle
        let shadow = pixel(&canvas, 40, 10);
        assert!(shadow.b > 0.9);
        assert!(shadow.r < 0.01);
    }

    #[test]
    fn test_no_pixel_leak_destination_out() {
        // Fill a pixel-aligned shape, then erase it with destination_out
        // and an opaque source: the buffer returns to fully transparent.
        let mut canvas = Canvas::new(32, 32).unwrap();
        canvas.set_color(StyleTarget::Fill, 0.2, 0.6, 0.9, 1.0);
        canvas.begin_path();
        canvas.rectangle(&RectParams {
            x: 4.0,
            y: 4.0,
            width: 20.0,
            height: 20.0,
        });
        canvas.fill();

        canvas.set_global_composite_operation(CompositeOperation::DestinationOut);
        canvas.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        canvas.fill();

        for p in &canvas.buffer {
            assert!(p.a.abs() < 1e-3);
            assert!(p.r.abs() < 1e-3);
        }
    }
}
