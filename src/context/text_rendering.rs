//! Text operations: font selection, layout, measurement, and rendering
//! through glyph outline paths.

use super::Canvas;
use crate::font::{Font, OutlineSink};
use crate::geometry::Point;
use crate::matrix::Matrix;
use crate::path::Path;
use crate::style::{StyleTarget, TextAlign, TextBaseline};

/// Fraction of the ascent used for the hanging baseline.
const HANGING_BASELINE_FACTOR: f32 = 0.8;

/// Builds glyph outlines into a device-space path.
struct PathSink<'a> {
    path: &'a mut Path,
    matrix: Matrix,
}

impl PathSink<'_> {
    fn map(&self, x: f32, y: f32) -> Point {
        let (dx, dy) = self.matrix.apply(x, y);
        Point::new(dx, dy)
    }
}

impl OutlineSink for PathSink<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.move_to(p);
    }
    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.line_to(p);
    }
    fn quad_to(&mut self, cx: f32, cy: f32, x: f32, y: f32) {
        let ctrl = self.map(cx, cy);
        let end = self.map(x, y);
        self.path.quad_to(ctrl, end);
    }
    fn close(&mut self) {
        self.path.close();
    }
}

impl Canvas {
    /// Set the font from raw TrueType bytes and a pixel em height.
    ///
    /// Malformed bytes or a non-positive size leave the previous font in
    /// effect; returns whether the font was accepted.
    pub fn set_font(&mut self, data: &[u8], size: f32) -> bool {
        log::debug!(target: "canvas", "set_font {} bytes at {}", data.len(), size);
        if !size.is_finite() || size <= 0.0 {
            log::warn!(target: "canvas", "invalid font size ignored");
            return false;
        }
        match Font::parse(data) {
            Ok(font) => {
                self.state.font = Some(font);
                self.state.font_size = size;
                true
            }
            Err(err) => {
                log::warn!(target: "canvas", "set_font rejected: {}", err);
                false
            }
        }
    }

    /// Set the text alignment.
    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    /// Set the text baseline.
    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    /// Width of a string in device pixels under the current font size.
    ///
    /// Does not apply the transform. Returns 0 without a valid font.
    /// The measured text ends at the first newline or form feed.
    pub fn measure_text(&self, text: &str) -> f32 {
        let font = match &self.state.font {
            Some(font) => font,
            None => return 0.0,
        };
        let scale = self.state.font_size / font.units_per_em as f32;
        visible_line(text)
            .chars()
            .map(|c| font.advance_width(font.glyph_index(c as u32)) as f32)
            .sum::<f32>()
            * scale
    }

    /// Fill text at the anchor position.
    pub fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        log::debug!(target: "canvas", "fill_text {:?} {} {}", text, x, y);
        self.render_text(text, x, y, None, StyleTarget::Fill);
    }

    /// Fill text, squeezing it horizontally to fit `max_width`.
    pub fn fill_text_max_width(&mut self, text: &str, x: f32, y: f32, max_width: f32) {
        self.render_text(text, x, y, Some(max_width), StyleTarget::Fill);
    }

    /// Stroke text at the anchor position.
    pub fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        log::debug!(target: "canvas", "stroke_text {:?} {} {}", text, x, y);
        self.render_text(text, x, y, None, StyleTarget::Stroke);
    }

    /// Stroke text, squeezing it horizontally to fit `max_width`.
    pub fn stroke_text_max_width(&mut self, text: &str, x: f32, y: f32, max_width: f32) {
        self.render_text(text, x, y, Some(max_width), StyleTarget::Stroke);
    }

    fn render_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_width: Option<f32>,
        target: StyleTarget,
    ) {
        let path = match self.build_text_path(text, x, y, max_width) {
            Some(path) => path,
            None => return,
        };

        match target {
            StyleTarget::Fill => self.render_fill_path(&path, target),
            StyleTarget::Stroke => self.render_stroke_path(&path, target),
        }

        // Text-to-path replaces the working path
        self.path = path;
        self.current_point = None;
        self.subpath_start = None;
    }

    /// Lay out one line of text as a device-space outline path.
    fn build_text_path(
        &self,
        text: &str,
        x: f32,
        y: f32,
        max_width: Option<f32>,
    ) -> Option<Path> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        let font = self.state.font.as_ref()?;
        let line = visible_line(text);
        if line.is_empty() {
            return None;
        }

        let scale = self.state.font_size / font.units_per_em as f32;
        let glyphs: Vec<u16> = line.chars().map(|c| font.glyph_index(c as u32)).collect();
        let natural_width: f32 = glyphs
            .iter()
            .map(|&g| font.advance_width(g) as f32)
            .sum::<f32>()
            * scale;

        // maxWidth squeezes the finished path uniformly around the anchor
        let squeeze = match max_width {
            None => 1.0,
            Some(mw) => {
                if mw.is_nan() || mw <= 0.0 {
                    return None;
                }
                if mw.is_infinite() || natural_width <= mw {
                    1.0
                } else {
                    let factor = mw / natural_width;
                    if factor < 0.001 {
                        return None;
                    }
                    factor
                }
            }
        };

        // Alignment uses the natural width; the squeeze around x keeps
        // the scaled text anchored correctly.
        let x_offset = match self.state.text_align {
            TextAlign::Leftward | TextAlign::Start => 0.0,
            TextAlign::Rightward | TextAlign::Ending => -natural_width,
            TextAlign::Center => -natural_width / 2.0,
        };

        let ascent = font.ascender as f32 * scale;
        let descent = -(font.descender as f32) * scale;
        let y_offset = match self.state.text_baseline {
            TextBaseline::Alphabetic => 0.0,
            TextBaseline::Top => ascent,
            TextBaseline::Hanging => ascent * HANGING_BASELINE_FACTOR,
            TextBaseline::Middle => (ascent - descent) / 2.0,
            TextBaseline::Ideographic => -descent,
            TextBaseline::Bottom => -descent,
        };

        let base = if squeeze != 1.0 {
            self.state.transform.pre_concat(
                Matrix::identity()
                    .pre_translate(x, 0.0)
                    .pre_scale(squeeze, 1.0)
                    .pre_translate(-x, 0.0),
            )
        } else {
            self.state.transform
        };

        let mut path = Path::new();
        let mut pen_x = x + x_offset;
        let pen_y = y + y_offset;
        for &glyph in &glyphs {
            // Font units have y up; flip while scaling to pixels
            let glyph_matrix = base
                .pre_translate(pen_x, pen_y)
                .pre_scale(scale, -scale);
            let mut sink = PathSink {
                path: &mut path,
                matrix: glyph_matrix,
            };
            font.outline_glyph(glyph, &mut sink);
            pen_x += font.advance_width(glyph) as f32 * scale;
        }
        Some(path)
    }
}

/// The portion of the string before the first newline or form feed.
///
/// A single call renders one line; line-breaking characters end the
/// string and do not advance the pen.
fn visible_line(text: &str) -> &str {
    match text.find(&['\n', '\u{c}'][..]) {
        Some(end) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::build_test_font;
    use crate::geometry::RectParams;

    fn canvas_with_font(size: f32) -> Canvas {
        let mut canvas = Canvas::new(64, 64).unwrap();
        let font = build_test_font();
        assert!(canvas.set_font(&font, size));
        canvas
    }

    #[test]
    fn test_set_font_rejects_garbage() {
        let mut canvas = Canvas::new(64, 64).unwrap();
        assert!(!canvas.set_font(&[1, 2, 3, 4], 16.0));
        assert!(canvas.state.font.is_none());

        // A valid font then a bad one: the valid font survives
        let font = build_test_font();
        assert!(canvas.set_font(&font, 16.0));
        assert!(!canvas.set_font(&[0xFF; 64], 20.0));
        assert!(canvas.state.font.is_some());
        assert_eq!(canvas.state.font_size, 16.0);
    }

    #[test]
    fn test_set_font_rejects_bad_size() {
        let mut canvas = Canvas::new(64, 64).unwrap();
        let font = build_test_font();
        assert!(!canvas.set_font(&font, 0.0));
        assert!(!canvas.set_font(&font, -4.0));
        assert!(!canvas.set_font(&font, f32::NAN));
        assert!(canvas.state.font.is_none());
    }

    #[test]
    fn test_measure_text() {
        let canvas = canvas_with_font(100.0);
        // Advance width is 600/1000 em for every glyph
        assert!((canvas.measure_text("A") - 60.0).abs() < 1e-3);
        assert!((canvas.measure_text("AAA") - 180.0).abs() < 1e-3);
        assert_eq!(canvas.measure_text(""), 0.0);
    }

    #[test]
    fn test_measure_text_stops_at_newline() {
        let canvas = canvas_with_font(100.0);
        assert_eq!(
            canvas.measure_text("AA\nAAAA"),
            canvas.measure_text("AA")
        );
        assert_eq!(
            canvas.measure_text("A\u{c}AAA"),
            canvas.measure_text("A")
        );
    }

    #[test]
    fn test_measure_without_font_is_zero() {
        let canvas = Canvas::new(64, 64).unwrap();
        assert_eq!(canvas.measure_text("hello"), 0.0);
    }

    #[test]
    fn test_fill_text_renders_glyph() {
        let mut canvas = canvas_with_font(40.0);
        canvas.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        // Triangle glyph spans (0,0)-(500,500) units = 20x20 px above
        // the baseline at y=50
        canvas.fill_text("A", 10.0, 50.0);

        // Sample near the triangle base, inside the glyph
        let p = canvas.buffer[48 * 64 + 20];
        assert!(p.a > 0.5);
        // Above the apex: empty
        assert_eq!(canvas.buffer[20 * 64 + 20].a, 0.0);
    }

    #[test]
    fn test_text_without_font_is_noop() {
        let mut canvas = Canvas::new(64, 64).unwrap();
        canvas.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        canvas.fill_text("A", 10.0, 50.0);
        assert!(canvas.buffer.iter().all(|p| p.a == 0.0));
    }

    #[test]
    fn test_text_replaces_working_path() {
        let mut canvas = canvas_with_font(40.0);
        canvas.begin_path();
        canvas.rectangle(&RectParams {
            x: 0.0,
            y: 0.0,
            width: 5.0,
            height: 5.0,
        });
        canvas.fill_text("A", 10.0, 50.0);

        // The working path is now the glyph outline, not the rectangle
        assert!(canvas.is_point_in_path(20.0, 45.0));
        assert!(!canvas.is_point_in_path(2.0, 2.0));
    }

    #[test]
    fn test_align_rightward_shifts_left() {
        let mut left = canvas_with_font(40.0);
        left.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        left.fill_text("A", 40.0, 50.0);

        let mut right = canvas_with_font(40.0);
        right.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        right.set_text_align(TextAlign::Rightward);
        right.fill_text("A", 40.0, 50.0);

        // Rightward: the glyph ends at the anchor, 24px advance earlier
        let left_covered = left.buffer[45 * 64 + 45].a;
        let right_covered = right.buffer[45 * 64 + 45 - 24].a;
        assert!((left_covered - right_covered).abs() < 0.05);
    }

    #[test]
    fn test_baseline_top_moves_glyph_down() {
        let mut alphabetic = canvas_with_font(40.0);
        alphabetic.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        alphabetic.fill_text("A", 10.0, 20.0);
        let alphabetic_hit = alphabetic.buffer[10 * 64 + 20].a;

        let mut top = canvas_with_font(40.0);
        top.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        top.set_text_baseline(TextBaseline::Top);
        // Ascent is 800/1000 * 40 = 32 px: baseline lands at y = 52
        top.fill_text("A", 10.0, 20.0);
        let top_hit = top.buffer[(10 + 32) * 64 + 20].a;

        assert!((alphabetic_hit - top_hit).abs() < 0.05);
    }

    #[test]
    fn test_max_width_squeezes() {
        let mut canvas = canvas_with_font(40.0);
        canvas.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        // Natural width of AA is 48; squeeze into 24
        canvas.fill_text_max_width("AA", 0.0, 60.0, 24.0);

        // Nothing may extend past x = 24
        for y in 0..64 {
            for x in 25..64 {
                assert_eq!(canvas.buffer[y * 64 + x].a, 0.0);
            }
        }
        // But something rendered
        assert!(canvas.buffer.iter().any(|p| p.a > 0.0));
    }

    #[test]
    fn test_max_width_invalid_is_noop() {
        let mut canvas = canvas_with_font(40.0);
        canvas.set_color(StyleTarget::Fill, 0.0, 0.0, 0.0, 1.0);
        canvas.fill_text_max_width("AA", 0.0, 60.0, 0.0);
        canvas.fill_text_max_width("AA", 0.0, 60.0, -5.0);
        canvas.fill_text_max_width("AA", 0.0, 60.0, f32::NAN);
        assert!(canvas.buffer.iter().all(|p| p.a == 0.0));
    }

    #[test]
    fn test_stroke_text_outlines_glyph() {
        let mut canvas = canvas_with_font(40.0);
        canvas.set_color(StyleTarget::Stroke, 0.0, 0.0, 0.0, 1.0);
        canvas.set_line_width(1.0);
        canvas.stroke_text("A", 10.0, 50.0);

        // The triangle edge passes near (10, 50); its interior does not
        let edge = canvas.buffer[49 * 64 + 12].a;
        assert!(edge > 0.2);
        let interior = canvas.buffer[45 * 64 + 20].a;
        assert!(interior < edge);
    }
}
