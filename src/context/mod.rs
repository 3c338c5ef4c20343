//! The canvas rendering context.

mod drawing;
mod image_ops;
mod path_ops;
mod text_rendering;
mod transform;

use crate::color::PremulColor;
use crate::drawing_state::DrawingState;
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::{Point, RadialGradientParams};
use crate::gradient::Gradient;
use crate::path::Path;
use crate::pattern::Pattern;
use crate::style::{
    CompositeOperation, LineCap, LineJoin, Paint, Repetition, StyleTarget,
};

/// Maximum canvas dimension (same as Chrome).
const MAX_DIMENSION: u32 = 32767;

/// A software 2D canvas.
///
/// Pixels are stored in linear premultiplied RGBA; sRGB8 enters and
/// leaves only through the image-data operations and the color setters.
pub struct Canvas {
    /// Width of the canvas in pixels.
    pub(crate) width: u32,
    /// Height of the canvas in pixels.
    pub(crate) height: u32,
    /// Pixel buffer, linear premultiplied, row-major.
    pub(crate) buffer: Vec<PremulColor>,
    /// Current drawing state.
    pub(crate) state: DrawingState,
    /// Stack of saved drawing states.
    state_stack: Vec<DrawingState>,
    /// Working path in device pixel space.
    pub(crate) path: Path,
    /// Current point in user space, if the path has one.
    pub(crate) current_point: Option<Point>,
    /// Start of the current subpath in user space.
    pub(crate) subpath_start: Option<Point>,
}

impl Canvas {
    /// Create a canvas with the specified dimensions in pixels.
    ///
    /// The canvas starts fully transparent.
    pub fn new(width: u32, height: u32) -> CanvasResult<Self> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(CanvasError::InvalidDimensions { width, height });
        }

        Ok(Self {
            width,
            height,
            buffer: vec![PremulColor::TRANSPARENT; width as usize * height as usize],
            state: DrawingState::default(),
            state_stack: Vec::new(),
            path: Path::new(),
            current_point: None,
            subpath_start: None,
        })
    }

    /// Get canvas width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get canvas height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Save the current drawing state, including the clip mask.
    pub fn save(&mut self) {
        log::debug!(target: "canvas", "save");
        self.state_stack.push(self.state.clone());
    }

    /// Restore the previously saved drawing state.
    ///
    /// A no-op when only the initial state remains. The pixel buffer is
    /// unaffected.
    pub fn restore(&mut self) {
        log::debug!(target: "canvas", "restore");
        if let Some(state) = self.state_stack.pop() {
            self.state = state;
        }
    }

    // --- Style setters ---

    fn style_mut(&mut self, target: StyleTarget) -> &mut Paint {
        match target {
            StyleTarget::Fill => &mut self.state.fill_style,
            StyleTarget::Stroke => &mut self.state.stroke_style,
        }
    }

    /// Set a style to a solid color.
    ///
    /// Components are nominally in [0, 1]; out-of-range values are
    /// accepted and clamped after premultiplication. Non-finite
    /// components are ignored.
    pub fn set_color(&mut self, target: StyleTarget, r: f32, g: f32, b: f32, a: f32) {
        log::debug!(target: "canvas", "set_color {:?} {} {} {} {}", target, r, g, b, a);
        if !(r.is_finite() && g.is_finite() && b.is_finite() && a.is_finite()) {
            return;
        }
        *self.style_mut(target) = Paint::Color(PremulColor::from_srgb(r, g, b, a));
    }

    /// Set a style to a linear gradient with no stops yet.
    pub fn set_linear_gradient(&mut self, target: StyleTarget, x0: f32, y0: f32, x1: f32, y1: f32) {
        log::debug!(target: "canvas", "set_linear_gradient {:?}", target);
        if !(x0.is_finite() && y0.is_finite() && x1.is_finite() && y1.is_finite()) {
            return;
        }
        *self.style_mut(target) = Paint::LinearGradient(Gradient::new_linear(x0, y0, x1, y1));
    }

    /// Set a style to a radial gradient with no stops yet.
    ///
    /// Negative radii are invalid and leave the style unchanged.
    pub fn set_radial_gradient(&mut self, target: StyleTarget, params: &RadialGradientParams) {
        log::debug!(target: "canvas", "set_radial_gradient {:?}", target);
        let finite = params.x0.is_finite()
            && params.y0.is_finite()
            && params.r0.is_finite()
            && params.x1.is_finite()
            && params.y1.is_finite()
            && params.r1.is_finite();
        if !finite || params.r0 < 0.0 || params.r1 < 0.0 {
            log::warn!(target: "canvas", "invalid radial gradient ignored");
            return;
        }
        *self.style_mut(target) = Paint::RadialGradient(Gradient::new_radial(params));
    }

    /// Append a color stop to the gradient active on the style target.
    ///
    /// A no-op when the target is not currently a gradient.
    pub fn add_color_stop(
        &mut self,
        target: StyleTarget,
        offset: f32,
        r: f32,
        g: f32,
        b: f32,
        a: f32,
    ) {
        if !(offset.is_finite() && r.is_finite() && g.is_finite() && b.is_finite() && a.is_finite())
        {
            return;
        }
        match self.style_mut(target) {
            Paint::LinearGradient(gradient) | Paint::RadialGradient(gradient) => {
                gradient.add_color_stop(offset, PremulColor::from_srgb(r, g, b, a));
            }
            _ => {
                log::warn!(target: "canvas", "add_color_stop without an active gradient");
            }
        }
    }

    /// Set a style to a pattern from sRGB8 RGBA pixels.
    ///
    /// The pixel data is copied. `stride` is the row stride in bytes.
    pub fn set_pattern(
        &mut self,
        target: StyleTarget,
        data: &[u8],
        width: u32,
        height: u32,
        stride: usize,
        repetition: Repetition,
    ) {
        log::debug!(target: "canvas", "set_pattern {:?} {}x{}", target, width, height);
        if data.is_empty() {
            return;
        }
        match Pattern::new(data, width, height, stride, repetition) {
            Ok(pattern) => *self.style_mut(target) = Paint::Pattern(pattern),
            Err(err) => log::warn!(target: "canvas", "set_pattern ignored: {}", err),
        }
    }

    // --- Line state ---

    /// Set the line width. Non-finite or non-positive values are ignored.
    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    /// Set the line cap style.
    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.state.line_cap = cap;
    }

    /// Set the line join style.
    pub fn set_line_join(&mut self, join: LineJoin) {
        self.state.line_join = join;
    }

    /// Set the miter limit. Values below 1 or non-finite are ignored.
    pub fn set_miter_limit(&mut self, limit: f32) {
        if limit.is_finite() && limit >= 1.0 {
            self.state.miter_limit = limit;
        }
    }

    /// Set the line dash pattern.
    ///
    /// Any non-finite or negative value makes the whole call a no-op.
    /// Odd-length arrays are duplicated to become even.
    pub fn set_line_dash(&mut self, segments: &[f32]) {
        if segments.iter().any(|&v| !v.is_finite() || v < 0.0) {
            return;
        }
        let mut dash = segments.to_vec();
        if dash.len() % 2 != 0 {
            dash.extend_from_slice(segments);
        }
        self.state.line_dash = dash;
    }

    /// Get the current line dash pattern.
    pub fn get_line_dash(&self) -> &[f32] {
        &self.state.line_dash
    }

    /// Set the line dash offset. Non-finite values are ignored.
    pub fn set_line_dash_offset(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.line_dash_offset = offset;
        }
    }

    // --- Global state ---

    /// Set the global alpha. Values outside [0, 1] are ignored.
    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    /// Set the global composite operation.
    pub fn set_global_composite_operation(&mut self, op: CompositeOperation) {
        self.state.global_composite_operation = op;
    }

    // --- Shadow state ---

    /// Set the shadow color.
    ///
    /// Components are accepted out of range and clamped per channel
    /// after premultiplication.
    pub fn set_shadow_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        if !(r.is_finite() && g.is_finite() && b.is_finite() && a.is_finite()) {
            return;
        }
        self.state.shadow_color = PremulColor::from_srgb(r, g, b, a);
    }

    /// Set the horizontal shadow offset. Non-finite values are ignored.
    pub fn set_shadow_offset_x(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.shadow_offset_x = offset;
        }
    }

    /// Set the vertical shadow offset. Non-finite values are ignored.
    pub fn set_shadow_offset_y(&mut self, offset: f32) {
        if offset.is_finite() {
            self.state.shadow_offset_y = offset;
        }
    }

    /// Set the shadow blur. Negative or non-finite values are ignored.
    pub fn set_shadow_blur(&mut self, blur: f32) {
        if blur.is_finite() && blur >= 0.0 {
            self.state.shadow_blur = blur;
        }
    }
}
