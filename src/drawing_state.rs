//! Drawing state that can be saved and restored.

use crate::color::PremulColor;
use crate::font::Font;
use crate::matrix::Matrix;
use crate::style::{CompositeOperation, LineCap, LineJoin, Paint, TextAlign, TextBaseline};

/// Drawing state that can be saved and restored.
///
/// The clip mask is part of the state: `None` means fully opaque, a
/// dense per-pixel coverage buffer otherwise. It is allocated lazily on
/// the first clip and deep-copied by save.
#[derive(Debug, Clone)]
pub(crate) struct DrawingState {
    /// Current fill style.
    pub fill_style: Paint,
    /// Current stroke style.
    pub stroke_style: Paint,
    /// Current line width in user-space units.
    pub line_width: f32,
    /// Current line cap style.
    pub line_cap: LineCap,
    /// Current line join style.
    pub line_join: LineJoin,
    /// Current miter limit.
    pub miter_limit: f32,
    /// Current line dash pattern.
    pub line_dash: Vec<f32>,
    /// Current line dash offset.
    pub line_dash_offset: f32,
    /// Current font outline source, if a valid font has been set.
    pub font: Option<Font>,
    /// Current font size (em height) in pixels.
    pub font_size: f32,
    /// Current text alignment.
    pub text_align: TextAlign,
    /// Current text baseline.
    pub text_baseline: TextBaseline,
    /// Current global alpha.
    pub global_alpha: f32,
    /// Current composite operation.
    pub global_composite_operation: CompositeOperation,
    /// Current transform matrix.
    pub transform: Matrix,
    /// Shadow color in linear premultiplied form.
    pub shadow_color: PremulColor,
    /// Shadow offset in device pixels.
    pub shadow_offset_x: f32,
    pub shadow_offset_y: f32,
    /// Shadow Gaussian blur parameter.
    pub shadow_blur: f32,
    /// Per-pixel clip coverage; None is fully opaque.
    pub clip_mask: Option<Vec<f32>>,
}

impl Default for DrawingState {
    fn default() -> Self {
        Self {
            fill_style: Paint::default(),
            stroke_style: Paint::default(),
            line_width: 1.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            miter_limit: 10.0,
            line_dash: Vec::new(),
            line_dash_offset: 0.0,
            font: None,
            font_size: 10.0,
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
            global_alpha: 1.0,
            global_composite_operation: CompositeOperation::default(),
            transform: Matrix::identity(),
            shadow_color: PremulColor::TRANSPARENT,
            shadow_offset_x: 0.0,
            shadow_offset_y: 0.0,
            shadow_blur: 0.0,
            clip_mask: None,
        }
    }
}
