//! Compositing in linear premultiplied space.
//!
//! Combines rasterized coverage, the clip mask, global alpha, and the
//! evaluated paint with the destination buffer under a Porter-Duff
//! operator. Operators that can clear pixels the source never touched
//! iterate the whole canvas; the rest visit only the coverage bounds.

use crate::color::PremulColor;
use crate::gradient::Gradient;
use crate::matrix::Matrix;
use crate::pattern::Pattern;
use crate::raster::Mask;
use crate::style::CompositeOperation;

/// A paint fixed for one drawing operation, ready to evaluate at device
/// pixel centers. Gradients and patterns are defined in user space, so
/// evaluation maps pixels back through the inverse CTM.
pub(crate) enum PreparedPaint<'a> {
    Solid(PremulColor),
    Gradient {
        gradient: &'a Gradient,
        inverse_ctm: Matrix,
    },
    Pattern {
        pattern: &'a Pattern,
        inverse_ctm: Matrix,
    },
}

impl PreparedPaint<'_> {
    pub fn eval(&self, px: f32, py: f32) -> PremulColor {
        match self {
            PreparedPaint::Solid(color) => *color,
            PreparedPaint::Gradient {
                gradient,
                inverse_ctm,
            } => {
                let (ux, uy) = inverse_ctm.apply(px, py);
                gradient.sample_at(ux, uy)
            }
            PreparedPaint::Pattern {
                pattern,
                inverse_ctm,
            } => {
                let (ux, uy) = inverse_ctm.apply(px, py);
                pattern.sample(ux, uy)
            }
        }
    }
}

/// Apply one Porter-Duff operator to premultiplied source and destination.
pub(crate) fn blend(
    op: CompositeOperation,
    s: PremulColor,
    d: PremulColor,
) -> PremulColor {
    match op {
        CompositeOperation::SourceOver => s.add(d.scale(1.0 - s.a)),
        CompositeOperation::DestinationOver => d.add(s.scale(1.0 - d.a)),
        CompositeOperation::SourceIn => s.scale(d.a),
        CompositeOperation::DestinationIn => d.scale(s.a),
        CompositeOperation::SourceOut => s.scale(1.0 - d.a),
        CompositeOperation::DestinationOut => d.scale(1.0 - s.a),
        CompositeOperation::SourceAtop => s.scale(d.a).add(d.scale(1.0 - s.a)),
        CompositeOperation::DestinationAtop => d.scale(s.a).add(s.scale(1.0 - d.a)),
        CompositeOperation::ExclusiveOr => s.scale(1.0 - d.a).add(d.scale(1.0 - s.a)),
        CompositeOperation::Lighter => s.add(d).clamp(),
        CompositeOperation::SourceCopy => s,
    }
}

/// Composite rasterized coverage against the destination buffer.
pub(crate) fn composite(
    buffer: &mut [PremulColor],
    width: usize,
    height: usize,
    mask: &Mask,
    clip: Option<&[f32]>,
    paint: &PreparedPaint,
    global_alpha: f32,
    op: CompositeOperation,
) {
    let full_canvas = op.clears_outside_source();

    let (x0, y0, x1, y1) = if full_canvas {
        (0, 0, width, height)
    } else {
        match mask.bounds {
            Some(b) => (
                b.x0.max(0) as usize,
                b.y0.max(0) as usize,
                (b.x1.max(0) as usize).min(width),
                (b.y1.max(0) as usize).min(height),
            ),
            None => return,
        }
    };

    for y in y0..y1 {
        for x in x0..x1 {
            let index = y * width + x;
            let coverage = mask.coverage(x, y);
            let k = clip.map(|c| c[index]).unwrap_or(1.0);
            let effective = coverage * global_alpha;
            if !full_canvas && (effective <= 0.0 || k <= 0.0) {
                continue;
            }

            // Coverage and global alpha scale the source, which
            // distributes through every operator and empties the pixels
            // a clearing operator never touched. The clip instead
            // selects between the operator result and the untouched
            // destination, so clipped-out pixels are never cleared.
            let d = buffer[index];
            let s = paint.eval(x as f32 + 0.5, y as f32 + 0.5).scale(effective);
            buffer[index] = d.lerp(blend(op, s, d), k);
        }
    }
}

/// Composite a pre-colored premultiplied buffer (the blurred shadow)
/// against the destination. Coverage is baked into the buffer; only the
/// clip mask and global alpha modulate it.
pub(crate) fn composite_buffer(
    buffer: &mut [PremulColor],
    source: &[PremulColor],
    clip: Option<&[f32]>,
    global_alpha: f32,
    op: CompositeOperation,
) {
    let full_canvas = op.clears_outside_source();
    for (index, d) in buffer.iter_mut().enumerate() {
        let s = source[index];
        if !full_canvas && s.a <= 0.0 && s.r <= 0.0 && s.g <= 0.0 && s.b <= 0.0 {
            continue;
        }
        let k = clip.map(|c| c[index]).unwrap_or(1.0);
        if !full_canvas && k <= 0.0 {
            continue;
        }
        *d = d.lerp(blend(op, s.scale(global_alpha), *d), k);
    }
}

/// Erase destination coverage under a mask, for clear_rectangle.
///
/// Honors the clip mask only; global alpha and the composite operation
/// do not apply to erasing.
pub(crate) fn erase(buffer: &mut [PremulColor], mask: &Mask, clip: Option<&[f32]>) {
    let bounds = match mask.bounds {
        Some(b) => b,
        None => return,
    };
    let width = mask.width;
    for y in bounds.y0.max(0) as usize..(bounds.y1.max(0) as usize).min(mask.height) {
        for x in bounds.x0.max(0) as usize..(bounds.x1.max(0) as usize).min(width) {
            let index = y * width + x;
            let k = clip.map(|c| c[index]).unwrap_or(1.0);
            let effective = mask.data[index] * k;
            if effective > 0.0 {
                buffer[index] = buffer[index].scale(1.0 - effective);
            }
        }
    }
}
