//! Shadow rendering: a colored silhouette blurred by three box passes.
//!
//! The composed three-pass box filter approximates a Gaussian with
//! sigma = blur / 2 (Wells 1986); the box radius is round(sigma * sqrt 3).
//! Pixels outside the canvas are treated as transparent, so shadows fade
//! at the edges instead of smearing.

use crate::color::PremulColor;
use crate::raster::Mask;

/// Whether the current shadow state produces any output.
pub(crate) fn shadow_active(color_alpha: f32, offset_x: f32, offset_y: f32, blur: f32) -> bool {
    color_alpha > 0.0 && (offset_x != 0.0 || offset_y != 0.0 || blur > 0.0)
}

/// Color an offset silhouette mask and blur it.
///
/// The mask is expected to be rasterized from the already-offset
/// geometry; this function only colors and blurs.
pub(crate) fn shadow_buffer(mask: &Mask, color: PremulColor, blur: f32) -> Vec<PremulColor> {
    let mut buffer: Vec<PremulColor> = mask.data.iter().map(|&c| color.scale(c)).collect();

    let sigma = blur.max(0.0) / 2.0;
    let radius = (sigma * 3.0f32.sqrt()).round() as i32;
    if radius <= 0 {
        return buffer;
    }

    let width = mask.width;
    let height = mask.height;
    let mut scratch = vec![PremulColor::TRANSPARENT; buffer.len()];
    for _ in 0..3 {
        box_blur_horizontal(&buffer, &mut scratch, width, height, radius);
        std::mem::swap(&mut buffer, &mut scratch);
    }
    for _ in 0..3 {
        box_blur_vertical(&buffer, &mut scratch, width, height, radius);
        std::mem::swap(&mut buffer, &mut scratch);
    }
    buffer
}

fn box_blur_horizontal(
    src: &[PremulColor],
    dst: &mut [PremulColor],
    width: usize,
    height: usize,
    radius: i32,
) {
    let norm = 1.0 / (2 * radius + 1) as f32;
    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        let mut sum = PremulColor::TRANSPARENT;
        for x in 0..=radius.min(width as i32 - 1) {
            sum = sum.add(row[x as usize]);
        }
        for x in 0..width as i32 {
            dst[y * width + x as usize] = sum.scale(norm);
            let entering = x + radius + 1;
            if entering < width as i32 {
                sum = sum.add(row[entering as usize]);
            }
            let leaving = x - radius;
            if leaving >= 0 {
                let p = row[leaving as usize];
                sum = sum.add(p.scale(-1.0));
            }
        }
    }
}

fn box_blur_vertical(
    src: &[PremulColor],
    dst: &mut [PremulColor],
    width: usize,
    height: usize,
    radius: i32,
) {
    let norm = 1.0 / (2 * radius + 1) as f32;
    for x in 0..width {
        let mut sum = PremulColor::TRANSPARENT;
        for y in 0..=radius.min(height as i32 - 1) {
            sum = sum.add(src[y as usize * width + x]);
        }
        for y in 0..height as i32 {
            dst[y as usize * width + x] = sum.scale(norm);
            let entering = y + radius + 1;
            if entering < height as i32 {
                sum = sum.add(src[entering as usize * width + x]);
            }
            let leaving = y - radius;
            if leaving >= 0 {
                let p = src[leaving as usize * width + x];
                sum = sum.add(p.scale(-1.0));
            }
        }
    }
}
