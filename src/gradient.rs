//! Gradient paint: color stop storage and linear/radial evaluation.
//!
//! Stops are appended in O(1) with a "sorted" flag; the first lookup
//! after an append sorts them (stable, so stops sharing an offset keep
//! insertion order). Lookup extrapolates linearly beyond the first and
//! last stop and clamps the resulting components to [0, 1].

use crate::color::PremulColor;
use crate::geometry::RadialGradientParams;

/// A color stop in a gradient.
#[derive(Debug, Clone)]
pub(crate) struct GradientStop {
    /// Offset position, clamped to [0, 1] at insertion.
    pub offset: f32,
    /// Linear premultiplied color at this stop.
    pub color: PremulColor,
}

/// Gradient geometry.
#[derive(Debug, Clone, Copy)]
pub(crate) enum GradientKind {
    /// Linear gradient from (x0, y0) to (x1, y1) in user space.
    Linear { x0: f32, y0: f32, x1: f32, y1: f32 },
    /// Radial gradient between two circles in user space.
    Radial(RadialGradientParams),
}

/// A gradient paint with its color stops.
#[derive(Debug, Clone)]
pub(crate) struct Gradient {
    pub kind: GradientKind,
    stops: Vec<GradientStop>,
    sorted: bool,
}

impl Gradient {
    pub fn new_linear(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            kind: GradientKind::Linear { x0, y0, x1, y1 },
            stops: Vec::new(),
            sorted: true,
        }
    }

    pub fn new_radial(params: &RadialGradientParams) -> Self {
        Self {
            kind: GradientKind::Radial(*params),
            stops: Vec::new(),
            sorted: true,
        }
    }

    /// Append a color stop. The offset is clamped to [0, 1].
    pub fn add_color_stop(&mut self, offset: f32, color: PremulColor) {
        self.stops.push(GradientStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        });
        self.sorted = false;
    }

    /// Sort stops by offset if an append invalidated the order.
    pub fn ensure_sorted(&mut self) {
        if !self.sorted {
            self.stops.sort_by(|a, b| {
                a.offset
                    .partial_cmp(&b.offset)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            self.sorted = true;
        }
    }

    pub fn has_stops(&self) -> bool {
        !self.stops.is_empty()
    }

    /// Evaluate the gradient color at a user-space point.
    ///
    /// Requires `ensure_sorted` to have run since the last append.
    pub fn sample_at(&self, x: f32, y: f32) -> PremulColor {
        match self.kind {
            GradientKind::Linear { x0, y0, x1, y1 } => {
                let dx = x1 - x0;
                let dy = y1 - y0;
                let len_sq = dx * dx + dy * dy;
                let t = if len_sq == 0.0 {
                    0.0
                } else {
                    ((x - x0) * dx + (y - y0) * dy) / len_sq
                };
                self.sample_stops(t)
            }
            GradientKind::Radial(params) => match radial_parameter(&params, x, y) {
                Some(t) => self.sample_stops(t),
                None => PremulColor::TRANSPARENT,
            },
        }
    }

    /// Look up the stop color at parameter `t`.
    ///
    /// Outside the stop range the first/last segment continues linearly;
    /// components are clamped afterwards. Stops sharing an offset keep
    /// insertion order: sampling exactly at the offset yields the first,
    /// strictly above it the next.
    pub fn sample_stops(&self, t: f32) -> PremulColor {
        debug_assert!(self.sorted);
        let stops = &self.stops;
        match stops.len() {
            0 => PremulColor::TRANSPARENT,
            1 => stops[0].color,
            n => {
                let mut index = n - 2;
                for i in 0..n - 1 {
                    if t <= stops[i + 1].offset {
                        index = i;
                        break;
                    }
                }
                let lo = &stops[index];
                let hi = &stops[index + 1];
                let span = hi.offset - lo.offset;
                let factor = if span <= f32::EPSILON {
                    if t <= lo.offset {
                        0.0
                    } else {
                        1.0
                    }
                } else {
                    (t - lo.offset) / span
                };
                lo.color.lerp(hi.color, factor).clamp()
            }
        }
    }
}

/// Solve the cone parameter of the W3C radial gradient formulation.
///
/// Returns the largest t in [0, 1] whose circle contains the point, or
/// None when the point lies outside the cone, the circle radius at the
/// solution is negative, or the solved t falls outside [0, 1].
/// Computed in f64 for root stability.
fn radial_parameter(params: &RadialGradientParams, x: f32, y: f32) -> Option<f32> {
    let cdx = (params.x1 - params.x0) as f64;
    let cdy = (params.y1 - params.y0) as f64;
    let rd = (params.r1 - params.r0) as f64;
    let pdx = (x - params.x0) as f64;
    let pdy = (y - params.y0) as f64;
    let r0 = params.r0 as f64;

    let a = cdx * cdx + cdy * cdy - rd * rd;
    let b = pdx * cdx + pdy * cdy + r0 * rd;
    let c = pdx * pdx + pdy * pdy - r0 * r0;

    let radius_at = |t: f64| r0 + t * rd;

    let t = if a.abs() < 1e-12 {
        // Degenerate cone: the quadratic collapses to 2·b·t = c
        if b.abs() < 1e-12 {
            return None;
        }
        let t = c / (2.0 * b);
        if radius_at(t) < 0.0 {
            return None;
        }
        t
    } else {
        let disc = b * b - a * c;
        if disc < 0.0 {
            return None;
        }
        let sq = disc.sqrt();
        let t1 = (b + sq) / a;
        let t2 = (b - sq) / a;
        let hi = t1.max(t2);
        let lo = t1.min(t2);
        if radius_at(hi) >= 0.0 {
            hi
        } else if radius_at(lo) >= 0.0 {
            lo
        } else {
            return None;
        }
    };

    // A root outside [0, 1] means no circle of the family reaches the
    // point; the paint is transparent there, not padded to an end stop
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(t as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn premul(r: f32, g: f32, b: f32, a: f32) -> PremulColor {
        PremulColor { r, g, b, a }
    }

    fn two_stop() -> Gradient {
        let mut g = Gradient::new_linear(0.0, 0.0, 100.0, 0.0);
        g.add_color_stop(0.0, premul(1.0, 0.0, 0.0, 1.0));
        g.add_color_stop(1.0, premul(0.0, 0.0, 1.0, 1.0));
        g.ensure_sorted();
        g
    }

    #[test]
    fn test_linear_midpoint() {
        let g = two_stop();
        let c = g.sample_at(50.0, 0.0);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.b - 0.5).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_linear_off_axis_projection() {
        let g = two_stop();
        // Perpendicular displacement does not change t
        let on = g.sample_at(25.0, 0.0);
        let off = g.sample_at(25.0, 40.0);
        assert_eq!(on, off);
    }

    #[test]
    fn test_degenerate_line_samples_t_zero() {
        let mut g = Gradient::new_linear(10.0, 10.0, 10.0, 10.0);
        g.add_color_stop(0.0, premul(1.0, 0.0, 0.0, 1.0));
        g.add_color_stop(1.0, premul(0.0, 1.0, 0.0, 1.0));
        g.ensure_sorted();
        assert_eq!(g.sample_at(99.0, -4.0), premul(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_extrapolation_clamps() {
        // Stops at 0.4 and 0.6: sampling at 0 and 1 continues the
        // segment linearly, clamped to [0, 1] per channel.
        let mut g = Gradient::new_linear(0.0, 0.0, 1.0, 0.0);
        g.add_color_stop(0.4, premul(0.4, 0.4, 0.4, 1.0));
        g.add_color_stop(0.6, premul(0.6, 0.6, 0.6, 1.0));
        g.ensure_sorted();

        let c = g.sample_stops(0.5);
        assert!((c.r - 0.5).abs() < 1e-6);

        // Linear continuation: value == t here
        let c = g.sample_stops(0.1);
        assert!((c.r - 0.1).abs() < 1e-6);

        // Far below: clamped at 0
        let c = g.sample_stops(-2.0);
        assert_eq!(c.r, 0.0);

        // Far above: clamped at 1
        let c = g.sample_stops(5.0);
        assert_eq!(c.r, 1.0);
    }

    #[test]
    fn test_single_stop_everywhere() {
        let mut g = Gradient::new_linear(0.0, 0.0, 1.0, 0.0);
        g.add_color_stop(0.7, premul(0.0, 1.0, 0.0, 1.0));
        g.ensure_sorted();
        assert_eq!(g.sample_stops(-1.0), premul(0.0, 1.0, 0.0, 1.0));
        assert_eq!(g.sample_stops(0.7), premul(0.0, 1.0, 0.0, 1.0));
        assert_eq!(g.sample_stops(2.0), premul(0.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_duplicate_offsets_keep_insertion_order() {
        let mut g = Gradient::new_linear(0.0, 0.0, 1.0, 0.0);
        g.add_color_stop(0.0, premul(0.0, 0.0, 0.0, 1.0));
        g.add_color_stop(0.5, premul(1.0, 0.0, 0.0, 1.0));
        g.add_color_stop(0.5, premul(0.0, 1.0, 0.0, 1.0));
        g.add_color_stop(1.0, premul(1.0, 1.0, 1.0, 1.0));
        g.ensure_sorted();

        // Exactly at the shared offset: the first of the pair
        assert_eq!(g.sample_stops(0.5), premul(1.0, 0.0, 0.0, 1.0));
        // Just above: interpolating away from the second
        let c = g.sample_stops(0.500001);
        assert!(c.g > 0.99);
    }

    #[test]
    fn test_unsorted_stops_sorted_on_demand() {
        let mut g = Gradient::new_linear(0.0, 0.0, 1.0, 0.0);
        g.add_color_stop(1.0, premul(1.0, 1.0, 1.0, 1.0));
        g.add_color_stop(0.0, premul(0.0, 0.0, 0.0, 1.0));
        g.ensure_sorted();
        let c = g.sample_stops(0.25);
        assert!((c.r - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_offset_clamped_at_insertion() {
        let mut g = Gradient::new_linear(0.0, 0.0, 1.0, 0.0);
        g.add_color_stop(-0.5, premul(1.0, 0.0, 0.0, 1.0));
        g.add_color_stop(1.5, premul(0.0, 0.0, 1.0, 1.0));
        g.ensure_sorted();
        let c = g.sample_stops(0.5);
        assert!((c.r - 0.5).abs() < 1e-6);
        assert!((c.b - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_radial_concentric() {
        let params = RadialGradientParams {
            x0: 50.0,
            y0: 50.0,
            r0: 0.0,
            x1: 50.0,
            y1: 50.0,
            r1: 10.0,
        };
        assert!((radial_parameter(&params, 55.0, 50.0).unwrap() - 0.5).abs() < 1e-5);
        assert!((radial_parameter(&params, 50.0, 50.0).unwrap() - 0.0).abs() < 1e-5);
        // Outside the outer circle no t in [0, 1] contains the point:
        // the paint is fully transparent there
        assert_eq!(radial_parameter(&params, 80.0, 50.0), None);
    }

    #[test]
    fn test_radial_cone_excludes_points_behind_apex() {
        // Cone apex to the left of the small circle: points far on the
        // other side have no circle containing them.
        let params = RadialGradientParams {
            x0: 0.0,
            y0: 0.0,
            r0: 0.0,
            x1: 20.0,
            y1: 0.0,
            r1: 10.0,
        };
        assert!(radial_parameter(&params, -30.0, 0.0).is_none());
        assert!(radial_parameter(&params, 10.0, 0.0).is_some());
    }
}
