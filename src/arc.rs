//! Arc geometry: sweep normalization, conversion of circular arcs into
//! cubic Bezier spans, and the arc_to tangent-circle construction.
//!
//! Arcs are emitted as one cubic per full 90 degree span plus one
//! shorter span for the remainder. The cubics are produced in user
//! space; the caller transforms their control points to device space
//! before flattening.

use std::f32::consts::{FRAC_PI_2, PI};

use crate::geometry::{ArcParams, ArcToParams, Point};

/// A cubic Bezier segment without its start point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CubicSegment {
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

/// Convert canvas `(start_angle, end_angle, anticlockwise)` into a single
/// signed sweep angle.
///
/// When anticlockwise is false the sweep is normalized modulo 2π into
/// (0, 2π]; symmetric into [-2π, 0) when anticlockwise is true.
pub(crate) fn compute_sweep_angle(start: f32, end: f32, anticlockwise: bool) -> f32 {
    let two_pi = 2.0 * PI;
    let mut sweep = end - start;

    if anticlockwise {
        if sweep > 0.0 {
            sweep -= two_pi * ((sweep / two_pi).floor() + 1.0);
        }
        if sweep == 0.0 && end != start {
            sweep = -two_pi;
        }
    } else {
        if sweep < 0.0 {
            sweep += two_pi * ((-sweep / two_pi).floor() + 1.0);
        }
        if sweep == 0.0 && end != start {
            sweep = two_pi;
        }
    }

    sweep
}

/// Convert an arc to its start point and cubic Bezier spans.
///
/// Returns None for a negative or non-finite radius; the caller treats
/// the operation as invalid. A zero radius yields the center point with
/// no spans.
pub(crate) fn arc_to_cubics(params: &ArcParams) -> Option<(Point, Vec<CubicSegment>)> {
    let ArcParams {
        x,
        y,
        radius,
        start_angle,
        end_angle,
        anticlockwise,
    } = *params;

    if !radius.is_finite() || radius < 0.0 || !x.is_finite() || !y.is_finite() {
        return None;
    }
    if !start_angle.is_finite() || !end_angle.is_finite() {
        return None;
    }

    let point_at = |angle: f32| Point::new(x + radius * angle.cos(), y + radius * angle.sin());

    let start = point_at(start_angle);
    if radius == 0.0 {
        return Some((start, Vec::new()));
    }

    let sweep = compute_sweep_angle(start_angle, end_angle, anticlockwise);

    // Full 90 degree spans plus one shorter remainder span.
    let full_spans = (sweep.abs() / FRAC_PI_2).floor() as usize;
    let remainder = sweep.abs() - full_spans as f32 * FRAC_PI_2;
    let direction = sweep.signum();

    let mut segments = Vec::with_capacity(full_spans + 1);
    let mut angle = start_angle;
    for i in 0..=full_spans {
        let delta = if i < full_spans {
            FRAC_PI_2 * direction
        } else if remainder > 1e-7 {
            remainder * direction
        } else {
            break;
        };

        let next = angle + delta;
        let k = (4.0 / 3.0) * (delta / 4.0).tan() * radius;
        let p0 = point_at(angle);
        let p3 = point_at(next);
        segments.push(CubicSegment {
            c1: Point::new(p0.x - k * angle.sin(), p0.y + k * angle.cos()),
            c2: Point::new(p3.x + k * next.sin(), p3.y - k * next.cos()),
            end: p3,
        });
        angle = next;
    }

    Some((start, segments))
}

/// Resolution of an arc_to call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ArcToGeometry {
    /// Degenerate input: append a line to the first control point.
    Line,
    /// Tangent circle found: line to `start`, then the arc.
    Arc { start: Point, params: ArcParams },
}

/// Construct the tangent circle for arc_to.
///
/// `(x0, y0)` is the current point. The circle of the given radius is
/// tangent to the half-line from (x1, y1) toward (x0, y0) and to the
/// half-line from (x1, y1) toward (x2, y2).
pub(crate) fn arc_to_geometry(x0: f32, y0: f32, params: &ArcToParams) -> ArcToGeometry {
    let ArcToParams {
        x1,
        y1,
        x2,
        y2,
        radius,
    } = *params;

    if radius == 0.0 {
        return ArcToGeometry::Line;
    }

    // Unit vectors from the corner to the adjacent points
    let v1x = x0 - x1;
    let v1y = y0 - y1;
    let v2x = x2 - x1;
    let v2y = y2 - y1;

    let len1 = (v1x * v1x + v1y * v1y).sqrt();
    let len2 = (v2x * v2x + v2y * v2y).sqrt();
    if len1 < 1e-6 || len2 < 1e-6 {
        return ArcToGeometry::Line;
    }

    let v1x = v1x / len1;
    let v1y = v1y / len1;
    let v2x = v2x / len2;
    let v2y = v2y / len2;

    let cross = v1x * v2y - v1y * v2x;
    let dot = v1x * v2x + v1y * v2y;
    let angle = cross.atan2(dot);
    if angle.abs() < 1e-6 {
        // Collinear points
        return ArcToGeometry::Line;
    }

    // Tangent points lie at radius / tan(angle / 2) from the corner
    let tan_half = (angle / 2.0).tan().abs();
    let seg_len = radius / tan_half;

    let start = Point::new(x1 + v1x * seg_len, y1 + v1y * seg_len);
    let end = Point::new(x1 + v2x * seg_len, y1 + v2y * seg_len);

    // The center sits at one radius along the inward normal of the first edge
    let sign = if cross < 0.0 { -1.0 } else { 1.0 };
    let cx = start.x + (-v1y * sign) * radius;
    let cy = start.y + (v1x * sign) * radius;

    let start_angle = (start.y - cy).atan2(start.x - cx);
    let end_angle = (end.y - cy).atan2(end.x - cx);

    ArcToGeometry::Arc {
        start,
        params: ArcParams {
            x: cx,
            y: cy,
            radius,
            start_angle,
            end_angle,
            anticlockwise: cross > 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PI_F32: f32 = std::f32::consts::PI;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_sweep_clockwise_wraps() {
        assert!(approx_eq(compute_sweep_angle(0.0, PI_F32, false), PI_F32));
        // end < start wraps forward
        assert!(approx_eq(
            compute_sweep_angle(PI_F32, 0.0, false),
            PI_F32
        ));
        // Equal angles with different values produce a full turn
        assert!(approx_eq(
            compute_sweep_angle(0.0, 2.0 * PI_F32, false),
            2.0 * PI_F32
        ));
    }

    #[test]
    fn test_sweep_anticlockwise() {
        assert!(approx_eq(
            compute_sweep_angle(0.0, PI_F32 / 2.0, true),
            -1.5 * PI_F32
        ));
        assert!(approx_eq(
            compute_sweep_angle(PI_F32 / 2.0, 0.0, true),
            -PI_F32 / 2.0
        ));
    }

    #[test]
    fn test_full_circle_spans() {
        let (start, segments) = arc_to_cubics(&ArcParams {
            x: 50.0,
            y: 50.0,
            radius: 50.0,
            start_angle: 0.0,
            end_angle: 2.0 * PI_F32,
            anticlockwise: false,
        })
        .unwrap();

        assert!(approx_eq(start.x, 100.0));
        assert!(approx_eq(start.y, 50.0));
        assert_eq!(segments.len(), 4);
        let end = segments.last().unwrap().end;
        assert!(approx_eq(end.x, 100.0));
        assert!(approx_eq(end.y, 50.0));
    }

    #[test]
    fn test_quarter_circle_endpoint() {
        let (start, segments) = arc_to_cubics(&ArcParams {
            x: 50.0,
            y: 50.0,
            radius: 50.0,
            start_angle: 0.0,
            end_angle: PI_F32 / 2.0,
            anticlockwise: false,
        })
        .unwrap();

        assert!(approx_eq(start.x, 100.0));
        assert_eq!(segments.len(), 1);
        let end = segments[0].end;
        assert!(approx_eq(end.x, 50.0));
        assert!(approx_eq(end.y, 100.0));
    }

    #[test]
    fn test_negative_radius_rejected() {
        assert!(arc_to_cubics(&ArcParams {
            x: 0.0,
            y: 0.0,
            radius: -1.0,
            start_angle: 0.0,
            end_angle: 1.0,
            anticlockwise: false,
        })
        .is_none());
    }

    #[test]
    fn test_zero_radius_is_center_point() {
        let (start, segments) = arc_to_cubics(&ArcParams {
            x: 7.0,
            y: 9.0,
            radius: 0.0,
            start_angle: 0.0,
            end_angle: 1.0,
            anticlockwise: false,
        })
        .unwrap();
        assert_eq!(start, Point::new(7.0, 9.0));
        assert!(segments.is_empty());
    }

    #[test]
    fn test_arc_to_right_angle_tangents() {
        // From (0,0) through the corner (50,0) toward (50,50) with r=20:
        // tangent points are (30,0) and (50,20).
        let geometry = arc_to_geometry(
            0.0,
            0.0,
            &ArcToParams {
                x1: 50.0,
                y1: 0.0,
                x2: 50.0,
                y2: 50.0,
                radius: 20.0,
            },
        );
        match geometry {
            ArcToGeometry::Arc { start, params } => {
                assert!(approx_eq(start.x, 30.0));
                assert!(approx_eq(start.y, 0.0));
                assert!(approx_eq(params.x, 30.0));
                assert!(approx_eq(params.y, 20.0));
                assert!(approx_eq(params.radius, 20.0));
            }
            ArcToGeometry::Line => panic!("expected an arc"),
        }
    }

    #[test]
    fn test_arc_to_collinear_is_line() {
        let geometry = arc_to_geometry(
            0.0,
            0.0,
            &ArcToParams {
                x1: 10.0,
                y1: 0.0,
                x2: 20.0,
                y2: 0.0,
                radius: 5.0,
            },
        );
        assert_eq!(geometry, ArcToGeometry::Line);
    }

    #[test]
    fn test_arc_to_zero_radius_is_line() {
        let geometry = arc_to_geometry(
            0.0,
            0.0,
            &ArcToParams {
                x1: 10.0,
                y1: 0.0,
                x2: 10.0,
                y2: 10.0,
                radius: 0.0,
            },
        );
        assert_eq!(geometry, ArcToGeometry::Line);
    }
}
