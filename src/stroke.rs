//! Stroke expansion.
//!
//! Converts a flattened device-space path plus line width, cap, join,
//! miter limit, and dash parameters into a filled outline path. Each
//! expanded polyline is traced once along each side in opposite
//! directions, so the nonzero rule fills the stroke interior with
//! coverage 1.

use crate::geometry::{lerp, Point};
use crate::path::{Path, Subpath};
use crate::style::{LineCap, LineJoin};

/// Segment count used to approximate rounded joins and half-disk caps.
const ROUND_SEGMENTS: usize = 8;

/// Stroke parameters in device units.
#[derive(Debug, Clone)]
pub(crate) struct StrokeStyle {
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dash: Vec<f32>,
    pub dash_offset: f32,
}

fn rot90(d: Point) -> Point {
    Point::new(-d.y, d.x)
}

fn direction(from: Point, to: Point) -> Option<Point> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-12 {
        None
    } else {
        Some(Point::new(dx / len, dy / len))
    }
}

fn offset(p: Point, n: Point, w: f32) -> Point {
    Point::new(p.x + n.x * w, p.y + n.y * w)
}

/// Expand a stroked path into a fillable outline.
pub(crate) fn expand_stroke(path: &Path, style: &StrokeStyle) -> Path {
    let half_width = style.width / 2.0;
    let mut outline = Path::new();
    if half_width <= 0.0 {
        return outline;
    }

    let dashing = style.dash.iter().sum::<f32>() > 0.0;

    for subpath in &path.subpaths {
        let points = &subpath.points;
        if points.is_empty() {
            continue;
        }

        if dashing {
            for run in dash_polyline(points, subpath.closed, &style.dash, style.dash_offset) {
                expand_open(&run, half_width, style, &mut outline);
            }
        } else if subpath.closed && points.len() >= 3 {
            expand_closed(points, half_width, style, &mut outline);
        } else {
            let mut run = points.clone();
            if subpath.closed {
                // A closed subpath too short to form a ring strokes as an
                // open segment there and back.
                run.push(points[0]);
            }
            expand_open(&run, half_width, style, &mut outline);
        }
    }

    outline
}

/// Split a polyline into "on" runs by walking the dash pattern along its
/// arc length. The offset is reduced modulo the pattern length.
fn dash_polyline(points: &[Point], closed: bool, dash: &[f32], dash_offset: f32) -> Vec<Vec<Point>> {
    let total: f32 = dash.iter().sum();
    if total <= 0.0 {
        return vec![points.to_vec()];
    }

    let mut walk: Vec<Point> = points.to_vec();
    if closed && points.len() >= 2 {
        walk.push(points[0]);
    }

    // Position the walk at dash_offset into the pattern
    let mut position = dash_offset.rem_euclid(total);
    let mut index = 0;
    while position >= dash[index] {
        position -= dash[index];
        index = (index + 1) % dash.len();
    }
    let mut remaining = dash[index] - position;
    let mut on = index % 2 == 0;

    let mut runs: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    if on {
        current.push(walk[0]);
    }

    for pair in walk.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let seg_len = a.distance(b);
        if seg_len <= 0.0 {
            continue;
        }
        let mut consumed = 0.0;

        while seg_len - consumed > remaining {
            consumed += remaining;
            let t = consumed / seg_len;
            let split = Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t));

            if on {
                current.push(split);
                if current.len() >= 2 {
                    runs.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            } else {
                current.push(split);
            }

            on = !on;
            index = (index + 1) % dash.len();
            remaining = dash[index];
            // Skip zero-length pattern entries
            while remaining <= 0.0 {
                on = !on;
                index = (index + 1) % dash.len();
                remaining = dash[index];
            }
            if !on {
                current.clear();
            }
        }

        remaining -= seg_len - consumed;
        if on {
            current.push(b);
        }
    }

    if on && current.len() >= 2 {
        runs.push(current);
    }
    runs
}

/// Expand one open polyline into a single closed outline: down the left
/// side, around the end cap, back up the right side, around the start cap.
fn expand_open(points: &[Point], w: f32, style: &StrokeStyle, outline: &mut Path) {
    // Collapse zero-length segments; they contribute no normal
    let mut pts: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        match pts.last() {
            Some(q) if q.distance(p) < 1e-12 => {}
            _ => pts.push(p),
        }
    }

    if pts.len() < 2 {
        // Isolated point: honor the cap at that location
        if let Some(&p) = pts.first() {
            emit_cap_dot(p, w, style.cap, outline);
        }
        return;
    }

    let dirs: Vec<Point> = pts
        .windows(2)
        .filter_map(|pair| direction(pair[0], pair[1]))
        .collect();
    if dirs.is_empty() {
        emit_cap_dot(pts[0], w, style.cap, outline);
        return;
    }

    let first_dir = dirs[0];
    let last_dir = *dirs.last().unwrap();
    let first = pts[0];
    let last = *pts.last().unwrap();

    let mut left: Vec<Point> = Vec::new();
    let mut right: Vec<Point> = Vec::new();

    left.push(offset(first, rot90(first_dir), w));
    right.push(offset(first, rot90(first_dir), -w));

    for i in 1..pts.len() - 1 {
        append_join(&mut left, pts[i], dirs[i - 1], dirs[i], w, 1.0, style);
        append_join(&mut right, pts[i], dirs[i - 1], dirs[i], w, -1.0, style);
    }

    left.push(offset(last, rot90(last_dir), w));
    right.push(offset(last, rot90(last_dir), -w));

    // Assemble: left side, end cap, reversed right side, start cap
    let mut ring = left;
    append_cap(&mut ring, last, rot90(last_dir), last_dir, w, style.cap);
    ring.extend(right.into_iter().rev());
    let neg_first_normal = Point::new(-rot90(first_dir).x, -rot90(first_dir).y);
    let neg_first_dir = Point::new(-first_dir.x, -first_dir.y);
    append_cap(&mut ring, first, neg_first_normal, neg_first_dir, w, style.cap);

    push_ring(outline, ring);
}

/// Expand one closed polyline into two rings traced in opposite
/// directions; the start and end vertices are ordinary interior joins.
fn expand_closed(points: &[Point], w: f32, style: &StrokeStyle, outline: &mut Path) {
    let n = points.len();
    let dirs: Vec<Option<Point>> = (0..n)
        .map(|i| direction(points[i], points[(i + 1) % n]))
        .collect();

    // All-degenerate ring collapses to a dot
    if dirs.iter().all(|d| d.is_none()) {
        emit_cap_dot(points[0], w, style.cap, outline);
        return;
    }

    let dir_before = |i: usize| -> Point {
        let mut k = (i + n - 1) % n;
        loop {
            if let Some(d) = dirs[k] {
                return d;
            }
            k = (k + n - 1) % n;
        }
    };
    let dir_after = |i: usize| -> Point {
        let mut k = i;
        loop {
            if let Some(d) = dirs[k] {
                return d;
            }
            k = (k + 1) % n;
        }
    };

    let mut left: Vec<Point> = Vec::new();
    let mut right: Vec<Point> = Vec::new();
    for i in 0..n {
        if dirs[i].is_none() && dirs[(i + n - 1) % n].is_none() {
            continue;
        }
        append_join(&mut left, points[i], dir_before(i), dir_after(i), w, 1.0, style);
        append_join(&mut right, points[i], dir_before(i), dir_after(i), w, -1.0, style);
    }

    right.reverse();
    push_ring(outline, left);
    push_ring(outline, right);
}

/// Emit the outline points at an interior vertex for one side.
///
/// The convex side gets the configured join; the concave side retracts
/// through the vertex itself so the two sides do not cross.
fn append_join(
    out: &mut Vec<Point>,
    p: Point,
    d0: Point,
    d1: Point,
    w: f32,
    side: f32,
    style: &StrokeStyle,
) {
    let n0 = Point::new(rot90(d0).x * side, rot90(d0).y * side);
    let n1 = Point::new(rot90(d1).x * side, rot90(d1).y * side);
    let cross = d0.x * d1.y - d0.y * d1.x;
    let dot = d0.x * d1.x + d0.y * d1.y;

    if cross.abs() < 1e-6 && dot >= 0.0 {
        out.push(offset(p, n0, w));
        return;
    }

    if cross * side > 0.0 {
        // Concave side
        out.push(offset(p, n0, w));
        out.push(p);
        out.push(offset(p, n1, w));
        return;
    }

    match style.join {
        LineJoin::Bevel => {
            out.push(offset(p, n0, w));
            out.push(offset(p, n1, w));
        }
        LineJoin::Miter => {
            let bx = n0.x + n1.x;
            let by = n0.y + n1.y;
            let len = (bx * bx + by * by).sqrt();
            let mut mitered = false;
            if len > 1e-6 {
                let bis = Point::new(bx / len, by / len);
                let cos_half = bis.x * n0.x + bis.y * n0.y;
                if cos_half > 1e-6 {
                    let ratio = 1.0 / cos_half;
                    if ratio <= style.miter_limit {
                        out.push(offset(p, n0, w));
                        out.push(offset(p, bis, w * ratio));
                        out.push(offset(p, n1, w));
                        mitered = true;
                    }
                }
            }
            if !mitered {
                out.push(offset(p, n0, w));
                out.push(offset(p, n1, w));
            }
        }
        LineJoin::Rounded => {
            append_arc(out, p, n0, n1, w);
        }
    }
}

/// Append an arc of ROUND_SEGMENTS chords from unit offset `from` to
/// unit offset `to` around `center`, sweeping the short way.
fn append_arc(out: &mut Vec<Point>, center: Point, from: Point, to: Point, w: f32) {
    let cross = from.x * to.y - from.y * to.x;
    let dot = from.x * to.x + from.y * to.y;
    let sweep = cross.atan2(dot);
    let start = from.y.atan2(from.x);
    for k in 0..=ROUND_SEGMENTS {
        let angle = start + sweep * k as f32 / ROUND_SEGMENTS as f32;
        out.push(Point::new(
            center.x + angle.cos() * w,
            center.y + angle.sin() * w,
        ));
    }
}

/// Append the cap geometry at an endpoint.
///
/// `normal` is the unit offset of the outline point just emitted;
/// `forward` is the outward direction the cap bulges toward.
fn append_cap(out: &mut Vec<Point>, p: Point, normal: Point, forward: Point, w: f32, cap: LineCap) {
    match cap {
        LineCap::Butt => {}
        LineCap::Square => {
            out.push(Point::new(
                p.x + (normal.x + forward.x) * w,
                p.y + (normal.y + forward.y) * w,
            ));
            out.push(Point::new(
                p.x + (-normal.x + forward.x) * w,
                p.y + (-normal.y + forward.y) * w,
            ));
        }
        LineCap::Circle => {
            // Half disk from +normal to -normal, bulging through forward
            let start = normal.y.atan2(normal.x);
            let toward = forward.y.atan2(forward.x);
            let mut quarter = toward - start;
            while quarter > std::f32::consts::PI {
                quarter -= 2.0 * std::f32::consts::PI;
            }
            while quarter < -std::f32::consts::PI {
                quarter += 2.0 * std::f32::consts::PI;
            }
            let sweep = 2.0 * quarter;
            for k in 1..ROUND_SEGMENTS {
                let angle = start + sweep * k as f32 / ROUND_SEGMENTS as f32;
                out.push(Point::new(
                    p.x + angle.cos() * w,
                    p.y + angle.sin() * w,
                ));
            }
        }
    }
}

/// Emit the outline of a cap standing alone at a zero-length location.
fn emit_cap_dot(p: Point, w: f32, cap: LineCap, outline: &mut Path) {
    match cap {
        LineCap::Butt => {}
        LineCap::Square => {
            push_ring(
                outline,
                vec![
                    Point::new(p.x - w, p.y - w),
                    Point::new(p.x + w, p.y - w),
                    Point::new(p.x + w, p.y + w),
                    Point::new(p.x - w, p.y + w),
                ],
            );
        }
        LineCap::Circle => {
            let mut ring = Vec::with_capacity(ROUND_SEGMENTS * 2);
            for k in 0..ROUND_SEGMENTS * 2 {
                let angle = std::f32::consts::PI * k as f32 / ROUND_SEGMENTS as f32;
                ring.push(Point::new(p.x + angle.cos() * w, p.y + angle.sin() * w));
            }
            push_ring(outline, ring);
        }
    }
}

fn push_ring(outline: &mut Path, ring: Vec<Point>) {
    if ring.len() < 3 {
        return;
    }
    outline.subpaths.push(Subpath {
        points: ring,
        closed: true,
    });
}
