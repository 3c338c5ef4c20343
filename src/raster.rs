//! Analytic scanline coverage rasterizer.
//!
//! Converts a device-space path into per-pixel coverage using 16
//! evenly-spaced sub-scanline crossings per pixel row. Edges are
//! bucketed by their top scanline; each row maintains an active edge
//! table that is re-sorted by current x (the simplest correct design at
//! canvas scale). Winding is accumulated per sub-row under the nonzero
//! rule and summed into fractional per-pixel coverage.
//!
//! The same machinery produces fill coverage, clip masks, and shadow
//! silhouettes.

use crate::geometry::Point;
use crate::path::Path;

/// Sub-scanline samples per pixel row.
const SUBSAMPLES: usize = 16;

/// Inclusive-exclusive integer pixel bounds of nonzero coverage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Bounds {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// A dense per-pixel coverage mask in [0, 1].
#[derive(Debug, Clone)]
pub(crate) struct Mask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
    /// Pixel region containing all nonzero coverage, if any.
    pub bounds: Option<Bounds>,
}

impl Mask {
    pub fn coverage(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }
}

/// One polygon edge prepared for scan conversion.
///
/// `y_top < y_bottom` always holds; `sign` records the original
/// direction (+1 downward, -1 upward) for the nonzero winding rule.
#[derive(Debug, Clone, Copy)]
struct Edge {
    x_top: f32,
    dxdy: f32,
    y_top: f32,
    y_bottom: f32,
    sign: i32,
}

impl Edge {
    /// Build an edge from two device-space points, clipped to the
    /// canvas' vertical extent with x adjusted along the slope so the
    /// signed winding past the clip is preserved.
    fn new(p0: Point, p1: Point, height: f32) -> Option<Edge> {
        if p0.y == p1.y {
            return None;
        }
        let (top, bottom, sign) = if p0.y < p1.y { (p0, p1, 1) } else { (p1, p0, -1) };
        if bottom.y <= 0.0 || top.y >= height {
            return None;
        }

        let dxdy = (bottom.x - top.x) / (bottom.y - top.y);
        let mut y_top = top.y;
        let mut x_top = top.x;
        if y_top < 0.0 {
            x_top += -y_top * dxdy;
            y_top = 0.0;
        }
        let y_bottom = bottom.y.min(height);

        Some(Edge {
            x_top,
            dxdy,
            y_top,
            y_bottom,
            sign,
        })
    }

    fn x_at(&self, y: f32) -> f32 {
        self.x_top + (y - self.y_top) * self.dxdy
    }
}

/// Collect the edges of every subpath, implicitly closing open ones.
fn collect_edges(path: &Path, height: f32) -> Vec<Edge> {
    let mut edges = Vec::new();
    for subpath in &path.subpaths {
        let points = &subpath.points;
        if points.len() < 2 {
            continue;
        }
        for pair in points.windows(2) {
            if let Some(edge) = Edge::new(pair[0], pair[1], height) {
                edges.push(edge);
            }
        }
        // Fills always treat subpaths as closed
        let first = points[0];
        let last = *points.last().unwrap();
        if let Some(edge) = Edge::new(last, first, height) {
            edges.push(edge);
        }
    }
    edges
}

/// Add `amount` of coverage over the horizontal interval [x0, x1).
fn add_span(row: &mut [f32], x0: f32, x1: f32, amount: f32) {
    let width = row.len() as f32;
    let x0 = x0.clamp(0.0, width);
    let x1 = x1.clamp(0.0, width);
    if x1 <= x0 {
        return;
    }

    let first = x0.floor() as usize;
    let last = (x1.ceil() as usize).min(row.len()) - 1;

    if first == last {
        row[first] += (x1 - x0) * amount;
        return;
    }

    row[first] += ((first + 1) as f32 - x0) * amount;
    for value in &mut row[first + 1..last] {
        *value += amount;
    }
    row[last] += (x1 - last as f32) * amount;
}

/// Rasterize a path into a dense coverage mask under the nonzero rule.
pub(crate) fn rasterize(path: &Path, width: usize, height: usize) -> Mask {
    let mut mask = Mask {
        width,
        height,
        data: vec![0.0; width * height],
        bounds: None,
    };

    let mut edges = collect_edges(path, height as f32);
    if edges.is_empty() {
        return mask;
    }

    // Bucket edges by the first pixel row they touch
    edges.sort_by(|a, b| a.y_top.partial_cmp(&b.y_top).unwrap_or(std::cmp::Ordering::Equal));
    let mut next_edge = 0;

    let mut active: Vec<Edge> = Vec::new();
    let mut crossings: Vec<(f32, i32)> = Vec::new();
    let mut row_acc = vec![0.0f32; width];
    let subsample_coverage = 1.0 / SUBSAMPLES as f32;

    let mut bounds: Option<Bounds> = None;

    for y in 0..height {
        let row_top = y as f32;
        let row_bottom = row_top + 1.0;

        while next_edge < edges.len() && edges[next_edge].y_top < row_bottom {
            active.push(edges[next_edge]);
            next_edge += 1;
        }
        active.retain(|e| e.y_bottom > row_top);
        if active.is_empty() {
            continue;
        }

        row_acc.iter_mut().for_each(|v| *v = 0.0);
        let mut row_touched = false;
        let mut row_min_x = width as f32;
        let mut row_max_x = 0.0f32;

        for sub in 0..SUBSAMPLES {
            let yc = row_top + (sub as f32 + 0.5) * subsample_coverage;

            crossings.clear();
            for edge in &active {
                if edge.y_top <= yc && yc < edge.y_bottom {
                    crossings.push((edge.x_at(yc), edge.sign));
                }
            }
            if crossings.is_empty() {
                continue;
            }
            crossings
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut winding = 0;
            for pair in 0..crossings.len() {
                let (x, sign) = crossings[pair];
                let previous = winding;
                winding += sign;
                if previous == 0 && winding != 0 {
                    // Span opens here; it closes at the next return to zero
                    let mut close_x = x;
                    let mut w = winding;
                    for &(nx, nsign) in &crossings[pair + 1..] {
                        w += nsign;
                        if w == 0 {
                            close_x = nx;
                            break;
                        }
                    }
                    if close_x > x {
                        add_span(&mut row_acc, x, close_x, subsample_coverage);
                        row_touched = true;
                        row_min_x = row_min_x.min(x.max(0.0));
                        row_max_x = row_max_x.max(close_x.min(width as f32));
                    }
                }
            }
        }

        if row_touched {
            let x0 = row_min_x.floor() as i32;
            let x1 = (row_max_x.ceil() as i32).min(width as i32);
            let dest = &mut mask.data[y * width..(y + 1) * width];
            for (d, s) in dest.iter_mut().zip(row_acc.iter()) {
                *d = s.clamp(0.0, 1.0);
            }
            bounds = Some(match bounds {
                None => Bounds {
                    x0,
                    y0: y as i32,
                    x1,
                    y1: y as i32 + 1,
                },
                Some(b) => Bounds {
                    x0: b.x0.min(x0),
                    y0: b.y0,
                    x1: b.x1.max(x1),
                    y1: y as i32 + 1,
                },
            });
        }
    }

    mask.bounds = bounds;
    mask
}

/// Coverage of a single pixel at the queried device-space location,
/// computed with the same sub-scanline walk in f64.
pub(crate) fn point_coverage(path: &Path, x: f64, y: f64) -> f64 {
    let px = x.floor();
    let py = y.floor();

    let mut segments: Vec<(f64, f64, f64, f64)> = Vec::new();
    for subpath in &path.subpaths {
        let points = &subpath.points;
        if points.len() < 2 {
            continue;
        }
        let mut push = |a: Point, b: Point| {
            segments.push((a.x as f64, a.y as f64, b.x as f64, b.y as f64));
        };
        for pair in points.windows(2) {
            push(pair[0], pair[1]);
        }
        push(*points.last().unwrap(), points[0]);
    }

    let mut coverage = 0.0;
    let sub = 1.0 / SUBSAMPLES as f64;
    for s in 0..SUBSAMPLES {
        let yc = py + (s as f64 + 0.5) * sub;

        let mut crossings: Vec<(f64, i32)> = Vec::new();
        for &(x0, y0, x1, y1) in &segments {
            if y0 == y1 {
                continue;
            }
            let (top_x, top_y, bot_x, bot_y, sign) = if y0 < y1 {
                (x0, y0, x1, y1, 1)
            } else {
                (x1, y1, x0, y0, -1)
            };
            if top_y <= yc && yc < bot_y {
                let cx = top_x + (yc - top_y) * (bot_x - top_x) / (bot_y - top_y);
                crossings.push((cx, sign));
            }
        }
        crossings.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut winding = 0;
        let mut span_start = 0.0;
        for &(cx, sign) in &crossings {
            let previous = winding;
            winding += sign;
            if previous == 0 && winding != 0 {
                span_start = cx;
            } else if previous != 0 && winding == 0 {
                let lo = span_start.max(px);
                let hi = cx.min(px + 1.0);
                if hi > lo {
                    coverage += (hi - lo) * sub;
                }
            }
        }
    }
    coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn rect_path(x: f32, y: f32, w: f32, h: f32) -> Path {
        let mut path = Path::new();
        path.move_to(Point::new(x, y));
        path.line_to(Point::new(x + w, y));
        path.line_to(Point::new(x + w, y + h));
        path.line_to(Point::new(x, y + h));
        path.close();
        path
    }

    #[test]
    fn test_axis_aligned_rect_full_coverage() {
        let mask = rasterize(&rect_path(2.0, 2.0, 6.0, 6.0), 10, 10);
        assert!((mask.coverage(5, 5) - 1.0).abs() < 1e-5);
        assert!((mask.coverage(2, 2) - 1.0).abs() < 1e-5);
        assert_eq!(mask.coverage(1, 5), 0.0);
        assert_eq!(mask.coverage(8, 5), 0.0);
        assert_eq!(mask.coverage(5, 1), 0.0);
    }

    #[test]
    fn test_half_pixel_coverage() {
        // Rectangle covering the left half of a pixel column
        let mask = rasterize(&rect_path(0.0, 0.0, 2.5, 4.0), 5, 4);
        assert!((mask.coverage(1, 1) - 1.0).abs() < 1e-5);
        assert!((mask.coverage(2, 1) - 0.5).abs() < 1e-5);
        assert_eq!(mask.coverage(3, 1), 0.0);
    }

    #[test]
    fn test_vertical_subpixel_coverage() {
        // Rectangle covering the top quarter of row 0
        let mask = rasterize(&rect_path(0.0, 0.0, 4.0, 0.25), 4, 2);
        let c = mask.coverage(1, 0);
        // 16 sub-rows quantize the fraction; 0.25 lands on a boundary
        assert!((c - 0.25).abs() <= 1.0 / 16.0);
    }

    #[test]
    fn test_triangle_diagonal_half() {
        let mut path = Path::new();
        path.move_to(Point::new(0.0, 0.0));
        path.line_to(Point::new(8.0, 0.0));
        path.line_to(Point::new(0.0, 8.0));
        path.close();

        let mask = rasterize(&path, 8, 8);
        // Pixels on the diagonal are about half covered
        assert!((mask.coverage(3, 4) - 0.5).abs() < 0.1);
        // Deep inside and outside
        assert!((mask.coverage(1, 1) - 1.0).abs() < 1e-4);
        assert_eq!(mask.coverage(7, 7), 0.0);
    }

    #[test]
    fn test_duplicate_edges_cancel() {
        // Degenerate bow-tie: forward and backward over the same segment
        let mut path = Path::new();
        path.move_to(Point::new(1.0, 1.0));
        path.line_to(Point::new(5.0, 5.0));
        path.line_to(Point::new(1.0, 1.0));

        let mask = rasterize(&path, 8, 8);
        assert!(mask.bounds.is_none() || mask.data.iter().all(|&c| c < 1e-5));
    }

    #[test]
    fn test_offcanvas_edges_balance() {
        // Rectangle extending far above the canvas still fills the
        // visible portion completely.
        let mask = rasterize(&rect_path(1.0, -100.0, 4.0, 104.0), 8, 8);
        assert!((mask.coverage(2, 0) - 1.0).abs() < 1e-4);
        assert!((mask.coverage(2, 3) - 1.0).abs() < 1e-4);
        assert_eq!(mask.coverage(6, 3), 0.0);
    }

    #[test]
    fn test_nonzero_overlap_stays_at_one() {
        let mut path = rect_path(1.0, 1.0, 6.0, 6.0);
        let other = rect_path(2.0, 2.0, 3.0, 3.0);
        path.subpaths.extend(other.subpaths);

        let mask = rasterize(&path, 8, 8);
        assert!((mask.coverage(3, 3) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_bounds_tracking() {
        let mask = rasterize(&rect_path(2.0, 3.0, 4.0, 2.0), 10, 10);
        let bounds = mask.bounds.unwrap();
        assert_eq!(bounds.y0, 3);
        assert_eq!(bounds.y1, 5);
        assert!(bounds.x0 <= 2 && bounds.x1 >= 6);
    }

    #[test]
    fn test_point_coverage_inside_outside() {
        let path = rect_path(2.0, 2.0, 6.0, 6.0);
        assert!(point_coverage(&path, 5.0, 5.0) > 0.9);
        assert_eq!(point_coverage(&path, 0.5, 0.5), 0.0);

        // A pixel straddling a half-pixel boundary has partial coverage
        let offset = rect_path(2.5, 2.0, 5.5, 6.0);
        let c = point_coverage(&offset, 2.0, 5.0);
        assert!((c - 0.5).abs() < 1e-9, "coverage {}", c);
    }
}
