//! Device-space path buffer.
//!
//! A path is a sequence of subpaths, each an ordered polyline with a
//! closed flag. Curves never reach this type directly: quadratic and
//! cubic segments are flattened to line segments on append, using
//! recursive midpoint subdivision to a chord-height tolerance expressed
//! in device pixels.

use crate::geometry::Point;

/// Flattening tolerance in device pixels.
const FLATTEN_TOLERANCE: f32 = 0.25;

/// Recursion cap guaranteeing termination on degenerate curves.
const MAX_SUBDIVISION_DEPTH: u32 = 20;

/// A contiguous polyline within a path, either open or closed.
#[derive(Debug, Clone, Default)]
pub(crate) struct Subpath {
    pub points: Vec<Point>,
    pub closed: bool,
}

/// A sequence of subpaths in device pixel space.
#[derive(Debug, Clone, Default)]
pub(crate) struct Path {
    pub subpaths: Vec<Subpath>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.subpaths.iter().all(|s| s.points.is_empty())
    }

    /// Start a new subpath at `p`.
    pub fn move_to(&mut self, p: Point) {
        // Drop an immediately preceding degenerate subpath
        if let Some(last) = self.subpaths.last() {
            if last.points.len() <= 1 && !last.closed {
                self.subpaths.pop();
            }
        }
        self.subpaths.push(Subpath {
            points: vec![p],
            closed: false,
        });
    }

    /// Append a line segment to the last open subpath.
    ///
    /// Exact duplicates of the previous point are skipped; they carry no
    /// geometry and the stroker must not derive normals from them.
    pub fn line_to(&mut self, p: Point) {
        if let Some(last) = self.subpaths.last_mut() {
            if !last.closed {
                if last.points.last() == Some(&p) {
                    return;
                }
                last.points.push(p);
                return;
            }
        }
        self.move_to(p);
    }

    /// Close the last subpath, connecting its end back to its start.
    ///
    /// A no-op on an empty or already-closed subpath.
    pub fn close(&mut self) {
        if let Some(last) = self.subpaths.last_mut() {
            if !last.closed && last.points.len() > 1 {
                last.closed = true;
            }
        }
    }

    /// The end point of the last subpath, if any.
    pub fn last_point(&self) -> Option<Point> {
        self.subpaths.last().and_then(|s| s.points.last().copied())
    }

    /// Whether the last subpath is open and non-empty.
    pub fn has_open_subpath(&self) -> bool {
        self.subpaths
            .last()
            .map(|s| !s.closed && !s.points.is_empty())
            .unwrap_or(false)
    }

    /// Begin a new subpath at `start` when no open subpath exists.
    ///
    /// Used after close_path, where the next segment implicitly starts a
    /// new subpath at the previous subpath's origin.
    pub fn ensure_open_from(&mut self, start: Point) {
        if !self.has_open_subpath() {
            self.move_to(start);
        }
    }

    /// Flatten a quadratic Bezier from the current point.
    pub fn quad_to(&mut self, ctrl: Point, end: Point) {
        let start = match self.last_point() {
            Some(p) => p,
            None => return,
        };
        self.flatten_quad(start, ctrl, end, 0);
    }

    /// Flatten a cubic Bezier from the current point.
    pub fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, end: Point) {
        let start = match self.last_point() {
            Some(p) => p,
            None => return,
        };
        self.flatten_cubic(start, ctrl1, ctrl2, end, 0);
    }

    fn flatten_quad(&mut self, p0: Point, p1: Point, p2: Point, depth: u32) {
        // De Casteljau split at t = 0.5; the curve midpoint's distance to
        // the chord midpoint bounds the chord height.
        let p01 = p0.midpoint(p1);
        let p12 = p1.midpoint(p2);
        let mid = p01.midpoint(p12);
        let chord_mid = p0.midpoint(p2);

        if depth >= MAX_SUBDIVISION_DEPTH || mid.distance(chord_mid) <= FLATTEN_TOLERANCE {
            self.line_to(p2);
        } else {
            self.flatten_quad(p0, p01, mid, depth + 1);
            self.flatten_quad(mid, p12, p2, depth + 1);
        }
    }

    fn flatten_cubic(&mut self, p0: Point, p1: Point, p2: Point, p3: Point, depth: u32) {
        let p01 = p0.midpoint(p1);
        let p12 = p1.midpoint(p2);
        let p23 = p2.midpoint(p3);
        let p012 = p01.midpoint(p12);
        let p123 = p12.midpoint(p23);
        let mid = p012.midpoint(p123);
        let chord_mid = p0.midpoint(p3);

        if depth >= MAX_SUBDIVISION_DEPTH || mid.distance(chord_mid) <= FLATTEN_TOLERANCE {
            self.line_to(p3);
        } else {
            self.flatten_cubic(p0, p01, p012, mid, depth + 1);
            self.flatten_cubic(mid, p123, p23, p3, depth + 1);
        }
    }

    /// A copy of this path translated by (dx, dy).
    pub fn translated(&self, dx: f32, dy: f32) -> Path {
        Path {
            subpaths: self
                .subpaths
                .iter()
                .map(|s| Subpath {
                    points: s
                        .points
                        .iter()
                        .map(|p| Point::new(p.x + dx, p.y + dy))
                        .collect(),
                    closed: s.closed,
                })
                .collect(),
        }
    }
}
