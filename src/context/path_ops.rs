//! Path building operations.
//!
//! Inputs are in user space; every emitted point is transformed to
//! device space before it is appended to the working path, so curve
//! flattening tolerance is measured in device pixels under the current
//! transform.

use super::Canvas;
use crate::arc::{arc_to_cubics, arc_to_geometry, ArcToGeometry, CubicSegment};
use crate::geometry::{
    ArcParams, ArcToParams, CubicBezierParams, Point, QuadraticBezierParams, RectParams,
};
use crate::path::Path;
use crate::raster;

impl Canvas {
    /// Begin a new, empty path.
    pub fn begin_path(&mut self) {
        log::debug!(target: "canvas", "begin_path");
        self.path = Path::new();
        self.current_point = None;
        self.subpath_start = None;
    }

    fn to_device(&self, p: Point) -> Point {
        let (x, y) = self.state.transform.apply(p.x, p.y);
        Point::new(x, y)
    }

    /// Reopen a subpath at the current point when the last one was
    /// closed by close_path.
    fn ensure_subpath(&mut self) {
        if !self.path.has_open_subpath() {
            if let Some(current) = self.current_point {
                let device = self.to_device(current);
                self.path.ensure_open_from(device);
            }
        }
    }

    fn path_move_to(&mut self, p: Point) {
        let device = self.to_device(p);
        self.path.move_to(device);
        self.current_point = Some(p);
        self.subpath_start = Some(p);
    }

    fn path_line_to(&mut self, p: Point) {
        self.ensure_subpath();
        let device = self.to_device(p);
        self.path.line_to(device);
        self.current_point = Some(p);
    }

    fn path_cubic_to(&mut self, c1: Point, c2: Point, end: Point) {
        self.ensure_subpath();
        let dc1 = self.to_device(c1);
        let dc2 = self.to_device(c2);
        let dend = self.to_device(end);
        self.path.cubic_to(dc1, dc2, dend);
        self.current_point = Some(end);
    }

    /// Move to a point, starting a new subpath.
    pub fn move_to(&mut self, x: f32, y: f32) {
        log::debug!(target: "canvas", "move_to {} {}", x, y);
        let p = Point::new(x, y);
        if !p.is_finite() {
            return;
        }
        self.path_move_to(p);
    }

    /// Add a line segment to the current subpath.
    ///
    /// Without a current point this acts as the corresponding move_to.
    pub fn line_to(&mut self, x: f32, y: f32) {
        log::debug!(target: "canvas", "line_to {} {}", x, y);
        let p = Point::new(x, y);
        if !p.is_finite() {
            return;
        }
        if self.current_point.is_none() {
            self.path_move_to(p);
        } else {
            self.path_line_to(p);
        }
    }

    /// Close the current subpath. A no-op on an empty path.
    pub fn close_path(&mut self) {
        log::debug!(target: "canvas", "close_path");
        self.path.close();
        if self.subpath_start.is_some() {
            self.current_point = self.subpath_start;
        }
    }

    /// Add a quadratic Bezier curve.
    pub fn quadratic_curve_to(&mut self, params: &QuadraticBezierParams) {
        let QuadraticBezierParams { cpx, cpy, x, y } = *params;
        if !(cpx.is_finite() && cpy.is_finite() && x.is_finite() && y.is_finite()) {
            return;
        }
        if self.current_point.is_none() {
            self.path_move_to(Point::new(cpx, cpy));
        }
        let start = self.current_point.unwrap();
        // Elevate to a cubic so all curves flatten through one route
        let c1 = Point::new(
            start.x + 2.0 / 3.0 * (cpx - start.x),
            start.y + 2.0 / 3.0 * (cpy - start.y),
        );
        let c2 = Point::new(x + 2.0 / 3.0 * (cpx - x), y + 2.0 / 3.0 * (cpy - y));
        self.path_cubic_to(c1, c2, Point::new(x, y));
    }

    /// Add a cubic Bezier curve.
    pub fn bezier_curve_to(&mut self, params: &CubicBezierParams) {
        let CubicBezierParams {
            cp1x,
            cp1y,
            cp2x,
            cp2y,
            x,
            y,
        } = *params;
        let finite = cp1x.is_finite()
            && cp1y.is_finite()
            && cp2x.is_finite()
            && cp2y.is_finite()
            && x.is_finite()
            && y.is_finite();
        if !finite {
            return;
        }
        if self.current_point.is_none() {
            self.path_move_to(Point::new(cp1x, cp1y));
        }
        self.path_cubic_to(
            Point::new(cp1x, cp1y),
            Point::new(cp2x, cp2y),
            Point::new(x, y),
        );
    }

    /// Add a closed rectangle subpath.
    pub fn rectangle(&mut self, params: &RectParams) {
        log::debug!(target: "canvas", "rectangle {} {} {} {}", params.x, params.y, params.width, params.height);
        if !params.is_finite() {
            return;
        }
        let RectParams {
            x,
            y,
            width,
            height,
        } = *params;
        self.path_move_to(Point::new(x, y));
        self.path_line_to(Point::new(x + width, y));
        self.path_line_to(Point::new(x + width, y + height));
        self.path_line_to(Point::new(x, y + height));
        self.path.close();
        self.current_point = Some(Point::new(x, y));
        self.subpath_start = Some(Point::new(x, y));
    }

    /// Add a circular arc.
    ///
    /// With a current point the arc start connects by a line; otherwise
    /// it begins a new subpath. A negative radius is invalid and makes
    /// the operation a no-op.
    pub fn arc(&mut self, params: &ArcParams) {
        log::debug!(target: "canvas", "arc {} {} r={}", params.x, params.y, params.radius);
        let (start, segments) = match arc_to_cubics(params) {
            Some(result) => result,
            None => {
                log::warn!(target: "canvas", "invalid arc ignored");
                return;
            }
        };
        self.append_arc_segments(start, &segments, true);
    }

    /// Add an arc connecting two tangent lines (arc_to).
    pub fn arc_to(&mut self, params: &ArcToParams) {
        let ArcToParams {
            x1,
            y1,
            x2,
            y2,
            radius,
        } = *params;
        let finite = x1.is_finite()
            && y1.is_finite()
            && x2.is_finite()
            && y2.is_finite()
            && radius.is_finite();
        if !finite || radius < 0.0 {
            log::warn!(target: "canvas", "invalid arc_to ignored");
            return;
        }

        let current = match self.current_point {
            Some(p) => p,
            None => {
                // No current point: the operation degrades to a line_to,
                // which itself degrades to a move_to
                self.line_to(x1, y1);
                return;
            }
        };

        match arc_to_geometry(current.x, current.y, params) {
            ArcToGeometry::Line => self.path_line_to(Point::new(x1, y1)),
            ArcToGeometry::Arc { start, params } => {
                self.path_line_to(start);
                if let Some((_, segments)) = arc_to_cubics(&params) {
                    self.append_arc_segments(start, &segments, false);
                }
            }
        }
    }

    fn append_arc_segments(&mut self, start: Point, segments: &[CubicSegment], connect: bool) {
        if connect {
            if self.current_point.is_some() {
                self.path_line_to(start);
            } else {
                self.path_move_to(start);
            }
        }
        for segment in segments {
            self.path_cubic_to(segment.c1, segment.c2, segment.end);
        }
    }

    /// Test whether a device-space point is inside the current path
    /// under the nonzero rule.
    ///
    /// Returns false under a non-invertible transform.
    pub fn is_point_in_path(&self, x: f32, y: f32) -> bool {
        if !x.is_finite() || !y.is_finite() {
            return false;
        }
        if !self.state.transform.is_invertible() {
            return false;
        }
        raster::point_coverage(&self.path, x as f64, y as f64) > 0.0
    }
}
