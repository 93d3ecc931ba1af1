//! Bounding boxes for nodes, cubic segments and globs.
//!
//! Bounds are plain `kurbo::Rect`s (`x0`/`y0` = min, `x1`/`y1` = max).
//! Containment and intersection are inclusive of edges, unlike `Rect::contains`.

use crate::entities::{Glob, NodeCap};
use crate::error::{GeometryError, GeometryResult};
use crate::geometry::{GlobPoints, outline};
use kurbo::{CubicBez, Line, ParamCurveExtrema, PathSeg, Point, Rect};

/// Bounds of a circle.
pub fn circle_bounds(center: Point, radius: f64) -> Rect {
    Rect::new(center.x - radius, center.y - radius, center.x + radius, center.y + radius)
}

/// Tight bounds of a cubic bezier: its endpoints plus the extrema where the
/// per-axis derivative vanishes for t in (0, 1).
pub fn cubic_bezier_bounds(p0: Point, c0: Point, c1: Point, p1: Point) -> Rect {
    CubicBez::new(p0, c0, c1, p1).bounding_box()
}

/// Bounds of a glob's derived geometry: both curves and both node circles.
pub fn glob_points_bounds(points: &GlobPoints) -> Rect {
    let prime = points.prime_curve().bounding_box();
    let primary = points.primary_curve().bounding_box();
    prime
        .union(primary)
        .union(circle_bounds(points.c0, points.r0))
        .union(circle_bounds(points.c1, points.r1))
}

/// Bounds of a glob. Fails while the glob has no geometry.
pub fn glob_bounds(glob: &Glob) -> GeometryResult<Rect> {
    glob.points
        .as_ref()
        .map(glob_points_bounds)
        .ok_or(GeometryError::GeometryUnavailable(glob.id()))
}

/// Union of two bounds.
pub fn union_bounds(a: Rect, b: Rect) -> Rect {
    a.union(b)
}

/// Union of any number of bounds, `None` when empty.
pub fn union_all(bounds: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    bounds.into_iter().reduce(|a, b| a.union(b))
}

/// Check whether `outer` fully contains `inner` (edges inclusive).
pub fn contains_bounds(outer: Rect, inner: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.y0 >= outer.y0 && inner.x1 <= outer.x1 && inner.y1 <= outer.y1
}

/// Check whether two bounds overlap or touch.
pub fn intersects_bounds(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

/// Inclusive point containment.
pub fn contains_point(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// Scale a rect about its center.
pub fn scale_about_center(rect: Rect, factor: f64) -> Rect {
    Rect::from_center_size(rect.center(), rect.size() * factor)
}

/// Check whether a circle overlaps a rect.
pub fn circle_intersects_rect(center: Point, radius: f64, rect: Rect) -> bool {
    let nearest = Point::new(center.x.clamp(rect.x0, rect.x1), center.y.clamp(rect.y0, rect.y1));
    (nearest - center).hypot() <= radius
}

fn rect_edges(rect: Rect) -> [Line; 4] {
    let tl = Point::new(rect.x0, rect.y0);
    let tr = Point::new(rect.x1, rect.y0);
    let br = Point::new(rect.x1, rect.y1);
    let bl = Point::new(rect.x0, rect.y1);
    [Line::new(tl, tr), Line::new(tr, br), Line::new(br, bl), Line::new(bl, tl)]
}

/// Check whether a path segment enters a rect: either endpoint inside or any
/// crossing of the rect's edges.
pub fn segment_intersects_rect(seg: PathSeg, rect: Rect) -> bool {
    use kurbo::ParamCurve;
    if contains_point(rect, seg.start()) || contains_point(rect, seg.end()) {
        return true;
    }
    if !intersects_bounds(seg.bounding_box(), rect) {
        return false;
    }
    rect_edges(rect)
        .into_iter()
        .any(|edge| !seg.intersect_line(edge).is_empty())
}

/// Check whether a glob's outline touches a rect.
pub fn glob_intersects_rect(points: &GlobPoints, start_cap: NodeCap, end_cap: NodeCap, rect: Rect, tolerance: f64) -> bool {
    if !intersects_bounds(glob_points_bounds(points), rect) {
        return false;
    }
    outline(points, start_cap, end_cap)
        .to_bez_path(tolerance)
        .segments()
        .any(|seg| segment_intersects_rect(seg, rect))
}
