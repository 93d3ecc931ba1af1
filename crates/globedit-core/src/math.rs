//! Small vector helpers on top of kurbo.

use kurbo::{Point, Vec2};
use std::f64::consts::TAU;

/// Distance below which two points are treated as coincident.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// Rotate a vector by +90 degrees.
pub fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Unit vector, or `None` for (near) zero length input.
pub fn unit(v: Vec2) -> Option<Vec2> {
    let len = v.hypot();
    if len < GEOMETRY_EPSILON || !len.is_finite() {
        None
    } else {
        Some(v / len)
    }
}

/// Signed angle from `from` to `to`, in (-PI, PI].
pub fn signed_angle(from: Vec2, to: Vec2) -> f64 {
    from.cross(to).atan2(from.dot(to))
}

/// Wrap an angle into [0, TAU).
pub fn positive_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Project `p` onto the segment `a`-`b`, returning the clamped parameter and the point.
pub fn project_onto_segment(p: Point, a: Point, b: Point) -> (f64, Point) {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < GEOMETRY_EPSILON {
        return (0.0, a);
    }
    let t = ((p - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    (t, a.lerp(b, t))
}

/// Project `p` onto the infinite line through `origin` with direction `dir`.
pub fn project_onto_line(p: Point, origin: Point, dir: Vec2) -> Point {
    let len_sq = dir.hypot2();
    if len_sq < GEOMETRY_EPSILON {
        return origin;
    }
    origin + dir * ((p - origin).dot(dir) / len_sq)
}

/// Intersection of two infinite lines, `None` when parallel.
pub fn line_intersection(p0: Point, d0: Vec2, p1: Point, d1: Vec2) -> Option<Point> {
    let denom = d0.cross(d1);
    if denom.abs() < GEOMETRY_EPSILON {
        return None;
    }
    let t = (p1 - p0).cross(d1) / denom;
    Some(p0 + d0 * t)
}

/// Mirror `p` across the line through `a` and `b`.
pub fn reflect_across_line(p: Point, a: Point, b: Point) -> Point {
    let foot = project_onto_line(p, a, b - a);
    foot + (foot - p)
}

/// Intersection points of two circles.
///
/// The first point lies clockwise (screen space) of the center line, the
/// second counter-clockwise. Near-tangent circles yield the same point twice.
pub fn circle_intersections(c0: Point, r0: f64, c1: Point, r1: f64) -> Option<(Point, Point)> {
    let delta = c1 - c0;
    let d = delta.hypot();
    if d < GEOMETRY_EPSILON || !d.is_finite() {
        return None;
    }
    let slack = GEOMETRY_EPSILON * d.max(r0).max(r1).max(1.0);
    if d > r0 + r1 + slack || d < (r0 - r1).abs() - slack {
        return None;
    }
    let a = (r0 * r0 - r1 * r1 + d * d) / (2.0 * d);
    // Clamp tiny negative values produced by near-tangent configurations.
    let h = (r0 * r0 - a * a).max(0.0).sqrt();
    let dir = delta / d;
    let base = c0 + dir * a;
    let offset = perp(dir) * h;
    Some((base - offset, base + offset))
}
