//! Glob geometry: tangent points, control points, outline and default handles.
//!
//! A glob's outline is built from four tangent points (two per node circle),
//! found by dropping tangents from the handles `D` and `Dp` onto each circle.
//! Control points interpolate between each tangent point and its handle, and
//! the outline alternates cap arcs with two cubic segments:
//!
//! ```text
//! E0 --cap0--> E0p --cubic(F0p, F1p)--> E1p --cap1--> E1 --cubic(F1, F0)--> E0
//! ```

use crate::entities::{Glob, HandleKind, Node, NodeCap};
use crate::error::{GeometryError, GeometryResult};
use crate::math::{GEOMETRY_EPSILON, circle_intersections, perp, positive_angle, unit};
use kurbo::{Arc, BezPath, CubicBez, Point, Vec2};
use std::f64::consts::TAU;

/// Which of the two tangents from an external point to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TangentSide {
    /// Clockwise of the center-to-target direction (screen space).
    First,
    /// Counter-clockwise of the center-to-target direction.
    Second,
}

/// Tangent point on the circle (`center`, `radius`) for a line through `target`.
///
/// Uses the two-circle construction: the tangent points are the intersections
/// of the circle with the circle whose diameter is the center-target segment.
/// Returns `None` when `target` lies inside the circle.
pub fn tangent_point(center: Point, radius: f64, target: Point, side: TangentSide) -> Option<Point> {
    let dist = (target - center).hypot();
    if radius.is_nan() || radius <= 0.0 || dist < GEOMETRY_EPSILON {
        return None;
    }
    let mid = center.midpoint(target);
    let (first, second) = circle_intersections(center, radius, mid, dist / 2.0)?;
    let point = match side {
        TangentSide::First => first,
        TangentSide::Second => second,
    };
    (point.x.is_finite() && point.y.is_finite()).then_some(point)
}

/// The raw inputs of the glob construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobInputs {
    pub c0: Point,
    pub r0: f64,
    pub c1: Point,
    pub r1: f64,
    pub d: Point,
    pub dp: Point,
    pub a: f64,
    pub b: f64,
    pub ap: f64,
    pub bp: f64,
}

impl GlobInputs {
    /// Gather the inputs for `glob` from its start and end nodes.
    pub fn new(glob: &Glob, start: &Node, end: &Node) -> Self {
        Self {
            c0: start.point,
            r0: start.radius,
            c1: end.point,
            r1: end.radius,
            d: glob.d,
            dp: glob.dp,
            a: glob.a,
            b: glob.b,
            ap: glob.ap,
            bp: glob.bp,
        }
    }

    fn is_finite(&self) -> bool {
        [self.c0, self.c1, self.d, self.dp]
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite())
            && [self.r0, self.r1, self.a, self.b, self.ap, self.bp]
                .iter()
                .all(|v| v.is_finite())
    }
}

/// Derived geometry of a glob.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlobPoints {
    pub c0: Point,
    pub r0: f64,
    pub c1: Point,
    pub r1: f64,
    pub d: Point,
    pub dp: Point,
    /// Tangent points.
    pub e0: Point,
    pub e0p: Point,
    pub e1: Point,
    pub e1p: Point,
    /// Bezier control points.
    pub f0: Point,
    pub f0p: Point,
    pub f1: Point,
    pub f1p: Point,
    /// Unit cap tangents at the tangent points, oriented by the cap sweep:
    /// `n0` and `n1p` leave their caps, `n0p` and `n1` arrive.
    pub n0: Vec2,
    pub n0p: Vec2,
    pub n1: Vec2,
    pub n1p: Vec2,
    /// Signed sweep of the start cap, from E0 to E0p.
    pub sweep0: f64,
    /// Signed sweep of the end cap, from E1p to E1.
    pub sweep1: f64,
}

impl GlobPoints {
    /// The prime-side curve, E0p to E1p.
    pub fn prime_curve(&self) -> CubicBez {
        CubicBez::new(self.e0p, self.f0p, self.f1p, self.e1p)
    }

    /// The primary-side curve, E1 back to E0.
    pub fn primary_curve(&self) -> CubicBez {
        CubicBez::new(self.e1, self.f1, self.f0, self.e0)
    }

    /// Tangent points shaped by the given handle, start node first.
    pub fn tangent_pair(&self, handle: HandleKind) -> (Point, Point) {
        match handle {
            HandleKind::Primary => (self.e0, self.e1),
            HandleKind::Prime => (self.e0p, self.e1p),
        }
    }
}

/// Resolve the two tangents at one circle, applying the degenerate-cap fallback.
fn resolve_pair(center: Point, first: Option<Point>, second: Option<Point>) -> (Point, Point) {
    match (first, second) {
        (Some(a), Some(b)) => (a, b),
        (Some(a), None) => (a, a),
        (None, Some(b)) => (b, b),
        (None, None) => (center, center),
    }
}

/// Sweep of the cap arc around `center` from `from` to `to`, choosing the
/// arc that does not face `away_from` (the opposite node).
fn cap_sweep(center: Point, from: Point, to: Point, away_from: Point) -> f64 {
    let (Some(u_from), Some(u_to)) = (unit(from - center), unit(to - center)) else {
        return 0.0;
    };
    let start = u_from.atan2();
    let ccw = positive_angle(u_to.atan2() - start);
    if ccw < GEOMETRY_EPSILON {
        return 0.0;
    }
    let toward = positive_angle((away_from - center).atan2() - start);
    if toward < ccw { ccw - TAU } else { ccw }
}

/// Unit tangent of the cap arc at `tangent`, pointing along the cap's sweep.
///
/// The leaving end of the cap points away from the other node and the
/// arriving end points back toward it, whichever side each handle is on.
/// Collapsed caps fall back to the spine direction.
fn cap_normal(center: Point, tangent: Point, other_center: Point, sweep: f64, leaving: bool) -> Vec2 {
    let away = unit(center - other_center).unwrap_or(Vec2::new(1.0, 0.0));
    let fallback = if leaving { away } else { -away };
    if sweep.abs() < GEOMETRY_EPSILON {
        return fallback;
    }
    unit(tangent - center).map_or(fallback, |radial| perp(radial) * sweep.signum())
}

/// Compute a glob's derived geometry.
///
/// Fails only when the configuration is unrecoverable (coincident centers,
/// non-positive radii, non-finite input). A handle inside a circle is handled
/// by the cap fallback instead of failing.
pub fn compute_glob_points(inputs: &GlobInputs) -> GeometryResult<GlobPoints> {
    let GlobInputs { c0, r0, c1, r1, d, dp, a, b, ap, bp } = *inputs;
    if !inputs.is_finite() || r0 <= 0.0 || r1 <= 0.0 {
        return Err(GeometryError::Degenerate);
    }
    if (c1 - c0).hypot() < GEOMETRY_EPSILON {
        return Err(GeometryError::Degenerate);
    }

    let (e0, e0p) = resolve_pair(
        c0,
        tangent_point(c0, r0, d, TangentSide::First),
        tangent_point(c0, r0, dp, TangentSide::Second),
    );
    let (e1, e1p) = resolve_pair(
        c1,
        tangent_point(c1, r1, d, TangentSide::Second),
        tangent_point(c1, r1, dp, TangentSide::First),
    );

    let f0 = e0.lerp(d, a.clamp(0.0, 1.0));
    let f1 = e1.lerp(d, b.clamp(0.0, 1.0));
    let f0p = e0p.lerp(dp, ap.clamp(0.0, 1.0));
    let f1p = e1p.lerp(dp, bp.clamp(0.0, 1.0));
    let sweep0 = cap_sweep(c0, e0, e0p, c1);
    let sweep1 = cap_sweep(c1, e1p, e1, c0);

    Ok(GlobPoints {
        c0,
        r0,
        c1,
        r1,
        d,
        dp,
        e0,
        e0p,
        e1,
        e1p,
        f0,
        f0p,
        f1,
        f1p,
        n0: cap_normal(c0, e0, c1, sweep0, true),
        n0p: cap_normal(c0, e0p, c1, sweep0, false),
        n1: cap_normal(c1, e1, c0, sweep1, false),
        n1p: cap_normal(c1, e1p, c0, sweep1, true),
        sweep0,
        sweep1,
    })
}

/// The two external tangent lines between two circles.
///
/// Returns `[start0, end0, start1, end1]`: the touch points of the primary-side
/// line on each circle, then the prime-side line. `None` when one circle
/// contains the other.
pub fn outer_tangents(c0: Point, r0: f64, c1: Point, r1: f64) -> Option<[Point; 4]> {
    let delta = c1 - c0;
    let dist = delta.hypot();
    if dist < GEOMETRY_EPSILON || (r1 - r0).abs() >= dist {
        return None;
    }
    let theta = delta.atan2();
    let phi = ((r0 - r1) / dist).clamp(-1.0, 1.0).acos();
    let primary = Vec2::from_angle(theta - phi);
    let prime = Vec2::from_angle(theta + phi);
    Some([
        c0 + primary * r0,
        c1 + primary * r1,
        c0 + prime * r0,
        c1 + prime * r1,
    ])
}

/// Default handles for a new glob: the midpoints of the outer tangent lines.
pub fn default_handles(start: &Node, end: &Node) -> Option<(Point, Point)> {
    let [p0, p1, q0, q1] = outer_tangents(start.point, start.radius, end.point, end.radius)?;
    Some((p0.midpoint(p1), q0.midpoint(q1)))
}

/// One drawing command of a glob outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Circular arc around `center`; `end` is the exact arc endpoint.
    Arc {
        center: Point,
        radius: f64,
        start_angle: f64,
        sweep_angle: f64,
        end: Point,
    },
    CubicTo(Point, Point, Point),
}

impl OutlineSegment {
    fn end_point(&self) -> Point {
        match *self {
            OutlineSegment::MoveTo(p) | OutlineSegment::LineTo(p) | OutlineSegment::CubicTo(_, _, p) => p,
            OutlineSegment::Arc { end, .. } => end,
        }
    }
}

/// A glob outline as path commands for the renderer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outline {
    pub segments: Vec<OutlineSegment>,
}

impl Outline {
    /// First point of the outline.
    pub fn start(&self) -> Option<Point> {
        self.segments.first().map(OutlineSegment::end_point)
    }

    /// Last point reached; equals `start` for a closed outline.
    pub fn end(&self) -> Option<Point> {
        self.segments.last().map(OutlineSegment::end_point)
    }

    /// Convert into a closed kurbo path, flattening arcs into cubics.
    pub fn to_bez_path(&self, tolerance: f64) -> BezPath {
        let mut path = BezPath::new();
        for segment in &self.segments {
            match *segment {
                OutlineSegment::MoveTo(p) => path.move_to(p),
                OutlineSegment::LineTo(p) => path.line_to(p),
                OutlineSegment::CubicTo(c0, c1, p) => path.curve_to(c0, c1, p),
                OutlineSegment::Arc { center, radius, start_angle, sweep_angle, end } => {
                    let arc = Arc {
                        center,
                        radii: Vec2::new(radius, radius),
                        start_angle,
                        sweep_angle,
                        x_rotation: 0.0,
                    };
                    let mut curves = Vec::new();
                    arc.to_cubic_beziers(tolerance, |c0, c1, p| curves.push((c0, c1, p)));
                    // Land exactly on the tangent point.
                    if let Some(last) = curves.last_mut() {
                        last.2 = end;
                    }
                    for (c0, c1, p) in curves {
                        path.curve_to(c0, c1, p);
                    }
                }
            }
        }
        if !self.segments.is_empty() {
            path.close_path();
        }
        path
    }
}

fn cap(center: Point, radius: f64, from: Point, to: Point, sweep: f64, style: NodeCap) -> OutlineSegment {
    match style {
        NodeCap::Round if sweep.abs() > GEOMETRY_EPSILON => OutlineSegment::Arc {
            center,
            radius,
            start_angle: (from - center).atan2(),
            sweep_angle: sweep,
            end: to,
        },
        _ => OutlineSegment::LineTo(to),
    }
}

/// Build the closed outline of a glob.
pub fn outline(points: &GlobPoints, start_cap: NodeCap, end_cap: NodeCap) -> Outline {
    let p = points;
    Outline {
        segments: vec![
            OutlineSegment::MoveTo(p.e0),
            cap(p.c0, p.r0, p.e0, p.e0p, p.sweep0, start_cap),
            OutlineSegment::CubicTo(p.f0p, p.f1p, p.e1p),
            cap(p.c1, p.r1, p.e1p, p.e1, p.sweep1, end_cap),
            OutlineSegment::CubicTo(p.f1, p.f0, p.e0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::PathEl;

    const EPS: f64 = 1e-9;

    fn inputs() -> GlobInputs {
        GlobInputs {
            c0: Point::new(0.0, 0.0),
            r0: 25.0,
            c1: Point::new(200.0, 0.0),
            r1: 25.0,
            d: Point::new(100.0, -50.0),
            dp: Point::new(100.0, 50.0),
            a: 0.5,
            b: 0.5,
            ap: 0.5,
            bp: 0.5,
        }
    }

    fn on_circle(p: Point, c: Point, r: f64) -> bool {
        ((p - c).hypot() - r).abs() < 1e-6
    }

    #[test]
    fn test_tangent_point_is_tangent() {
        let center = Point::new(10.0, 20.0);
        let target = Point::new(80.0, -30.0);
        for side in [TangentSide::First, TangentSide::Second] {
            let e = tangent_point(center, 15.0, target, side).unwrap();
            assert!(on_circle(e, center, 15.0));
            // Radius is perpendicular to the tangent line.
            assert!((e - center).dot(target - e).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tangent_sides_differ() {
        let first = tangent_point(Point::ZERO, 10.0, Point::new(100.0, 0.0), TangentSide::First).unwrap();
        let second = tangent_point(Point::ZERO, 10.0, Point::new(100.0, 0.0), TangentSide::Second).unwrap();
        assert!(first.y < 0.0);
        assert!(second.y > 0.0);
        assert!((first.x - second.x).abs() < EPS);
    }

    #[test]
    fn test_tangent_point_inside_circle() {
        assert!(tangent_point(Point::ZERO, 10.0, Point::new(3.0, 4.0), TangentSide::First).is_none());
        assert!(tangent_point(Point::ZERO, 10.0, Point::ZERO, TangentSide::Second).is_none());
    }

    #[test]
    fn test_tangent_points_on_circles() {
        let p = compute_glob_points(&inputs()).unwrap();
        assert!(on_circle(p.e0, p.c0, p.r0));
        assert!(on_circle(p.e0p, p.c0, p.r0));
        assert!(on_circle(p.e1, p.c1, p.r1));
        assert!(on_circle(p.e1p, p.c1, p.r1));
        // Primary side is above the center line, prime side below.
        assert!(p.e0.y < 0.0 && p.e1.y < 0.0);
        assert!(p.e0p.y > 0.0 && p.e1p.y > 0.0);
        // Outline hugs the outside: E0 left of C0's vertical, E1 right of C1's.
        assert!(p.e0.x < 0.0);
        assert!(p.e1.x > 200.0);
    }

    #[test]
    fn test_anchor_boundaries() {
        let mut i = inputs();
        i.a = 0.0;
        i.b = 1.0;
        i.ap = 1.0;
        i.bp = 0.0;
        let p = compute_glob_points(&i).unwrap();
        assert_eq!(p.f0, p.e0);
        assert_eq!(p.f1, i.d);
        assert_eq!(p.f0p, i.dp);
        assert_eq!(p.f1p, p.e1p);
    }

    #[test]
    fn test_handle_inside_circle_collapses_cap() {
        let mut i = inputs();
        i.d = Point::new(5.0, 0.0);
        i.dp = Point::new(-5.0, 0.0);
        let p = compute_glob_points(&i).unwrap();
        assert_eq!(p.e0, i.c0);
        assert_eq!(p.e0p, i.c0);
        assert!(on_circle(p.e1, p.c1, p.r1));
    }

    #[test]
    fn test_one_handle_inside_copies_other() {
        let mut i = inputs();
        i.d = Point::new(5.0, 0.0);
        let p = compute_glob_points(&i).unwrap();
        assert_eq!(p.e0, p.e0p);
        assert!(on_circle(p.e0, p.c0, p.r0));
    }

    #[test]
    fn test_coincident_centers_fail() {
        let mut i = inputs();
        i.c1 = i.c0;
        assert_eq!(compute_glob_points(&i), Err(GeometryError::Degenerate));
        let mut i = inputs();
        i.d = Point::new(f64::NAN, 0.0);
        assert!(compute_glob_points(&i).is_err());
    }

    #[test]
    fn test_cap_sweeps_face_away() {
        let p = compute_glob_points(&inputs()).unwrap();
        // Both caps turn the same way, and neither sweeps through the body.
        assert!(p.sweep0 < 0.0);
        assert!(p.sweep1 < 0.0);
        let mid0 = p.c0 + Vec2::from_angle((p.e0 - p.c0).atan2() + p.sweep0 / 2.0) * p.r0;
        assert!(mid0.x < 0.0);
        let mid1 = p.c1 + Vec2::from_angle((p.e1p - p.c1).atan2() + p.sweep1 / 2.0) * p.r1;
        assert!(mid1.x > 200.0);
    }

    fn assert_normals_consistent(p: &GlobPoints) {
        let spine = p.c1 - p.c0;
        for (n, e, c) in [(p.n0, p.e0, p.c0), (p.n0p, p.e0p, p.c0), (p.n1, p.e1, p.c1), (p.n1p, p.e1p, p.c1)] {
            assert!((n.hypot() - 1.0).abs() < EPS);
            assert!(n.dot(e - c).abs() < 1e-6);
        }
        assert!(p.n0.dot(spine) < 0.0);
        assert!(p.n0p.dot(spine) > 0.0);
        assert!(p.n1p.dot(spine) > 0.0);
        assert!(p.n1.dot(spine) < 0.0);
    }

    #[test]
    fn test_normals_follow_cap_sweep() {
        let p = compute_glob_points(&inputs()).unwrap();
        assert!(p.sweep0 < 0.0);
        assert_normals_consistent(&p);

        // Handles swapped across the spine.
        let mut i = inputs();
        std::mem::swap(&mut i.d, &mut i.dp);
        assert_normals_consistent(&compute_glob_points(&i).unwrap());

        // Handles behind the start node turn its cap the other way.
        let mut i = inputs();
        i.d = Point::new(-68.0, 88.0);
        i.dp = Point::new(-68.0, -88.0);
        let p = compute_glob_points(&i).unwrap();
        assert!(p.sweep0 > 0.0);
        assert!(p.n0.dot(p.e0 - p.c0).abs() < 1e-6);
        assert_normals_consistent(&p);
    }

    #[test]
    fn test_collapsed_cap_normals_follow_spine() {
        let mut i = inputs();
        i.d = Point::new(5.0, 0.0);
        i.dp = Point::new(-5.0, 0.0);
        let p = compute_glob_points(&i).unwrap();
        assert_eq!(p.e0, p.c0);
        assert_eq!(p.n0, Vec2::new(-1.0, 0.0));
        assert_eq!(p.n0p, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_outline_is_closed() {
        let p = compute_glob_points(&inputs()).unwrap();
        for (start, end) in [
            (NodeCap::Round, NodeCap::Round),
            (NodeCap::Flat, NodeCap::Round),
            (NodeCap::Flat, NodeCap::Flat),
        ] {
            let outline = outline(&p, start, end);
            assert_eq!(outline.start(), Some(p.e0));
            assert_eq!(outline.end(), Some(p.e0));
        }
    }

    #[test]
    fn test_outline_bez_path_hits_tangent_points() {
        let p = compute_glob_points(&inputs()).unwrap();
        let path = outline(&p, NodeCap::Round, NodeCap::Round).to_bez_path(0.1);
        let ends: Vec<Point> = path
            .elements()
            .iter()
            .filter_map(|el| match el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) | PathEl::CurveTo(_, _, p) => Some(*p),
                _ => None,
            })
            .collect();
        assert!(ends.contains(&p.e0p));
        assert!(ends.contains(&p.e1));
        assert_eq!(ends.last(), Some(&p.e0));
    }

    #[test]
    fn test_outer_tangents_equal_radii() {
        let t = outer_tangents(Point::ZERO, 25.0, Point::new(200.0, 0.0), 25.0).unwrap();
        assert!((t[0].x).abs() < EPS && (t[0].y + 25.0).abs() < EPS);
        assert!((t[1].x - 200.0).abs() < EPS && (t[1].y + 25.0).abs() < EPS);
        assert!((t[2].y - 25.0).abs() < EPS);
        assert!((t[3].y - 25.0).abs() < EPS);
    }

    #[test]
    fn test_outer_tangents_touch_both_circles() {
        let (c0, r0, c1, r1) = (Point::new(-10.0, 5.0), 30.0, Point::new(150.0, 60.0), 12.0);
        let t = outer_tangents(c0, r0, c1, r1).unwrap();
        for (p, q) in [(t[0], t[1]), (t[2], t[3])] {
            assert!(on_circle(p, c0, r0));
            assert!(on_circle(q, c1, r1));
            let dir = q - p;
            assert!((p - c0).dot(dir).abs() < 1e-6);
            assert!((q - c1).dot(dir).abs() < 1e-6);
        }
    }

    #[test]
    fn test_outer_tangents_nested() {
        assert!(outer_tangents(Point::ZERO, 50.0, Point::new(10.0, 0.0), 5.0).is_none());
    }
}
