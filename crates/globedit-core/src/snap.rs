//! Proximity snapping for node drags, handle drags and rotation.

use crate::bounds::{contains_bounds, scale_about_center};
use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{EntityId, Node, NodeId};
use crate::math::{line_intersection, project_onto_line};
use kurbo::{Point, Rect, Vec2};
use std::collections::BTreeSet;

/// A visual hint that a snap is active, from the snapped feature to its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapIndicator {
    pub id: EntityId,
    pub from: Point,
    pub to: Point,
}

/// Corrected drag delta plus the snaps that produced it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapOutcome {
    pub delta: Vec2,
    pub snaps: Vec<SnapIndicator>,
}

/// Which features were aligned on one axis. Lower ranks win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum AlignRank {
    CenterCenter,
    CenterEdge,
    EdgeEdge,
}

#[derive(Debug, Clone, Copy)]
struct AxisSnap {
    rank: AlignRank,
    /// Correction added to the delta on this axis.
    correction: f64,
    /// Coordinate of the alignment line.
    at: f64,
    candidate: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: NodeId,
    point: Point,
    radius: f64,
}

impl Candidate {
    fn bounds(&self) -> Rect {
        Rect::from_center_size(self.point, (self.radius * 2.0, self.radius * 2.0))
    }
}

/// Snapshot of snap candidates taken at gesture start.
#[derive(Debug, Clone)]
pub struct Snapper {
    origin: Point,
    radius: f64,
    candidates: Vec<Candidate>,
    threshold_px: f64,
    cull_scale: f64,
}

impl Snapper {
    /// Capture `others` as candidates for aligning `moving`.
    pub fn new<'a>(moving: &Node, others: impl IntoIterator<Item = &'a Node>, config: &EditorConfig) -> Self {
        let candidates = others
            .into_iter()
            .filter(|n| n.id() != moving.id())
            .map(|n| Candidate {
                id: n.id(),
                point: n.point,
                radius: n.radius,
            })
            .collect();
        Self {
            origin: moving.point,
            radius: moving.radius,
            candidates,
            threshold_px: config.snap_threshold_px,
            cull_scale: config.snap_cull_scale,
        }
    }

    /// Build a snapper for `moving` against every node of `doc` not in `exclude`.
    pub fn for_node(doc: &Document, moving: NodeId, exclude: &BTreeSet<NodeId>, config: &EditorConfig) -> Option<Self> {
        let node = doc.node(moving)?;
        let others = doc.nodes.values().filter(|n| !exclude.contains(&n.id()));
        Some(Self::new(node, others, config))
    }

    /// Correct `delta` so the moving node aligns with a nearby candidate.
    ///
    /// `visible` is the world rect on screen; `skip` bypasses snapping.
    pub fn resolve(&self, delta: Vec2, camera: &Camera, visible: Rect, skip: bool) -> SnapOutcome {
        if skip {
            return SnapOutcome { delta, snaps: Vec::new() };
        }
        let threshold = camera.screen_to_world_len(self.threshold_px);
        let cull = scale_about_center(visible, self.cull_scale);
        let live: Vec<usize> = (0..self.candidates.len())
            .filter(|i| contains_bounds(cull, self.candidates[*i].bounds()))
            .collect();
        let moved = self.origin + delta;

        // An exact center match on both axes locks the point.
        let locked = live
            .iter()
            .map(|i| (*i, self.candidates[*i].point - moved))
            .filter(|(_, d)| d.x.abs() < threshold && d.y.abs() < threshold)
            .min_by(|(_, a), (_, b)| a.hypot2().total_cmp(&b.hypot2()));
        if let Some((i, _)) = locked {
            let c = self.candidates[i];
            return SnapOutcome {
                delta: c.point - self.origin,
                snaps: vec![SnapIndicator {
                    id: EntityId::Node(c.id),
                    from: c.point,
                    to: c.point,
                }],
            };
        }

        let x = self.best_axis(&live, moved.x, |p| p.x, threshold);
        let y = self.best_axis(&live, moved.y, |p| p.y, threshold);
        let mut out = delta;
        if let Some(s) = x {
            out.x += s.correction;
        }
        if let Some(s) = y {
            out.y += s.correction;
        }
        let snapped = self.origin + out;
        let mut snaps = Vec::new();
        if let Some(s) = x {
            let c = self.candidates[s.candidate];
            snaps.push(SnapIndicator {
                id: EntityId::Node(c.id),
                from: Point::new(s.at, snapped.y),
                to: Point::new(s.at, c.point.y),
            });
        }
        if let Some(s) = y {
            let c = self.candidates[s.candidate];
            snaps.push(SnapIndicator {
                id: EntityId::Node(c.id),
                from: Point::new(snapped.x, s.at),
                to: Point::new(c.point.x, s.at),
            });
        }
        SnapOutcome { delta: out, snaps }
    }

    fn best_axis(&self, live: &[usize], moved: f64, axis: impl Fn(Point) -> f64, threshold: f64) -> Option<AxisSnap> {
        let r = self.radius;
        let mut best: Option<(AxisSnap, f64)> = None;
        for &i in live {
            let c = self.candidates[i];
            let cc = axis(c.point);
            let cr = c.radius;
            // (rank, moving feature offset from center, target coordinate)
            let pairs = [
                (AlignRank::CenterCenter, 0.0, cc),
                (AlignRank::CenterEdge, 0.0, cc - cr),
                (AlignRank::CenterEdge, 0.0, cc + cr),
                (AlignRank::CenterEdge, -r, cc),
                (AlignRank::CenterEdge, r, cc),
                (AlignRank::EdgeEdge, -r, cc - cr),
                (AlignRank::EdgeEdge, -r, cc + cr),
                (AlignRank::EdgeEdge, r, cc - cr),
                (AlignRank::EdgeEdge, r, cc + cr),
            ];
            for (rank, feature, target) in pairs {
                let correction = target - (moved + feature);
                let dist = correction.abs();
                if dist >= threshold {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some((b, bd)) => rank < b.rank || (rank == b.rank && dist < *bd),
                };
                if better {
                    best = Some((
                        AxisSnap {
                            rank,
                            correction,
                            at: target,
                            candidate: i,
                        },
                        dist,
                    ));
                }
            }
        }
        best.map(|(s, _)| s)
    }
}

/// A line or point that a dragged handle can stick to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapGuide {
    Line { origin: Point, dir: Vec2, id: EntityId },
    Point { point: Point, id: EntityId },
}

/// Snap `point` to the closest guide within `threshold`.
///
/// Point guides win over lines. When two lines are in range their
/// intersection is used if it is also in range.
pub fn snap_to_guides(point: Point, guides: &[SnapGuide], threshold: f64) -> Option<(Point, Vec<SnapIndicator>)> {
    let nearest_point = guides
        .iter()
        .filter_map(|g| match *g {
            SnapGuide::Point { point: p, id } => Some((p, id, (p - point).hypot())),
            SnapGuide::Line { .. } => None,
        })
        .filter(|(_, _, d)| *d < threshold)
        .min_by(|a, b| a.2.total_cmp(&b.2));
    if let Some((p, id, _)) = nearest_point {
        return Some((p, vec![SnapIndicator { id, from: point, to: p }]));
    }

    let mut lines: Vec<(Point, Vec2, EntityId, Point, f64)> = guides
        .iter()
        .filter_map(|g| match *g {
            SnapGuide::Line { origin, dir, id } => {
                let p = project_onto_line(point, origin, dir);
                Some((origin, dir, id, p, (p - point).hypot()))
            }
            SnapGuide::Point { .. } => None,
        })
        .filter(|l| l.4 < threshold)
        .collect();
    lines.sort_by(|a, b| a.4.total_cmp(&b.4));

    if let [a, b, ..] = lines.as_slice() {
        if let Some(x) = line_intersection(a.0, a.1, b.0, b.1) {
            if (x - point).hypot() < threshold {
                let snaps = vec![
                    SnapIndicator { id: a.2, from: a.0, to: x },
                    SnapIndicator { id: b.2, from: b.0, to: x },
                ];
                return Some((x, snaps));
            }
        }
    }
    lines
        .first()
        .map(|(origin, _, id, p, _)| (*p, vec![SnapIndicator { id: *id, from: *origin, to: *p }]))
}

/// Snap an angle to the nearest increment.
/// Returns the snapped angle in degrees (0-360).
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    let snapped = (angle_degrees / increment).round() * increment;
    snapped.rem_euclid(360.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Size;

    fn visible() -> Rect {
        Camera::new().visible_world_rect(Size::new(800.0, 600.0))
    }

    fn scene() -> (Node, Vec<Node>) {
        let a = Node::new(Point::new(0.0, 0.0), 10.0);
        let b = Node::new(Point::new(100.0, 0.0), 10.0);
        let moving = Node::new(Point::new(0.0, 200.0), 10.0);
        (moving, vec![a, b])
    }

    #[test]
    fn test_center_alignment_snaps_exactly() {
        let (moving, others) = scene();
        let snapper = Snapper::new(&moving, &others, &EditorConfig::default());
        let out = snapper.resolve(Vec2::new(97.0, 0.0), &Camera::new(), visible(), false);
        assert_eq!(moving.point.x + out.delta.x, 100.0);
        assert_eq!(out.delta.y, 0.0);
        assert_eq!(out.snaps.len(), 1);
        assert_eq!(out.snaps[0].id, EntityId::Node(others[1].id()));
    }

    #[test]
    fn test_skip_bypasses() {
        let (moving, others) = scene();
        let snapper = Snapper::new(&moving, &others, &EditorConfig::default());
        let out = snapper.resolve(Vec2::new(97.0, 0.0), &Camera::new(), visible(), true);
        assert_eq!(out.delta, Vec2::new(97.0, 0.0));
        assert!(out.snaps.is_empty());
    }

    #[test]
    fn test_threshold_scales_with_zoom() {
        let (moving, others) = scene();
        let snapper = Snapper::new(&moving, &others, &EditorConfig::default());
        let camera = Camera { zoom: 2.0, ..Camera::new() };
        let visible = camera.visible_world_rect(Size::new(800.0, 600.0));
        // 3 world units is 6 screen pixels at zoom 2.
        let out = snapper.resolve(Vec2::new(97.0, 0.0), &camera, visible, false);
        assert_eq!(out.delta.x, 97.0);
    }

    #[test]
    fn test_center_match_locks_both_axes() {
        let (moving, others) = scene();
        let snapper = Snapper::new(&moving, &others, &EditorConfig::default());
        let out = snapper.resolve(Vec2::new(98.0, -198.5), &Camera::new(), visible(), false);
        assert_eq!(moving.point + out.delta, Point::new(100.0, 0.0));
    }

    #[test]
    fn test_edge_alignment() {
        let (moving, others) = scene();
        let snapper = Snapper::new(&moving, &others, &EditorConfig::default());
        // Moving node's left edge (x - 10) lands near b's right edge (110).
        let out = snapper.resolve(Vec2::new(118.0, 0.0), &Camera::new(), visible(), false);
        assert!((moving.point.x + out.delta.x - 120.0).abs() < 1e-12);
    }

    #[test]
    fn test_offscreen_candidates_are_culled() {
        let moving = Node::new(Point::new(0.0, 0.0), 10.0);
        let far = Node::new(Point::new(5000.0, 5000.0), 10.0);
        let snapper = Snapper::new(&moving, [&far], &EditorConfig::default());
        let out = snapper.resolve(Vec2::new(4998.0, 100.0), &Camera::new(), visible(), false);
        assert_eq!(out.delta, Vec2::new(4998.0, 100.0));
    }

    #[test]
    fn test_guides_prefer_points_then_intersections() {
        let id = EntityId::Node(NodeId::nil());
        let guides = [
            SnapGuide::Line { origin: Point::new(0.0, 0.0), dir: Vec2::new(1.0, 0.0), id },
            SnapGuide::Line { origin: Point::new(0.0, 0.0), dir: Vec2::new(0.0, 1.0), id },
        ];
        let (p, snaps) = snap_to_guides(Point::new(2.0, 1.0), &guides, 4.0).unwrap();
        assert_eq!(p, Point::ZERO);
        assert_eq!(snaps.len(), 2);

        let (p, _) = snap_to_guides(Point::new(20.0, 1.0), &guides, 4.0).unwrap();
        assert_eq!(p, Point::new(20.0, 0.0));

        let with_point = [guides[0], SnapGuide::Point { point: Point::new(21.0, 2.0), id }];
        let (p, _) = snap_to_guides(Point::new(20.0, 1.0), &with_point, 4.0).unwrap();
        assert_eq!(p, Point::new(21.0, 2.0));

        assert!(snap_to_guides(Point::new(20.0, 10.0), &guides[..1], 4.0).is_none());
    }

    #[test]
    fn test_snap_angle() {
        assert!((snap_angle(7.0, 15.0) - 0.0).abs() < f64::EPSILON);
        assert!((snap_angle(8.0, 15.0) - 15.0).abs() < f64::EPSILON);
        assert!((snap_angle(-10.0, 15.0) - 345.0).abs() < f64::EPSILON);
        assert!((snap_angle(358.0, 15.0) - 0.0).abs() < f64::EPSILON);
    }
}
