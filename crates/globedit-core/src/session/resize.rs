use super::{Baseline, SessionTrait};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{GlobId, NodeId};
use crate::error::{EditorError, EditorResult};
use crate::history::{Command, CommandKind};
use crate::input::PointerInput;
use crate::math::unit;
use kurbo::{Point, Vec2};
use std::collections::{BTreeMap, BTreeSet};

/// Changes node radii by dragging away from or toward the grabbed node.
#[derive(Debug, Clone)]
pub struct ResizeSession {
    base: Baseline,
    node: NodeId,
    center: Point,
    start_dist: f64,
    nodes: BTreeSet<NodeId>,
    globs: BTreeSet<GlobId>,
}

impl ResizeSession {
    /// Resize `node`, plus every other selected node when `node` is selected.
    pub fn new(doc: &Document, node: NodeId, input: &PointerInput) -> EditorResult<Self> {
        let center = doc.node(node).ok_or(EditorError::MissingNode(node))?.point;
        let mut ids = BTreeSet::from([node]);
        if doc.selection.is_node_selected(node) {
            ids.extend(doc.selection.nodes.iter().copied());
        }
        let base = Baseline::capture(doc, input, ids.iter().copied(), []);
        let nodes = base.unlocked(ids);
        let globs = doc.globs_touching(&nodes);
        let start_dist = (base.origin - center).hypot();
        Ok(Self {
            base,
            node,
            center,
            start_dist,
            nodes,
            globs,
        })
    }

    /// The node under the pointer at gesture start.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Move a glob's handles along the tangent directions so its sides keep
    /// hugging the resized circles.
    fn nudge_handles(&self, doc: &mut Document, radius_change: &BTreeMap<NodeId, f64>) {
        for id in &self.globs {
            let Some(original) = self.base.original_glob(*id) else {
                continue;
            };
            let Some(points) = original.points else {
                continue;
            };
            let start = radius_change.get(&original.start()).copied();
            let end = radius_change.get(&original.end()).copied();
            let along = |e: Point, c: Point, dr: f64| unit(e - c).unwrap_or(Vec2::ZERO) * dr;
            let (d_shift, dp_shift) = match (start, end) {
                (Some(dr0), None) => (along(points.e0, points.c0, dr0), along(points.e0p, points.c0, dr0)),
                (None, Some(dr1)) => (along(points.e1, points.c1, dr1), along(points.e1p, points.c1, dr1)),
                (Some(dr0), Some(dr1)) => (
                    (along(points.e0, points.c0, dr0) + along(points.e1, points.c1, dr1)) * 0.5,
                    (along(points.e0p, points.c0, dr0) + along(points.e1p, points.c1, dr1)) * 0.5,
                ),
                (None, None) => continue,
            };
            if let Some(glob) = doc.glob_mut(*id) {
                glob.d = original.d + d_shift;
                glob.dp = original.dp + dp_shift;
            }
        }
    }
}

impl SessionTrait for ResizeSession {
    fn kind(&self) -> CommandKind {
        CommandKind::Resize
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        let dist = (input.world() - self.center).hypot();
        let mut radius_change = BTreeMap::new();
        for id in &self.nodes {
            let Some(original) = self.base.original_node(*id) else {
                continue;
            };
            let radius = if input.modifiers.meta {
                dist
            } else {
                original.radius + (dist - self.start_dist)
            };
            let radius = radius.max(config.min_node_radius);
            radius_change.insert(*id, radius - original.radius);
            if let Some(node) = doc.node_mut(*id) {
                node.radius = radius;
            }
        }

        for id in &self.globs {
            if let (Some(original), Some(glob)) = (self.base.original_glob(*id), doc.globs.get_mut(id)) {
                glob.d = original.d;
                glob.dp = original.dp;
            }
        }
        if input.modifiers.shift {
            self.nudge_handles(doc, &radius_change);
        }
        doc.recompute_globs(&self.globs);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.base.restore(doc);
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.base.finish(CommandKind::Resize, doc)
    }
}
