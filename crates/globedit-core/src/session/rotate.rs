use super::{Baseline, SessionTrait, globs_within, transform_from};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{GlobId, NodeId};
use crate::error::{EditorError, EditorResult};
use crate::history::{Command, CommandKind};
use crate::input::PointerInput;
use crate::math::GEOMETRY_EPSILON;
use crate::snap::snap_angle;
use kurbo::{Affine, Point};
use std::collections::BTreeSet;

/// Rotates the selection about the center of its bounds.
#[derive(Debug, Clone)]
pub struct RotateSession {
    base: Baseline,
    center: Point,
    start_angle: f64,
    nodes: BTreeSet<NodeId>,
    globs: BTreeSet<GlobId>,
    angle: f64,
}

impl RotateSession {
    /// Start rotating the selection.
    pub fn new(doc: &Document, input: &PointerInput) -> EditorResult<Self> {
        let bounds = doc.selection_bounds().ok_or(EditorError::NothingToDo)?;
        let closure = doc.selected_node_closure();
        let base = Baseline::capture(doc, input, closure.iter().copied(), globs_within(doc, &closure));
        let nodes = base.unlocked(closure);
        let globs = globs_within(doc, &nodes);
        let center = bounds.center();
        let start_angle = (base.origin - center).atan2();
        Ok(Self {
            base,
            center,
            start_angle,
            nodes,
            globs,
            angle: 0.0,
        })
    }

    /// Current rotation in radians.
    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl SessionTrait for RotateSession {
    fn kind(&self) -> CommandKind {
        CommandKind::Rotate
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        let v = input.world() - self.center;
        if v.hypot() < GEOMETRY_EPSILON {
            return;
        }
        let mut angle = v.atan2() - self.start_angle;
        if input.modifiers.shift {
            angle = snap_angle(angle.to_degrees(), config.rotation_snap_degrees).to_radians();
        }
        self.angle = angle;
        let affine = Affine::rotate_about(angle, self.center);
        transform_from(doc, &self.base, &self.nodes, &self.globs, affine, 1.0, config.min_node_radius);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.base.restore(doc);
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.base.finish(CommandKind::Rotate, doc)
    }
}
