use super::{Baseline, SessionTrait, globs_within, transform_from};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{GlobId, NodeId};
use crate::error::{EditorError, EditorResult};
use crate::history::{Command, CommandKind};
use crate::input::PointerInput;
use crate::math::GEOMETRY_EPSILON;
use crate::selection::BoundsHandle;
use kurbo::{Affine, Point};
use std::collections::BTreeSet;

/// Scales the selection by dragging a corner or edge of its bounds.
///
/// The opposite corner or edge stays fixed. Dragging past it gives a negative
/// scale, which mirrors the selection.
#[derive(Debug, Clone)]
pub struct TransformSession {
    base: Baseline,
    handle: BoundsHandle,
    fixed: Point,
    grab: Point,
    nodes: BTreeSet<NodeId>,
    globs: BTreeSet<GlobId>,
}

impl TransformSession {
    /// Start scaling the selection from `handle`.
    pub fn new(doc: &Document, handle: BoundsHandle, input: &PointerInput) -> EditorResult<Self> {
        let bounds = doc.selection_bounds().ok_or(EditorError::NothingToDo)?;
        let closure = doc.selected_node_closure();
        let base = Baseline::capture(doc, input, closure.iter().copied(), globs_within(doc, &closure));
        let nodes = base.unlocked(closure);
        let globs = globs_within(doc, &nodes);
        Ok(Self {
            base,
            handle,
            fixed: handle.opposite(bounds),
            grab: handle.position(bounds, input.camera.zoom),
            nodes,
            globs,
        })
    }

    /// Signed scale factors for the pointer at `world`.
    ///
    /// The handle follows the pointer's drag from the gesture origin, so a
    /// grab slightly off the handle does not rescale anything.
    fn scale(&self, world: Point, keep_aspect: bool) -> (f64, f64) {
        let (scale_x, scale_y) = self.handle.axes();
        let start = self.grab - self.fixed;
        let now = self.grab + (world - self.base.origin) - self.fixed;
        let mut sx = if scale_x && start.x.abs() > GEOMETRY_EPSILON { now.x / start.x } else { 1.0 };
        let mut sy = if scale_y && start.y.abs() > GEOMETRY_EPSILON { now.y / start.y } else { 1.0 };
        if keep_aspect && scale_x && scale_y {
            let k = sx.abs().max(sy.abs());
            sx = k.copysign(sx);
            sy = k.copysign(sy);
        }
        (sx, sy)
    }
}

impl SessionTrait for TransformSession {
    fn kind(&self) -> CommandKind {
        CommandKind::Transform
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        let (sx, sy) = self.scale(input.world(), input.modifiers.shift);
        let pivot = self.fixed.to_vec2();
        let affine = Affine::translate(pivot) * Affine::scale_non_uniform(sx, sy) * Affine::translate(-pivot);
        let radius_scale = (sx * sy).abs().sqrt();
        transform_from(doc, &self.base, &self.nodes, &self.globs, affine, radius_scale, config.min_node_radius);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.base.restore(doc);
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.base.finish(CommandKind::Transform, doc)
    }
}
