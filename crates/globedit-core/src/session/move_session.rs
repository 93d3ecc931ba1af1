use super::{Baseline, SessionTrait, globs_within, translate_from};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{GlobId, NodeId};
use crate::history::{Command, CommandKind};
use crate::input::PointerInput;
use crate::snap::{SnapIndicator, Snapper};
use kurbo::Vec2;
use std::collections::BTreeSet;

/// Drags the selection by the pointer delta.
#[derive(Debug, Clone)]
pub struct MoveSession {
    base: Baseline,
    nodes: BTreeSet<NodeId>,
    globs: BTreeSet<GlobId>,
    snapper: Option<Snapper>,
    snaps: Vec<SnapIndicator>,
    kind: CommandKind,
}

impl MoveSession {
    /// Start moving the selected nodes and the globs between them.
    pub fn new(doc: &Document, input: &PointerInput, config: &EditorConfig) -> Self {
        let closure = doc.selected_node_closure();
        let globs_all = globs_within(doc, &closure);
        let base = Baseline::capture(doc, input, closure.iter().copied(), globs_all.iter().copied());
        let nodes = base.unlocked(closure);
        let globs = globs_within(doc, &nodes);

        let origin = base.origin;
        let grabbed: Vec<NodeId> = doc
            .selection
            .nodes
            .iter()
            .filter(|id| nodes.contains(*id))
            .filter(|id| doc.node(**id).is_some_and(|n| n.hit_test(origin, 0.0)))
            .copied()
            .collect();
        let snapper = match grabbed.as_slice() {
            [only] => Snapper::for_node(doc, *only, &nodes, config),
            _ => None,
        };

        Self {
            base,
            nodes,
            globs,
            snapper,
            snaps: Vec::new(),
            kind: CommandKind::Move,
        }
    }

    /// Record the gesture under a different command kind.
    pub(crate) fn with_kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }

    /// Nodes that follow the pointer.
    pub fn moving_nodes(&self) -> &BTreeSet<NodeId> {
        &self.nodes
    }
}

/// Keep only the larger component of `delta`.
fn lock_axis(delta: Vec2) -> Vec2 {
    if delta.x.abs() >= delta.y.abs() {
        Vec2::new(delta.x, 0.0)
    } else {
        Vec2::new(0.0, delta.y)
    }
}

impl SessionTrait for MoveSession {
    fn kind(&self) -> CommandKind {
        self.kind
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        let mut delta = self.base.delta(input);
        if input.modifiers.shift {
            delta = lock_axis(delta);
        }
        self.snaps.clear();
        if let Some(snapper) = &self.snapper {
            let skip = input.modifiers.ctrl || input.speed > config.snap_speed_limit;
            let outcome = snapper.resolve(delta, &input.camera, input.visible_world_rect(), skip);
            delta = outcome.delta;
            if input.modifiers.shift {
                delta = lock_axis(delta);
            }
            self.snaps = outcome.snaps;
        }
        translate_from(doc, &self.base, &self.nodes, &self.globs, delta);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.snaps.clear();
        self.base.restore(doc);
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.snaps.clear();
        self.base.finish(self.kind, doc)
    }

    fn snaps(&self) -> &[SnapIndicator] {
        &self.snaps
    }
}
