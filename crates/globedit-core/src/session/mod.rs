//! Per-gesture edit sessions.
//!
//! A session is created when a drag starts, mutates the document live on
//! every pointer move, and ends with either `cancel` (restore the snapshot) or
//! `complete` (hand back one undoable [`Command`]).

mod anchor;
mod brush;
mod clone;
mod handle;
mod move_session;
mod resize;
mod rotate;
mod transform;

pub use anchor::AnchorSession;
pub use brush::BrushSession;
pub use clone::CloneSession;
pub use handle::HandleSession;
pub use move_session::MoveSession;
pub use resize::ResizeSession;
pub use rotate::RotateSession;
pub use transform::TransformSession;

use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{AnchorKind, GlobId, HandleKind, NodeId};
use crate::error::EditorResult;
use crate::history::{Command, CommandKind, EntitySnapshot};
use crate::input::PointerInput;
use crate::selection::{BoundsHandle, Selection};
use crate::snap::SnapIndicator;
use kurbo::{Affine, Point, Rect, Vec2};
use std::collections::BTreeSet;

/// What the input dispatcher asks for when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    Move,
    Handle { glob: GlobId, handle: HandleKind },
    Anchor { glob: GlobId, anchor: AnchorKind },
    Resize { node: NodeId },
    Rotate,
    Transform { handle: BoundsHandle },
    Brush,
    Clone,
}

/// Common behavior of all sessions.
pub trait SessionTrait {
    /// Command kind recorded in history.
    fn kind(&self) -> CommandKind;

    /// Apply the gesture for the current pointer sample.
    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig);

    /// Restore the document to its state at gesture start.
    fn cancel(&mut self, doc: &mut Document);

    /// Finish the gesture. Returns `None` when nothing changed.
    fn complete(&mut self, doc: &mut Document) -> Option<Command>;

    /// Active snap hints for the renderer.
    fn snaps(&self) -> &[SnapIndicator] {
        &[]
    }
}

/// The active session.
#[derive(Debug, Clone)]
pub enum Session {
    Move(MoveSession),
    Handle(HandleSession),
    Anchor(AnchorSession),
    Resize(ResizeSession),
    Rotate(RotateSession),
    Transform(TransformSession),
    Brush(BrushSession),
    Clone(CloneSession),
}

impl Session {
    /// Start a session for `request` at the pointer position in `input`.
    pub fn begin(
        request: SessionRequest,
        doc: &mut Document,
        input: &PointerInput,
        config: &EditorConfig,
    ) -> EditorResult<Self> {
        let session = match request {
            SessionRequest::Move => Session::Move(MoveSession::new(doc, input, config)),
            SessionRequest::Handle { glob, handle } => {
                Session::Handle(HandleSession::new(doc, glob, handle, input)?)
            }
            SessionRequest::Anchor { glob, anchor } => {
                Session::Anchor(AnchorSession::new(doc, glob, anchor, input)?)
            }
            SessionRequest::Resize { node } => Session::Resize(ResizeSession::new(doc, node, input)?),
            SessionRequest::Rotate | SessionRequest::Transform { handle: BoundsHandle::Rotate } => {
                Session::Rotate(RotateSession::new(doc, input)?)
            }
            SessionRequest::Transform { handle } => {
                Session::Transform(TransformSession::new(doc, handle, input)?)
            }
            SessionRequest::Brush => Session::Brush(BrushSession::new(doc, input)),
            SessionRequest::Clone => Session::Clone(CloneSession::new(doc, input, config)?),
        };
        log::debug!("session: begin {:?}", session.kind());
        Ok(session)
    }

    fn inner(&self) -> &dyn SessionTrait {
        match self {
            Session::Move(s) => s,
            Session::Handle(s) => s,
            Session::Anchor(s) => s,
            Session::Resize(s) => s,
            Session::Rotate(s) => s,
            Session::Transform(s) => s,
            Session::Brush(s) => s,
            Session::Clone(s) => s,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn SessionTrait {
        match self {
            Session::Move(s) => s,
            Session::Handle(s) => s,
            Session::Anchor(s) => s,
            Session::Resize(s) => s,
            Session::Rotate(s) => s,
            Session::Transform(s) => s,
            Session::Brush(s) => s,
            Session::Clone(s) => s,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.inner().kind()
    }

    /// Apply a pointer move.
    pub fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        self.inner_mut().update(doc, input, config);
    }

    /// Restore the document to its state at gesture start.
    pub fn cancel(&mut self, doc: &mut Document) {
        log::debug!("session: cancel {:?}", self.kind());
        self.inner_mut().cancel(doc);
    }

    /// Finish the gesture, returning a command when anything changed.
    pub fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        let command = self.inner_mut().complete(doc);
        log::debug!(
            "session: complete {:?} ({})",
            self.kind(),
            if command.is_some() { "recorded" } else { "no change" }
        );
        command
    }

    /// Snap indicators from the last update.
    pub fn snaps(&self) -> &[SnapIndicator] {
        self.inner().snaps()
    }

    /// The brush rectangle, while brushing.
    pub fn brush_rect(&self) -> Option<Rect> {
        match self {
            Session::Brush(s) => s.rect(),
            _ => None,
        }
    }
}

/// Gesture origin plus the state captured when the gesture started.
#[derive(Debug, Clone)]
pub(crate) struct Baseline {
    pub origin: Point,
    pub before: EntitySnapshot,
    pub selection: Selection,
}

impl Baseline {
    pub fn capture(
        doc: &Document,
        input: &PointerInput,
        nodes: impl IntoIterator<Item = NodeId>,
        globs: impl IntoIterator<Item = GlobId>,
    ) -> Self {
        Self {
            origin: input.world(),
            before: EntitySnapshot::capture(doc, nodes, globs),
            selection: doc.selection.clone(),
        }
    }

    /// World-space drag vector from the gesture origin.
    pub fn delta(&self, input: &PointerInput) -> Vec2 {
        input.world() - self.origin
    }

    /// Put every captured entity and the selection back.
    pub fn restore(&self, doc: &mut Document) {
        self.before.apply(doc);
        doc.selection.nodes = self.selection.nodes.clone();
        doc.selection.globs = self.selection.globs.clone();
        doc.prune_selection();
    }

    /// Build the command for the gesture, or `None` if nothing changed.
    pub fn finish(&self, kind: CommandKind, doc: &Document) -> Option<Command> {
        let after = self.before.recapture(doc);
        if after == self.before && doc.selection.same_selection(&self.selection) {
            return None;
        }
        Some(Command::new(kind, self.before.clone(), after).with_selection_before(self.selection.clone()))
    }

    /// Unlocked nodes among `ids`, as captured at gesture start.
    pub fn unlocked(&self, ids: impl IntoIterator<Item = NodeId>) -> BTreeSet<NodeId> {
        ids.into_iter()
            .filter(|id| matches!(self.before.nodes.get(id), Some(Some(n)) if !n.locked))
            .collect()
    }

    pub fn original_node(&self, id: NodeId) -> Option<&crate::entities::Node> {
        self.before.nodes.get(&id).and_then(Option::as_ref)
    }

    pub fn original_glob(&self, id: GlobId) -> Option<&crate::entities::Glob> {
        self.before.globs.get(&id).and_then(Option::as_ref)
    }
}

/// Globs whose both endpoints are in `nodes`.
pub(crate) fn globs_within(doc: &Document, nodes: &BTreeSet<NodeId>) -> BTreeSet<GlobId> {
    doc.globs
        .values()
        .filter(|g| g.nodes.iter().all(|n| nodes.contains(n)))
        .map(|g| g.id())
        .collect()
}

/// Set nodes and glob handles to their captured positions moved by `delta`,
/// then recompute the globs attached to the moved nodes.
pub(crate) fn translate_from(
    doc: &mut Document,
    base: &Baseline,
    nodes: &BTreeSet<NodeId>,
    globs: &BTreeSet<GlobId>,
    delta: Vec2,
) {
    for id in nodes {
        if let (Some(orig), Some(node)) = (base.original_node(*id), doc.nodes.get_mut(id)) {
            node.point = orig.point + delta;
        }
    }
    for id in globs {
        if let (Some(orig), Some(glob)) = (base.original_glob(*id), doc.globs.get_mut(id)) {
            glob.d = orig.d + delta;
            glob.dp = orig.dp + delta;
        }
    }
    let dirty = doc.globs_touching(nodes);
    doc.recompute_globs(dirty.iter().chain(globs));
}

/// Set nodes and glob handles to their captured state mapped through
/// `affine`. Orientation-reversing maps swap each glob's sides so the outline
/// keeps its shape.
pub(crate) fn transform_from(
    doc: &mut Document,
    base: &Baseline,
    nodes: &BTreeSet<NodeId>,
    globs: &BTreeSet<GlobId>,
    affine: Affine,
    radius_scale: f64,
    min_radius: f64,
) {
    // Identity maps restore the originals exactly instead of round-tripping
    // coordinates through the pivot.
    let identity = affine == Affine::IDENTITY && radius_scale == 1.0;
    let flip = affine.determinant() < 0.0;
    for id in nodes {
        if let (Some(orig), Some(node)) = (base.original_node(*id), doc.nodes.get_mut(id)) {
            *node = orig.clone();
            if !identity {
                node.transform(affine, radius_scale, min_radius);
            }
        }
    }
    for id in globs {
        if let (Some(orig), Some(glob)) = (base.original_glob(*id), doc.globs.get_mut(id)) {
            *glob = orig.clone();
            if !identity {
                glob.transform_handles(affine);
            }
            if flip {
                glob.swap_sides();
            }
        }
    }
    let dirty = doc.globs_touching(nodes);
    doc.recompute_globs(dirty.iter().chain(globs));
}
