//! The editor facade: document, history, camera and the active session.

use crate::bounds::glob_bounds;
use crate::camera::Camera;
use crate::config::EditorConfig;
use crate::document::{Document, HitTarget};
use crate::entities::{Glob, GlobId, Node, NodeId};
use crate::error::{DocumentError, EditorError, EditorResult, GeometryError};
use crate::geometry::{Outline, default_handles};
use crate::history::{Command, CommandKind, EntitySnapshot, History};
use crate::input::{Modifiers, PointerInput, PointerTracker};
use crate::selection::{BoundsHandle, HANDLE_SIZE, hit_test_bounds_handles};
use crate::session::{Session, SessionRequest};
use crate::snap::SnapIndicator;
use kurbo::{BezPath, Point, Rect, Size, Vec2};
use std::collections::BTreeSet;

/// Padding used by `fit_to_content`, in screen pixels.
const FIT_PADDING: f64 = 50.0;

/// Owns everything needed to edit one document.
#[derive(Debug, Clone)]
pub struct Editor {
    pub document: Document,
    pub history: History,
    pub camera: Camera,
    pub viewport: Size,
    pub config: EditorConfig,
    session: Option<Session>,
    tracker: PointerTracker,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// Create an editor with an empty document.
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::new(), config)
    }

    /// Create an editor for an existing document.
    pub fn with_document(document: Document, config: EditorConfig) -> Self {
        Self {
            document,
            history: History::new(config.history_limit),
            camera: Camera::new(),
            viewport: Size::new(800.0, 600.0),
            config,
            session: None,
            tracker: PointerTracker::new(),
        }
    }

    /// Load a document from JSON with an empty history.
    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self, DocumentError> {
        Ok(Self::with_document(Document::from_json(json)?, config))
    }

    /// Serialize the document.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        self.document.to_json()
    }

    /// Set the viewport size in screen pixels.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport = Size::new(width, height);
    }

    /// Build a pointer sample using the editor's camera and viewport.
    pub fn pointer(&self, screen: Point, modifiers: Modifiers) -> PointerInput {
        PointerInput::new(screen, modifiers, self.camera, self.viewport)
    }

    /// Zoom and pan so the whole document is visible.
    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.document.bounds() {
            self.camera.fit_to_bounds(bounds, self.viewport, FIT_PADDING);
        }
    }

    // --- sessions ---

    /// Check if a gesture is in progress.
    pub fn is_session_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Start a gesture. Fails if one is already running.
    pub fn begin_session(&mut self, request: SessionRequest, input: &PointerInput) -> EditorResult<()> {
        if self.session.is_some() {
            return Err(EditorError::SessionActive);
        }
        self.tracker.reset(input.screen);
        self.session = Some(Session::begin(request, &mut self.document, input, &self.config)?);
        Ok(())
    }

    /// Feed a pointer move to the active session.
    pub fn update_session(&mut self, input: &PointerInput) -> EditorResult<()> {
        let session = self.session.as_mut().ok_or(EditorError::NoSession)?;
        let input = PointerInput {
            speed: self.tracker.track(input.screen),
            ..*input
        };
        session.update(&mut self.document, &input, &self.config);
        Ok(())
    }

    /// Abort the active session, restoring the document.
    pub fn cancel_session(&mut self) -> EditorResult<()> {
        let mut session = self.session.take().ok_or(EditorError::NoSession)?;
        session.cancel(&mut self.document);
        Ok(())
    }

    /// Finish the gesture. Returns whether a history entry was recorded.
    pub fn complete_session(&mut self) -> EditorResult<bool> {
        let mut session = self.session.take().ok_or(EditorError::NoSession)?;
        match session.complete(&mut self.document) {
            Some(command) => {
                self.history.execute(&mut self.document, command);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- history ---

    /// Undo the last command. Rejected while a session is active.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        Ok(self.history.undo(&mut self.document))
    }

    /// Redo the next command. Rejected while a session is active.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        Ok(self.history.redo(&mut self.document))
    }

    pub fn can_undo(&self) -> bool {
        self.session.is_none() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.session.is_none() && self.history.can_redo()
    }

    fn ensure_idle(&self) -> EditorResult<()> {
        if self.session.is_some() {
            Err(EditorError::SessionActive)
        } else {
            Ok(())
        }
    }

    /// Apply `mutate` and record it as one command. Nothing is recorded when
    /// the entities and selection come out unchanged.
    fn record(
        &mut self,
        kind: CommandKind,
        nodes: impl IntoIterator<Item = NodeId>,
        globs: impl IntoIterator<Item = GlobId>,
        mutate: impl FnOnce(&mut Document),
    ) -> bool {
        let selection = self.document.selection.clone();
        let before = EntitySnapshot::capture(&self.document, nodes, globs);
        mutate(&mut self.document);
        let after = before.recapture(&self.document);
        if after == before && self.document.selection.same_selection(&selection) {
            return false;
        }
        let command = Command::new(kind, before, after).with_selection_before(selection);
        self.history.execute(&mut self.document, command);
        true
    }

    // --- discrete commands ---

    /// Add a node and select it.
    pub fn create_node(&mut self, center: Point, radius: Option<f64>) -> EditorResult<NodeId> {
        self.ensure_idle()?;
        let radius = radius
            .unwrap_or(self.config.default_node_radius)
            .max(self.config.min_node_radius);
        let node = Node::new(center, radius);
        let id = node.id();
        self.record(CommandKind::CreateNode, [id], [], |doc| {
            doc.add_node(node);
            doc.selection.select_node(id);
        });
        Ok(id)
    }

    /// Join two nodes with a glob whose handles sit on the outer tangents.
    pub fn create_glob(&mut self, start: NodeId, end: NodeId) -> EditorResult<GlobId> {
        self.ensure_idle()?;
        let a = self.document.node(start).ok_or(EditorError::MissingNode(start))?;
        let b = self.document.node(end).ok_or(EditorError::MissingNode(end))?;
        if start == end {
            return Err(EditorError::NothingToDo);
        }
        let (d, dp) = default_handles(a, b).ok_or(GeometryError::Degenerate)?;
        let glob = Glob::new(start, end, d, dp);
        let id = glob.id();
        self.record(CommandKind::CreateGlob, [], [id], |doc| {
            doc.add_glob(glob);
            doc.selection.select_glob(id);
        });
        Ok(id)
    }

    /// Delete the selection. Globs attached to deleted nodes go with them.
    pub fn delete_selected(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        let nodes = self.document.selection.nodes.clone();
        let globs = self.document.selection.globs.clone();
        Ok(self.record(CommandKind::Delete, nodes.clone(), globs.clone(), |doc| {
            for id in &globs {
                doc.remove_glob(*id);
            }
            for id in &nodes {
                doc.remove_node(*id);
            }
        }))
    }

    /// Switch the cap style of every selected node.
    pub fn toggle_cap(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        let nodes = self.document.selection.nodes.clone();
        Ok(self.record(CommandKind::ToggleCap, nodes.clone(), [], |doc| {
            for id in &nodes {
                if let Some(node) = doc.node_mut(*id) {
                    node.cap = node.cap.toggled();
                }
            }
        }))
    }

    /// Flip the locked flag of every selected node.
    pub fn toggle_locked(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        let nodes = self.document.selection.nodes.clone();
        Ok(self.record(CommandKind::ToggleLocked, nodes.clone(), [], |doc| {
            for id in &nodes {
                if let Some(node) = doc.node_mut(*id) {
                    node.locked = !node.locked;
                }
            }
        }))
    }

    /// Move the selection one step along `direction` (normalized).
    pub fn nudge_selected(&mut self, direction: Vec2, large: bool) -> EditorResult<bool> {
        self.ensure_idle()?;
        let step = if large { self.config.nudge_large } else { self.config.nudge_small };
        let delta = direction.normalize() * step;
        if !delta.is_finite() {
            return Ok(false);
        }
        let nodes: BTreeSet<NodeId> = self
            .document
            .selected_node_closure()
            .into_iter()
            .filter(|id| self.document.node(*id).is_some_and(|n| !n.locked))
            .collect();
        let globs = crate::session::globs_within(&self.document, &nodes);
        Ok(self.record(CommandKind::Nudge, nodes.clone(), globs.clone(), |doc| {
            for id in &nodes {
                if let Some(node) = doc.node_mut(*id) {
                    node.point += delta;
                }
            }
            for id in &globs {
                if let Some(glob) = doc.glob_mut(*id) {
                    glob.translate_handles(delta);
                }
            }
            let dirty = doc.globs_touching(&nodes);
            doc.recompute_globs(&dirty);
        }))
    }

    /// Select every node and glob as one undoable step.
    pub fn select_all(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        Ok(self.record(CommandKind::Select, [], [], |doc| {
            doc.selection.nodes = doc.nodes.keys().copied().collect();
            doc.selection.globs = doc.globs.keys().copied().collect();
        }))
    }

    /// Clear the selection as one undoable step.
    pub fn clear_selection(&mut self) -> EditorResult<bool> {
        self.ensure_idle()?;
        Ok(self.record(CommandKind::Select, [], [], |doc| {
            doc.selection.nodes.clear();
            doc.selection.globs.clear();
        }))
    }

    // --- renderer queries ---

    /// Outline segments of a glob, `None` while it is degenerate.
    pub fn outline(&self, glob: GlobId) -> Option<Outline> {
        self.document.outline(glob)
    }

    /// Outline as a closed path, with cap arcs flattened to cubics.
    pub fn outline_path(&self, glob: GlobId) -> Option<BezPath> {
        self.outline(glob).map(|o| o.to_bez_path(self.config.arc_tolerance))
    }

    pub fn node_bounds(&self, node: NodeId) -> EditorResult<Rect> {
        self.document.node_bounds(node).ok_or(EditorError::MissingNode(node))
    }

    /// Bounds of a glob outline.
    pub fn glob_bounds(&self, glob: GlobId) -> EditorResult<Rect> {
        let entity = self.document.glob(glob).ok_or(EditorError::MissingGlob(glob))?;
        Ok(glob_bounds(entity)?)
    }

    /// Bounds of everything selected.
    pub fn selection_bounds(&self) -> Option<Rect> {
        self.document.selection_bounds()
    }

    /// Snap guides to draw for the active session.
    pub fn snap_indicators(&self) -> &[SnapIndicator] {
        match &self.session {
            Some(session) => session.snaps(),
            None => &[],
        }
    }

    /// The rubber-band rectangle while brushing.
    pub fn brush_rect(&self) -> Option<Rect> {
        self.session.as_ref().and_then(Session::brush_rect)
    }

    // --- hit testing ---

    /// The entity under a world point.
    pub fn hit_test(&self, world: Point) -> Option<HitTarget> {
        let tolerance = self.camera.screen_to_world_len(HANDLE_SIZE);
        self.document.hit_test(world, tolerance, self.config.arc_tolerance)
    }

    /// Hit test and mark the result as hovered. Handles and anchors hover
    /// their glob.
    pub fn hover(&mut self, world: Point) -> Option<HitTarget> {
        let target = self.hit_test(world);
        let mut nodes = BTreeSet::new();
        let mut globs = BTreeSet::new();
        match target {
            Some(HitTarget::Node(id)) => {
                nodes.insert(id);
            }
            Some(HitTarget::Handle(id, _) | HitTarget::Anchor(id, _) | HitTarget::Glob(id)) => {
                globs.insert(id);
            }
            None => {}
        }
        self.document.selection.set_hovered(nodes, globs);
        target
    }

    /// The selection bounds handle under a world point.
    pub fn bounds_handle_at(&self, world: Point) -> Option<BoundsHandle> {
        let bounds = self.selection_bounds()?;
        hit_test_bounds_handles(bounds, world, self.camera.zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{HandleKind, NodeCap};

    fn editor_with_pair() -> (Editor, NodeId, NodeId) {
        let mut editor = Editor::default();
        let a = editor.create_node(Point::new(0.0, 0.0), Some(25.0)).unwrap();
        let b = editor.create_node(Point::new(200.0, 0.0), Some(25.0)).unwrap();
        (editor, a, b)
    }

    #[test]
    fn test_create_glob_end_to_end() {
        let (mut editor, a, b) = editor_with_pair();
        let g = editor.create_glob(a, b).unwrap();
        let glob = editor.document.glob(g).unwrap();
        let points = glob.points.unwrap();
        assert!(((points.e0 - Point::new(0.0, 0.0)).hypot() - 25.0).abs() < 1e-9);
        // Equal radii: the tangent lines are horizontal, so the outline spans
        // both circles exactly.
        let bounds = editor.glob_bounds(g).unwrap();
        assert!((bounds.width() - 250.0).abs() < 1e-9);
        assert!((bounds.height() - 50.0).abs() < 1e-9);
        assert!(editor.outline_path(g).is_some());
        assert!(editor.document.selection.is_glob_selected(g));
    }

    #[test]
    fn test_create_glob_unequal_radii() {
        let mut editor = Editor::default();
        let a = editor.create_node(Point::new(0.0, 0.0), Some(25.0)).unwrap();
        let b = editor.create_node(Point::new(200.0, 0.0), Some(40.0)).unwrap();
        let g = editor.create_glob(a, b).unwrap();
        let points = editor.document.glob(g).unwrap().points.unwrap();

        // The primary tangent touches both circles at -phi from the spine.
        let phi = ((25.0_f64 - 40.0) / 200.0).acos();
        let dir = Vec2::from_angle(-phi);
        assert!((points.e0 - (Point::ZERO + dir * 25.0)).hypot() < 1e-6);
        assert!((points.e1 - (Point::new(200.0, 0.0) + dir * 40.0)).hypot() < 1e-6);
        assert!((points.e0p - (Point::ZERO + Vec2::from_angle(phi) * 25.0)).hypot() < 1e-6);

        // Bounds cover both node circles: x from -25 to 240, y within r1.
        let bounds = editor.glob_bounds(g).unwrap();
        assert!((bounds.width() - (200.0 + 25.0 + 40.0)).abs() < 1e-9);
        assert!((bounds.height() - 80.0).abs() < 1e-9);
        assert!((bounds.x0 + 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_create_glob_rejects_nested_and_missing() {
        let mut editor = Editor::default();
        let big = editor.create_node(Point::ZERO, Some(100.0)).unwrap();
        let small = editor.create_node(Point::new(10.0, 0.0), Some(5.0)).unwrap();
        assert_eq!(
            editor.create_glob(big, small),
            Err(EditorError::Geometry(GeometryError::Degenerate))
        );
        let ghost = Node::new(Point::ZERO, 1.0).id();
        assert_eq!(editor.create_glob(big, ghost), Err(EditorError::MissingNode(ghost)));
    }

    #[test]
    fn test_create_undo_redo() {
        let (mut editor, a, b) = editor_with_pair();
        let g = editor.create_glob(a, b).unwrap();
        let full = editor.document.clone();
        assert!(editor.undo().unwrap());
        assert!(editor.document.glob(g).is_none());
        assert!(editor.document.selection.is_node_selected(b));
        editor.undo().unwrap();
        editor.undo().unwrap();
        assert!(editor.document.is_empty());
        assert!(!editor.undo().unwrap());
        for _ in 0..3 {
            assert!(editor.redo().unwrap());
        }
        assert_eq!(editor.document, full);
    }

    #[test]
    fn test_delete_cascades_and_undoes() {
        let (mut editor, a, b) = editor_with_pair();
        let g = editor.create_glob(a, b).unwrap();
        editor.document.selection.select_node(a);
        let before = editor.document.clone();
        assert!(editor.delete_selected().unwrap());
        assert!(editor.document.glob(g).is_none());
        assert!(editor.document.node(b).is_some());
        editor.undo().unwrap();
        assert_eq!(editor.document, before);
    }

    #[test]
    fn test_toggles_and_nudge() {
        let (mut editor, a, _) = editor_with_pair();
        editor.document.selection.select_node(a);
        assert!(editor.toggle_cap().unwrap());
        assert_eq!(editor.document.node(a).unwrap().cap, NodeCap::Flat);
        assert!(editor.nudge_selected(Vec2::new(1.0, 0.0), true).unwrap());
        assert_eq!(editor.document.node(a).unwrap().point, Point::new(10.0, 0.0));
        assert!(editor.toggle_locked().unwrap());
        assert!(!editor.nudge_selected(Vec2::new(0.0, 1.0), false).unwrap());
        editor.undo().unwrap();
        editor.undo().unwrap();
        editor.undo().unwrap();
        assert_eq!(editor.document.node(a).unwrap().cap, NodeCap::Round);
        assert_eq!(editor.document.node(a).unwrap().point, Point::ZERO);
    }

    #[test]
    fn test_selection_commands() {
        let (mut editor, a, b) = editor_with_pair();
        assert!(editor.select_all().unwrap());
        assert!(editor.document.selection.is_node_selected(a));
        assert!(!editor.select_all().unwrap());
        assert!(editor.clear_selection().unwrap());
        assert!(editor.document.selection.is_empty());
        editor.undo().unwrap();
        assert!(editor.document.selection.is_node_selected(b));
    }

    #[test]
    fn test_session_lifecycle() {
        let (mut editor, a, _) = editor_with_pair();
        editor.document.selection.select_node(a);
        let start = editor.pointer(Point::new(0.0, 0.0), Modifiers::NONE);
        editor.begin_session(SessionRequest::Move, &start).unwrap();
        assert_eq!(editor.begin_session(SessionRequest::Move, &start), Err(EditorError::SessionActive));
        assert_eq!(editor.undo(), Err(EditorError::SessionActive));

        let drag = editor.pointer(Point::new(60.0, 80.0), Modifiers::NONE);
        editor.update_session(&drag).unwrap();
        assert_eq!(editor.document.node(a).unwrap().point, Point::new(60.0, 80.0));
        assert!(editor.complete_session().unwrap());
        assert_eq!(editor.complete_session(), Err(EditorError::NoSession));

        editor.undo().unwrap();
        assert_eq!(editor.document.node(a).unwrap().point, Point::ZERO);
        editor.redo().unwrap();
        assert_eq!(editor.document.node(a).unwrap().point, Point::new(60.0, 80.0));
    }

    #[test]
    fn test_fast_drag_skips_snapping() {
        let (mut editor, a, _) = editor_with_pair();
        editor.document.selection.select_node(a);
        let start = editor.pointer(Point::new(0.0, 0.0), Modifiers::NONE);
        editor.begin_session(SessionRequest::Move, &start).unwrap();
        // One big jump is faster than the snap speed limit.
        let drag = editor.pointer(Point::new(30.0, 2.0), Modifiers::NONE);
        editor.update_session(&drag).unwrap();
        assert_eq!(editor.document.node(a).unwrap().point, Point::new(30.0, 2.0));
        assert!(editor.snap_indicators().is_empty());
        // Settling slowly lets it snap.
        let settle = editor.pointer(Point::new(30.0, 1.0), Modifiers::NONE);
        editor.update_session(&settle).unwrap();
        assert_eq!(editor.document.node(a).unwrap().point, Point::new(30.0, 0.0));
        assert!(!editor.snap_indicators().is_empty());
        editor.cancel_session().unwrap();
        assert_eq!(editor.document.node(a).unwrap().point, Point::ZERO);
    }

    #[test]
    fn test_hit_test_dispatch() {
        let (mut editor, a, b) = editor_with_pair();
        let g = editor.create_glob(a, b).unwrap();
        assert_eq!(editor.hit_test(Point::new(200.0, 10.0)), Some(HitTarget::Node(b)));
        let d = editor.document.glob(g).unwrap().d;
        assert_eq!(editor.hit_test(d), Some(HitTarget::Handle(g, HandleKind::Primary)));
        assert_eq!(
            editor.bounds_handle_at(Point::new(225.0, 25.0)),
            Some(BoundsHandle::Corner(crate::selection::Corner::BottomRight))
        );
    }

    #[test]
    fn test_hover_tracks_hit_target() {
        let (mut editor, a, b) = editor_with_pair();
        let g = editor.create_glob(a, b).unwrap();
        editor.hover(Point::new(0.0, 5.0));
        assert!(editor.document.selection.hovered_nodes.contains(&a));
        let d = editor.document.glob(g).unwrap().d;
        editor.hover(d);
        assert!(editor.document.selection.hovered_nodes.is_empty());
        assert!(editor.document.selection.hovered_globs.contains(&g));
        assert_eq!(editor.hover(Point::new(100.0, 500.0)), None);
        assert!(editor.document.selection.hovered_globs.is_empty());
    }

    #[test]
    fn test_json_roundtrip_through_editor() {
        let (mut editor, a, b) = editor_with_pair();
        editor.create_glob(a, b).unwrap();
        let json = editor.to_json().unwrap();
        let loaded = Editor::from_json(&json, EditorConfig::default()).unwrap();
        assert_eq!(loaded.document, editor.document);
        assert_eq!(loaded.to_json().unwrap(), json);
        assert!(!loaded.can_undo());
    }
}
