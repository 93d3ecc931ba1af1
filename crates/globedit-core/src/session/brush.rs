use super::SessionTrait;
use crate::bounds::{circle_intersects_rect, contains_bounds, glob_bounds, glob_intersects_rect};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{GlobId, NodeId};
use crate::history::{Command, CommandKind, EntitySnapshot};
use crate::input::PointerInput;
use crate::selection::Selection;
use kurbo::{Point, Rect};
use std::collections::BTreeSet;

/// Rubber-band selection.
#[derive(Debug, Clone)]
pub struct BrushSession {
    origin: Point,
    rect: Option<Rect>,
    selection_before: Selection,
}

impl BrushSession {
    /// Start a rubber band at the pointer.
    pub fn new(doc: &Document, input: &PointerInput) -> Self {
        Self {
            origin: input.world(),
            rect: None,
            selection_before: doc.selection.clone(),
        }
    }

    /// The current brush rectangle in world units.
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }
}

/// Entities fully inside `rect` or touching it.
fn entities_in(doc: &Document, rect: Rect, arc_tolerance: f64) -> (BTreeSet<NodeId>, BTreeSet<GlobId>) {
    let nodes = doc
        .nodes
        .values()
        .filter(|n| contains_bounds(rect, n.bounds()) || circle_intersects_rect(n.point, n.radius, rect))
        .map(|n| n.id())
        .collect();
    let globs = doc
        .globs
        .values()
        .filter(|g| {
            let Some(points) = &g.points else {
                return false;
            };
            if glob_bounds(g).is_ok_and(|b| contains_bounds(rect, b)) {
                return true;
            }
            let cap = |id: NodeId| doc.node(id).map(|n| n.cap).unwrap_or_default();
            glob_intersects_rect(points, cap(g.start()), cap(g.end()), rect, arc_tolerance)
        })
        .map(|g| g.id())
        .collect();
    (nodes, globs)
}

impl SessionTrait for BrushSession {
    fn kind(&self) -> CommandKind {
        CommandKind::Select
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        let rect = Rect::from_points(self.origin, input.world());
        self.rect = Some(rect);
        let (nodes, globs) = entities_in(doc, rect, config.arc_tolerance);
        let (mut selected_nodes, mut selected_globs) = if input.modifiers.shift {
            (self.selection_before.nodes.clone(), self.selection_before.globs.clone())
        } else {
            (BTreeSet::new(), BTreeSet::new())
        };
        selected_nodes.extend(nodes.iter().copied());
        selected_globs.extend(globs.iter().copied());
        doc.selection.nodes = selected_nodes;
        doc.selection.globs = selected_globs;
        doc.selection.set_highlighted(nodes, globs);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.rect = None;
        doc.selection.nodes = self.selection_before.nodes.clone();
        doc.selection.globs = self.selection_before.globs.clone();
        doc.selection.set_highlighted(BTreeSet::new(), BTreeSet::new());
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.rect = None;
        doc.selection.set_highlighted(BTreeSet::new(), BTreeSet::new());
        if doc.selection.same_selection(&self.selection_before) {
            return None;
        }
        Some(
            Command::new(CommandKind::Select, EntitySnapshot::default(), EntitySnapshot::default())
                .with_selection_before(self.selection_before.clone()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Node;
    use crate::history::History;
    use crate::input::Modifiers;
    use crate::session::test_util::{at, at_with, pair};

    #[test]
    fn test_contained_and_intersecting() {
        let (mut doc, a, b, g) = pair();
        let config = EditorConfig::default();
        let mut session = BrushSession::new(&doc, &at(-40.0, -40.0));
        session.update(&mut doc, &at(10.0, 40.0), &config);
        // a is cut by the rect, b is far, the glob outline crosses the rect.
        assert!(doc.selection.is_node_selected(a));
        assert!(!doc.selection.is_node_selected(b));
        assert!(doc.selection.is_glob_selected(g));
        assert!(doc.selection.highlighted_nodes.contains(&a));

        session.update(&mut doc, &at(-30.0, -30.0), &config);
        assert!(doc.selection.is_empty());
    }

    #[test]
    fn test_glob_between_nodes() {
        let (mut doc, a, _, g) = pair();
        let config = EditorConfig::default();
        let mut session = BrushSession::new(&doc, &at(90.0, -100.0));
        session.update(&mut doc, &at(110.0, -20.0), &config);
        assert!(doc.selection.is_glob_selected(g));
        assert!(!doc.selection.is_node_selected(a));
    }

    #[test]
    fn test_shift_keeps_base_selection() {
        let (mut doc, a, b, _) = pair();
        let far = doc.add_node(Node::new(Point::new(0.0, 500.0), 10.0));
        doc.selection.select_node(far);
        let config = EditorConfig::default();
        let mut session = BrushSession::new(&doc, &at(180.0, -10.0));
        session.update(&mut doc, &at_with(220.0, 10.0, Modifiers::shift()), &config);
        assert!(doc.selection.is_node_selected(far));
        assert!(doc.selection.is_node_selected(b));
        assert!(!doc.selection.is_node_selected(a));

        session.update(&mut doc, &at(220.0, 10.0), &config);
        assert!(!doc.selection.is_node_selected(far));
    }

    #[test]
    fn test_complete_is_undoable() {
        let (mut doc, a, _, _) = pair();
        let config = EditorConfig::default();
        let mut history = History::default();
        let mut session = BrushSession::new(&doc, &at(-30.0, -30.0));
        session.update(&mut doc, &at(30.0, 30.0), &config);
        let command = session.complete(&mut doc).unwrap();
        history.execute(&mut doc, command);
        assert!(doc.selection.highlighted_nodes.is_empty());
        history.undo(&mut doc);
        assert!(!doc.selection.is_node_selected(a));
        history.redo(&mut doc);
        assert!(doc.selection.is_node_selected(a));
    }

    #[test]
    fn test_unchanged_selection_records_nothing() {
        let (mut doc, ..) = pair();
        let config = EditorConfig::default();
        let mut session = BrushSession::new(&doc, &at(500.0, 500.0));
        session.update(&mut doc, &at(520.0, 520.0), &config);
        assert!(session.complete(&mut doc).is_none());
    }
}
