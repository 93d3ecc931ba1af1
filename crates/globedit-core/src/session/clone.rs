use super::{MoveSession, SessionTrait, globs_within};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{GlobId, NodeId};
use crate::error::{EditorError, EditorResult};
use crate::history::{Command, CommandKind, EntitySnapshot};
use crate::input::PointerInput;
use crate::selection::Selection;
use crate::snap::SnapIndicator;
use std::collections::{BTreeMap, BTreeSet};

/// Duplicates the selection, then drags the copies.
#[derive(Debug, Clone)]
pub struct CloneSession {
    inner: MoveSession,
    /// The clones as absent, for undo and cancel.
    absent: EntitySnapshot,
    selection_before: Selection,
}

impl CloneSession {
    /// Duplicate the selection and start moving the copies.
    pub fn new(doc: &mut Document, input: &PointerInput, config: &EditorConfig) -> EditorResult<Self> {
        let nodes = doc.selected_node_closure();
        if nodes.is_empty() {
            return Err(EditorError::NothingToDo);
        }
        let globs = globs_within(doc, &nodes);
        let selection_before = doc.selection.clone();

        let node_copies: Vec<_> = nodes
            .iter()
            .filter_map(|id| doc.node(*id))
            .map(|n| {
                let mut copy = n.duplicate();
                copy.locked = false;
                (n.id(), copy)
            })
            .collect();
        let remap: BTreeMap<NodeId, NodeId> = node_copies.iter().map(|(old, new)| (*old, new.id())).collect();
        let glob_copies: Vec<_> = globs
            .iter()
            .filter_map(|id| doc.glob(*id))
            .map(|g| g.duplicate_with(|n| remap.get(&n).copied().unwrap_or(n)))
            .collect();

        let new_nodes: BTreeSet<NodeId> = remap.values().copied().collect();
        let new_globs: BTreeSet<GlobId> = glob_copies.iter().map(|g| g.id()).collect();
        let absent = EntitySnapshot::capture(doc, new_nodes.iter().copied(), new_globs.iter().copied());

        for (_, node) in node_copies {
            doc.add_node(node);
        }
        for glob in glob_copies {
            doc.add_glob(glob);
        }
        doc.selection.nodes = new_nodes;
        doc.selection.globs = new_globs;

        let inner = MoveSession::new(doc, input, config).with_kind(CommandKind::Clone);
        Ok(Self {
            inner,
            absent,
            selection_before,
        })
    }
}

impl SessionTrait for CloneSession {
    fn kind(&self) -> CommandKind {
        CommandKind::Clone
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        self.inner.update(doc, input, config);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.inner.cancel(doc);
        self.absent.apply(doc);
        doc.selection.nodes = self.selection_before.nodes.clone();
        doc.selection.globs = self.selection_before.globs.clone();
        doc.prune_selection();
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.inner.complete(doc);
        let after = self.absent.recapture(doc);
        Some(
            Command::new(CommandKind::Clone, self.absent.clone(), after)
                .with_selection_before(self.selection_before.clone()),
        )
    }

    fn snaps(&self) -> &[SnapIndicator] {
        self.inner.snaps()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::History;
    use crate::session::test_util::{at, pair};
    use kurbo::Point;

    #[test]
    fn test_clone_glob_and_drag() {
        let (mut doc, a, b, g) = pair();
        doc.selection.select_glob(g);
        let config = EditorConfig::default();
        let mut session = CloneSession::new(&mut doc, &at(100.0, 0.0), &config).unwrap();
        assert_eq!(doc.nodes.len(), 4);
        assert_eq!(doc.globs.len(), 2);
        assert!(!doc.selection.is_glob_selected(g));

        session.update(&mut doc, &at(100.0, 300.0), &config);
        assert_eq!(doc.node(a).unwrap().point, Point::ZERO);
        let clone_id = *doc.selection.globs.iter().next().unwrap();
        let clone = doc.glob(clone_id).unwrap();
        assert!(!clone.references(a) && !clone.references(b));
        assert_eq!(doc.node(clone.start()).unwrap().point, Point::new(0.0, 300.0));
        assert!(clone.points.is_some());
    }

    #[test]
    fn test_cancel_removes_clones() {
        let (mut doc, a, _, _) = pair();
        doc.selection.select_node(a);
        let original = doc.clone();
        let config = EditorConfig::default();
        let mut session = CloneSession::new(&mut doc, &at(0.0, 0.0), &config).unwrap();
        session.update(&mut doc, &at(40.0, 40.0), &config);
        session.cancel(&mut doc);
        assert_eq!(doc, original);
    }

    #[test]
    fn test_undo_removes_and_redo_restores() {
        let (mut doc, a, _, _) = pair();
        doc.selection.select_node(a);
        let config = EditorConfig::default();
        let mut history = History::default();
        let mut session = CloneSession::new(&mut doc, &at(0.0, 0.0), &config).unwrap();
        session.update(&mut doc, &at(0.0, 90.0), &config);
        let command = session.complete(&mut doc).unwrap();
        history.execute(&mut doc, command);
        let cloned = doc.clone();
        assert_eq!(doc.nodes.len(), 3);

        history.undo(&mut doc);
        assert_eq!(doc.nodes.len(), 2);
        assert!(doc.selection.is_node_selected(a));
        history.redo(&mut doc);
        assert_eq!(doc, cloned);
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        let (mut doc, ..) = pair();
        let config = EditorConfig::default();
        assert!(CloneSession::new(&mut doc, &at(0.0, 0.0), &config).is_err());
    }
}
