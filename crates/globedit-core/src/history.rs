//! Undo/redo history built from before/after entity snapshots.

use crate::document::Document;
use crate::entities::{Glob, GlobId, Node, NodeId};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The state of a set of entities at one instant. `None` means "absent".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub nodes: BTreeMap<NodeId, Option<Node>>,
    pub globs: BTreeMap<GlobId, Option<Glob>>,
}

impl EntitySnapshot {
    /// Capture the given nodes and globs, plus every glob attached to one of
    /// the nodes.
    pub fn capture(
        doc: &Document,
        nodes: impl IntoIterator<Item = NodeId>,
        globs: impl IntoIterator<Item = GlobId>,
    ) -> Self {
        let nodes: BTreeSet<NodeId> = nodes.into_iter().collect();
        let mut glob_ids: BTreeSet<GlobId> = globs.into_iter().collect();
        glob_ids.extend(doc.globs_touching(&nodes));
        Self {
            nodes: nodes.into_iter().map(|id| (id, doc.node(id).cloned())).collect(),
            globs: glob_ids.into_iter().map(|id| (id, doc.glob(id).cloned())).collect(),
        }
    }

    /// Capture the same entity ids as `self`, from the current document.
    pub fn recapture(&self, doc: &Document) -> Self {
        Self {
            nodes: self.nodes.keys().map(|id| (*id, doc.node(*id).cloned())).collect(),
            globs: self.globs.keys().map(|id| (*id, doc.glob(*id).cloned())).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.globs.is_empty()
    }

    /// Write this state back into `doc` and recompute the affected globs.
    pub fn apply(&self, doc: &mut Document) {
        for (id, node) in &self.nodes {
            if let Some(node) = node {
                doc.nodes.insert(*id, node.clone());
            }
        }
        for (id, glob) in &self.globs {
            match glob {
                Some(glob) => {
                    doc.globs.insert(*id, glob.clone());
                }
                None => {
                    doc.globs.remove(id);
                }
            }
        }
        for (id, node) in &self.nodes {
            if node.is_none() {
                doc.nodes.remove(id);
            }
        }
        debug_assert!(
            doc.globs
                .values()
                .all(|g| g.nodes.iter().all(|n| doc.nodes.contains_key(n))),
            "snapshot left a glob referencing a missing node"
        );

        let touched: BTreeSet<NodeId> = self.nodes.keys().copied().collect();
        let mut dirty = doc.globs_touching(&touched);
        dirty.extend(self.globs.keys().filter(|id| doc.globs.contains_key(id)));
        doc.recompute_globs(&dirty);
    }
}

/// What produced a command, for logging and UI labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Move,
    Handle,
    Anchor,
    Resize,
    Rotate,
    Transform,
    Select,
    Clone,
    CreateNode,
    CreateGlob,
    Delete,
    ToggleCap,
    ToggleLocked,
    Nudge,
}

/// One undoable step.
///
/// Commands are pushed after the change has already been made live, so the
/// first execution is a no-op and later redos reapply `after`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub before: EntitySnapshot,
    pub after: EntitySnapshot,
    selection_before: Option<Selection>,
    selection_after: Option<Selection>,
}

impl Command {
    /// Create a command. `History::execute` fills in the selection snapshots.
    pub fn new(kind: CommandKind, before: EntitySnapshot, after: EntitySnapshot) -> Self {
        Self {
            kind,
            before,
            after,
            selection_before: None,
            selection_after: None,
        }
    }

    /// Record the selection as it was when the gesture began, for commands
    /// whose change already altered it.
    pub fn with_selection_before(mut self, selection: Selection) -> Self {
        self.selection_before = Some(selection);
        self
    }

    /// Whether undoing this command would change nothing.
    pub fn is_noop(&self) -> bool {
        self.before == self.after
            && match (&self.selection_before, &self.selection_after) {
                (Some(a), Some(b)) => a.same_selection(b),
                _ => true,
            }
    }

    /// Apply the change. The first run only records selection.
    pub fn redo(&self, doc: &mut Document, first_run: bool) {
        if !first_run {
            self.after.apply(doc);
            if let Some(selection) = &self.selection_after {
                restore_selection(doc, selection);
            }
        }
    }

    /// Revert the change, leaving the pre-command selection.
    pub fn undo(&self, doc: &mut Document) {
        if let Some(selection) = &self.selection_after {
            restore_selection(doc, selection);
        }
        self.before.apply(doc);
        if let Some(selection) = &self.selection_before {
            restore_selection(doc, selection);
        }
        doc.prune_selection();
    }
}

fn restore_selection(doc: &mut Document, selection: &Selection) {
    doc.selection.nodes = selection.nodes.clone();
    doc.selection.globs = selection.globs.clone();
    doc.prune_selection();
}

/// Bounded undo/redo stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    stack: Vec<Command>,
    /// Index of the last applied command, -1 when none.
    pointer: isize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(crate::config::HISTORY_LIMIT)
    }
}

impl History {
    /// Create a history that keeps at most `limit` commands.
    pub fn new(limit: usize) -> Self {
        Self {
            stack: Vec::new(),
            pointer: -1,
            limit: limit.max(1),
        }
    }

    /// Number of stored commands.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Index of the last applied command, -1 when none is.
    pub fn pointer(&self) -> isize {
        self.pointer
    }

    pub fn can_undo(&self) -> bool {
        self.pointer >= 0
    }

    pub fn can_redo(&self) -> bool {
        self.pointer + 1 < self.stack.len() as isize
    }

    /// The command that `undo` would revert.
    pub fn last(&self) -> Option<&Command> {
        usize::try_from(self.pointer).ok().and_then(|i| self.stack.get(i))
    }

    /// Run `command` for the first time and record it, dropping any redo tail.
    pub fn execute(&mut self, doc: &mut Document, mut command: Command) {
        if command.selection_before.is_none() {
            command.selection_before = Some(doc.selection.clone());
        }
        command.redo(doc, true);
        command.selection_after = Some(doc.selection.clone());

        self.stack.truncate((self.pointer + 1) as usize);
        log::debug!("history: execute {:?}", command.kind);
        self.stack.push(command);
        if self.stack.len() > self.limit {
            let evicted = self.stack.remove(0);
            log::warn!("history full, dropping oldest command {:?}", evicted.kind);
        }
        self.pointer = self.stack.len() as isize - 1;
    }

    /// Revert the last applied command. Does nothing at the start of history.
    pub fn undo(&mut self, doc: &mut Document) -> bool {
        let Some(command) = self.last() else {
            return false;
        };
        log::debug!("history: undo {:?}", command.kind);
        command.undo(doc);
        self.pointer -= 1;
        true
    }

    /// Reapply the next command. Does nothing at the end of history.
    pub fn redo(&mut self, doc: &mut Document) -> bool {
        if !self.can_redo() {
            return false;
        }
        let next = (self.pointer + 1) as usize;
        let command = &self.stack[next];
        log::debug!("history: redo {:?}", command.kind);
        command.redo(doc, false);
        self.pointer += 1;
        true
    }

    /// Drop every command.
    pub fn clear(&mut self) {
        self.stack.clear();
        self.pointer = -1;
    }
}
