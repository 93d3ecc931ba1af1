//! The editable document: nodes, globs and selection.

use crate::bounds::{glob_bounds, union_all};
use crate::entities::{AnchorKind, Glob, GlobId, HandleKind, Node, NodeId};
use crate::error::{DocumentError, GeometryResult};
use crate::geometry::{GlobInputs, Outline, compute_glob_points, outline};
use crate::selection::Selection;
use kurbo::{Point, Rect, Shape as _};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What lies under the pointer, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Handle(GlobId, HandleKind),
    Anchor(GlobId, AnchorKind),
    Node(NodeId),
    Glob(GlobId),
}

/// A document containing all entities and the selection.
///
/// Maps are ordered so that serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub nodes: BTreeMap<NodeId, Node>,
    pub globs: BTreeMap<GlobId, Glob>,
    #[serde(default)]
    pub selection: Selection,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the document has no nodes and no globs.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.globs.is_empty()
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node by id.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Get a glob by id.
    pub fn glob(&self, id: GlobId) -> Option<&Glob> {
        self.globs.get(&id)
    }

    /// Get a mutable reference to a glob by id. Call `recompute_glob` after editing it.
    pub fn glob_mut(&mut self, id: GlobId) -> Option<&mut Glob> {
        self.globs.get_mut(&id)
    }

    /// Add a node, returning its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Add a glob and compute its geometry.
    pub fn add_glob(&mut self, glob: Glob) -> GlobId {
        debug_assert!(
            glob.nodes.iter().all(|n| self.nodes.contains_key(n)),
            "glob references a missing node"
        );
        let id = glob.id();
        self.globs.insert(id, glob);
        self.recompute_glob(id);
        id
    }

    /// Remove a node and every glob that references it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Glob>)> {
        let node = self.nodes.remove(&id)?;
        let dependents: Vec<GlobId> = self.globs_for_node(id).collect();
        let globs = dependents.into_iter().filter_map(|g| self.globs.remove(&g)).collect();
        self.prune_selection();
        Some((node, globs))
    }

    /// Remove a glob.
    pub fn remove_glob(&mut self, id: GlobId) -> Option<Glob> {
        let glob = self.globs.remove(&id);
        self.prune_selection();
        glob
    }

    /// Ids of globs that reference `node`.
    pub fn globs_for_node(&self, node: NodeId) -> impl Iterator<Item = GlobId> + '_ {
        self.globs
            .values()
            .filter(move |g| g.references(node))
            .map(Glob::id)
    }

    /// Ids of globs that reference any of `nodes`.
    pub fn globs_touching(&self, nodes: &BTreeSet<NodeId>) -> BTreeSet<GlobId> {
        self.globs
            .values()
            .filter(|g| g.nodes.iter().any(|n| nodes.contains(n)))
            .map(Glob::id)
            .collect()
    }

    /// Recompute one glob's derived geometry. Degenerate input leaves `None`.
    pub fn recompute_glob(&mut self, id: GlobId) {
        let Some(glob) = self.globs.get(&id) else {
            return;
        };
        let points = match (self.nodes.get(&glob.start()), self.nodes.get(&glob.end())) {
            (Some(start), Some(end)) => compute_glob_points(&GlobInputs::new(glob, start, end)).ok(),
            _ => {
                debug_assert!(false, "glob {id} references a missing node");
                None
            }
        };
        if points.is_none() {
            log::trace!("glob {id} has degenerate geometry");
        }
        if let Some(glob) = self.globs.get_mut(&id) {
            glob.points = points;
        }
    }

    /// Recompute a set of globs.
    pub fn recompute_globs<'a>(&mut self, ids: impl IntoIterator<Item = &'a GlobId>) {
        for id in ids {
            self.recompute_glob(*id);
        }
    }

    /// Recompute every glob.
    pub fn recompute_all(&mut self) {
        let ids: Vec<GlobId> = self.globs.keys().copied().collect();
        self.recompute_globs(&ids);
    }

    /// Drop selection ids that no longer refer to live entities.
    pub fn prune_selection(&mut self) {
        self.selection.retain_live(&self.nodes, &self.globs);
    }

    /// Nodes affected by the current selection: selected nodes plus the
    /// endpoints of selected globs.
    pub fn selected_node_closure(&self) -> BTreeSet<NodeId> {
        let mut nodes = self.selection.nodes.clone();
        for id in &self.selection.globs {
            if let Some(glob) = self.globs.get(id) {
                nodes.extend(glob.nodes);
            }
        }
        nodes.retain(|id| self.nodes.contains_key(id));
        nodes
    }

    /// Bounds of a node circle.
    pub fn node_bounds(&self, id: NodeId) -> Option<Rect> {
        self.nodes.get(&id).map(Node::bounds)
    }

    /// Bounds of a glob; `None` when missing or degenerate.
    pub fn glob_bounds(&self, id: GlobId) -> Option<GeometryResult<Rect>> {
        self.globs.get(&id).map(glob_bounds)
    }

    /// Union of the bounds of the selected entities.
    pub fn selection_bounds(&self) -> Option<Rect> {
        let nodes = self.selection.nodes.iter().filter_map(|id| self.node_bounds(*id));
        let globs = self
            .selection
            .globs
            .iter()
            .filter_map(|id| self.glob_bounds(*id).and_then(Result::ok));
        union_all(nodes.chain(globs))
    }

    /// Bounds of the whole document.
    pub fn bounds(&self) -> Option<Rect> {
        let nodes = self.nodes.values().map(Node::bounds);
        let globs = self.globs.values().filter_map(|g| glob_bounds(g).ok());
        union_all(nodes.chain(globs))
    }

    /// The outline of a glob, if it has geometry.
    pub fn outline(&self, id: GlobId) -> Option<Outline> {
        let glob = self.globs.get(&id)?;
        let points = glob.points.as_ref()?;
        let start = self.nodes.get(&glob.start())?;
        let end = self.nodes.get(&glob.end())?;
        Some(outline(points, start.cap, end.cap))
    }

    /// Find the topmost entity at a world point.
    ///
    /// Handles and anchors are only considered for selected globs, since only
    /// those show them.
    pub fn hit_test(&self, point: Point, tolerance: f64, arc_tolerance: f64) -> Option<HitTarget> {
        for id in &self.selection.globs {
            let Some(glob) = self.globs.get(id) else { continue };
            for kind in [HandleKind::Primary, HandleKind::Prime] {
                if (glob.handle(kind) - point).hypot() <= tolerance {
                    return Some(HitTarget::Handle(*id, kind));
                }
            }
            if let Some(p) = &glob.points {
                let anchors = [
                    (AnchorKind::A, p.f0),
                    (AnchorKind::B, p.f1),
                    (AnchorKind::Ap, p.f0p),
                    (AnchorKind::Bp, p.f1p),
                ];
                if let Some((kind, _)) = anchors.iter().find(|(_, f)| (*f - point).hypot() <= tolerance) {
                    return Some(HitTarget::Anchor(*id, *kind));
                }
            }
        }
        if let Some(node) = self.nodes.values().find(|n| n.hit_test(point, tolerance)) {
            return Some(HitTarget::Node(node.id()));
        }
        self.globs
            .keys()
            .find(|id| {
                self.outline(**id)
                    .is_some_and(|o| o.to_bez_path(arc_tolerance).contains(point))
            })
            .map(|id| HitTarget::Glob(*id))
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize a document from JSON, dropping dangling globs and
    /// recomputing derived geometry.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        let mut doc: Self = serde_json::from_str(json)?;
        let before = doc.globs.len();
        let nodes = &doc.nodes;
        doc.globs.retain(|_, g| g.nodes.iter().all(|n| nodes.contains_key(n)));
        if doc.globs.len() != before {
            log::warn!("dropped {} globs with missing nodes", before - doc.globs.len());
        }
        doc.prune_selection();
        doc.recompute_all();
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::default_handles;

    fn doc_with_glob() -> (Document, NodeId, NodeId, GlobId) {
        let mut doc = Document::new();
        let a = Node::new(Point::new(0.0, 0.0), 25.0);
        let b = Node::new(Point::new(200.0, 0.0), 25.0);
        let (d, dp) = default_handles(&a, &b).unwrap();
        let a_id = doc.add_node(a);
        let b_id = doc.add_node(b);
        let g = doc.add_glob(Glob::new(a_id, b_id, d, dp));
        (doc, a_id, b_id, g)
    }

    #[test]
    fn test_document_creation() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert!(doc.bounds().is_none());
    }

    #[test]
    fn test_add_glob_computes_points() {
        let (doc, ..) = doc_with_glob();
        assert!(doc.globs.values().all(|g| g.points.is_some()));
    }

    #[test]
    fn test_remove_node_cascades() {
        let (mut doc, a, b, g) = doc_with_glob();
        doc.selection.add_glob(g);
        doc.selection.add_node(a);
        let (_, removed) = doc.remove_node(a).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(doc.globs.is_empty());
        assert!(doc.selection.is_empty());
        assert!(doc.node(b).is_some());
    }

    #[test]
    fn test_coincident_nodes_degrade_to_none() {
        let (mut doc, a, b, g) = doc_with_glob();
        let target = doc.node(a).unwrap().point;
        doc.node_mut(b).unwrap().point = target;
        doc.recompute_glob(g);
        assert!(doc.glob(g).unwrap().points.is_none());
        assert!(doc.outline(g).is_none());
        assert!(matches!(doc.glob_bounds(g), Some(Err(_))));
    }

    #[test]
    fn test_json_roundtrip_is_byte_identical() {
        let (mut doc, a, _, g) = doc_with_glob();
        doc.node_mut(a).unwrap().point = Point::new(0.1 + 0.2, -1.0 / 3.0);
        doc.recompute_glob(g);
        doc.selection.add_glob(g);
        let json = doc.to_json().unwrap();
        let loaded = Document::from_json(&json).unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(loaded.to_json().unwrap(), json);
    }

    #[test]
    fn test_from_json_drops_dangling_globs() {
        let (mut doc, a, _, g) = doc_with_glob();
        doc.nodes.remove(&a);
        doc.selection.add_glob(g);
        let json = serde_json::to_string(&doc).unwrap();
        let loaded = Document::from_json(&json).unwrap();
        assert!(loaded.globs.is_empty());
        assert!(loaded.selection.is_empty());
    }

    #[test]
    fn test_hit_test_priority() {
        let (mut doc, a, _, g) = doc_with_glob();
        assert_eq!(doc.hit_test(Point::new(3.0, 3.0), 1.0, 0.1), Some(HitTarget::Node(a)));
        assert_eq!(doc.hit_test(Point::new(100.0, 0.0), 1.0, 0.1), Some(HitTarget::Glob(g)));
        assert_eq!(doc.hit_test(Point::new(100.0, 300.0), 1.0, 0.1), None);
        doc.selection.add_glob(g);
        let d = doc.glob(g).unwrap().d;
        assert_eq!(doc.hit_test(d, 1.0, 0.1), Some(HitTarget::Handle(g, HandleKind::Primary)));
    }

    #[test]
    fn test_selected_node_closure() {
        let (mut doc, a, b, g) = doc_with_glob();
        doc.selection.add_glob(g);
        let closure = doc.selected_node_closure();
        assert!(closure.contains(&a) && closure.contains(&b));
    }
}
