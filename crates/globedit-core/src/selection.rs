//! Selection state and bounding-box manipulation handles.

use crate::entities::{GlobId, NodeId};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Handle size in screen pixels.
pub const HANDLE_SIZE: f64 = 8.0;
/// Handle hit tolerance in screen pixels.
pub const HANDLE_HIT_TOLERANCE: f64 = 12.0;
/// Distance from the selection box to the rotation handle (screen pixels).
pub const ROTATE_HANDLE_OFFSET: f64 = 25.0;

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// A handle on the selection bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundsHandle {
    Corner(Corner),
    Edge(Edge),
    Rotate,
}

impl BoundsHandle {
    /// Position of the handle on `bounds`. `zoom` converts the rotate offset to world units.
    pub fn position(self, bounds: Rect, zoom: f64) -> Point {
        let center = bounds.center();
        match self {
            BoundsHandle::Corner(Corner::TopLeft) => Point::new(bounds.x0, bounds.y0),
            BoundsHandle::Corner(Corner::TopRight) => Point::new(bounds.x1, bounds.y0),
            BoundsHandle::Corner(Corner::BottomLeft) => Point::new(bounds.x0, bounds.y1),
            BoundsHandle::Corner(Corner::BottomRight) => Point::new(bounds.x1, bounds.y1),
            BoundsHandle::Edge(Edge::Top) => Point::new(center.x, bounds.y0),
            BoundsHandle::Edge(Edge::Right) => Point::new(bounds.x1, center.y),
            BoundsHandle::Edge(Edge::Bottom) => Point::new(center.x, bounds.y1),
            BoundsHandle::Edge(Edge::Left) => Point::new(bounds.x0, center.y),
            BoundsHandle::Rotate => Point::new(center.x, bounds.y0 - ROTATE_HANDLE_OFFSET / zoom),
        }
    }

    /// The point that stays fixed while this handle is dragged.
    pub fn opposite(self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            BoundsHandle::Corner(Corner::TopLeft) => Point::new(bounds.x1, bounds.y1),
            BoundsHandle::Corner(Corner::TopRight) => Point::new(bounds.x0, bounds.y1),
            BoundsHandle::Corner(Corner::BottomLeft) => Point::new(bounds.x1, bounds.y0),
            BoundsHandle::Corner(Corner::BottomRight) => Point::new(bounds.x0, bounds.y0),
            BoundsHandle::Edge(Edge::Top) => Point::new(center.x, bounds.y1),
            BoundsHandle::Edge(Edge::Right) => Point::new(bounds.x0, center.y),
            BoundsHandle::Edge(Edge::Bottom) => Point::new(center.x, bounds.y0),
            BoundsHandle::Edge(Edge::Left) => Point::new(bounds.x1, center.y),
            BoundsHandle::Rotate => center,
        }
    }

    /// Which axes the handle scales: (x, y).
    pub fn axes(self) -> (bool, bool) {
        match self {
            BoundsHandle::Corner(_) => (true, true),
            BoundsHandle::Edge(Edge::Left | Edge::Right) => (true, false),
            BoundsHandle::Edge(Edge::Top | Edge::Bottom) => (false, true),
            BoundsHandle::Rotate => (false, false),
        }
    }

    pub const ALL: [BoundsHandle; 9] = [
        BoundsHandle::Corner(Corner::TopLeft),
        BoundsHandle::Corner(Corner::TopRight),
        BoundsHandle::Corner(Corner::BottomLeft),
        BoundsHandle::Corner(Corner::BottomRight),
        BoundsHandle::Edge(Edge::Top),
        BoundsHandle::Edge(Edge::Right),
        BoundsHandle::Edge(Edge::Bottom),
        BoundsHandle::Edge(Edge::Left),
        BoundsHandle::Rotate,
    ];
}

/// Find which bounds handle (if any) is hit at the given world point.
pub fn hit_test_bounds_handles(bounds: Rect, point: Point, zoom: f64) -> Option<BoundsHandle> {
    let tolerance = HANDLE_HIT_TOLERANCE / zoom;
    BoundsHandle::ALL
        .into_iter()
        .find(|handle| (handle.position(bounds, zoom) - point).hypot() <= tolerance)
}

/// Selected, hovered and highlighted entity ids.
///
/// Every id refers to a live entity; `retain_live` enforces that after any
/// structural change to the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selection {
    pub nodes: BTreeSet<NodeId>,
    pub globs: BTreeSet<GlobId>,
    pub hovered_nodes: BTreeSet<NodeId>,
    pub hovered_globs: BTreeSet<GlobId>,
    pub highlighted_nodes: BTreeSet<NodeId>,
    pub highlighted_globs: BTreeSet<GlobId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.globs.is_empty()
    }

    /// Check if a node is selected.
    pub fn is_node_selected(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Check if a glob is selected.
    pub fn is_glob_selected(&self, id: GlobId) -> bool {
        self.globs.contains(&id)
    }

    /// Select a single node (clears other selections).
    pub fn select_node(&mut self, id: NodeId) {
        self.clear();
        self.nodes.insert(id);
    }

    /// Select a single glob (clears other selections).
    pub fn select_glob(&mut self, id: GlobId) {
        self.clear();
        self.globs.insert(id);
    }

    /// Add a node to the selection.
    pub fn add_node(&mut self, id: NodeId) {
        self.nodes.insert(id);
    }

    /// Add a glob to the selection.
    pub fn add_glob(&mut self, id: GlobId) {
        self.globs.insert(id);
    }

    /// Clear selected entities. Hover and highlight are left alone.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.globs.clear();
    }

    /// Replace the hovered set.
    pub fn set_hovered(&mut self, nodes: BTreeSet<NodeId>, globs: BTreeSet<GlobId>) {
        self.hovered_nodes = nodes;
        self.hovered_globs = globs;
    }

    /// Replace the highlighted set.
    pub fn set_highlighted(&mut self, nodes: BTreeSet<NodeId>, globs: BTreeSet<GlobId>) {
        self.highlighted_nodes = nodes;
        self.highlighted_globs = globs;
    }

    /// Drop ids that no longer refer to live entities.
    pub fn retain_live<N, G>(&mut self, nodes: &BTreeMap<NodeId, N>, globs: &BTreeMap<GlobId, G>) {
        for set in [&mut self.nodes, &mut self.hovered_nodes, &mut self.highlighted_nodes] {
            set.retain(|id| nodes.contains_key(id));
        }
        for set in [&mut self.globs, &mut self.hovered_globs, &mut self.highlighted_globs] {
            set.retain(|id| globs.contains_key(id));
        }
    }

    /// Same selected entities, ignoring hover and highlight.
    pub fn same_selection(&self, other: &Selection) -> bool {
        self.nodes == other.nodes && self.globs == other.globs
    }
}
