//! Glob entity.

use super::{GlobId, NodeId};
use crate::geometry::GlobPoints;
use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the two external handles of a glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// `D`, shaping the primary side.
    Primary,
    /// `Dp`, shaping the prime side.
    Prime,
}

impl HandleKind {
    /// The handle on the other side.
    pub fn other(self) -> Self {
        match self {
            HandleKind::Primary => HandleKind::Prime,
            HandleKind::Prime => HandleKind::Primary,
        }
    }
}

/// One of the four interpolation anchors of a glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    /// `a`: between E0 and D.
    A,
    /// `b`: between E1 and D.
    B,
    /// `ap`: between E0p and Dp.
    Ap,
    /// `bp`: between E1p and Dp.
    Bp,
}

impl AnchorKind {
    pub const ALL: [AnchorKind; 4] = [AnchorKind::A, AnchorKind::B, AnchorKind::Ap, AnchorKind::Bp];

    /// The handle this anchor interpolates towards.
    pub fn handle(self) -> HandleKind {
        match self {
            AnchorKind::A | AnchorKind::B => HandleKind::Primary,
            AnchorKind::Ap | AnchorKind::Bp => HandleKind::Prime,
        }
    }

    /// Whether the anchor sits on the start node's side.
    pub fn is_start(self) -> bool {
        matches!(self, AnchorKind::A | AnchorKind::Ap)
    }

    /// The other anchor on the same handle side.
    pub fn paired(self) -> Self {
        match self {
            AnchorKind::A => AnchorKind::B,
            AnchorKind::B => AnchorKind::A,
            AnchorKind::Ap => AnchorKind::Bp,
            AnchorKind::Bp => AnchorKind::Ap,
        }
    }
}

/// Two nodes joined by a smooth outline shaped by two handles and four anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glob {
    pub(crate) id: GlobId,
    /// Start and end node ids.
    pub nodes: [NodeId; 2],
    /// Primary handle.
    #[serde(rename = "D")]
    pub d: Point,
    /// Prime handle.
    #[serde(rename = "Dp")]
    pub dp: Point,
    pub a: f64,
    pub b: f64,
    pub ap: f64,
    pub bp: f64,
    /// Derived geometry, `None` while the configuration is degenerate.
    #[serde(skip)]
    pub points: Option<GlobPoints>,
}

impl Glob {
    /// Create a glob with all anchors at 0.5. Geometry is computed by the document.
    pub fn new(start: NodeId, end: NodeId, d: Point, dp: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            nodes: [start, end],
            d,
            dp,
            a: 0.5,
            b: 0.5,
            ap: 0.5,
            bp: 0.5,
            points: None,
        }
    }

    /// Get the glob id.
    pub fn id(&self) -> GlobId {
        self.id
    }

    /// Start node id.
    pub fn start(&self) -> NodeId {
        self.nodes[0]
    }

    /// End node id.
    pub fn end(&self) -> NodeId {
        self.nodes[1]
    }

    /// Check if the glob references the given node.
    pub fn references(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Copy with a fresh id, remapping node ids through `remap`.
    pub fn duplicate_with(&self, remap: impl Fn(NodeId) -> NodeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            nodes: [remap(self.nodes[0]), remap(self.nodes[1])],
            ..self.clone()
        }
    }

    /// Position of a handle.
    pub fn handle(&self, kind: HandleKind) -> Point {
        match kind {
            HandleKind::Primary => self.d,
            HandleKind::Prime => self.dp,
        }
    }

    /// Move a handle. Geometry is stale until the document recomputes it.
    pub fn set_handle(&mut self, kind: HandleKind, point: Point) {
        match kind {
            HandleKind::Primary => self.d = point,
            HandleKind::Prime => self.dp = point,
        }
    }

    /// Value of an anchor in [0, 1].
    pub fn anchor(&self, kind: AnchorKind) -> f64 {
        match kind {
            AnchorKind::A => self.a,
            AnchorKind::B => self.b,
            AnchorKind::Ap => self.ap,
            AnchorKind::Bp => self.bp,
        }
    }

    /// Set an anchor, clamped to [0, 1].
    pub fn set_anchor(&mut self, kind: AnchorKind, value: f64) {
        let value = value.clamp(0.0, 1.0);
        match kind {
            AnchorKind::A => self.a = value,
            AnchorKind::B => self.b = value,
            AnchorKind::Ap => self.ap = value,
            AnchorKind::Bp => self.bp = value,
        }
    }

    /// Move both handles by `delta`.
    pub fn translate_handles(&mut self, delta: Vec2) {
        self.d += delta;
        self.dp += delta;
    }

    /// Map both handles through `affine`.
    pub fn transform_handles(&mut self, affine: Affine) {
        self.d = affine * self.d;
        self.dp = affine * self.dp;
    }

    /// Exchange the primary and prime sides (handles and anchors).
    ///
    /// Required after any orientation-reversing transform, otherwise the
    /// tangent side selection picks the crossing tangents.
    pub fn swap_sides(&mut self) {
        std::mem::swap(&mut self.d, &mut self.dp);
        std::mem::swap(&mut self.a, &mut self.ap);
        std::mem::swap(&mut self.b, &mut self.bp);
    }
}
