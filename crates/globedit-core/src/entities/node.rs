//! Node entity.

use super::NodeId;
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a glob outline closes around a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCap {
    /// Arc around the node between the two tangent points.
    #[default]
    Round,
    /// Straight line between the two tangent points.
    Flat,
}

impl NodeCap {
    /// Toggle between round and flat.
    pub fn toggled(self) -> Self {
        match self {
            NodeCap::Round => NodeCap::Flat,
            NodeCap::Flat => NodeCap::Round,
        }
    }
}

/// A circle anchoring one end of zero or more globs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    /// Center point.
    pub point: Point,
    /// Radius, always positive.
    pub radius: f64,
    /// Cap style used by globs ending at this node.
    #[serde(default)]
    pub cap: NodeCap,
    /// Locked nodes ignore move, resize and transform gestures.
    #[serde(default)]
    pub locked: bool,
}

impl Node {
    /// Create a new round, unlocked node.
    pub fn new(point: Point, radius: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            point,
            radius,
            cap: NodeCap::Round,
            locked: false,
        }
    }

    /// Get the node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Copy of this node with a fresh id.
    pub fn duplicate(&self) -> Self {
        Self { id: Uuid::new_v4(), ..self.clone() }
    }

    /// Axis-aligned bounds of the circle.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.point.x - self.radius,
            self.point.y - self.radius,
            self.point.x + self.radius,
            self.point.y + self.radius,
        )
    }

    /// Check if a point lies inside the circle (inflated by `tolerance`).
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.point).hypot() <= self.radius + tolerance
    }

    /// Map the center through `affine`, scaling the radius by `radius_scale`.
    pub fn transform(&mut self, affine: Affine, radius_scale: f64, min_radius: f64) {
        self.point = affine * self.point;
        self.radius = (self.radius * radius_scale).max(min_radius);
    }
}
