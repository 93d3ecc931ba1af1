//! Document entities: circular nodes and the globs that join them.

mod glob;
mod node;

pub use glob::{AnchorKind, Glob, HandleKind};
pub use node::{Node, NodeCap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for nodes.
pub type NodeId = Uuid;

/// Unique identifier for globs.
pub type GlobId = Uuid;

/// Either kind of entity, for mixed collections such as snap indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityId {
    Node(NodeId),
    Glob(GlobId),
}
