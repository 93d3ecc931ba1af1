//! Globedit Core Library
//!
//! Geometry, snapping, edit sessions and undo history for an editor of
//! "globs": pairs of circular nodes joined by a smooth tangent outline.

pub mod bounds;
pub mod camera;
pub mod config;
pub mod document;
pub mod editor;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod math;
pub mod selection;
pub mod session;
pub mod snap;

pub use camera::Camera;
pub use config::EditorConfig;
pub use document::{Document, HitTarget};
pub use editor::Editor;
pub use entities::{AnchorKind, EntityId, Glob, GlobId, HandleKind, Node, NodeCap, NodeId};
pub use error::{DocumentError, EditorError, EditorResult, GeometryError, GeometryResult};
pub use geometry::{GlobPoints, Outline, OutlineSegment, compute_glob_points, outer_tangents, outline, tangent_point};
pub use history::{Command, CommandKind, EntitySnapshot, History};
pub use input::{Modifiers, PointerInput, PointerTracker};
pub use selection::{BoundsHandle, Selection};
pub use session::{Session, SessionRequest, SessionTrait};
pub use snap::{SnapIndicator, SnapOutcome, Snapper};
