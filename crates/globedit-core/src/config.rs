//! Tunable editor constants.

use serde::{Deserialize, Serialize};

/// Snap distance in screen pixels (divided by the camera zoom in world space).
pub const SNAP_THRESHOLD_PX: f64 = 4.0;
/// Pointer speed (screen pixels per frame) above which snapping is skipped.
pub const SNAP_SPEED_LIMIT: f64 = 5.0;
/// Snap candidates must lie within the visible rect scaled by this factor.
pub const SNAP_CULL_SCALE: f64 = 1.5;
/// Anchors within this distance of 0.5 snap to the midpoint.
pub const ANCHOR_SNAP_TOLERANCE: f64 = 0.025;
/// Maximum number of commands kept in history.
pub const HISTORY_LIMIT: usize = 100;
/// Radius of a freshly created node.
pub const DEFAULT_NODE_RADIUS: f64 = 25.0;
/// Nodes can never shrink below this radius.
pub const MIN_NODE_RADIUS: f64 = 1.0;
/// Rotation snap increment in degrees (Shift while rotating).
pub const ROTATION_SNAP_DEGREES: f64 = 15.0;

/// Runtime configuration for the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snap threshold for node drags, in screen pixels.
    pub snap_threshold_px: f64,
    /// Snap threshold for handle drags, in screen pixels.
    pub handle_snap_threshold_px: f64,
    /// Gesture speed that bypasses snapping, in screen pixels per frame.
    pub snap_speed_limit: f64,
    /// Visible-rect scale used to cull snap candidates.
    pub snap_cull_scale: f64,
    /// Anchor midpoint snap tolerance (normalized).
    pub anchor_snap_tolerance: f64,
    /// History depth.
    pub history_limit: usize,
    pub default_node_radius: f64,
    pub min_node_radius: f64,
    /// Rotation snap increment in degrees.
    pub rotation_snap_degrees: f64,
    /// Arrow-key nudge distance in world units.
    pub nudge_small: f64,
    /// Shift+arrow nudge distance in world units.
    pub nudge_large: f64,
    /// Flattening tolerance for cap arcs when producing a `BezPath`.
    pub arc_tolerance: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold_px: SNAP_THRESHOLD_PX,
            handle_snap_threshold_px: SNAP_THRESHOLD_PX * 2.0,
            snap_speed_limit: SNAP_SPEED_LIMIT,
            snap_cull_scale: SNAP_CULL_SCALE,
            anchor_snap_tolerance: ANCHOR_SNAP_TOLERANCE,
            history_limit: HISTORY_LIMIT,
            default_node_radius: DEFAULT_NODE_RADIUS,
            min_node_radius: MIN_NODE_RADIUS,
            rotation_snap_degrees: ROTATION_SNAP_DEGREES,
            nudge_small: 1.0,
            nudge_large: 10.0,
            arc_tolerance: 0.1,
        }
    }
}
