use super::{Baseline, SessionTrait};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{AnchorKind, GlobId};
use crate::error::{EditorError, EditorResult};
use crate::geometry::GlobPoints;
use crate::history::{Command, CommandKind};
use crate::input::PointerInput;
use crate::math::project_onto_segment;
use kurbo::Point;

/// The segment an anchor interpolates along: tangent point to handle.
fn anchor_segment(points: &GlobPoints, kind: AnchorKind) -> (Point, Point) {
    match kind {
        AnchorKind::A => (points.e0, points.d),
        AnchorKind::B => (points.e1, points.d),
        AnchorKind::Ap => (points.e0p, points.dp),
        AnchorKind::Bp => (points.e1p, points.dp),
    }
}

/// Slides one anchor between its tangent point and handle.
#[derive(Debug, Clone)]
pub struct AnchorSession {
    base: Baseline,
    glob: GlobId,
    anchor: AnchorKind,
}

impl AnchorSession {
    /// Start dragging `anchor` of `glob`.
    pub fn new(doc: &Document, glob: GlobId, anchor: AnchorKind, input: &PointerInput) -> EditorResult<Self> {
        if doc.glob(glob).is_none() {
            return Err(EditorError::MissingGlob(glob));
        }
        Ok(Self {
            base: Baseline::capture(doc, input, [], [glob]),
            glob,
            anchor,
        })
    }
}

impl SessionTrait for AnchorSession {
    fn kind(&self) -> CommandKind {
        CommandKind::Anchor
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        let Some(original) = self.base.original_glob(self.glob) else {
            return;
        };
        let Some(glob) = doc.glob_mut(self.glob) else {
            return;
        };
        // Anchors do not move tangent points, so the live geometry is valid here.
        let Some(points) = glob.points else {
            return;
        };
        let (from, to) = anchor_segment(&points, self.anchor);
        let (mut n, _) = project_onto_segment(input.world(), from, to);
        if !input.modifiers.alt && (n - 0.5).abs() < config.anchor_snap_tolerance {
            n = 0.5;
        }

        for kind in AnchorKind::ALL {
            glob.set_anchor(kind, original.anchor(kind));
        }
        glob.set_anchor(self.anchor, n);
        if input.modifiers.meta && input.modifiers.shift {
            for kind in AnchorKind::ALL {
                glob.set_anchor(kind, n);
            }
        } else if input.modifiers.meta {
            glob.set_anchor(self.anchor.paired(), n);
        }
        doc.recompute_glob(self.glob);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.base.restore(doc);
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.base.finish(CommandKind::Anchor, doc)
    }
}
