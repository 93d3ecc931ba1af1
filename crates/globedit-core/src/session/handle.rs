use super::{Baseline, SessionTrait};
use crate::bounds::intersects_bounds;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::entities::{EntityId, GlobId, HandleKind};
use crate::error::{EditorError, EditorResult};
use crate::history::{Command, CommandKind};
use crate::input::PointerInput;
use crate::math::{perp, reflect_across_line};
use crate::snap::{SnapGuide, SnapIndicator, snap_to_guides};
use kurbo::{ParamCurve, ParamCurveNearest, Point, Vec2};

const NEAREST_ACCURACY: f64 = 1e-3;

/// Drags one of a glob's two handles.
#[derive(Debug, Clone)]
pub struct HandleSession {
    base: Baseline,
    glob: GlobId,
    handle: HandleKind,
    /// Offset from the pointer to the handle at gesture start.
    grab: Vec2,
    guides: Vec<SnapGuide>,
    snaps: Vec<SnapIndicator>,
}

impl HandleSession {
    /// Start dragging `handle` of `glob_id`.
    pub fn new(doc: &Document, glob_id: GlobId, handle: HandleKind, input: &PointerInput) -> EditorResult<Self> {
        let glob = doc.glob(glob_id).ok_or(EditorError::MissingGlob(glob_id))?;
        let base = Baseline::capture(doc, input, [], [glob_id]);
        let grab = glob.handle(handle) - base.origin;

        let own = EntityId::Glob(glob_id);
        let mut guides = Vec::new();
        if let Some(points) = &glob.points {
            let (e0, e1) = points.tangent_pair(handle);
            let chord = e1 - e0;
            let mid = e0.midpoint(e1);
            guides.push(SnapGuide::Line { origin: mid, dir: perp(chord), id: own });
            guides.push(SnapGuide::Line { origin: e0, dir: chord, id: own });
            // Apexes of the right isosceles triangles over the chord.
            guides.push(SnapGuide::Point { point: mid + perp(chord) * 0.5, id: own });
            guides.push(SnapGuide::Point { point: mid - perp(chord) * 0.5, id: own });
        }
        for other in doc.globs.values() {
            let id = EntityId::Glob(other.id());
            for kind in [HandleKind::Primary, HandleKind::Prime] {
                if other.id() == glob_id && kind == handle {
                    continue;
                }
                let p = other.handle(kind);
                guides.push(SnapGuide::Line { origin: p, dir: Vec2::new(1.0, 0.0), id });
                guides.push(SnapGuide::Line { origin: p, dir: Vec2::new(0.0, 1.0), id });
            }
        }

        Ok(Self {
            base,
            glob: glob_id,
            handle,
            grab,
            guides,
            snaps: Vec::new(),
        })
    }

    /// Nearest points on other globs' curves, for globs in view.
    fn edge_guides(&self, doc: &Document, input: &PointerInput, target: Point) -> Vec<SnapGuide> {
        let visible = input.visible_world_rect();
        doc.globs
            .values()
            .filter(|g| g.id() != self.glob)
            .filter_map(|g| g.points.as_ref().map(|p| (g.id(), p)))
            .filter(|(id, _)| {
                doc.glob_bounds(*id)
                    .and_then(Result::ok)
                    .is_some_and(|b| intersects_bounds(b, visible))
            })
            .flat_map(|(id, p)| {
                [p.primary_curve(), p.prime_curve()].map(|curve| {
                    let nearest = curve.nearest(target, NEAREST_ACCURACY);
                    SnapGuide::Point {
                        point: curve.eval(nearest.t),
                        id: EntityId::Glob(id),
                    }
                })
            })
            .collect()
    }
}

impl SessionTrait for HandleSession {
    fn kind(&self) -> CommandKind {
        CommandKind::Handle
    }

    fn update(&mut self, doc: &mut Document, input: &PointerInput, config: &EditorConfig) {
        let mut target = input.world() + self.grab;
        self.snaps.clear();
        if !input.modifiers.ctrl {
            let mut guides = self.guides.clone();
            guides.extend(self.edge_guides(doc, input, target));
            let threshold = input.camera.screen_to_world_len(config.handle_snap_threshold_px);
            if let Some((snapped, snaps)) = snap_to_guides(target, &guides, threshold) {
                target = snapped;
                self.snaps = snaps;
            }
        }

        let Some(original) = self.base.original_glob(self.glob).cloned() else {
            return;
        };
        let centers = doc
            .node(original.start())
            .zip(doc.node(original.end()))
            .map(|(a, b)| (a.point, b.point));
        let Some(glob) = doc.glob_mut(self.glob) else {
            return;
        };
        glob.set_handle(self.handle, target);
        let other = self.handle.other();
        match centers {
            Some((c0, c1)) if input.modifiers.meta => {
                glob.set_handle(other, reflect_across_line(target, c0, c1));
            }
            _ => glob.set_handle(other, original.handle(other)),
        }
        doc.recompute_glob(self.glob);
    }

    fn cancel(&mut self, doc: &mut Document) {
        self.snaps.clear();
        self.base.restore(doc);
    }

    fn complete(&mut self, doc: &mut Document) -> Option<Command> {
        self.snaps.clear();
        self.base.finish(CommandKind::Handle, doc)
    }

    fn snaps(&self) -> &[SnapIndicator] {
        &self.snaps
    }
}
