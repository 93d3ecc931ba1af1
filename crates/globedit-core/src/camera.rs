//! View transform between screen pixels and world units.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Pan/zoom state of the viewport.
///
/// `screen = world * zoom + offset`, so `world = (screen - offset) / zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Translation in screen pixels.
    pub offset: Vec2,
    /// Screen pixels per world unit.
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.05,
            max_zoom: 20.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// World-to-screen transform, for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen-to-world transform, for input.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Convert a length in screen pixels to world units.
    pub fn screen_to_world_len(&self, pixels: f64) -> f64 {
        pixels / self.zoom
    }

    /// The world-space rectangle covered by a viewport of the given size.
    pub fn visible_world_rect(&self, viewport: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(viewport.width, viewport.height)),
        )
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping `screen_point` fixed over the same world point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }
        let anchor = self.screen_to_world(screen_point);
        self.zoom = new_zoom;
        self.offset += screen_point - self.world_to_screen(anchor);
    }

    /// Reset to the identity view.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Center `bounds` in the viewport with `padding` pixels on each side.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }
        let avail_w = (viewport.width - padding * 2.0).max(1.0);
        let avail_h = (viewport.height - padding * 2.0).max(1.0);
        self.zoom = (avail_w / bounds.width())
            .min(avail_h / bounds.height())
            .clamp(self.min_zoom, self.max_zoom);
        let viewport_center = Point::new(viewport.width / 2.0, viewport.height / 2.0);
        self.offset = viewport_center.to_vec2() - bounds.center().to_vec2() * self.zoom;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let camera = Camera::new();
        let p = Point::new(100.0, 200.0);
        assert_eq!(camera.screen_to_world(p), p);
    }

    #[test]
    fn test_screen_to_world_with_offset_and_zoom() {
        let camera = Camera {
            offset: Vec2::new(50.0, 100.0),
            zoom: 2.0,
            ..Camera::default()
        };
        let world = camera.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < 1e-12);
        assert!((world.y - 100.0).abs() < 1e-12);
        assert!((camera.screen_to_world_len(4.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_at_keeps_anchor_fixed() {
        let mut camera = Camera::new();
        camera.offset = Vec2::new(30.0, -20.0);
        let anchor = Point::new(123.0, 456.0);
        let world = camera.screen_to_world(anchor);
        camera.zoom_at(anchor, 2.5);
        let back = camera.world_to_screen(world);
        assert!((back - anchor).hypot() < 1e-9);
    }

    #[test]
    fn test_pan_and_reset() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 2.0);
        camera.pan(Vec2::new(20.0, -10.0));
        assert_eq!(camera.screen_to_world(Point::new(20.0, -10.0)), Point::ZERO);
        camera.reset();
        assert_eq!(camera, Camera::new());
    }

    #[test]
    fn test_zoom_clamp() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.0001);
        assert!((camera.zoom - camera.min_zoom).abs() < f64::EPSILON);
        camera.zoom_at(Point::ZERO, 1e6);
        assert!((camera.zoom - camera.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_visible_world_rect() {
        let camera = Camera {
            offset: Vec2::new(-100.0, 0.0),
            zoom: 2.0,
            ..Camera::default()
        };
        let rect = camera.visible_world_rect(Size::new(800.0, 600.0));
        assert!((rect.x0 - 50.0).abs() < 1e-12);
        assert!((rect.x1 - 450.0).abs() < 1e-12);
        assert!((rect.height() - 300.0).abs() < 1e-12);
    }

    #[test]
    fn test_fit_to_bounds_centers() {
        let mut camera = Camera::new();
        let viewport = Size::new(400.0, 400.0);
        camera.fit_to_bounds(Rect::new(0.0, 0.0, 100.0, 50.0), viewport, 0.0);
        assert!((camera.zoom - 4.0).abs() < 1e-12);
        let center = camera.world_to_screen(Point::new(50.0, 25.0));
        assert!((center - Point::new(200.0, 200.0)).hypot() < 1e-9);
    }
}
