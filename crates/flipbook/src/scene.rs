//! Camera and viewport description passed into the controller
//!
//! The renderer owns the camera; the controller only needs enough of it to
//! turn pointer positions into book-space rays and to measure how wide a
//! page appears on screen.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

/// Projection state for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneConfig {
    /// World to clip transform
    pub clip_from_world: Mat4,
    /// Camera position in world space
    pub camera_position: Vec3,
    /// Viewport size in logical pixels, origin top-left
    pub viewport: Vec2,
    /// World position of the middle of the spine
    pub book_origin: Vec3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self::looking_down(Vec2::new(1600.0, 1000.0), 3.0)
    }
}

impl SceneConfig {
    /// Perspective camera straight above the spine, top of the pages at the
    /// top of the screen
    pub fn looking_down(viewport: Vec2, height: f32) -> Self {
        let camera_position = Vec3::new(0.0, height, 0.0);
        let view = Mat4::look_at_rh(camera_position, Vec3::ZERO, Vec3::NEG_Z);
        let aspect = viewport.x / viewport.y.max(1.0);
        let projection = Mat4::perspective_rh(45f32.to_radians(), aspect, 0.1, 100.0);
        Self {
            clip_from_world: projection * view,
            camera_position,
            viewport,
            book_origin: Vec3::ZERO,
        }
    }

    /// Book-space ray through a screen position, as (origin, unit direction)
    pub fn ray_from_screen(&self, screen: Vec2) -> Option<(Vec3, Vec3)> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            screen.x / self.viewport.x * 2.0 - 1.0,
            1.0 - screen.y / self.viewport.y * 2.0,
        );
        // Mid-depth point stays finite for both standard and reversed depth
        let world = self
            .clip_from_world
            .inverse()
            .project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        let dir = (world - self.camera_position).try_normalize()?;
        Some((self.camera_position - self.book_origin, dir))
    }

    /// Screen position of a book-space point; `None` behind the camera
    pub fn book_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.clip_from_world * (point + self.book_origin).extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.x,
            (1.0 - ndc.y) * 0.5 * self.viewport.y,
        ))
    }

    /// On-screen width in pixels of a flat page `page_width` wide
    pub fn page_pixel_width(&self, page_width: f32) -> f32 {
        let spine = self.book_to_screen(Vec3::ZERO);
        let edge = self.book_to_screen(Vec3::new(page_width, 0.0, 0.0));
        match (spine, edge) {
            (Some(a), Some(b)) if a.distance(b) > 1.0 => a.distance(b),
            _ => self.viewport.x * 0.5,
        }
    }
}
