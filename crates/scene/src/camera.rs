//! Camera above the book
//!
//! The book lies in the XZ plane with the spine along Z. The camera looks
//! straight down with -Z as screen up, so page tops sit at the top of the
//! window.

use bevy::core_pipeline::tonemapping::Tonemapping;
use bevy::prelude::*;
use flipbook::{BookController, SceneConfig};

use crate::{to_book_mat4, to_book_vec2, to_book_vec3};

/// Height of the camera above the spine in world units
pub const CAMERA_HEIGHT: f32 = 3.0;

/// Marker for the camera used to pick and view pages
#[derive(Component)]
pub struct BookCamera;

pub(crate) fn spawn_camera(mut commands: Commands) {
    // TonyMcMapFace needs tonemapping_luts, which needs zstd
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, CAMERA_HEIGHT, 0.0).looking_at(Vec3::ZERO, Vec3::NEG_Z),
        Tonemapping::Reinhard,
        BookCamera,
    ));
}

/// Projection state of `camera` as the controller sees it
pub fn scene_config(camera: &Camera, transform: &GlobalTransform) -> Option<SceneConfig> {
    let viewport = camera.logical_viewport_size()?;
    let world_from_view = Mat4::from(transform.affine());
    let clip_from_world = camera.clip_from_view() * world_from_view.inverse();
    Some(SceneConfig {
        clip_from_world: to_book_mat4(clip_from_world),
        camera_position: to_book_vec3(transform.translation()),
        viewport: to_book_vec2(viewport),
        book_origin: glam::Vec3::ZERO,
    })
}

/// Keep the controller's picking camera in step with the real one
pub(crate) fn sync_scene_config(
    cameras: Query<(&Camera, &GlobalTransform), With<BookCamera>>,
    mut controller: NonSendMut<BookController>,
) {
    let Ok((camera, transform)) = cameras.single() else {
        return;
    };
    let Some(scene) = scene_config(camera, transform) else {
        return;
    };
    if *controller.scene() != scene {
        controller.set_scene(scene);
    }
}
