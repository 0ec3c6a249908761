//! Bevy scene for Folio
//!
//! Renders the sheets owned by a [`BookController`] and keeps their meshes,
//! transforms and page textures in step with it every frame. The app must
//! insert the controller as a non-send resource before adding
//! [`BookScenePlugin`].

use bevy::prelude::*;
use flipbook::BookController;

mod book;
mod camera;
mod lighting;
mod messages;
mod textures;

pub use book::{BookFace, face_visible};
pub use camera::{BookCamera, CAMERA_HEIGHT};
pub use lighting::LightingPlugin;
pub use messages::{BookCommand, BookOutbox, BookStateChanged, PageChanged};
pub use textures::{PageImages, page_image};

/// Systems that drive the book each frame, in order
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BookSystems {
    /// Commands and camera state flow into the controller
    Prepare,
    /// Controller advances one frame
    Advance,
    /// Controller state flows out to messages, textures and entities
    Sync,
}

pub struct BookScenePlugin;

impl Plugin for BookScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PageImages>()
            .insert_non_send_resource(BookOutbox::default())
            .add_message::<PageChanged>()
            .add_message::<BookStateChanged>()
            .add_message::<BookCommand>()
            .add_plugins(LightingPlugin)
            .configure_sets(
                Update,
                (BookSystems::Prepare, BookSystems::Advance, BookSystems::Sync).chain(),
            )
            .add_systems(
                Startup,
                (
                    camera::spawn_camera,
                    book::spawn_book_faces,
                    messages::connect_outbox,
                ),
            )
            .add_systems(
                Update,
                (messages::apply_commands, camera::sync_scene_config)
                    .chain()
                    .in_set(BookSystems::Prepare),
            )
            .add_systems(Update, advance_book.in_set(BookSystems::Advance))
            .add_systems(
                Update,
                (
                    messages::forward_notices,
                    textures::upload_page_textures,
                    book::sync_book_faces,
                )
                    .chain()
                    .in_set(BookSystems::Sync),
            );
    }
}

fn advance_book(time: Res<Time>, mut controller: NonSendMut<BookController>) {
    controller.update(time.delta_secs());
}

/// Bevy vector to the flipbook's math types
pub fn to_book_vec2(v: Vec2) -> glam::Vec2 {
    glam::Vec2::new(v.x, v.y)
}

pub fn to_book_vec3(v: Vec3) -> glam::Vec3 {
    glam::Vec3::new(v.x, v.y, v.z)
}

pub fn to_book_mat4(m: Mat4) -> glam::Mat4 {
    glam::Mat4::from_cols_array(&m.to_cols_array())
}

pub fn from_book_mat4(m: glam::Mat4) -> Mat4 {
    Mat4::from_cols_array(&m.to_cols_array())
}

