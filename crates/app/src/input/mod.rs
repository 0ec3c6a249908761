//! Input handling - forwards Bevy input to the book controller
//!
//! Runs in PreUpdate so the controller sees this frame's input before it
//! advances in Update.

use bevy::input::InputSystems;
use bevy::prelude::*;

mod hotkeys;
mod keyboard;
mod mouse;
mod touch;

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PointerState>().add_systems(
            PreUpdate,
            (
                mouse::forward_mouse,
                touch::forward_touches,
                keyboard::forward_keyboard,
                hotkeys::handle_hotkeys,
            )
                .chain()
                .after(InputSystems),
        );

        info!("Input plugin initialized");
    }
}

/// Last known cursor position in logical window pixels
#[derive(Resource, Default)]
pub struct PointerState {
    pub position: Option<Vec2>,
}

/// Milliseconds since startup, the clock pointer velocity is measured on
fn timestamp_ms(time: &Time<Real>) -> f64 {
    time.elapsed_secs_f64() * 1000.0
}
