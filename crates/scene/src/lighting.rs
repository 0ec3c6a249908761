//! Reading light over the book

use bevy::light::GlobalAmbientLight;
use bevy::prelude::*;

/// Direction toward the key light, slightly off the page normal
const KEY_LIGHT_DIRECTION: Vec3 = Vec3::new(0.35, 1.0, 0.5);

const KEY_LIGHT_ILLUMINANCE: f32 = 6000.0;

const AMBIENT_BRIGHTNESS: f32 = 400.0;

/// Marker for the key light
#[derive(Component)]
pub struct KeyLight;

pub struct LightingPlugin;

impl Plugin for LightingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_lighting);
    }
}

fn setup_lighting(mut commands: Commands) {
    let direction = KEY_LIGHT_DIRECTION.normalize();

    // looking_to takes the forward direction; light shines along -direction
    commands.spawn((
        DirectionalLight {
            illuminance: KEY_LIGHT_ILLUMINANCE,
            color: Color::srgb(1.0, 0.98, 0.94),
            shadows_enabled: true,
            ..default()
        },
        Transform::default().looking_to(-direction, Vec3::Y),
        KeyLight,
    ));

    commands.insert_resource(GlobalAmbientLight {
        color: Color::WHITE,
        brightness: AMBIENT_BRIGHTNESS,
        ..default()
    });

    info!("Book lighting initialized");
}
