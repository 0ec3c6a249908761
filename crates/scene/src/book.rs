//! Sheet entities
//!
//! Every sheet is drawn as two single-sided meshes, one per face, each with
//! its own material so the two sides can show different pages.

use bevy::prelude::*;
use flipbook::{BookController, Face, FaceGeometry, Sheet, SheetRole};

use crate::from_book_mat4;
use crate::textures::PageImages;

/// Paper tint shown until a page texture arrives
const PAPER_COLOR: Color = Color::srgb(0.96, 0.95, 0.91);

/// One face of one sheet
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookFace {
    pub role: SheetRole,
    pub face: Face,
}

/// What was last written to the face's mesh and material
#[derive(Component, Default)]
pub(crate) struct FaceSync {
    shape: Option<ShapeKey>,
    texture: Option<AssetId<Image>>,
    depth_bias: f32,
}

/// Inputs that change a sheet's deformed geometry
#[derive(Debug, Clone, Copy, PartialEq)]
struct ShapeKey {
    angle: f32,
    width: f32,
    height: f32,
    hard: bool,
}

impl ShapeKey {
    fn of(sheet: &Sheet) -> Self {
        Self {
            angle: sheet.angle(),
            width: sheet.width(),
            height: sheet.height(),
            hard: sheet.is_hard(),
        }
    }
}

fn face_geometry(sheet: &Sheet, face: Face) -> &FaceGeometry {
    match face {
        Face::Front => &sheet.geometry().front,
        Face::Back => &sheet.geometry().back,
    }
}

/// Whether a face has anything to show this frame
pub fn face_visible(controller: &BookController, role: SheetRole, face: Face) -> bool {
    if !controller.sheet_visible(role) {
        return false;
    }
    let sheet = controller.sheet(role);
    match face {
        Face::Front => sheet.is_front_visible() && sheet.front_page().is_some(),
        Face::Back => {
            controller.face_slot(role, Face::Back).is_some() && sheet.back_page().is_some()
        }
    }
}

fn page_material() -> StandardMaterial {
    StandardMaterial {
        base_color: PAPER_COLOR,
        perceptual_roughness: 0.9,
        reflectance: 0.2,
        ..default()
    }
}

pub(crate) fn spawn_book_faces(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    controller: NonSend<BookController>,
) {
    for role in SheetRole::ALL {
        let sheet = controller.sheet(role);
        for face in [Face::Front, Face::Back] {
            commands.spawn((
                Mesh3d(meshes.add(face_geometry(sheet, face).to_mesh())),
                MeshMaterial3d(materials.add(page_material())),
                Transform::from_matrix(from_book_mat4(sheet.transform())),
                Visibility::Hidden,
                BookFace { role, face },
                FaceSync {
                    shape: Some(ShapeKey::of(sheet)),
                    ..default()
                },
                Name::new(format!("{role:?} sheet, {face:?}")),
            ));
        }
    }
    info!("Spawned {} sheet faces", SheetRole::ALL.len() * 2);
}

/// Copy sheet shape, placement, visibility and textures onto the entities
pub(crate) fn sync_book_faces(
    controller: NonSend<BookController>,
    page_images: Res<PageImages>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut faces: Query<(
        &BookFace,
        &mut FaceSync,
        &Mesh3d,
        &MeshMaterial3d<StandardMaterial>,
        &mut Transform,
        &mut Visibility,
    )>,
) {
    for (book_face, mut sync, mesh_handle, material_handle, mut transform, mut visibility) in
        faces.iter_mut()
    {
        let BookFace { role, face } = *book_face;
        let visible = face_visible(&controller, role, face);
        visibility.set_if_neq(if visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        });
        if !visible {
            continue;
        }

        let sheet = controller.sheet(role);
        transform.set_if_neq(Transform::from_matrix(from_book_mat4(sheet.transform())));

        let shape = ShapeKey::of(sheet);
        if sync.shape != Some(shape) {
            if let Some(mesh) = meshes.get_mut(&mesh_handle.0) {
                face_geometry(sheet, face).write_mesh(mesh);
            }
            sync.shape = Some(shape);
        }

        let texture = controller
            .face_slot(role, face)
            .and_then(|slot| page_images.get(slot));
        let texture_id = texture.map(Handle::id);
        let depth_bias = sheet.depth_bias();
        if sync.texture != texture_id || sync.depth_bias != depth_bias {
            if let Some(material) = materials.get_mut(&material_handle.0) {
                material.base_color_texture = texture.cloned();
                material.depth_bias = depth_bias;
            }
            sync.texture = texture_id;
            sync.depth_bias = depth_bias;
        }
    }
}

#[cfg(test)]
mod tests {
    use flipbook::Side;
    use folio_config::PageGeometryConfig;

    use super::*;

    #[test]
    fn test_shape_key_tracks_turning() {
        let mut sheet = Sheet::new(Side::Right, &PageGeometryConfig::default());
        let resting = ShapeKey::of(&sheet);
        sheet.set_angle(60.0, 30.0);
        assert_ne!(ShapeKey::of(&sheet), resting);
        sheet.reset_to_rest();
        assert_eq!(ShapeKey::of(&sheet), resting);
    }

    #[test]
    fn test_face_geometry_selects_face() {
        let sheet = Sheet::new(Side::Left, &PageGeometryConfig::default());
        let front = face_geometry(&sheet, Face::Front);
        let back = face_geometry(&sheet, Face::Back);
        assert!(front.normals[0].y > 0.0);
        assert!(back.normals[0].y < 0.0);
    }
}
