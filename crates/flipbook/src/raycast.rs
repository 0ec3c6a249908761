//! Ray picking against deformed sheet faces
//!
//! Rays are transformed into the sheet's face-local space and tested against
//! every triangle of both faces with the Moller-Trumbore algorithm. The hit
//! carries the interpolated texture coordinate of the face that was struck.

use glam::{Vec2, Vec3};

use crate::sheet::{FaceGeometry, Sheet};

const EPSILON: f32 = 1e-7;

/// Barycentric hit on one triangle
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray, in units of the ray direction
    pub t: f32,
    /// Weight of the second vertex
    pub u: f32,
    /// Weight of the third vertex
    pub v: f32,
}

/// Which face of a sheet was struck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Front,
    Back,
}

/// Closest intersection of a ray with a sheet
#[derive(Debug, Clone, Copy)]
pub struct SheetHit {
    pub face: Face,
    /// Texture coordinate on the struck face
    pub uv: Vec2,
    /// Intersection point in book space
    pub point: Vec3,
    /// Book-space distance from the ray origin
    pub distance: f32,
}

/// Moller-Trumbore intersection; triangles are hit from either side.
pub fn ray_triangle_intersection(
    origin: Vec3,
    dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let pvec = dir.cross(edge2);
    let det = edge1.dot(pvec);
    if det.abs() < EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = origin - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    (t > EPSILON).then_some(TriangleHit { t, u, v })
}

pub fn interpolate_vec2(a: Vec2, b: Vec2, c: Vec2, u: f32, v: f32) -> Vec2 {
    a * (1.0 - u - v) + b * u + c * v
}

/// Closest hit against one face, as (ray parameter, uv)
pub fn raycast_face(origin: Vec3, dir: Vec3, face: &FaceGeometry) -> Option<(f32, Vec2)> {
    let mut closest: Option<(f32, Vec2)> = None;
    for tri in face.indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let Some(hit) = ray_triangle_intersection(
            origin,
            dir,
            face.positions[a],
            face.positions[b],
            face.positions[c],
        ) else {
            continue;
        };
        if closest.is_some_and(|(t, _)| hit.t >= t) {
            continue;
        }
        let uv = interpolate_vec2(face.uvs[a], face.uvs[b], face.uvs[c], hit.u, hit.v);
        closest = Some((hit.t, uv));
    }
    closest
}

/// Cast a book-space ray against both faces of `sheet`.
///
/// Hidden front faces are skipped.
pub fn raycast_sheet(origin: Vec3, dir: Vec3, sheet: &Sheet) -> Option<SheetHit> {
    let to_local = sheet.transform().inverse();
    let local_origin = to_local.transform_point3(origin);
    let local_dir = to_local.transform_vector3(dir);

    let geometry = sheet.geometry();
    let front = sheet
        .is_front_visible()
        .then(|| raycast_face(local_origin, local_dir, &geometry.front))
        .flatten()
        .map(|(t, uv)| (Face::Front, t, uv));
    let back = raycast_face(local_origin, local_dir, &geometry.back).map(|(t, uv)| (Face::Back, t, uv));

    let (face, t, uv) = match (front, back) {
        (Some(f), Some(b)) => {
            if f.1 <= b.1 {
                f
            } else {
                b
            }
        }
        (hit, None) | (None, hit) => hit?,
    };

    // Affine maps preserve the ray parameter
    let point = origin + dir * t;
    Some(SheetHit {
        face,
        uv,
        point,
        distance: (point - origin).length(),
    })
}
