//! Pointer hit testing against the resting spread
//!
//! The right sheet is tried before the left. Each sheet is first picked with
//! a ray; when the ray misses (for instance on a nearly edge-on sheet) the
//! projected bounds of its front face are used instead.

use folio_config::HitZoneConfig;
use glam::{Vec2, Vec3};

use crate::raycast::{Face, raycast_sheet};
use crate::scene::SceneConfig;
use crate::sheet::Sheet;
use crate::types::Side;

/// Turnable area of a page face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitZone {
    /// Near the outer edge and near the top or bottom
    Corner,
    /// Near the outer edge only
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitMethod {
    Ray,
    ScreenBounds,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageHit {
    pub side: Side,
    /// Texture coordinate on the front face
    pub uv: Vec2,
    /// 0 at the spine, 1 at the outer edge, for either side
    pub outer_u: f32,
    pub zone: HitZone,
    pub method: HitMethod,
}

/// Map a face `u` so that 1 is always the outer edge
pub fn outer_u(side: Side, u: f32) -> f32 {
    match side {
        Side::Right => u,
        Side::Left => 1.0 - u,
    }
}

/// Classify a hit; `None` when it is not in a turnable zone
pub fn classify_zone(outer_u: f32, v: f32, zones: &HitZoneConfig) -> Option<HitZone> {
    if outer_u < 1.0 - zones.outer_edge {
        return None;
    }
    if v <= zones.corner || v >= 1.0 - zones.corner {
        Some(HitZone::Corner)
    } else {
        Some(HitZone::Edge)
    }
}

/// Front-face uv under `screen` using the projected bounds of the sheet
fn screen_bounds_uv(screen: Vec2, scene: &SceneConfig, sheet: &Sheet) -> Option<Vec2> {
    let transform = sheet.transform();
    let face = &sheet.geometry().front;
    let projected: Vec<(Vec2, f32)> = face
        .positions
        .iter()
        .zip(&face.uvs)
        .filter_map(|(position, uv)| {
            scene
                .book_to_screen(transform.transform_point3(*position))
                .map(|point| (point, uv.x))
        })
        .collect();
    if projected.len() != face.positions.len() || projected.is_empty() {
        return None;
    }

    let (min, max) = projected.iter().fold(
        (Vec2::splat(f32::INFINITY), Vec2::splat(f32::NEG_INFINITY)),
        |(min, max), (point, _)| (min.min(*point), max.max(*point)),
    );
    if screen.x < min.x || screen.x > max.x || screen.y < min.y || screen.y > max.y {
        return None;
    }

    // Nearest projected row along x gives u; v follows the vertical extent
    let (_, u) = projected.iter().fold((f32::INFINITY, 0.0), |(best, u), (point, row_u)| {
        let distance = (point.x - screen.x).abs();
        if distance < best { (distance, *row_u) } else { (best, u) }
    });
    let height = max.y - min.y;
    let v = if height > f32::EPSILON { (screen.y - min.y) / height } else { 0.5 };
    Some(Vec2::new(u, v))
}

fn hit_sheet(
    screen: Vec2,
    ray: Option<(Vec3, Vec3)>,
    scene: &SceneConfig,
    sheet: &Sheet,
) -> Option<(Vec2, HitMethod)> {
    if let Some((origin, dir)) = ray {
        if let Some(hit) = raycast_sheet(origin, dir, sheet) {
            if hit.face == Face::Front {
                return Some((hit.uv, HitMethod::Ray));
            }
        }
    }
    screen_bounds_uv(screen, scene, sheet).map(|uv| (uv, HitMethod::ScreenBounds))
}

/// Hit test `screen` against `sheets`, in priority order.
///
/// Returns the first sheet struck. A strike outside every turnable zone is
/// reported as `None` without trying later sheets.
pub fn hit_test<'a>(
    screen: Vec2,
    scene: &SceneConfig,
    sheets: impl IntoIterator<Item = &'a Sheet>,
    zones: &HitZoneConfig,
) -> Option<PageHit> {
    let ray = scene.ray_from_screen(screen);
    for sheet in sheets {
        let Some((uv, method)) = hit_sheet(screen, ray, scene, sheet) else {
            continue;
        };
        let side = sheet.side();
        let outer_u = outer_u(side, uv.x);
        let zone = classify_zone(outer_u, uv.y, zones)?;
        return Some(PageHit {
            side,
            uv,
            outer_u,
            zone,
            method,
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use folio_config::PageGeometryConfig;

    use super::*;

    fn spread() -> (Sheet, Sheet) {
        let geometry = PageGeometryConfig::default();
        (Sheet::new(Side::Right, &geometry), Sheet::new(Side::Left, &geometry))
    }

    #[test]
    fn test_classify_zones() {
        let zones = HitZoneConfig::default();
        assert_eq!(classify_zone(0.95, 0.05, &zones), Some(HitZone::Corner));
        assert_eq!(classify_zone(0.95, 0.5, &zones), Some(HitZone::Edge));
        assert_eq!(classify_zone(0.5, 0.05, &zones), None);
    }

    #[test]
    fn test_outer_u_mirrors_left() {
        assert_eq!(outer_u(Side::Right, 0.9), 0.9);
        assert!((outer_u(Side::Left, 0.1) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_right_outer_corner_hits() {
        let scene = SceneConfig::default();
        let (right, left) = spread();
        let screen = scene.book_to_screen(Vec3::new(0.95, 0.0, -0.65)).unwrap();
        let hit = hit_test(screen, &scene, [&right, &left], &HitZoneConfig::default()).unwrap();
        assert_eq!(hit.side, Side::Right);
        assert_eq!(hit.zone, HitZone::Corner);
        assert_eq!(hit.method, HitMethod::Ray);
    }

    #[test]
    fn test_left_outer_edge_hits() {
        let scene = SceneConfig::default();
        let (right, left) = spread();
        let screen = scene.book_to_screen(Vec3::new(-0.95, 0.0, 0.0)).unwrap();
        let hit = hit_test(screen, &scene, [&right, &left], &HitZoneConfig::default()).unwrap();
        assert_eq!(hit.side, Side::Left);
        assert_eq!(hit.zone, HitZone::Edge);
        assert!(hit.outer_u > 0.9);
    }

    #[test]
    fn test_page_interior_is_rejected() {
        let scene = SceneConfig::default();
        let (right, left) = spread();
        let screen = scene.book_to_screen(Vec3::new(0.3, 0.0, 0.0)).unwrap();
        assert!(hit_test(screen, &scene, [&right, &left], &HitZoneConfig::default()).is_none());
    }

    #[test]
    fn test_screen_bounds_fallback() {
        let scene = SceneConfig::default();
        let (right, _) = spread();
        let screen = scene.book_to_screen(Vec3::new(0.9, 0.0, 0.0)).unwrap();
        let uv = screen_bounds_uv(screen, &scene, &right).unwrap();
        assert!((uv.x - 0.9).abs() < 0.05);
        assert!((uv.y - 0.5).abs() < 0.05);
        assert!(screen_bounds_uv(Vec2::new(1.0, 1.0), &scene, &right).is_none());
    }
}
