//! Curled sheet geometry
//!
//! A sheet's cross-section (the plane perpendicular to the spine) is modelled
//! by two cubic Bézier curves, one per face, offset by the sheet thickness.
//! Each curve is resampled by cumulative chord length so that bending never
//! stretches the paper: row `r` sits at arc fraction `r / segments` and its
//! texture coordinate is its own normalized arc position.
//!
//! Coordinates are sheet-local: the spine runs along Z through the origin,
//! angle 0 lies flat along +X (right half of the spread), angle 180 lies flat
//! along -X, and +Y is up out of the book.

use folio_config::PageGeometryConfig;
use glam::{Mat4, Vec2, Vec3};

use crate::constants::{ARC_OVERSAMPLE, NEARLY_FLAT_DEGREES, TURNING_DEPTH_BIAS};
use crate::types::Side;

/// Inputs of the deformation model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetParams {
    pub width: f32,
    pub height: f32,
    pub thickness: f32,
    pub segments: usize,
    /// Outer edge angle in degrees, 0 = flat right, 180 = flat left
    pub angle: f32,
    /// How far the leading edge has folded, in degrees
    pub curve_angle: f32,
    pub flexibility: f32,
    pub hard: bool,
    pub side: Side,
}

/// Vertex data for one face of a sheet
///
/// Rows run from the spine (row 0) to the outer edge. Each row holds two
/// vertices: the top edge (v = 0) then the bottom edge (v = 1).
#[derive(Debug, Clone, Default)]
pub struct FaceGeometry {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    /// Normalized arc position of each row, 0 at the spine
    pub row_arc: Vec<f32>,
    /// Cross-section arc length before `fold_scale` is applied
    pub arc_length: f32,
}

impl FaceGeometry {
    /// Number of rows along the fold
    pub fn row_count(&self) -> usize {
        self.row_arc.len()
    }

    /// Position of the top-edge vertex of a row
    pub fn row_position(&self, row: usize) -> Vec3 {
        self.positions[row * 2]
    }
}

/// Output of the deformation model
#[derive(Debug, Clone)]
pub struct DeformedGeometry {
    /// Translation of the sheet pivot relative to the spine
    pub pivot_offset: Vec3,
    /// Uniform scale in the cross-section plane restoring the flat width
    pub fold_scale: f32,
    pub front: FaceGeometry,
    pub back: FaceGeometry,
}

impl Default for DeformedGeometry {
    fn default() -> Self {
        Self {
            pivot_offset: Vec3::ZERO,
            fold_scale: 1.0,
            front: FaceGeometry::default(),
            back: FaceGeometry::default(),
        }
    }
}

impl DeformedGeometry {
    /// Transform from face-local vertex space to spine space
    pub fn local_transform(&self) -> Mat4 {
        Mat4::from_translation(self.pivot_offset)
            * Mat4::from_scale(Vec3::new(self.fold_scale, self.fold_scale, 1.0))
    }
}

#[derive(Debug, Clone, Copy)]
struct CubicBezier {
    p0: Vec2,
    p1: Vec2,
    p2: Vec2,
    p3: Vec2,
}

impl CubicBezier {
    fn eval(&self, t: f32) -> Vec2 {
        let mt = 1.0 - t;
        self.p0 * (mt * mt * mt)
            + self.p1 * (3.0 * mt * mt * t)
            + self.p2 * (3.0 * mt * t * t)
            + self.p3 * (t * t * t)
    }

    /// Shift the start half along `start_normal` and the end half along
    /// `end_normal`, giving the parallel face of a bent sheet.
    fn offset(&self, start_normal: Vec2, end_normal: Vec2, distance: f32) -> Self {
        Self {
            p0: self.p0 + start_normal * distance,
            p1: self.p1 + start_normal * distance,
            p2: self.p2 + end_normal * distance,
            p3: self.p3 + end_normal * distance,
        }
    }
}

fn direction(radians: f32) -> Vec2 {
    Vec2::new(radians.cos(), radians.sin())
}

/// Left-hand perpendicular; points up (+Y) for a sheet lying flat at angle 0
fn perp(v: Vec2) -> Vec2 {
    Vec2::new(-v.y, v.x)
}

/// Curve angle for a sheet at `sheet_angle` degrees.
///
/// Eases from flat to a bulge and back to flat over the bands 0-45, 45-135
/// and 135-180. `is_left_turn` means the sheet travels from right to left;
/// the opposite direction mirrors the easing.
pub fn curve_angle(is_left_turn: bool, sheet_angle: f32) -> f32 {
    fn eased(angle: f32) -> f32 {
        if angle <= 45.0 {
            angle * 0.5
        } else if angle <= 135.0 {
            22.5 + (angle - 45.0) * 1.25
        } else {
            135.0 + (angle - 135.0)
        }
    }

    let angle = sheet_angle.clamp(0.0, 180.0);
    let curve = if is_left_turn {
        eased(angle)
    } else {
        180.0 - eased(180.0 - angle)
    };
    curve.clamp(0.0, 180.0)
}

/// Texture `u` for arc position `s` (0 at the spine) of a page read on `half`.
fn outward_u(half: Side, s: f32) -> f32 {
    match half {
        Side::Right => s,
        Side::Left => 1.0 - s,
    }
}

/// Samples `curve` into `segments + 1` points evenly spaced by arc length.
///
/// Returns the points and the total arc length of the dense polyline.
fn resample_by_arc(curve: &CubicBezier, segments: usize) -> (Vec<Vec2>, f32) {
    let dense_count = segments * ARC_OVERSAMPLE;
    let dense: Vec<Vec2> = (0..=dense_count)
        .map(|i| curve.eval(i as f32 / dense_count as f32))
        .collect();

    let mut cumulative = Vec::with_capacity(dense.len());
    let mut total = 0.0;
    cumulative.push(0.0);
    for pair in dense.windows(2) {
        total += pair[0].distance(pair[1]);
        cumulative.push(total);
    }

    if total <= f32::EPSILON {
        return (vec![dense[0]; segments + 1], 0.0);
    }

    let mut points = Vec::with_capacity(segments + 1);
    let mut cursor = 0;
    for row in 0..=segments {
        let target = total * row as f32 / segments as f32;
        while cursor + 2 < cumulative.len() && cumulative[cursor + 1] < target {
            cursor += 1;
        }
        let span = cumulative[cursor + 1] - cumulative[cursor];
        let t = if span > 0.0 {
            ((target - cumulative[cursor]) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        points.push(dense[cursor].lerp(dense[cursor + 1], t));
    }
    (points, total)
}

/// Normalized cumulative chord length of each resampled row
fn row_arc(points: &[Vec2]) -> Vec<f32> {
    let mut arc = Vec::with_capacity(points.len());
    let mut total = 0.0;
    arc.push(0.0);
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        arc.push(total);
    }
    if total <= f32::EPSILON {
        let last = (points.len().max(2) - 1) as f32;
        return (0..points.len()).map(|i| i as f32 / last).collect();
    }
    arc.iter_mut().for_each(|a| *a /= total);
    arc
}

fn row_tangent(points: &[Vec2], row: usize, fallback: Vec2) -> Vec2 {
    let prev = points[row.saturating_sub(1)];
    let next = points[(row + 1).min(points.len() - 1)];
    (next - prev).try_normalize().unwrap_or(fallback)
}

fn build_face(
    points: &[Vec2],
    arc: &[f32],
    arc_length: f32,
    height: f32,
    fallback_tangent: Vec2,
    facing: f32,
    u_of: impl Fn(f32) -> f32,
) -> FaceGeometry {
    let half = height * 0.5;
    let mut positions = Vec::with_capacity(points.len() * 2);
    let mut normals = Vec::with_capacity(points.len() * 2);
    let mut uvs = Vec::with_capacity(points.len() * 2);

    for (row, point) in points.iter().enumerate() {
        let n = perp(row_tangent(points, row, fallback_tangent)) * facing;
        let normal = Vec3::new(n.x, n.y, 0.0);
        let u = u_of(arc[row]);

        positions.push(Vec3::new(point.x, point.y, -half));
        positions.push(Vec3::new(point.x, point.y, half));
        normals.push(normal);
        normals.push(normal);
        uvs.push(Vec2::new(u, 0.0));
        uvs.push(Vec2::new(u, 1.0));
    }

    let mut indices = Vec::with_capacity((points.len() - 1) * 6);
    for row in 0..points.len() as u32 - 1 {
        let top = row * 2;
        let bottom = top + 1;
        let next_top = top + 2;
        let next_bottom = top + 3;
        if facing > 0.0 {
            indices.extend_from_slice(&[top, bottom, next_top, next_top, bottom, next_bottom]);
        } else {
            indices.extend_from_slice(&[top, next_top, bottom, next_top, next_bottom, bottom]);
        }
    }

    FaceGeometry {
        positions,
        normals,
        uvs,
        indices,
        row_arc: arc.to_vec(),
        arc_length,
    }
}

/// Deform a sheet for the given parameters.
pub fn deform_sheet(params: &SheetParams) -> DeformedGeometry {
    let segments = params.segments.max(1);
    let angle = params.angle.clamp(0.0, 180.0);
    let nearly_flat = angle < NEARLY_FLAT_DEGREES || angle > 180.0 - NEARLY_FLAT_DEGREES;
    let flex = if params.hard || nearly_flat {
        0.0
    } else {
        params.flexibility.clamp(0.0, 1.0)
    };

    // Soft pages shorten their chord as they bend
    let base_axis = params.width * (1.0 - (flex / 2.0).sin().powi(2) / 2.0 - flex / 20.0);

    let theta = angle.to_radians();
    let phi = params.curve_angle.clamp(0.0, 180.0).to_radians();
    let start_dir = direction(theta);
    let end_dir = direction(theta + flex * (phi - theta));

    // Front faces up when the sheet lies on its own side
    let up = match params.side {
        Side::Right => 1.0,
        Side::Left => -1.0,
    };

    let p3 = start_dir * base_axis;
    let front_curve = CubicBezier {
        p0: Vec2::ZERO,
        p1: start_dir * (base_axis / 3.0),
        p2: p3 - end_dir * (base_axis / 3.0),
        p3,
    };
    let back_curve = front_curve.offset(perp(start_dir), perp(end_dir), -params.thickness * up);

    let (front_points, front_length) = resample_by_arc(&front_curve, segments);
    let (back_points, back_length) = resample_by_arc(&back_curve, segments);
    let front_arc = row_arc(&front_points);
    let back_arc = row_arc(&back_points);

    let side = params.side;
    let front = build_face(
        &front_points,
        &front_arc,
        front_length,
        params.height,
        start_dir,
        up,
        |s| outward_u(side, s),
    );
    // The back always carries a page of the opposite half, whatever the angle
    let back = build_face(
        &back_points,
        &back_arc,
        back_length,
        params.height,
        start_dir,
        -up,
        |s| outward_u(side.opposite(), s),
    );

    let fold_scale = if front_length > f32::EPSILON {
        params.width / front_length
    } else {
        1.0
    };

    DeformedGeometry {
        pivot_offset: Vec3::new(0.0, params.thickness * 0.5 * theta.sin(), 0.0),
        fold_scale,
        front,
        back,
    }
}

/// A single leaf with two readable faces
#[derive(Debug, Clone)]
pub struct Sheet {
    side: Side,
    width: f32,
    height: f32,
    thickness: f32,
    segments: usize,
    flexibility: f32,
    hard: bool,
    angle: f32,
    curve_angle: f32,
    front_page: Option<usize>,
    back_page: Option<usize>,
    animating: bool,
    front_visible: bool,
    stack_offset: f32,
    geometry: DeformedGeometry,
}

impl Sheet {
    /// Create a sheet lying flat on `side`
    pub fn new(side: Side, config: &PageGeometryConfig) -> Self {
        let mut sheet = Self {
            side,
            width: config.width,
            height: config.height,
            thickness: config.thickness,
            segments: config.segments.max(1),
            flexibility: config.flexibility,
            hard: false,
            angle: Self::rest_angle(side),
            curve_angle: Self::rest_angle(side),
            front_page: None,
            back_page: None,
            animating: false,
            front_visible: true,
            stack_offset: 0.0,
            geometry: DeformedGeometry::default(),
        };
        sheet.rebuild();
        sheet
    }

    /// Angle at which a sheet on `side` lies flat
    pub fn rest_angle(side: Side) -> f32 {
        match side {
            Side::Right => 0.0,
            Side::Left => 180.0,
        }
    }

    pub fn params(&self) -> SheetParams {
        SheetParams {
            width: self.width,
            height: self.height,
            thickness: self.thickness,
            segments: self.segments,
            angle: self.angle,
            curve_angle: self.curve_angle,
            flexibility: self.flexibility,
            hard: self.hard,
            side: self.side,
        }
    }

    fn rebuild(&mut self) {
        self.geometry = deform_sheet(&self.params());
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        if self.width == width && self.height == height {
            return;
        }
        self.width = width;
        self.height = height;
        self.rebuild();
    }

    pub fn set_angle(&mut self, angle: f32, curve_angle: f32) {
        let angle = angle.clamp(0.0, 180.0);
        if self.angle == angle && self.curve_angle == curve_angle {
            return;
        }
        self.angle = angle;
        self.curve_angle = curve_angle;
        self.rebuild();
    }

    /// Lay the sheet flat on its own side
    pub fn reset_to_rest(&mut self) {
        let rest = Self::rest_angle(self.side);
        self.set_angle(rest, rest);
    }

    pub fn set_hard(&mut self, hard: bool) {
        if self.hard != hard {
            self.hard = hard;
            self.rebuild();
        }
    }

    pub fn set_pages(&mut self, front: Option<usize>, back: Option<usize>) {
        self.front_page = front;
        self.back_page = back;
    }

    pub fn set_stack_offset(&mut self, offset: f32) {
        self.stack_offset = offset;
    }

    /// Raise the sheet above the stack while it turns
    pub fn begin_animation(&mut self) {
        self.animating = true;
    }

    pub fn end_animation(&mut self) {
        self.animating = false;
        self.front_visible = true;
    }

    pub fn set_front_visible(&mut self, visible: bool) {
        self.front_visible = visible;
    }

    pub fn depth_bias(&self) -> f32 {
        if self.animating { TURNING_DEPTH_BIAS } else { 0.0 }
    }

    /// Transform from face vertex space to book space
    pub fn transform(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, self.stack_offset, 0.0)) * self.geometry.local_transform()
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn is_hard(&self) -> bool {
        self.hard
    }

    pub fn front_page(&self) -> Option<usize> {
        self.front_page
    }

    pub fn back_page(&self) -> Option<usize> {
        self.back_page
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn is_front_visible(&self) -> bool {
        self.front_visible
    }

    pub fn geometry(&self) -> &DeformedGeometry {
        &self.geometry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(angle: f32, flexibility: f32) -> SheetParams {
        SheetParams {
            width: 1.0,
            height: 1.4,
            thickness: 0.01,
            segments: 24,
            angle,
            curve_angle: curve_angle(true, angle),
            flexibility,
            hard: false,
            side: Side::Right,
        }
    }

    fn scaled_length(geometry: &DeformedGeometry) -> f32 {
        let face = &geometry.front;
        (0..face.row_count() - 1)
            .map(|r| face.row_position(r).distance(face.row_position(r + 1)))
            .sum::<f32>()
            * geometry.fold_scale
    }

    #[test]
    fn test_arc_is_monotonic_for_all_angles() {
        for angle in (0..=180).step_by(15) {
            for flex in [0.0, 0.3, 0.6, 1.0] {
                let geometry = deform_sheet(&params(angle as f32, flex));
                let arc = &geometry.front.row_arc;
                assert_eq!(arc.len(), 25);
                assert_eq!(arc[0], 0.0);
                assert!((arc[24] - 1.0).abs() < 1e-5);
                for pair in arc.windows(2) {
                    assert!(pair[1] > pair[0], "angle {angle} flex {flex}: {pair:?}");
                }
            }
        }
    }

    #[test]
    fn test_bending_preserves_width() {
        for angle in [10.0, 45.0, 90.0, 135.0, 170.0] {
            let geometry = deform_sheet(&params(angle, 0.8));
            let length = scaled_length(&geometry);
            assert!((length - 1.0).abs() < 1e-3, "angle {angle}: length {length}");
        }
    }

    #[test]
    fn test_rows_are_evenly_spaced_by_arc() {
        let geometry = deform_sheet(&params(80.0, 1.0));
        for (row, arc) in geometry.front.row_arc.iter().enumerate() {
            assert!((arc - row as f32 / 24.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_nearly_flat_ignores_flexibility() {
        let soft = deform_sheet(&params(0.5, 1.0));
        let rigid = deform_sheet(&params(0.5, 0.0));
        assert!((soft.fold_scale - rigid.fold_scale).abs() < 1e-6);
        assert!((soft.fold_scale - 1.0).abs() < 1e-3);
        for p in &soft.front.positions {
            assert!(p.y.abs() < 0.01);
        }
    }

    #[test]
    fn test_hard_sheet_stays_straight() {
        let mut p = params(60.0, 1.0);
        p.hard = true;
        let geometry = deform_sheet(&p);
        let dir = Vec2::new(60f32.to_radians().cos(), 60f32.to_radians().sin());
        for row in 0..geometry.front.row_count() {
            let pos = geometry.front.row_position(row);
            let cross = pos.x * dir.y - pos.y * dir.x;
            assert!(cross.abs() < 1e-4);
        }
    }

    #[test]
    fn test_back_uv_reads_as_opposite_half() {
        let right = deform_sheet(&params(30.0, 0.5));
        let mut left_params = params(30.0, 0.5);
        left_params.side = Side::Left;
        let left = deform_sheet(&left_params);

        assert_eq!(right.front.uvs[0].x, 0.0);
        assert_eq!(left.front.uvs[0].x, 1.0);
        assert_eq!(right.back.uvs[0].x, 1.0);
        assert_eq!(left.back.uvs[0].x, 0.0);

        // Turning the sheet does not change how the back is mapped
        let turned = deform_sheet(&params(150.0, 0.5));
        assert_eq!(turned.back.uvs[0].x, 1.0);
        assert_eq!(turned.back.uvs.last().unwrap().x, 0.0);
    }

    #[test]
    fn test_left_sheet_front_faces_up_at_rest() {
        let mut p = params(180.0, 0.0);
        p.side = Side::Left;
        let geometry = deform_sheet(&p);
        assert!(geometry.front.normals.iter().all(|n| n.y > 0.99));
        assert!(geometry.back.positions[0].y < geometry.front.positions[0].y);

        let [a, b, c] = [0usize, 1, 2].map(|i| geometry.front.positions[geometry.front.indices[i] as usize]);
        assert!((b - a).cross(c - a).y > 0.0);
    }

    #[test]
    fn test_faces_have_independent_arc_lengths() {
        let geometry = deform_sheet(&params(90.0, 1.0));
        assert!((geometry.front.arc_length - geometry.back.arc_length).abs() > 1e-5);
    }

    #[test]
    fn test_flat_front_faces_up() {
        let geometry = deform_sheet(&params(0.0, 0.0));
        assert!(geometry.front.normals.iter().all(|n| n.y > 0.99));
        assert!(geometry.back.normals.iter().all(|n| n.y < -0.99));
        assert_eq!(geometry.front.indices.len(), 24 * 6);

        let [a, b, c] = [0usize, 1, 2].map(|i| geometry.front.positions[geometry.front.indices[i] as usize]);
        assert!((b - a).cross(c - a).y > 0.0);
    }

    #[test]
    fn test_curve_angle_bands() {
        assert_eq!(curve_angle(true, 0.0), 0.0);
        assert_eq!(curve_angle(true, 180.0), 180.0);
        assert_eq!(curve_angle(true, 45.0), 22.5);
        assert!(curve_angle(true, 90.0) < 90.0);
        assert!(curve_angle(false, 90.0) > 90.0);
        assert_eq!(curve_angle(false, 0.0), 0.0);
        assert_eq!(curve_angle(true, 400.0), 180.0);

        let mut previous = 0.0;
        for angle in 0..=180 {
            let curve = curve_angle(true, angle as f32);
            assert!(curve >= previous);
            previous = curve;
        }
    }

    #[test]
    fn test_sheet_rest_and_animation_flags() {
        let mut sheet = Sheet::new(Side::Left, &PageGeometryConfig::default());
        assert_eq!(sheet.angle(), 180.0);

        sheet.begin_animation();
        sheet.set_front_visible(false);
        assert!(sheet.depth_bias() > 0.0);

        sheet.set_angle(90.0, curve_angle(false, 90.0));
        assert_eq!(sheet.angle(), 90.0);

        sheet.end_animation();
        sheet.reset_to_rest();
        assert_eq!(sheet.depth_bias(), 0.0);
        assert!(sheet.is_front_visible());
        assert_eq!(sheet.angle(), 180.0);
    }
}
