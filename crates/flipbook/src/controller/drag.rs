//! Drag progress shaping

use folio_config::FeelProfile;

use crate::types::TurnDirection;

/// Raw turn progress from the signed pointer travel along x
pub fn raw_progress(direction: TurnDirection, delta_x: f32, page_pixel_width: f32) -> f32 {
    if page_pixel_width <= 0.0 {
        return 0.0;
    }
    (delta_x * direction.drag_sign() / page_pixel_width).clamp(0.0, 1.0)
}

/// Apply the feel's easing, then snap to a boundary when close to it
pub fn shape_progress(raw: f32, profile: &FeelProfile) -> f32 {
    let raw = raw.clamp(0.0, 1.0);
    let eased = match profile.easing_exponent {
        Some(exponent) => raw.powf(exponent),
        None => raw,
    };
    if raw <= profile.snap_threshold {
        0.0
    } else if raw >= 1.0 - profile.snap_threshold {
        1.0
    } else {
        eased
    }
}

/// Exponential approach of `current` toward `target` over `dt` seconds
pub fn smooth_toward(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    let alpha = 1.0 - (-rate * dt.max(0.0)).exp();
    let next = current + (target - current) * alpha;
    if (target - next).abs() < 1e-4 { target } else { next }
}

/// Convert a pointer velocity in px/ms along the turn into progress per second
pub fn progress_velocity(px_per_ms: f32, page_pixel_width: f32) -> f32 {
    if page_pixel_width <= 0.0 {
        return 0.0;
    }
    px_per_ms * 1000.0 / page_pixel_width
}

#[cfg(test)]
mod tests {
    use folio_config::TurnFeel;

    use super::*;

    #[test]
    fn test_raw_progress_follows_turn_direction() {
        assert_eq!(raw_progress(TurnDirection::Forward, -100.0, 400.0), 0.25);
        assert_eq!(raw_progress(TurnDirection::Forward, 100.0, 400.0), 0.0);
        assert_eq!(raw_progress(TurnDirection::Backward, 100.0, 400.0), 0.25);
        assert_eq!(raw_progress(TurnDirection::Backward, 900.0, 400.0), 1.0);
        assert_eq!(raw_progress(TurnDirection::Forward, -10.0, 0.0), 0.0);
    }

    #[test]
    fn test_snap_near_boundaries() {
        let snappy = TurnFeel::Snappy.profile();
        assert_eq!(shape_progress(0.05, &snappy), 0.0);
        assert_eq!(shape_progress(0.96, &snappy), 1.0);
        assert_eq!(shape_progress(0.4, &snappy), 0.4);
    }

    #[test]
    fn test_soft_eases_start() {
        let soft = TurnFeel::Soft.profile();
        let shaped = shape_progress(0.2, &soft);
        assert!((shaped - 0.2f32.powf(0.85)).abs() < 1e-6);
        assert!(shaped > 0.2);
        assert_eq!(shape_progress(0.02, &soft), 0.0);
    }

    #[test]
    fn test_smoothing_converges_without_overshoot() {
        let mut value = 0.0;
        for _ in 0..120 {
            let next = smooth_toward(value, 0.6, 28.0, 1.0 / 60.0);
            assert!(next >= value && next <= 0.6);
            value = next;
        }
        assert_eq!(value, 0.6);
    }

    #[test]
    fn test_progress_velocity() {
        assert_eq!(progress_velocity(0.4, 400.0), 1.0);
        assert_eq!(progress_velocity(1.0, 0.0), 0.0);
    }
}
