/// Sheet angles within this many degrees of 0 or 180 are treated as flat.
pub const NEARLY_FLAT_DEGREES: f32 = 1.0;

/// Dense Bézier samples taken per output row before arc-length resampling.
pub const ARC_OVERSAMPLE: usize = 8;

/// Default physics spring stiffness.
pub const DEFAULT_SPRING_K: f32 = 100.0;

/// Default physics damping.
pub const DEFAULT_DAMPING: f32 = 13.0;

/// Default mass of the turn-progress oscillator.
pub const DEFAULT_MASS: f32 = 1.0;

/// Largest physics step (seconds); longer frames are clamped.
pub const DEFAULT_MAX_DT: f32 = 0.033;

/// Distance and speed under which physics is considered at rest.
pub const DEFAULT_REST_THRESHOLD: f32 = 0.001;

/// Release decision boundary on drag progress. Exactly 0.5 does not complete.
pub const COMPLETE_THRESHOLD: f32 = 0.5;

/// Window (ms) of pointer samples used for release velocity.
pub const VELOCITY_WINDOW_MS: f64 = 100.0;

/// Depth bias applied to a sheet while it is turning.
pub const TURNING_DEPTH_BIAS: f32 = 8.0;
