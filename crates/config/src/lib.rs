//! Shared configuration for Folio
//!
//! This crate provides the single source of truth for the window size,
//! page geometry, turn feel, hit-zone sizes and texture budgets shared by the
//! flipbook core and the Bevy scene.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default window width in pixels
pub const DEFAULT_WIDTH: u32 = 1600;

/// Default window height in pixels
pub const DEFAULT_HEIGHT: u32 = 1000;

/// Environment variable selecting the turn feel (`snappy` or `soft`)
pub const FEEL_ENV: &str = "FOLIO_FEEL";

/// Environment variable selecting the layout (`single` or `double`)
pub const LAYOUT_ENV: &str = "FOLIO_LAYOUT";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How a dragged page responds to the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnFeel {
    /// Direct response, stiff spring, short flicks complete a turn
    #[default]
    Snappy,
    /// Eased start, softer spring, needs a firmer flick
    Soft,
}

/// Tuning numbers derived from a [`TurnFeel`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeelProfile {
    /// Raw progress within this distance of 0 or 1 snaps to the boundary
    pub snap_threshold: f32,
    /// Exponential smoothing rate (1/s) of drag progress toward the pointer
    pub smoothing_rate: f32,
    /// Release velocity (px/ms in the turn direction) that completes a turn
    pub flick_velocity: f32,
    /// Spring stiffness
    pub spring_k: f32,
    /// Spring damping
    pub damping: f32,
    /// Sub-linear easing exponent applied to raw drag progress
    pub easing_exponent: Option<f32>,
}

impl TurnFeel {
    pub fn profile(self) -> FeelProfile {
        match self {
            TurnFeel::Snappy => FeelProfile {
                snap_threshold: 0.06,
                smoothing_rate: 28.0,
                flick_velocity: 0.35,
                spring_k: 110.0,
                damping: 13.5,
                easing_exponent: None,
            },
            TurnFeel::Soft => FeelProfile {
                snap_threshold: 0.03,
                smoothing_rate: 12.0,
                flick_velocity: 0.6,
                spring_k: 85.0,
                damping: 12.0,
                easing_exponent: Some(0.85),
            },
        }
    }

    /// Parse from a lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "snappy" => Some(Self::Snappy),
            "soft" => Some(Self::Soft),
            _ => None,
        }
    }
}

/// Single page or two-page spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Single,
    #[default]
    Double,
}

impl LayoutMode {
    /// Number of pages a completed turn advances
    pub fn page_step(self) -> usize {
        match self {
            LayoutMode::Single => 1,
            LayoutMode::Double => 2,
        }
    }

    pub fn from_page_step(step: usize) -> Self {
        if step >= 2 {
            LayoutMode::Double
        } else {
            LayoutMode::Single
        }
    }

    /// Parse from a lowercase name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

/// Physical page size and tessellation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometryConfig {
    /// Page width in world units (spine to outer edge)
    pub width: f32,
    /// Page height in world units (along the spine)
    pub height: f32,
    /// Sheet thickness in world units
    pub thickness: f32,
    /// Rows along the fold direction
    pub segments: usize,
    /// 0 = rigid, 1 = very soft
    pub flexibility: f32,
    /// Treat the first and last sheets as hard covers
    pub hard_covers: bool,
}

impl Default for PageGeometryConfig {
    fn default() -> Self {
        Self {
            width: 1.0,
            height: 1.4,
            thickness: 0.002,
            segments: 32,
            flexibility: 0.6,
            hard_covers: true,
        }
    }
}

/// Fractional sizes of the turnable zones on a page face
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HitZoneConfig {
    /// Fraction of the page width, measured from the outer edge, that is turnable
    pub outer_edge: f32,
    /// Fraction of the page height at top and bottom that counts as a corner
    pub corner: f32,
}

impl Default for HitZoneConfig {
    fn default() -> Self {
        Self {
            outer_edge: 0.2,
            corner: 0.2,
        }
    }
}

/// Texture loading, caching and prefetch budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureConfig {
    /// Scale of the immediate low-resolution pass
    pub fast_scale: f32,
    /// Scale of the background high-resolution pass
    pub quality_scale: f32,
    /// Maximum decoded entries held in the cache
    pub cache_limit: usize,
    /// Pages further than this from the spread anchor are pruned
    pub window_radius: usize,
    /// Neighbor spreads warmed on each side of the current one
    pub prefetch_radius: usize,
    /// Target widths are rounded up to a multiple of this many pixels
    pub resolution_bucket: u32,
}

impl Default for TextureConfig {
    fn default() -> Self {
        Self {
            fast_scale: 0.5,
            quality_scale: 1.0,
            cache_limit: 32,
            window_radius: 6,
            prefetch_radius: 1,
            resolution_bucket: 128,
        }
    }
}

/// Complete book configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    pub feel: TurnFeel,
    pub layout: LayoutMode,
    pub page: PageGeometryConfig,
    pub hit_zones: HitZoneConfig,
    pub textures: TextureConfig,
    /// Refuse to start a drag until the faces it reveals are cached
    pub require_textures_before_drag: bool,
    /// Hide the turning sheet's front face past this progress
    pub hide_front_after: f32,
    /// Release velocity (progress/s) of keyboard and programmatic turns
    pub programmatic_velocity: f32,
    /// Physics rest threshold for both distance and speed
    pub rest_threshold: f32,
    /// Largest physics step in seconds
    pub max_dt: f32,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            feel: TurnFeel::default(),
            layout: LayoutMode::default(),
            page: PageGeometryConfig::default(),
            hit_zones: HitZoneConfig::default(),
            textures: TextureConfig::default(),
            require_textures_before_drag: true,
            hide_front_after: 0.5,
            programmatic_velocity: 1.5,
            rest_threshold: 0.001,
            max_dt: 0.033,
        }
    }
}

impl BookConfig {
    /// Parse a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply `FOLIO_FEEL` and `FOLIO_LAYOUT` overrides when set
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(feel) = std::env::var(FEEL_ENV).ok().as_deref().and_then(TurnFeel::from_name) {
            self.feel = feel;
        }
        if let Some(layout) = std::env::var(LAYOUT_ENV)
            .ok()
            .as_deref()
            .and_then(LayoutMode::from_name)
        {
            self.layout = layout;
        }
        self
    }

    /// Tuning numbers for the configured feel
    pub fn profile(&self) -> FeelProfile {
        self.feel.profile()
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn fraction(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                })
            }
        }
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} must be positive"),
                })
            }
        }

        if self.page.segments == 0 {
            return Err(ConfigError::Invalid {
                field: "page.segments",
                reason: "at least one segment is required".into(),
            });
        }
        positive("page.width", self.page.width)?;
        positive("page.height", self.page.height)?;
        fraction("page.flexibility", self.page.flexibility)?;
        fraction("hit_zones.outer_edge", self.hit_zones.outer_edge)?;
        fraction("hit_zones.corner", self.hit_zones.corner)?;
        fraction("hide_front_after", self.hide_front_after)?;
        positive("textures.fast_scale", self.textures.fast_scale)?;
        positive("textures.quality_scale", self.textures.quality_scale)?;
        positive("max_dt", self.max_dt)?;
        positive("rest_threshold", self.rest_threshold)?;
        if self.textures.cache_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "textures.cache_limit",
                reason: "cache must hold at least one entry".into(),
            });
        }
        if self.textures.resolution_bucket == 0 {
            return Err(ConfigError::Invalid {
                field: "textures.resolution_bucket",
                reason: "bucket must be non-zero".into(),
            });
        }
        Ok(())
    }
}
