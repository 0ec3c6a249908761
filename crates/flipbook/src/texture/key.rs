//! Cache keys for decoded page textures

use std::sync::Arc;

use folio_config::LayoutMode;
use serde::{Deserialize, Serialize};

/// Resolution ladder rung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TextureTier {
    /// Reduced scale for immediate feedback
    Fast,
    /// Full scale, swapped in when ready
    Quality,
}

/// Identity of one decoded page image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub document_id: Arc<str>,
    pub layout: LayoutMode,
    pub page: usize,
    /// Render scale in thousandths
    pub scale_permille: u32,
    /// Target width in pixels, already rounded to a bucket
    pub target_width: u32,
}

impl TextureKey {
    pub fn new(
        document_id: Arc<str>,
        layout: LayoutMode,
        page: usize,
        scale: f32,
        target_width: u32,
    ) -> Self {
        Self {
            document_id,
            layout,
            page,
            scale_permille: (scale * 1000.0).round() as u32,
            target_width,
        }
    }

    pub fn scale(&self) -> f32 {
        self.scale_permille as f32 / 1000.0
    }
}

/// Round `pixels` up to the next multiple of `bucket`, never below one bucket
pub fn bucket_width(pixels: f32, bucket: u32) -> u32 {
    let bucket = bucket.max(1);
    let pixels = if pixels.is_finite() { pixels.max(1.0) } else { 1.0 };
    (pixels / bucket as f32).ceil().max(1.0) as u32 * bucket
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_width_rounds_up() {
        assert_eq!(bucket_width(1.0, 128), 128);
        assert_eq!(bucket_width(128.0, 128), 128);
        assert_eq!(bucket_width(129.0, 128), 256);
        assert_eq!(bucket_width(f32::NAN, 128), 128);
    }

    #[test]
    fn test_scale_is_part_of_identity() {
        let doc: Arc<str> = Arc::from("doc");
        let fast = TextureKey::new(doc.clone(), LayoutMode::Double, 3, 0.5, 512);
        let quality = TextureKey::new(doc, LayoutMode::Double, 3, 1.0, 512);
        assert_ne!(fast, quality);
        assert_eq!(fast.scale(), 0.5);
    }
}
