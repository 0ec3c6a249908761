//! Bounded LRU cache of decoded page textures
//!
//! Recency is a logical clock bumped on every insert and lookup, so eviction
//! order is exact even when several entries are touched in the same frame.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use tracing::debug;

use super::key::TextureKey;

/// A decoded page ready for upload
#[derive(Debug, Clone)]
pub struct CachedTexture {
    pub image: Arc<RgbaImage>,
    /// Dimensions reported by the source before downscaling
    pub natural_width: u32,
    pub natural_height: u32,
}

#[derive(Debug)]
struct CacheEntry {
    texture: CachedTexture,
    last_used: u64,
}

#[derive(Debug)]
pub struct TextureCache {
    entries: HashMap<TextureKey, CacheEntry>,
    limit: usize,
    clock: u64,
}

impl TextureCache {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            limit: limit.max(1),
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Look up and mark as used
    pub fn get(&mut self, key: &TextureKey) -> Option<CachedTexture> {
        let now = self.tick();
        let entry = self.entries.get_mut(key)?;
        entry.last_used = now;
        Some(entry.texture.clone())
    }

    /// Look up without touching recency
    pub fn peek(&self, key: &TextureKey) -> Option<&CachedTexture> {
        self.entries.get(key).map(|entry| &entry.texture)
    }

    pub fn contains(&self, key: &TextureKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or refresh an entry, then evict least recently used entries
    /// until the limit holds. Returns the evicted keys.
    pub fn insert(&mut self, key: TextureKey, texture: CachedTexture) -> Vec<TextureKey> {
        let now = self.tick();
        self.entries.insert(
            key,
            CacheEntry {
                texture,
                last_used: now,
            },
        );
        self.evict_to_limit()
    }

    fn evict_to_limit(&mut self) -> Vec<TextureKey> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.limit {
            let Some(oldest) = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            self.entries.remove(&oldest);
            debug!("Evicted page {} from texture cache", oldest.page);
            evicted.push(oldest);
        }
        evicted
    }

    /// Drop every entry whose page falls outside `[min_page, max_page]`
    pub fn prune_outside(&mut self, min_page: usize, max_page: usize) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|key, _| (min_page..=max_page).contains(&key.page));
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!("Pruned {} textures outside pages {}..={}", pruned, min_page, max_page);
        }
        pruned
    }

    pub fn set_limit(&mut self, limit: usize) -> Vec<TextureKey> {
        self.limit = limit.max(1);
        self.evict_to_limit()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
