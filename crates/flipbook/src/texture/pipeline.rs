//! Texture pipeline
//!
//! Decides which page images each face needs, fetches them on the tokio
//! runtime, and binds results to texture slots when they arrive.
//!
//! - Concurrent requests for one key share a single fetch.
//! - Slots belong to a group (spread or under) with a monotonic generation.
//!   A result whose group generation moved on since the request was issued
//!   is discarded, unless the request was allowed to warm the cache.
//! - Spread pages load fast first, then at quality; quality is never
//!   replaced by fast for the same page.
//! - After each spread change, cached pages outside the window around the
//!   anchor are pruned regardless of recency.
//!
//! All state is mutated from the thread that calls [`TexturePipeline::poll`];
//! worker tasks only fetch and decode.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use folio_config::{LayoutMode, TextureConfig};
use futures_util::future::BoxFuture;
use image::imageops::FilterType;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, info, warn};

use super::cache::{CachedTexture, TextureCache};
use super::key::{TextureKey, TextureTier, bucket_width};
use super::source::{PagePayload, PageRequest, PageSource};
use super::TextureError;
use crate::types::{Spread, TurnDirection, TurnPlan};

/// A face that displays a page texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureSlot {
    SpreadLeft,
    SpreadRight,
    /// Back face of the sheet that is turning
    TurningBack,
    UnderLeft,
    UnderRight,
}

impl TextureSlot {
    pub const ALL: [TextureSlot; 5] = [
        TextureSlot::SpreadLeft,
        TextureSlot::SpreadRight,
        TextureSlot::TurningBack,
        TextureSlot::UnderLeft,
        TextureSlot::UnderRight,
    ];

    pub fn group(self) -> SlotGroup {
        match self {
            TextureSlot::SpreadLeft | TextureSlot::SpreadRight => SlotGroup::Spread,
            TextureSlot::TurningBack | TextureSlot::UnderLeft | TextureSlot::UnderRight => {
                SlotGroup::Under
            }
        }
    }
}

/// Slots that are superseded together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotGroup {
    Spread,
    Under,
}

impl SlotGroup {
    fn index(self) -> usize {
        match self {
            SlotGroup::Spread => 0,
            SlotGroup::Under => 1,
        }
    }
}

/// Texture currently shown by a slot
#[derive(Debug, Clone)]
pub struct BoundTexture {
    pub page: usize,
    pub tier: TextureTier,
    pub texture: CachedTexture,
}

#[derive(Debug, Clone, Copy)]
enum Waiter {
    /// Render now: bind to `slot` if its group is still at `generation`
    Bind {
        slot: TextureSlot,
        page: usize,
        tier: TextureTier,
        generation: u64,
        allow_inactive_cache: bool,
    },
    /// Warm the cache whatever spread is active
    Warm,
}

struct Completion {
    key: TextureKey,
    result: Result<Option<CachedTexture>, TextureError>,
}

pub struct TexturePipeline {
    source: Arc<dyn PageSource>,
    runtime: Handle,
    config: TextureConfig,
    document_id: Arc<str>,
    layout: LayoutMode,
    total_pages: usize,
    page_pixel_width: f32,
    anchor: usize,
    cache: TextureCache,
    in_flight: HashMap<TextureKey, Vec<Waiter>>,
    generations: [u64; 2],
    wanted: HashMap<TextureSlot, usize>,
    bound: HashMap<TextureSlot, BoundTexture>,
    dirty: HashSet<TextureSlot>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
}

impl TexturePipeline {
    pub fn new(
        source: Arc<dyn PageSource>,
        runtime: Handle,
        config: TextureConfig,
        document_id: impl Into<Arc<str>>,
        layout: LayoutMode,
        total_pages: usize,
    ) -> Self {
        let (completions_tx, completions_rx) = unbounded_channel();
        Self {
            source,
            runtime,
            cache: TextureCache::new(config.cache_limit),
            config,
            document_id: document_id.into(),
            layout,
            total_pages,
            page_pixel_width: 512.0,
            anchor: 0,
            in_flight: HashMap::new(),
            generations: [0; 2],
            wanted: HashMap::new(),
            bound: HashMap::new(),
            dirty: HashSet::new(),
            completions_tx,
            completions_rx,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn cache(&self) -> &TextureCache {
        &self.cache
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    pub fn generation(&self, group: SlotGroup) -> u64 {
        self.generations[group.index()]
    }

    pub fn bound(&self, slot: TextureSlot) -> Option<&BoundTexture> {
        self.bound.get(&slot)
    }

    /// Slots whose bound texture changed since the last call
    pub fn take_dirty_slots(&mut self) -> Vec<TextureSlot> {
        let mut slots: Vec<_> = self.dirty.drain().collect();
        slots.sort();
        slots
    }

    /// On-screen width of one page; feeds the resolution bucket of future requests
    pub fn set_page_pixel_width(&mut self, pixels: f32) {
        if pixels.is_finite() && pixels > 0.0 {
            self.page_pixel_width = pixels;
        }
    }

    pub fn set_total_pages(&mut self, total_pages: usize) {
        self.total_pages = total_pages;
    }

    pub fn set_layout(&mut self, layout: LayoutMode) {
        if self.layout != layout {
            self.layout = layout;
            self.bump(SlotGroup::Spread);
            self.bump(SlotGroup::Under);
        }
    }

    /// Switch to another document, dropping every cached and bound texture
    pub fn set_document(&mut self, document_id: impl Into<Arc<str>>, total_pages: usize) {
        self.document_id = document_id.into();
        self.total_pages = total_pages;
        self.anchor = 0;
        self.cache.clear();
        self.in_flight.clear();
        self.bump(SlotGroup::Spread);
        self.bump(SlotGroup::Under);
        self.wanted.clear();
        let cleared: Vec<_> = self.bound.drain().map(|(slot, _)| slot).collect();
        self.dirty.extend(cleared);
        info!("Texture pipeline switched to document {}", self.document_id);
    }

    fn bump(&mut self, group: SlotGroup) -> u64 {
        let generation = &mut self.generations[group.index()];
        *generation += 1;
        *generation
    }

    fn scale(&self, tier: TextureTier) -> f32 {
        match tier {
            TextureTier::Fast => self.config.fast_scale,
            TextureTier::Quality => self.config.quality_scale,
        }
    }

    fn key(&self, page: usize, tier: TextureTier) -> TextureKey {
        let scale = self.scale(tier);
        TextureKey::new(
            self.document_id.clone(),
            self.layout,
            page,
            scale,
            bucket_width(self.page_pixel_width * scale, self.config.resolution_bucket),
        )
    }

    fn in_document(&self, page: usize) -> bool {
        page < self.total_pages
    }

    /// Record what `slot` should show. Out-of-range pages clear the slot.
    fn assign(&mut self, slot: TextureSlot, page: Option<usize>) -> Option<usize> {
        match page.filter(|&page| self.in_document(page)) {
            Some(page) => {
                self.wanted.insert(slot, page);
                Some(page)
            }
            None => {
                self.wanted.remove(&slot);
                if self.bound.remove(&slot).is_some() {
                    self.dirty.insert(slot);
                }
                None
            }
        }
    }

    fn bind(&mut self, slot: TextureSlot, page: usize, tier: TextureTier, texture: CachedTexture) {
        if let Some(current) = self.bound.get(&slot) {
            if current.page == page && current.tier > tier {
                return;
            }
        }
        self.bound.insert(slot, BoundTexture { page, tier, texture });
        self.dirty.insert(slot);
    }

    /// Bind from cache when possible, otherwise queue a fetch.
    /// Returns true when the slot was bound immediately.
    fn request_slot(
        &mut self,
        slot: TextureSlot,
        page: usize,
        tier: TextureTier,
        generation: u64,
        allow_inactive_cache: bool,
    ) -> bool {
        let key = self.key(page, tier);
        if let Some(texture) = self.cache.get(&key) {
            self.bind(slot, page, tier, texture);
            return true;
        }
        self.enqueue(
            key,
            page,
            tier,
            Waiter::Bind {
                slot,
                page,
                tier,
                generation,
                allow_inactive_cache,
            },
        );
        false
    }

    /// Fast then quality. A cached quality image short-circuits the ladder.
    fn load_ladder(&mut self, slot: TextureSlot, page: usize, generation: u64) {
        let quality = self.key(page, TextureTier::Quality);
        if let Some(texture) = self.cache.get(&quality) {
            self.bind(slot, page, TextureTier::Quality, texture);
            return;
        }
        if self.request_slot(slot, page, TextureTier::Fast, generation, false) {
            self.request_slot(slot, page, TextureTier::Quality, generation, false);
        }
    }

    fn enqueue(&mut self, key: TextureKey, page: usize, tier: TextureTier, waiter: Waiter) {
        if let Some(waiters) = self.in_flight.get_mut(&key) {
            debug!("Joined in-flight request for page {} ({:?})", page, tier);
            waiters.push(waiter);
            return;
        }

        let request = PageRequest {
            document_id: key.document_id.clone(),
            page,
            scale: key.scale(),
            target_width: Some(key.target_width),
            target_height: None,
            tier,
        };
        let fetch = self.source.fetch(request);
        let completions = self.completions_tx.clone();
        let task_key = key.clone();
        self.runtime.spawn(async move {
            let target_width = task_key.target_width;
            let result = load_texture(fetch, target_width).await;
            // Receiver lives as long as the pipeline
            let _ = completions.send(Completion {
                key: task_key,
                result,
            });
        });
        debug!("Requested page {} ({:?})", page, tier);
        self.in_flight.insert(key, vec![waiter]);
    }

    /// Warm the cache with the fast image of `page`
    pub fn prefetch_page(&mut self, page: usize) {
        if !self.in_document(page) {
            return;
        }
        let key = self.key(page, TextureTier::Fast);
        if self.cache.contains(&key) {
            return;
        }
        self.enqueue(key, page, TextureTier::Fast, Waiter::Warm);
    }

    /// Show the spread anchored at `anchor` and re-center the cache window
    pub fn show_spread(&mut self, anchor: usize) {
        self.anchor = anchor;
        let generation = self.bump(SlotGroup::Spread);
        let spread = Spread::at(anchor, self.layout, self.total_pages);
        for (slot, page) in [
            (TextureSlot::SpreadLeft, spread.left),
            (TextureSlot::SpreadRight, spread.right),
        ] {
            if let Some(page) = self.assign(slot, page) {
                self.load_ladder(slot, page, generation);
            }
        }

        let radius = self.config.window_radius;
        self.cache
            .prune_outside(anchor.saturating_sub(radius), anchor.saturating_add(radius));
        self.prefetch_neighbors();
    }

    /// Warm the spreads on either side of the current one
    pub fn prefetch_neighbors(&mut self) {
        let step = self.layout.page_step();
        for distance in 1..=self.config.prefetch_radius {
            let offset = distance * step;
            let anchors = [
                self.anchor.checked_add(offset),
                self.anchor.checked_sub(offset),
            ];
            for anchor in anchors.into_iter().flatten() {
                let spread = Spread::at(anchor, self.layout, self.total_pages);
                for page in spread.pages() {
                    self.prefetch_page(page);
                }
            }
        }
    }

    /// Warm every page a turn would reveal, without binding anything
    pub fn warm_turn(&mut self, plan: &TurnPlan) {
        for page in plan.revealed_pages() {
            self.prefetch_page(page);
        }
    }

    /// Bind the turning back face and the under spread for `plan`
    pub fn prepare_turn(&mut self, plan: &TurnPlan) {
        let generation = self.bump(SlotGroup::Under);
        for (slot, page) in [
            (TextureSlot::TurningBack, plan.turning_back),
            (TextureSlot::UnderLeft, plan.under.left),
            (TextureSlot::UnderRight, plan.under.right),
        ] {
            if let Some(page) = self.assign(slot, page) {
                self.request_slot(slot, page, TextureTier::Fast, generation, true);
            }
        }

        let beyond = match plan.direction {
            TurnDirection::Forward => plan.destination.checked_add(self.layout.page_step()),
            TurnDirection::Backward => plan.destination.checked_sub(self.layout.page_step()),
        };
        if let Some(anchor) = beyond {
            for page in Spread::at(anchor, self.layout, self.total_pages).pages() {
                self.prefetch_page(page);
            }
        }
    }

    /// Clear the under slots once a turn has finished
    pub fn release_under(&mut self) {
        self.bump(SlotGroup::Under);
        for slot in [
            TextureSlot::TurningBack,
            TextureSlot::UnderLeft,
            TextureSlot::UnderRight,
        ] {
            self.assign(slot, None);
        }
    }

    /// Every in-range page already has a decoded image at some tier
    pub fn is_ready(&self, pages: impl IntoIterator<Item = usize>) -> bool {
        pages.into_iter().filter(|&page| self.in_document(page)).all(|page| {
            self.cache.contains(&self.key(page, TextureTier::Fast))
                || self.cache.contains(&self.key(page, TextureTier::Quality))
        })
    }

    /// Apply every finished fetch. Call once per frame.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.complete(completion);
            handled += 1;
        }
        handled
    }

    /// Apply completions until nothing is in flight
    pub async fn wait_idle(&mut self) {
        while !self.in_flight.is_empty() {
            match self.completions_rx.recv().await {
                Some(completion) => self.complete(completion),
                None => break,
            }
        }
    }

    fn is_live(&self, waiter: &Waiter) -> bool {
        match *waiter {
            Waiter::Bind {
                slot,
                page,
                generation,
                ..
            } => {
                self.generations[slot.group().index()] == generation
                    && self.wanted.get(&slot) == Some(&page)
            }
            Waiter::Warm => false,
        }
    }

    fn complete(&mut self, completion: Completion) {
        let Some(waiters) = self.in_flight.remove(&completion.key) else {
            debug!("Dropped result for page {} with no waiters", completion.key.page);
            return;
        };
        let key = completion.key;
        let page = key.page;

        let live: Vec<Waiter> = waiters.iter().copied().filter(|w| self.is_live(w)).collect();

        let texture = match completion.result {
            Ok(Some(texture)) => texture,
            Ok(None) => {
                debug!("Page {} is not available", page);
                self.continue_ladder(&live);
                return;
            }
            Err(err) => {
                warn!("Failed to load page {}: {}", page, err);
                self.continue_ladder(&live);
                return;
            }
        };

        let keep = !live.is_empty()
            || waiters.iter().any(|w| {
                matches!(
                    w,
                    Waiter::Warm
                        | Waiter::Bind {
                            allow_inactive_cache: true,
                            ..
                        }
                )
            });
        if !keep {
            debug!("Discarded stale page {} at scale {}", page, key.scale());
            return;
        }

        self.cache.insert(key, texture.clone());
        for waiter in &live {
            if let Waiter::Bind { slot, page, tier, .. } = *waiter {
                self.bind(slot, page, tier, texture.clone());
            }
        }
        self.continue_ladder(&live);
    }

    /// Move live fast spread requests on to the quality rung
    fn continue_ladder(&mut self, live: &[Waiter]) {
        for waiter in live {
            if let Waiter::Bind {
                slot,
                page,
                tier: TextureTier::Fast,
                generation,
                ..
            } = *waiter
            {
                if slot.group() == SlotGroup::Spread {
                    self.request_slot(slot, page, TextureTier::Quality, generation, false);
                }
            }
        }
    }
}

async fn load_texture(
    fetch: BoxFuture<'static, Result<Option<PagePayload>, TextureError>>,
    target_width: u32,
) -> Result<Option<CachedTexture>, TextureError> {
    let Some(payload) = fetch.await? else {
        return Ok(None);
    };
    let texture = tokio::task::spawn_blocking(move || decode_payload(payload, target_width)).await??;
    Ok(Some(texture))
}

/// Decode a payload to RGBA, downscaling to `target_width` when wider
pub fn decode_payload(payload: PagePayload, target_width: u32) -> Result<CachedTexture, TextureError> {
    let mut image = image::load_from_memory(&payload.bytes)?.to_rgba8();
    if target_width > 0 && image.width() > target_width {
        let height = (u64::from(image.height()) * u64::from(target_width) / u64::from(image.width())).max(1);
        image = image::imageops::resize(&image, target_width, height as u32, FilterType::Triangle);
    }
    Ok(CachedTexture {
        image: Arc::new(image),
        natural_width: payload.natural_width,
        natural_height: payload.natural_height,
    })
}
