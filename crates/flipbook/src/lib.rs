//! Folio flipbook engine - page-turn interaction and sheet deformation
//!
//! Renderer-independent core of the book:
//! - [`sheet`] - Bézier deformation of a sheet into front and back faces
//! - [`physics`] - Damped spring driving turn progress after release
//! - [`state_machine`] - Interaction states and legal transitions
//! - [`controller`] - Input, physics and textures tied together per frame
//! - [`hit_test`] / [`raycast`] - Picking turnable page zones
//! - [`texture`] - Tiered page image loading, caching and prefetch

pub mod constants;
pub mod controller;
pub mod hit_test;
pub mod input;
#[cfg(feature = "bevy")]
mod mesh;
pub mod physics;
pub mod raycast;
pub mod scene;
pub mod sheet;
pub mod state_machine;
pub mod texture;
pub mod types;

pub use controller::*;
pub use hit_test::*;
pub use input::*;
pub use physics::*;
pub use raycast::*;
pub use scene::*;
pub use sheet::*;
pub use state_machine::*;
pub use texture::{
    BoundTexture, CachedTexture, DirectoryPageSource, PagePayload, PageRequest, PageSource,
    SlotGroup, TextureCache, TextureError, TextureKey, TexturePipeline, TextureSlot, TextureTier,
};
pub use types::*;
