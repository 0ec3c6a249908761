//! Upload of bound page textures into Bevy images

use std::collections::HashMap;

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use flipbook::{BookController, CachedTexture, TextureSlot};

/// Image currently shown by each texture slot
#[derive(Resource, Default)]
pub struct PageImages {
    handles: HashMap<TextureSlot, Handle<Image>>,
}

impl PageImages {
    pub fn get(&self, slot: TextureSlot) -> Option<&Handle<Image>> {
        self.handles.get(&slot)
    }
}

/// Wrap a decoded page as an sRGB image for the render world
pub fn page_image(texture: &CachedTexture) -> Image {
    let (width, height) = texture.image.dimensions();
    Image::new(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        texture.image.as_raw().clone(),
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    )
}

/// Replace the image of every slot the pipeline rebound since last frame
pub(crate) fn upload_page_textures(
    mut controller: NonSendMut<BookController>,
    mut page_images: ResMut<PageImages>,
    mut images: ResMut<Assets<Image>>,
) {
    let dirty = controller.pipeline_mut().take_dirty_slots();
    for slot in dirty {
        match controller.pipeline().bound(slot) {
            Some(bound) => {
                let handle = images.add(page_image(&bound.texture));
                debug!(
                    "Slot {:?} now shows page {} ({:?}, {}x{})",
                    slot,
                    bound.page,
                    bound.tier,
                    bound.texture.image.width(),
                    bound.texture.image.height()
                );
                page_images.handles.insert(slot, handle);
            }
            None => {
                page_images.handles.remove(&slot);
            }
        }
    }
}
