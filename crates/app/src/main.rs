//! Folio - page-turning book viewer
//!
//! Shows the images in `FOLIO_PAGES` as the pages of a 3D book.

use std::sync::Arc;

use bevy::prelude::*;
use bevy::window::WindowResolution;
use flipbook::{BookController, DirectoryPageSource};
use folio_config::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use folio_scene::BookScenePlugin;

mod config;
mod input;

use config::FolioConfig;

fn main() -> AppExit {
    let config = FolioConfig::from_env();

    // Logging is not up yet; startup failures go to stderr
    let book_config = match config.load_book_config() {
        Ok(book_config) => book_config,
        Err(err) => {
            eprintln!("Failed to load book config: {err}");
            return AppExit::error();
        }
    };

    let runtime = tokio::runtime::Runtime::new().expect("Failed to start tokio runtime");
    let source = match runtime.block_on(DirectoryPageSource::open(&config.pages_dir)) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Failed to open pages in {}: {err}", config.pages_dir.display());
            return AppExit::error();
        }
    };

    let total_pages = source.page_count();
    let document_id = config
        .document_id
        .clone()
        .unwrap_or_else(|| source.document_id());
    let controller = BookController::new(
        book_config,
        Arc::new(source),
        runtime.handle().clone(),
        document_id,
        total_pages,
    );

    let window = Window {
        title: "Folio".into(),
        resolution: WindowResolution::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
        present_mode: bevy::window::PresentMode::AutoVsync,
        ..default()
    };

    App::new()
        .insert_resource(config)
        .insert_resource(ClearColor(Color::srgb(0.16, 0.15, 0.14)))
        .insert_non_send_resource(controller)
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(window),
                    ..default()
                })
                .set(bevy::log::LogPlugin {
                    level: bevy::log::Level::INFO,
                    ..default()
                }),
        )
        .add_plugins(BookScenePlugin)
        .add_plugins(input::InputPlugin)
        .run()
}
