//! Navigation hotkeys outside the turn bindings
//!
//! - Home / End: first / last spread
//! - L: switch between single and double layout

use bevy::prelude::*;
use flipbook::BookController;
use folio_config::LayoutMode;
use folio_scene::BookCommand;

fn toggled(layout: LayoutMode) -> LayoutMode {
    match layout {
        LayoutMode::Single => LayoutMode::Double,
        LayoutMode::Double => LayoutMode::Single,
    }
}

pub fn handle_hotkeys(
    key_input: Res<ButtonInput<KeyCode>>,
    controller: NonSend<BookController>,
    mut book_commands: MessageWriter<BookCommand>,
) {
    if key_input.just_pressed(KeyCode::Home) {
        book_commands.write(BookCommand::GoToPage(0));
    }
    if key_input.just_pressed(KeyCode::End) {
        let last = controller.total_pages().saturating_sub(1);
        book_commands.write(BookCommand::GoToPage(last));
    }
    if key_input.just_pressed(KeyCode::KeyL) {
        let layout = toggled(controller.config().layout);
        info!("Switching to {:?} layout", layout);
        book_commands.write(BookCommand::SetLayout(layout));
    }
}
