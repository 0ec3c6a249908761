//! Keyboard input - arrow keys and space turn pages

use bevy::input::keyboard::KeyboardInput;
use bevy::prelude::*;
use flipbook::{BookController, BookKey, InputEvent};

/// Turn binding of a key, if it has one
pub fn book_key(key: KeyCode) -> Option<BookKey> {
    match key {
        KeyCode::ArrowLeft => Some(BookKey::ArrowLeft),
        KeyCode::ArrowRight => Some(BookKey::ArrowRight),
        KeyCode::Space => Some(BookKey::Space),
        _ => None,
    }
}

/// Forward fresh presses of bound keys; auto-repeat is ignored
pub fn forward_keyboard(
    mut key_events: MessageReader<KeyboardInput>,
    mut controller: NonSendMut<BookController>,
) {
    for event in key_events.read() {
        if !event.state.is_pressed() || event.repeat {
            continue;
        }
        if let Some(key) = book_key(event.key_code) {
            controller.push_input(InputEvent::Key(key));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_bindings() {
        assert_eq!(book_key(KeyCode::ArrowRight), Some(BookKey::ArrowRight));
        assert_eq!(book_key(KeyCode::Space), Some(BookKey::Space));
        assert_eq!(book_key(KeyCode::KeyA), None);
    }
}
