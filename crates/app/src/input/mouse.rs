//! Mouse input - the left button drags pages

use bevy::input::ButtonState;
use bevy::input::mouse::MouseButtonInput;
use bevy::prelude::*;
use bevy::window::{CursorLeft, CursorMoved};
use flipbook::{BookController, InputEvent, PointerId};
use folio_scene::to_book_vec2;

use super::{PointerState, timestamp_ms};

/// Forward cursor motion, left button presses and window exits
pub fn forward_mouse(
    mut cursor_events: MessageReader<CursorMoved>,
    mut button_events: MessageReader<MouseButtonInput>,
    mut left_events: MessageReader<CursorLeft>,
    mut pointer: ResMut<PointerState>,
    time: Res<Time<Real>>,
    mut controller: NonSendMut<BookController>,
) {
    let time_ms = timestamp_ms(&time);

    for event in cursor_events.read() {
        pointer.position = Some(event.position);
        controller.push_input(InputEvent::PointerMove {
            pointer: PointerId::Mouse,
            position: to_book_vec2(event.position),
            time_ms,
        });
    }

    for event in button_events.read() {
        if event.button != MouseButton::Left {
            continue;
        }
        // Buttons carry no position; use the tracked cursor
        let Some(position) = pointer.position.map(to_book_vec2) else {
            continue;
        };
        let input = match event.state {
            ButtonState::Pressed => InputEvent::PointerDown {
                pointer: PointerId::Mouse,
                position,
                time_ms,
            },
            ButtonState::Released => InputEvent::PointerUp {
                pointer: PointerId::Mouse,
                position,
                time_ms,
            },
        };
        controller.push_input(input);
    }

    if !left_events.is_empty() {
        left_events.clear();
        pointer.position = None;
        controller.push_input(InputEvent::PointerLeave);
    }
}
