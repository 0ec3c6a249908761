//! Touch input - every finger is its own pointer

use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::prelude::*;
use flipbook::{BookController, InputEvent, PointerId};
use folio_scene::to_book_vec2;

use super::timestamp_ms;

/// Map one touch phase to the controller's pointer events
pub fn touch_event(phase: TouchPhase, id: u64, position: Vec2, time_ms: f64) -> InputEvent {
    let pointer = PointerId::Touch(id);
    let position = to_book_vec2(position);
    match phase {
        TouchPhase::Started => InputEvent::PointerDown {
            pointer,
            position,
            time_ms,
        },
        TouchPhase::Moved => InputEvent::PointerMove {
            pointer,
            position,
            time_ms,
        },
        TouchPhase::Ended => InputEvent::PointerUp {
            pointer,
            position,
            time_ms,
        },
        TouchPhase::Canceled => InputEvent::PointerCancel { pointer },
    }
}

pub fn forward_touches(
    mut touch_events: MessageReader<TouchInput>,
    time: Res<Time<Real>>,
    mut controller: NonSendMut<BookController>,
) {
    let time_ms = timestamp_ms(&time);
    for event in touch_events.read() {
        controller.push_input(touch_event(event.phase, event.id, event.position, time_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_phases() {
        let position = Vec2::new(12.0, 34.0);
        assert_eq!(
            touch_event(TouchPhase::Started, 3, position, 5.0),
            InputEvent::PointerDown {
                pointer: PointerId::Touch(3),
                position: to_book_vec2(position),
                time_ms: 5.0,
            }
        );
        assert_eq!(
            touch_event(TouchPhase::Canceled, 3, position, 6.0),
            InputEvent::PointerCancel {
                pointer: PointerId::Touch(3)
            }
        );
        assert!(matches!(
            touch_event(TouchPhase::Ended, 4, position, 7.0),
            InputEvent::PointerUp {
                pointer: PointerId::Touch(4),
                ..
            }
        ));
    }
}
