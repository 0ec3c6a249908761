//! Messages in and out of the book
//!
//! Controller callbacks are not `Send`, so they push into a shared
//! [`BookOutbox`] and a system republishes the contents as Bevy messages.

use std::cell::RefCell;
use std::rc::Rc;

use bevy::ecs::message::Message;
use bevy::prelude::*;
use flipbook::{BookController, FlipbookState, PageChange, Transition, TurnDirection};
use folio_config::LayoutMode;

/// A new page became current
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChanged {
    pub previous: usize,
    pub current: usize,
    /// `None` when the page was set directly rather than turned
    pub direction: Option<TurnDirection>,
}

/// The interaction state machine moved
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookStateChanged {
    pub from: FlipbookState,
    pub to: FlipbookState,
}

/// Requests from the rest of the app
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum BookCommand {
    TurnForward,
    TurnBackward,
    GoToPage(usize),
    SetLayout(LayoutMode),
    SetPageDimensions { width: f32, height: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Notice {
    Page(PageChange),
    State(Transition),
}

/// Notifications collected from controller callbacks, in emission order
#[derive(Debug, Default, Clone)]
pub struct BookOutbox {
    notices: Rc<RefCell<Vec<Notice>>>,
}

impl BookOutbox {
    /// Route the controller's callbacks into this outbox
    pub fn connect(&self, controller: &mut BookController) {
        let pages = self.notices.clone();
        controller.on_page_changed(move |change| pages.borrow_mut().push(Notice::Page(change)));
        let states = self.notices.clone();
        controller.on_state_changed(move |transition| {
            states.borrow_mut().push(Notice::State(transition))
        });
    }

    fn push(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }

    fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.borrow_mut())
    }

    pub fn is_empty(&self) -> bool {
        self.notices.borrow().is_empty()
    }
}

pub(crate) fn connect_outbox(
    outbox: NonSend<BookOutbox>,
    mut controller: NonSendMut<BookController>,
) {
    outbox.connect(&mut controller);
}

pub(crate) fn apply_commands(
    mut commands: MessageReader<BookCommand>,
    mut controller: NonSendMut<BookController>,
) {
    for command in commands.read() {
        match *command {
            BookCommand::TurnForward => {
                controller.turn_page_forward();
            }
            BookCommand::TurnBackward => {
                controller.turn_page_backward();
            }
            BookCommand::GoToPage(page) => {
                controller.set_current_page(page);
            }
            BookCommand::SetLayout(layout) => controller.set_layout(layout),
            BookCommand::SetPageDimensions { width, height } => {
                controller.set_page_dimensions(width, height)
            }
        }
    }
}

pub(crate) fn forward_notices(
    outbox: NonSend<BookOutbox>,
    mut pages: MessageWriter<PageChanged>,
    mut states: MessageWriter<BookStateChanged>,
) {
    for notice in outbox.drain() {
        match notice {
            Notice::Page(change) => {
                pages.write(PageChanged {
                    previous: change.previous,
                    current: change.current,
                    direction: change.direction,
                });
            }
            Notice::State(transition) => {
                states.write(BookStateChanged {
                    from: transition.from,
                    to: transition.to,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::message::Messages;

    use super::*;

    #[test]
    fn test_outbox_keeps_order_and_drains() {
        let outbox = BookOutbox::default();
        let shared = outbox.clone();
        shared.push(Notice::State(Transition {
            from: FlipbookState::AnimatingForward,
            to: FlipbookState::Idle,
        }));
        shared.push(Notice::Page(PageChange {
            previous: 0,
            current: 2,
            direction: Some(TurnDirection::Forward),
        }));

        let notices = outbox.drain();
        assert_eq!(notices.len(), 2);
        assert!(matches!(notices[0], Notice::State(_)));
        assert!(matches!(notices[1], Notice::Page(change) if change.current == 2));
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_notices_become_messages() {
        let mut app = App::new();
        app.add_message::<PageChanged>()
            .add_message::<BookStateChanged>()
            .insert_non_send_resource(BookOutbox::default())
            .add_systems(Update, forward_notices);

        app.world()
            .non_send_resource::<BookOutbox>()
            .push(Notice::Page(PageChange {
                previous: 4,
                current: 6,
                direction: None,
            }));
        app.update();

        let messages = app.world().resource::<Messages<PageChanged>>();
        let mut cursor = messages.get_cursor();
        let changes: Vec<_> = cursor.read(messages).copied().collect();
        assert_eq!(
            changes,
            vec![PageChanged {
                previous: 4,
                current: 6,
                direction: None,
            }]
        );
    }
}
