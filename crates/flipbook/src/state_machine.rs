//! Interaction state machine
//!
//! Owns the interaction session (state, drag data, page index, page count and
//! step) and enforces which transitions are legal. It does not know about
//! pointers, physics or textures; the controller feeds it decisions and
//! reacts to the transitions it returns.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::COMPLETE_THRESHOLD;
use crate::types::{Side, TurnDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlipbookState {
    #[default]
    Idle,
    HoverCornerLeft,
    HoverCornerRight,
    DraggingForward,
    DraggingBackward,
    AnimatingForward,
    AnimatingBackward,
    Settling,
}

impl FlipbookState {
    pub fn is_hovering(self) -> bool {
        matches!(self, Self::HoverCornerLeft | Self::HoverCornerRight)
    }

    pub fn is_dragging(self) -> bool {
        matches!(self, Self::DraggingForward | Self::DraggingBackward)
    }

    /// Physics owns the turning sheet
    pub fn is_in_motion(self) -> bool {
        matches!(
            self,
            Self::AnimatingForward | Self::AnimatingBackward | Self::Settling
        )
    }

    /// A new gesture may begin
    pub fn accepts_gesture(self) -> bool {
        self == Self::Idle || self.is_hovering()
    }

    pub(crate) fn hover(side: Side) -> Self {
        match side {
            Side::Left => Self::HoverCornerLeft,
            Side::Right => Self::HoverCornerRight,
        }
    }

    fn dragging(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Forward => Self::DraggingForward,
            TurnDirection::Backward => Self::DraggingBackward,
        }
    }

    fn animating(direction: TurnDirection) -> Self {
        match direction {
            TurnDirection::Forward => Self::AnimatingForward,
            TurnDirection::Backward => Self::AnimatingBackward,
        }
    }
}

/// Live drag gesture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragData {
    /// Pointer position where the drag started, in screen pixels
    pub start: Vec2,
    /// Latest pointer position
    pub current: Vec2,
    /// Turn progress in `[0, 1]`
    pub progress: f32,
    pub direction: TurnDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: FlipbookState,
    pub to: FlipbookState,
}

/// Outcome of releasing a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseDecision {
    pub should_complete: bool,
    pub direction: TurnDirection,
    pub transition: Transition,
}

/// Outcome of physics coming to rest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnOutcome {
    pub direction: TurnDirection,
    pub completed: bool,
    pub previous_page: usize,
    pub current_page: usize,
    pub transition: Transition,
}

#[derive(Debug, Clone)]
pub struct StateMachine {
    state: FlipbookState,
    drag: Option<DragData>,
    /// Direction of the turn in flight, kept through settling
    active: Option<TurnDirection>,
    current_page: usize,
    total_pages: usize,
    page_step: usize,
}

impl StateMachine {
    pub fn new(total_pages: usize, page_step: usize) -> Self {
        Self {
            state: FlipbookState::Idle,
            drag: None,
            active: None,
            current_page: 0,
            total_pages,
            page_step: page_step.max(1),
        }
    }

    pub fn state(&self) -> FlipbookState {
        self.state
    }

    pub fn drag(&self) -> Option<&DragData> {
        self.drag.as_ref()
    }

    /// Direction of the drag or animation in flight
    pub fn active_direction(&self) -> Option<TurnDirection> {
        self.active
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn page_step(&self) -> usize {
        self.page_step
    }

    pub fn can_turn_forward(&self) -> bool {
        self.current_page + self.page_step < self.total_pages
    }

    pub fn can_turn_backward(&self) -> bool {
        self.current_page >= self.page_step
    }

    pub fn can_turn(&self, direction: TurnDirection) -> bool {
        match direction {
            TurnDirection::Forward => self.can_turn_forward(),
            TurnDirection::Backward => self.can_turn_backward(),
        }
    }

    fn transition(&mut self, to: FlipbookState) -> Transition {
        let from = self.state;
        self.state = to;
        info!("Flipbook state {:?} -> {:?}", from, to);
        Transition { from, to }
    }

    /// Pointer entered a turnable zone on `side`. Only entered from idle;
    /// moving between corners leaves the first hover before the second.
    pub fn hover(&mut self, side: Side) -> Option<Transition> {
        if self.state != FlipbookState::Idle || !self.can_turn(side.turn_direction()) {
            return None;
        }
        Some(self.transition(FlipbookState::hover(side)))
    }

    /// Pointer left every turnable zone
    pub fn leave_hover(&mut self) -> Option<Transition> {
        if !self.state.is_hovering() {
            return None;
        }
        Some(self.transition(FlipbookState::Idle))
    }

    /// Begin a drag at `point`. Rejected unless idle or hovering and the
    /// direction is turnable.
    pub fn start_drag(&mut self, direction: TurnDirection, point: Vec2) -> Option<Transition> {
        if !self.state.accepts_gesture() || !self.can_turn(direction) {
            return None;
        }
        self.drag = Some(DragData {
            start: point,
            current: point,
            progress: 0.0,
            direction,
        });
        self.active = Some(direction);
        Some(self.transition(FlipbookState::dragging(direction)))
    }

    /// Record the latest pointer position and progress of the drag
    pub fn update_drag(&mut self, point: Vec2, progress: f32) -> bool {
        match self.drag.as_mut() {
            Some(drag) if self.state.is_dragging() => {
                drag.current = point;
                drag.progress = progress.clamp(0.0, 1.0);
                true
            }
            _ => false,
        }
    }

    /// Release the drag.
    ///
    /// `velocity` is the release speed in px/ms, positive in the turn
    /// direction. Completes when progress is strictly past the halfway mark
    /// or the flick is faster than `flick_threshold`.
    pub fn end_drag(&mut self, velocity: f32, flick_threshold: f32) -> Option<ReleaseDecision> {
        if !self.state.is_dragging() {
            return None;
        }
        let drag = self.drag?;
        let should_complete = drag.progress > COMPLETE_THRESHOLD || velocity > flick_threshold;
        let to = if should_complete {
            FlipbookState::animating(drag.direction)
        } else {
            FlipbookState::Settling
        };
        let transition = self.transition(to);
        Some(ReleaseDecision {
            should_complete,
            direction: drag.direction,
            transition,
        })
    }

    /// Programmatic turn straight into animation
    pub fn start_animation(&mut self, direction: TurnDirection) -> Option<Transition> {
        if !self.state.accepts_gesture() || !self.can_turn(direction) {
            return None;
        }
        self.drag = None;
        self.active = Some(direction);
        Some(self.transition(FlipbookState::animating(direction)))
    }

    /// Physics came to rest at `final_progress`.
    ///
    /// The resting progress alone decides whether the page changes, for both
    /// animating and settling states.
    pub fn finish(&mut self, final_progress: f32) -> Option<TurnOutcome> {
        if !self.state.is_in_motion() {
            return None;
        }
        let direction = self.active?;
        let previous_page = self.current_page;
        let completed = final_progress > COMPLETE_THRESHOLD;
        if completed {
            self.current_page = match direction {
                TurnDirection::Forward => self.current_page + self.page_step,
                TurnDirection::Backward => self.current_page.saturating_sub(self.page_step),
            };
        }
        self.drag = None;
        self.active = None;
        let transition = self.transition(FlipbookState::Idle);
        Some(TurnOutcome {
            direction,
            completed,
            previous_page,
            current_page: self.current_page,
            transition,
        })
    }

    /// Abort whatever is in flight and return to idle
    pub fn reset(&mut self) -> Option<Transition> {
        self.drag = None;
        self.active = None;
        (self.state != FlipbookState::Idle).then(|| self.transition(FlipbookState::Idle))
    }

    /// Align `page` to a spread anchor inside the document
    pub fn normalize_page(&self, page: usize) -> usize {
        let last = self.total_pages.saturating_sub(1);
        let page = page.min(last);
        page - page % self.page_step
    }

    pub fn set_current_page(&mut self, page: usize) -> usize {
        self.current_page = self.normalize_page(page);
        self.current_page
    }

    pub fn set_total_pages(&mut self, total_pages: usize) {
        self.total_pages = total_pages;
        self.current_page = self.normalize_page(self.current_page);
    }

    pub fn set_page_step(&mut self, page_step: usize) {
        self.page_step = page_step.max(1);
        self.current_page = self.normalize_page(self.current_page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let machine = StateMachine::new(10, 2);
        assert_eq!(machine.state(), FlipbookState::Idle);
        assert!(machine.can_turn_forward());
        assert!(!machine.can_turn_backward());
    }

    #[test]
    fn test_start_drag_rejected_when_not_turnable() {
        let mut machine = StateMachine::new(10, 2);
        machine.set_current_page(8);
        assert!(!machine.can_turn_forward());
        assert!(machine.start_drag(TurnDirection::Forward, Vec2::ZERO).is_none());
        assert_eq!(machine.state(), FlipbookState::Idle);
    }

    #[test]
    fn test_second_drag_has_no_effect() {
        let mut machine = StateMachine::new(10, 2);
        machine.set_current_page(4);
        assert!(machine.start_drag(TurnDirection::Forward, Vec2::new(100.0, 0.0)).is_some());
        assert!(machine.start_drag(TurnDirection::Backward, Vec2::ZERO).is_none());
        assert_eq!(machine.state(), FlipbookState::DraggingForward);
        assert_eq!(machine.drag().unwrap().start, Vec2::new(100.0, 0.0));
    }

    #[test]
    fn test_release_threshold() {
        let mut machine = StateMachine::new(10, 2);
        machine.start_drag(TurnDirection::Forward, Vec2::ZERO);
        machine.update_drag(Vec2::ZERO, 0.49);
        let decision = machine.end_drag(0.0, 0.35).unwrap();
        assert!(!decision.should_complete);
        assert_eq!(machine.state(), FlipbookState::Settling);

        let mut machine = StateMachine::new(10, 2);
        machine.start_drag(TurnDirection::Forward, Vec2::ZERO);
        machine.update_drag(Vec2::ZERO, 0.51);
        let decision = machine.end_drag(0.0, 0.35).unwrap();
        assert!(decision.should_complete);
        assert_eq!(machine.state(), FlipbookState::AnimatingForward);
    }

    #[test]
    fn test_exact_half_does_not_complete() {
        let mut machine = StateMachine::new(10, 2);
        machine.start_drag(TurnDirection::Forward, Vec2::ZERO);
        machine.update_drag(Vec2::ZERO, 0.5);
        assert!(!machine.end_drag(0.0, 0.35).unwrap().should_complete);
    }

    #[test]
    fn test_flick_completes_early_release() {
        let mut machine = StateMachine::new(10, 2);
        machine.start_drag(TurnDirection::Forward, Vec2::ZERO);
        machine.update_drag(Vec2::ZERO, 0.1);
        let decision = machine.end_drag(0.8, 0.35).unwrap();
        assert!(decision.should_complete);
    }

    #[test]
    fn test_hover_respects_bounds() {
        let mut machine = StateMachine::new(10, 2);
        assert!(machine.hover(Side::Left).is_none());
        assert!(machine.hover(Side::Right).is_some());
        assert_eq!(machine.state(), FlipbookState::HoverCornerRight);
        assert!(machine.hover(Side::Right).is_none());
        assert!(machine.leave_hover().is_some());
        assert_eq!(machine.state(), FlipbookState::Idle);
    }

    #[test]
    fn test_corner_to_corner_goes_through_idle() {
        let mut machine = StateMachine::new(10, 2);
        machine.set_current_page(4);
        assert!(machine.hover(Side::Right).is_some());
        assert!(machine.hover(Side::Left).is_none());
        assert_eq!(machine.state(), FlipbookState::HoverCornerRight);

        let leave = machine.leave_hover().unwrap();
        assert_eq!(leave.to, FlipbookState::Idle);
        let enter = machine.hover(Side::Left).unwrap();
        assert_eq!(enter.from, FlipbookState::Idle);
        assert_eq!(enter.to, FlipbookState::HoverCornerLeft);
    }

    #[test]
    fn test_settling_finish_uses_resting_progress() {
        let mut machine = StateMachine::new(10, 2);
        machine.start_drag(TurnDirection::Forward, Vec2::ZERO);
        machine.update_drag(Vec2::ZERO, 0.2);
        machine.end_drag(0.0, 0.35);

        let outcome = machine.finish(0.0).unwrap();
        assert!(!outcome.completed);
        assert_eq!(machine.current_page(), 0);
        assert_eq!(machine.state(), FlipbookState::Idle);
        assert!(machine.drag().is_none());
    }

    #[test]
    fn test_animation_finish_advances_by_step() {
        let mut machine = StateMachine::new(10, 2);
        machine.start_animation(TurnDirection::Forward).unwrap();
        assert!(machine.start_drag(TurnDirection::Forward, Vec2::ZERO).is_none());

        let outcome = machine.finish(1.0).unwrap();
        assert!(outcome.completed);
        assert_eq!(outcome.previous_page, 0);
        assert_eq!(machine.current_page(), 2);
        assert!(machine.can_turn_backward());
    }

    #[test]
    fn test_one_page_book_is_locked() {
        let mut machine = StateMachine::new(1, 1);
        assert!(!machine.can_turn_forward());
        assert!(!machine.can_turn_backward());
        assert!(machine.start_animation(TurnDirection::Forward).is_none());
        assert_eq!(machine.state(), FlipbookState::Idle);
    }

    #[test]
    fn test_page_normalization() {
        let mut machine = StateMachine::new(9, 2);
        assert_eq!(machine.set_current_page(5), 4);
        assert_eq!(machine.set_current_page(40), 8);

        machine.set_page_step(1);
        assert_eq!(machine.set_current_page(5), 5);

        machine.set_total_pages(3);
        assert_eq!(machine.current_page(), 2);
    }
}
