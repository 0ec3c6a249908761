//! Page-turn controller
//!
//! Binds the state machine, physics, sheets and texture pipeline to input.
//! The host pushes [`InputEvent`]s as they happen and calls
//! [`BookController::update`] once per frame; within an update, queued input
//! is applied first, then physics is stepped, then sheet geometry is
//! reshaped, so a frame never shows geometry out of step with physics.

mod drag;

use std::sync::Arc;

use folio_config::{BookConfig, FeelProfile, LayoutMode};
use glam::Vec2;
use tokio::runtime::Handle;
use tracing::{debug, info};

pub use drag::{progress_velocity, raw_progress, shape_progress, smooth_toward};

use crate::hit_test::{PageHit, hit_test};
use crate::input::{BookKey, InputEvent, InputQueue, PointerId, VelocityTracker};
use crate::physics::PagePhysics;
use crate::raycast::Face;
use crate::scene::SceneConfig;
use crate::sheet::{Sheet, curve_angle};
use crate::state_machine::{FlipbookState, StateMachine, Transition};
use crate::texture::{PageSource, TexturePipeline, TextureSlot};
use crate::types::{Side, Spread, TurnDirection, TurnPlan};

/// The four sheets a book needs on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetRole {
    Left,
    Right,
    UnderLeft,
    UnderRight,
}

impl SheetRole {
    pub const ALL: [SheetRole; 4] = [
        SheetRole::Left,
        SheetRole::Right,
        SheetRole::UnderLeft,
        SheetRole::UnderRight,
    ];
}

/// Notification sent when a new page becomes current
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub previous: usize,
    pub current: usize,
    /// Turn that produced the change; `None` for direct jumps
    pub direction: Option<TurnDirection>,
}

pub type PageChangedCallback = Box<dyn FnMut(PageChange)>;
pub type StateChangedCallback = Box<dyn FnMut(Transition)>;

#[derive(Debug, Clone)]
struct Sheets {
    left: Sheet,
    right: Sheet,
    under_left: Sheet,
    under_right: Sheet,
}

impl Sheets {
    fn get(&self, role: SheetRole) -> &Sheet {
        match role {
            SheetRole::Left => &self.left,
            SheetRole::Right => &self.right,
            SheetRole::UnderLeft => &self.under_left,
            SheetRole::UnderRight => &self.under_right,
        }
    }

    fn get_mut(&mut self, role: SheetRole) -> &mut Sheet {
        match role {
            SheetRole::Left => &mut self.left,
            SheetRole::Right => &mut self.right,
            SheetRole::UnderLeft => &mut self.under_left,
            SheetRole::UnderRight => &mut self.under_right,
        }
    }

    fn turning_mut(&mut self, direction: TurnDirection) -> &mut Sheet {
        match direction.origin_side() {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

pub struct BookController {
    config: BookConfig,
    profile: FeelProfile,
    scene: SceneConfig,
    page_pixel_width: f32,
    machine: StateMachine,
    physics: PagePhysics,
    sheets: Sheets,
    pipeline: TexturePipeline,
    input: InputQueue,
    velocity: VelocityTracker,
    active_pointer: Option<PointerId>,
    plan: Option<TurnPlan>,
    /// Shaped pointer progress the drag is smoothing toward
    drag_target: f32,
    on_page_changed: Option<PageChangedCallback>,
    on_state_changed: Option<StateChangedCallback>,
}

impl BookController {
    pub fn new(
        config: BookConfig,
        source: Arc<dyn PageSource>,
        runtime: Handle,
        document_id: impl Into<Arc<str>>,
        total_pages: usize,
    ) -> Self {
        let profile = config.profile();
        let mut physics = PagePhysics::new(profile.spring_k, profile.damping);
        physics.rest_threshold = config.rest_threshold;
        physics.max_dt = config.max_dt;

        let under = |side| {
            let mut sheet = Sheet::new(side, &config.page);
            sheet.set_stack_offset(-config.page.thickness);
            sheet
        };
        let sheets = Sheets {
            left: Sheet::new(Side::Left, &config.page),
            right: Sheet::new(Side::Right, &config.page),
            under_left: under(Side::Left),
            under_right: under(Side::Right),
        };

        let pipeline = TexturePipeline::new(
            source,
            runtime,
            config.textures.clone(),
            document_id,
            config.layout,
            total_pages,
        );

        let scene = SceneConfig::default();
        let mut controller = Self {
            machine: StateMachine::new(total_pages, config.layout.page_step()),
            page_pixel_width: scene.page_pixel_width(config.page.width),
            scene,
            profile,
            physics,
            sheets,
            pipeline,
            input: InputQueue::default(),
            velocity: VelocityTracker::default(),
            active_pointer: None,
            plan: None,
            drag_target: 0.0,
            on_page_changed: None,
            on_state_changed: None,
            config,
        };
        controller.pipeline.set_page_pixel_width(controller.page_pixel_width);
        controller.show_current_spread();
        info!(
            "Book controller ready: {} pages, {:?} layout, {:?} feel",
            total_pages, controller.config.layout, controller.config.feel
        );
        controller
    }

    pub fn on_page_changed(&mut self, callback: impl FnMut(PageChange) + 'static) {
        self.on_page_changed = Some(Box::new(callback));
    }

    pub fn on_state_changed(&mut self, callback: impl FnMut(Transition) + 'static) {
        self.on_state_changed = Some(Box::new(callback));
    }

    // Queries

    pub fn state(&self) -> FlipbookState {
        self.machine.state()
    }

    pub fn current_page(&self) -> usize {
        self.machine.current_page()
    }

    pub fn total_pages(&self) -> usize {
        self.machine.total_pages()
    }

    pub fn page_step(&self) -> usize {
        self.machine.page_step()
    }

    pub fn can_turn_forward(&self) -> bool {
        self.machine.can_turn_forward()
    }

    pub fn can_turn_backward(&self) -> bool {
        self.machine.can_turn_backward()
    }

    /// Turn progress of the sheet in flight, 0 when none
    pub fn progress(&self) -> f32 {
        self.physics.position()
    }

    pub fn physics(&self) -> &PagePhysics {
        &self.physics
    }

    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    pub fn scene(&self) -> &SceneConfig {
        &self.scene
    }

    pub fn page_pixel_width(&self) -> f32 {
        self.page_pixel_width
    }

    pub fn plan(&self) -> Option<&TurnPlan> {
        self.plan.as_ref()
    }

    pub fn sheet(&self, role: SheetRole) -> &Sheet {
        self.sheets.get(role)
    }

    pub fn pipeline(&self) -> &TexturePipeline {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut TexturePipeline {
        &mut self.pipeline
    }

    /// Whether a sheet has anything to draw this frame
    pub fn sheet_visible(&self, role: SheetRole) -> bool {
        let sheet = self.sheets.get(role);
        match role {
            SheetRole::Left | SheetRole::Right => {
                sheet.front_page().is_some() || sheet.back_page().is_some() || sheet.is_animating()
            }
            SheetRole::UnderLeft | SheetRole::UnderRight => {
                self.plan.is_some() && sheet.front_page().is_some()
            }
        }
    }

    /// Texture slot feeding one face of one sheet
    pub fn face_slot(&self, role: SheetRole, face: Face) -> Option<TextureSlot> {
        let turning = self.plan.map(|plan| plan.direction.origin_side());
        match (role, face) {
            (SheetRole::Left, Face::Front) => Some(TextureSlot::SpreadLeft),
            (SheetRole::Right, Face::Front) => Some(TextureSlot::SpreadRight),
            (SheetRole::Left, Face::Back) => (turning == Some(Side::Left)).then_some(TextureSlot::TurningBack),
            (SheetRole::Right, Face::Back) => (turning == Some(Side::Right)).then_some(TextureSlot::TurningBack),
            (SheetRole::UnderLeft, Face::Front) => Some(TextureSlot::UnderLeft),
            (SheetRole::UnderRight, Face::Front) => Some(TextureSlot::UnderRight),
            (SheetRole::UnderLeft | SheetRole::UnderRight, Face::Back) => None,
        }
    }

    // Host-facing commands

    pub fn push_input(&mut self, event: InputEvent) {
        self.input.push(event);
    }

    pub fn turn_page_forward(&mut self) -> bool {
        self.turn_page(TurnDirection::Forward)
    }

    pub fn turn_page_backward(&mut self) -> bool {
        self.turn_page(TurnDirection::Backward)
    }

    /// Programmatic turn with a scripted release velocity
    pub fn turn_page(&mut self, direction: TurnDirection) -> bool {
        if !self.machine.state().accepts_gesture() || !self.machine.can_turn(direction) {
            return false;
        }
        let Some(plan) = self.turn_plan(direction) else {
            return false;
        };
        let Some(transition) = self.machine.start_animation(direction) else {
            return false;
        };
        self.begin_turn(plan);
        self.physics.reset();
        self.physics.release(1.0, self.config.programmatic_velocity);
        self.emit_transition(transition);
        true
    }

    pub fn set_page_dimensions(&mut self, width: f32, height: f32) {
        if !(width > 0.0 && height > 0.0) {
            return;
        }
        self.config.page.width = width;
        self.config.page.height = height;
        for role in SheetRole::ALL {
            self.sheets.get_mut(role).set_size(width, height);
        }
        self.refresh_page_pixel_width();
    }

    pub fn set_total_pages(&mut self, total_pages: usize) {
        self.cancel_turn();
        let previous = self.machine.current_page();
        self.machine.set_total_pages(total_pages);
        self.pipeline.set_total_pages(total_pages);
        self.show_current_spread();
        self.notify_jump(previous);
    }

    /// Jump straight to `page`; returns the anchor actually shown
    pub fn set_current_page(&mut self, page: usize) -> usize {
        self.cancel_turn();
        let previous = self.machine.current_page();
        let current = self.machine.set_current_page(page);
        self.show_current_spread();
        self.notify_jump(previous);
        current
    }

    pub fn set_page_step(&mut self, step: usize) {
        self.set_layout(LayoutMode::from_page_step(step));
    }

    pub fn set_layout(&mut self, layout: LayoutMode) {
        if self.config.layout == layout {
            return;
        }
        self.cancel_turn();
        let previous = self.machine.current_page();
        self.config.layout = layout;
        self.machine.set_page_step(layout.page_step());
        self.pipeline.set_layout(layout);
        self.show_current_spread();
        self.notify_jump(previous);
    }

    /// Load another document and start over at page 0
    pub fn set_document(&mut self, document_id: impl Into<Arc<str>>, total_pages: usize) {
        self.cancel_turn();
        let previous = self.machine.current_page();
        self.machine.set_total_pages(total_pages);
        self.machine.set_current_page(0);
        self.pipeline.set_document(document_id, total_pages);
        self.show_current_spread();
        self.notify_jump(previous);
    }

    /// Replace camera and viewport, typically after a resize
    pub fn set_scene(&mut self, scene: SceneConfig) {
        if self.scene == scene {
            return;
        }
        self.scene = scene;
        self.refresh_page_pixel_width();
    }

    /// Advance one frame
    pub fn update(&mut self, dt: f32) {
        self.pipeline.poll();

        let events: Vec<InputEvent> = self.input.drain().collect();
        for event in events {
            self.handle_event(event);
        }

        self.advance(dt);
        self.reshape();
    }

    /// Apply texture completions until nothing is in flight
    pub async fn wait_for_textures(&mut self) {
        self.pipeline.wait_idle().await;
    }

    // Input

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerMove {
                pointer,
                position,
                time_ms,
            } => self.pointer_moved(pointer, position, time_ms),
            InputEvent::PointerDown {
                pointer,
                position,
                time_ms,
            } => self.pointer_pressed(pointer, position, time_ms),
            InputEvent::PointerUp {
                pointer,
                position,
                time_ms,
            } => {
                if self.is_active_pointer(pointer) {
                    self.velocity.record(time_ms, position);
                    self.track_pointer(position);
                    self.release_drag(self.turn_velocity());
                }
            }
            InputEvent::PointerCancel { pointer } => {
                if self.is_active_pointer(pointer) {
                    self.release_drag(0.0);
                }
            }
            InputEvent::PointerLeave => {
                if self.machine.state().is_dragging() {
                    self.release_drag(0.0);
                } else if let Some(transition) = self.machine.leave_hover() {
                    self.emit_transition(transition);
                }
            }
            InputEvent::Key(BookKey::ArrowRight | BookKey::Space) => {
                self.turn_page_forward();
            }
            InputEvent::Key(BookKey::ArrowLeft) => {
                self.turn_page_backward();
            }
        }
    }

    fn is_active_pointer(&self, pointer: PointerId) -> bool {
        self.machine.state().is_dragging() && self.active_pointer == Some(pointer)
    }

    fn hit(&self, position: Vec2) -> Option<PageHit> {
        let candidates = [&self.sheets.right, &self.sheets.left]
            .into_iter()
            .filter(|sheet| sheet.front_page().is_some());
        hit_test(position, &self.scene, candidates, &self.config.hit_zones)
    }

    fn turn_plan(&self, direction: TurnDirection) -> Option<TurnPlan> {
        TurnPlan::new(
            self.machine.current_page(),
            direction,
            self.config.layout,
            self.machine.total_pages(),
        )
    }

    fn pointer_moved(&mut self, pointer: PointerId, position: Vec2, time_ms: f64) {
        let state = self.machine.state();
        if state.is_dragging() {
            if self.active_pointer == Some(pointer) {
                self.velocity.record(time_ms, position);
                self.track_pointer(position);
            }
            return;
        }
        if !state.accepts_gesture() {
            return;
        }

        let hover_side = self
            .hit(position)
            .map(|hit| hit.side)
            .filter(|side| self.machine.can_turn(side.turn_direction()));
        match hover_side {
            Some(side) => {
                if state.is_hovering() && state != FlipbookState::hover(side) {
                    if let Some(transition) = self.machine.leave_hover() {
                        self.emit_transition(transition);
                    }
                }
                if let Some(transition) = self.machine.hover(side) {
                    if let Some(plan) = self.turn_plan(side.turn_direction()) {
                        self.pipeline.warm_turn(&plan);
                    }
                    self.emit_transition(transition);
                }
            }
            None => {
                if let Some(transition) = self.machine.leave_hover() {
                    self.emit_transition(transition);
                }
            }
        }
    }

    fn pointer_pressed(&mut self, pointer: PointerId, position: Vec2, time_ms: f64) {
        if !self.machine.state().accepts_gesture() || self.active_pointer.is_some() {
            return;
        }
        let Some(hit) = self.hit(position) else {
            return;
        };
        let direction = hit.side.turn_direction();
        if !self.machine.can_turn(direction) {
            return;
        }
        let Some(plan) = self.turn_plan(direction) else {
            return;
        };

        if self.config.require_textures_before_drag && !self.pipeline.is_ready(plan.revealed_pages()) {
            debug!("Faces for {:?} turn not loaded yet, drag refused", direction);
            self.pipeline.warm_turn(&plan);
            return;
        }

        let Some(transition) = self.machine.start_drag(direction, position) else {
            return;
        };
        self.active_pointer = Some(pointer);
        self.velocity.reset();
        self.velocity.record(time_ms, position);
        self.drag_target = 0.0;
        self.physics.reset();
        self.begin_turn(plan);
        self.emit_transition(transition);
    }

    /// Recompute the shaped drag target from the pointer position
    fn track_pointer(&mut self, position: Vec2) {
        let Some(drag) = self.machine.drag().copied() else {
            return;
        };
        let raw = raw_progress(drag.direction, position.x - drag.start.x, self.page_pixel_width);
        self.drag_target = shape_progress(raw, &self.profile);
        self.machine.update_drag(position, drag.progress);
    }

    /// Release velocity in px/ms, positive in the turn direction
    fn turn_velocity(&self) -> f32 {
        match self.machine.active_direction() {
            Some(direction) => self.velocity.velocity().x * direction.drag_sign(),
            None => 0.0,
        }
    }

    /// Release the drag. The decision reads the pointer's shaped progress,
    /// not the smoothed value shown on screen.
    fn release_drag(&mut self, velocity: f32) {
        if let Some(drag) = self.machine.drag().copied() {
            self.machine.update_drag(drag.current, self.drag_target);
        }
        let Some(decision) = self.machine.end_drag(velocity, self.profile.flick_velocity) else {
            return;
        };
        let target = if decision.should_complete { 1.0 } else { 0.0 };
        self.physics
            .release(target, progress_velocity(velocity, self.page_pixel_width));
        self.active_pointer = None;
        self.velocity.reset();
        debug!(
            "Released {:?} turn at {:.2} (velocity {:.2} px/ms), complete: {}",
            decision.direction,
            self.physics.position(),
            velocity,
            decision.should_complete
        );
        self.emit_transition(decision.transition);
    }

    // Frame stepping

    fn advance(&mut self, dt: f32) {
        let state = self.machine.state();
        if state.is_dragging() {
            let current = self.physics.position();
            let next = smooth_toward(current, self.drag_target, self.profile.smoothing_rate, dt);
            self.physics.set_position(next);
            if let Some(drag) = self.machine.drag().copied() {
                self.machine.update_drag(drag.current, next);
            }
        } else if state.is_in_motion() {
            self.physics.step(dt);
            if self.physics.is_at_rest() {
                self.physics.settle();
                self.finish_turn();
            }
        }
    }

    fn reshape(&mut self) {
        let Some(plan) = self.plan else {
            return;
        };
        let progress = self.physics.position();
        let angle = match plan.direction {
            TurnDirection::Forward => progress * 180.0,
            TurnDirection::Backward => 180.0 - progress * 180.0,
        };
        let curve = curve_angle(plan.direction == TurnDirection::Forward, angle);
        let hide_front = progress > self.config.hide_front_after;
        let sheet = self.sheets.turning_mut(plan.direction);
        sheet.set_angle(angle, curve);
        sheet.set_front_visible(!hide_front);
    }

    // Turn lifecycle

    fn is_cover(&self, page: Option<usize>) -> bool {
        let last = self.machine.total_pages().saturating_sub(1);
        self.config.page.hard_covers && page.is_some_and(|page| page == 0 || page == last)
    }

    fn assign_sheet(&mut self, role: SheetRole, front: Option<usize>, back: Option<usize>) {
        let hard = self.is_cover(front) || self.is_cover(back);
        let sheet = self.sheets.get_mut(role);
        sheet.set_pages(front, back);
        sheet.set_hard(hard);
    }

    fn begin_turn(&mut self, plan: TurnPlan) {
        let turning = match plan.direction {
            TurnDirection::Forward => SheetRole::Right,
            TurnDirection::Backward => SheetRole::Left,
        };
        self.assign_sheet(turning, plan.turning_front, plan.turning_back);
        self.assign_sheet(SheetRole::UnderLeft, plan.under.left, None);
        self.assign_sheet(SheetRole::UnderRight, plan.under.right, None);

        let sheet = self.sheets.get_mut(turning);
        sheet.begin_animation();
        sheet.set_front_visible(true);

        self.pipeline.prepare_turn(&plan);
        self.plan = Some(plan);
    }

    fn finish_turn(&mut self) {
        let Some(outcome) = self.machine.finish(self.physics.position()) else {
            return;
        };
        self.end_turn();
        self.show_current_spread();
        self.emit_transition(outcome.transition);

        if outcome.completed {
            info!("Page {} -> {}", outcome.previous_page, outcome.current_page);
            self.emit_page_change(PageChange {
                previous: outcome.previous_page,
                current: outcome.current_page,
                direction: Some(outcome.direction),
            });
        }
    }

    /// Put every sheet back at rest and drop the under spread
    fn end_turn(&mut self) {
        if let Some(plan) = self.plan.take() {
            self.sheets.turning_mut(plan.direction).end_animation();
            self.pipeline.release_under();
        }
        for role in SheetRole::ALL {
            self.sheets.get_mut(role).reset_to_rest();
        }
        self.physics.reset();
        self.drag_target = 0.0;
        self.active_pointer = None;
        self.velocity.reset();
    }

    /// Abort a drag or animation without changing page
    fn cancel_turn(&mut self) {
        if let Some(transition) = self.machine.reset() {
            self.emit_transition(transition);
        }
        self.end_turn();
    }

    fn show_current_spread(&mut self) {
        let anchor = self.machine.current_page();
        let spread = Spread::at(anchor, self.config.layout, self.machine.total_pages());
        self.assign_sheet(SheetRole::Left, spread.left, None);
        self.assign_sheet(SheetRole::Right, spread.right, None);
        self.assign_sheet(SheetRole::UnderLeft, None, None);
        self.assign_sheet(SheetRole::UnderRight, None, None);
        self.pipeline.show_spread(anchor);
    }

    fn refresh_page_pixel_width(&mut self) {
        self.page_pixel_width = self.scene.page_pixel_width(self.config.page.width);
        self.pipeline.set_page_pixel_width(self.page_pixel_width);
    }

    fn notify_jump(&mut self, previous: usize) {
        let current = self.machine.current_page();
        if current != previous {
            info!("Page {} -> {}", previous, current);
            self.emit_page_change(PageChange {
                previous,
                current,
                direction: None,
            });
        }
    }

    fn emit_transition(&mut self, transition: Transition) {
        if let Some(callback) = self.on_state_changed.as_mut() {
            callback(transition);
        }
    }

    fn emit_page_change(&mut self, change: PageChange) {
        if let Some(callback) = self.on_page_changed.as_mut() {
            callback(change);
        }
    }
}
