//! Input events consumed by the controller once per frame

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::constants::VELOCITY_WINDOW_MS;

/// Which pointer produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerId {
    Mouse,
    Touch(u64),
}

/// Keys with a turn binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookKey {
    ArrowLeft,
    ArrowRight,
    Space,
}

/// Pointer and keyboard input, positions in logical screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerMove {
        pointer: PointerId,
        position: Vec2,
        time_ms: f64,
    },
    PointerDown {
        pointer: PointerId,
        position: Vec2,
        time_ms: f64,
    },
    PointerUp {
        pointer: PointerId,
        position: Vec2,
        time_ms: f64,
    },
    /// The platform took the pointer away (touch cancel, focus loss)
    PointerCancel { pointer: PointerId },
    /// The pointer left the viewport
    PointerLeave,
    Key(BookKey),
}

/// FIFO of pending input
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Take every pending event in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}

/// Pointer velocity over a trailing time window
#[derive(Debug, Clone, Default)]
pub struct VelocityTracker {
    samples: VecDeque<(f64, Vec2)>,
}

impl VelocityTracker {
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    pub fn record(&mut self, time_ms: f64, position: Vec2) {
        self.samples.push_back((time_ms, position));
        while let Some(&(oldest, _)) = self.samples.front() {
            if time_ms - oldest > VELOCITY_WINDOW_MS {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Average velocity in px/ms across the window; zero with fewer than two samples
    pub fn velocity(&self) -> Vec2 {
        let (Some(&(t0, p0)), Some(&(t1, p1))) = (self.samples.front(), self.samples.back()) else {
            return Vec2::ZERO;
        };
        let elapsed = t1 - t0;
        if elapsed <= 0.0 {
            return Vec2::ZERO;
        }
        (p1 - p0) / elapsed as f32
    }
}
