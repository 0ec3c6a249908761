//! Damped spring driving turn progress after release

use crate::constants::{
    DEFAULT_DAMPING, DEFAULT_MASS, DEFAULT_MAX_DT, DEFAULT_REST_THRESHOLD, DEFAULT_SPRING_K,
};

/// One-dimensional damped oscillator on turn progress in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PagePhysics {
    position: f32,
    velocity: f32,
    target: f32,
    pub spring_k: f32,
    pub damping: f32,
    pub mass: f32,
    pub rest_threshold: f32,
    pub max_dt: f32,
}

impl Default for PagePhysics {
    fn default() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            target: 0.0,
            spring_k: DEFAULT_SPRING_K,
            damping: DEFAULT_DAMPING,
            mass: DEFAULT_MASS,
            rest_threshold: DEFAULT_REST_THRESHOLD,
            max_dt: DEFAULT_MAX_DT,
        }
    }
}

impl PagePhysics {
    pub fn new(spring_k: f32, damping: f32) -> Self {
        Self {
            spring_k,
            damping,
            ..Self::default()
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// Place the oscillator at `position` and stop it
    pub fn set_position(&mut self, position: f32) {
        self.position = position.clamp(0.0, 1.0);
        self.velocity = 0.0;
    }

    /// Hand over from the pointer: aim at `target` with initial `velocity`
    pub fn release(&mut self, target: f32, velocity: f32) {
        self.target = target.clamp(0.0, 1.0);
        self.velocity = velocity;
    }

    /// Advance by `dt` seconds using semi-implicit Euler.
    ///
    /// Steps longer than `max_dt` are clamped. Position is kept in `[0, 1]`
    /// and velocity is zeroed on contact with either bound.
    pub fn step(&mut self, dt: f32) {
        let dt = dt.clamp(0.0, self.max_dt);
        if dt == 0.0 {
            return;
        }
        let force = -self.spring_k * (self.position - self.target) - self.damping * self.velocity;
        self.velocity += force / self.mass * dt;
        self.position += self.velocity * dt;

        if self.position <= 0.0 {
            self.position = 0.0;
            self.velocity = 0.0;
        } else if self.position >= 1.0 {
            self.position = 1.0;
            self.velocity = 0.0;
        }
    }

    /// Both distance to target and speed are under the rest threshold
    pub fn is_at_rest(&self) -> bool {
        (self.position - self.target).abs() < self.rest_threshold
            && self.velocity.abs() < self.rest_threshold
    }

    /// Back to (0, 0, 0)
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.velocity = 0.0;
        self.target = 0.0;
    }

    /// Snap onto the target and stop
    pub fn settle(&mut self) {
        self.position = self.target;
        self.velocity = 0.0;
    }
}
