//! Host intents and edge detection.
//!
//! The host reports held state every tick. Firing repeats while held;
//! weapon use and cycling only act on the tick a button goes down.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Intents {
    /// Desired direction; longer than 1 is clamped.
    pub movement: Vec2,
    pub fire: bool,
    pub use_light_weapon: bool,
    pub use_heavy_weapon: bool,
    pub use_defensive_weapon: bool,
    pub cycle_weapon: bool,
}

/// One-shot actions resolved for the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actions {
    pub fire: bool,
    pub use_light: bool,
    pub use_heavy: bool,
    pub use_defensive: bool,
    pub cycle: bool,
}

#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct InputState {
    pub current: Intents,
    previous: Intents,
    pub actions: Actions,
}

impl InputState {
    /// Latch new intents, deriving rising edges from the previous tick.
    ///
    /// A non-finite movement vector is treated as no movement.
    pub fn update(&mut self, mut intents: Intents) {
        if !intents.movement.is_finite() {
            intents.movement = Vec2::ZERO;
        }
        self.previous = self.current;
        self.current = intents;
        let prev = self.previous;
        self.actions = Actions {
            fire: intents.fire,
            use_light: intents.use_light_weapon && !prev.use_light_weapon,
            use_heavy: intents.use_heavy_weapon && !prev.use_heavy_weapon,
            use_defensive: intents.use_defensive_weapon && !prev.use_defensive_weapon,
            cycle: intents.cycle_weapon && !prev.cycle_weapon,
        };
    }

    /// Movement clamped to unit length.
    pub fn movement(&self) -> Vec2 {
        self.current.movement.clamp_length_max(1.0)
    }
}
