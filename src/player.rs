//! The player avatar and the per-tick status view the AI reads.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::components::HitOutcome;

/// Health below which the low-health cue plays.
pub const LOW_HEALTH_THRESHOLD: f32 = 25.0;
/// Moving less than this from the anchor still counts as standing still.
pub const STATIONARY_TOLERANCE: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub facing: f32,
    /// Units per reference frame.
    pub speed: f32,
    pub radius: f32,
    pub health: f32,
    pub max_health: f32,
    pub shield: f32,
    pub max_shield: f32,
    pub invincible_ms: f32,
    pub stationary_ms: f32,
    /// Where the stationary timer started counting.
    pub anchor: Vec2,
    pub fire_cooldown_ms: f32,
    pub low_health: bool,
}

impl Player {
    pub const SPEED: f32 = 3.3;
    pub const RADIUS: f32 = 7.0;
    pub const MAX_HEALTH: f32 = 100.0;
    pub const MAX_SHIELD: f32 = 100.0;
    pub const SPAWN_INVINCIBILITY_MS: f32 = 3000.0;

    pub fn spawn(pos: Vec2) -> Self {
        Self {
            pos,
            facing: 0.0,
            speed: Self::SPEED,
            radius: Self::RADIUS,
            health: Self::MAX_HEALTH,
            max_health: Self::MAX_HEALTH,
            shield: Self::MAX_SHIELD,
            max_shield: Self::MAX_SHIELD,
            invincible_ms: Self::SPAWN_INVINCIBILITY_MS,
            stationary_ms: 0.0,
            anchor: pos,
            fire_cooldown_ms: 0.0,
            low_health: false,
        }
    }

    pub fn is_invincible(&self) -> bool {
        self.invincible_ms > 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Damage lands on the shield while any remains, and the part of a hit
    /// the shield could not cover is discarded rather than passed to health.
    pub fn take_hit(&mut self, amount: f32) -> HitOutcome {
        if self.shield > 0.0 {
            self.shield = (self.shield - amount).max(0.0);
            HitOutcome::Shield
        } else {
            self.health = (self.health - amount).max(0.0);
            HitOutcome::Health
        }
    }

    /// Accumulate stationary time, re-anchoring once the player drifts off.
    pub fn track_stationary(&mut self, dt_ms: f32) {
        if self.pos.distance(self.anchor) > STATIONARY_TOLERANCE {
            self.anchor = self.pos;
            self.stationary_ms = 0.0;
        } else {
            self.stationary_ms += dt_ms;
        }
    }

    /// Update the low-health latch; returns the new state when it flips.
    pub fn update_low_health(&mut self) -> Option<bool> {
        let low = self.health < LOW_HEALTH_THRESHOLD;
        if low != self.low_health {
            self.low_health = low;
            Some(low)
        } else {
            None
        }
    }
}

/// `None` once the player has been destroyed.
#[derive(Resource, Debug, Clone, Default)]
pub struct PlayerSlot(pub Option<Player>);

impl PlayerSlot {
    pub fn player(&self) -> Option<&Player> {
        self.0.as_ref()
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.0.as_mut()
    }
}

/// What the hostile AI may know about the player this tick.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStatus {
    pub position: Option<Vec2>,
    pub cloaked: bool,
    pub shielded: bool,
    pub stationary_ms: f32,
}

impl PlayerStatus {
    pub fn is_alive(&self) -> bool {
        self.position.is_some()
    }

    pub fn is_cloaked(&self) -> bool {
        self.cloaked
    }

    pub fn is_shielded(&self) -> bool {
        self.shielded
    }

    /// The player's position, unless it is hidden by the cloak.
    pub fn visible_position(&self) -> Option<Vec2> {
        if self.cloaked {
            None
        } else {
            self.position
        }
    }
}
