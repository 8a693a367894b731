//! Per-tick output: destructions, score, cosmetic triggers and sound cues.
//!
//! Systems push into `TickEvents` while the tick runs; `SimWorld::advance`
//! drains it into the `ChangeSet` handed back to the host.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::armory::{DefensiveWeapon, HeavyWeapon, LightWeapon};
use crate::components::ProjectileKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestroyedKind {
    Bee,
    Hunter,
    Cell,
}

impl DestroyedKind {
    pub fn points(self) -> u64 {
        match self {
            DestroyedKind::Bee => 5,
            DestroyedKind::Hunter => 25,
            DestroyedKind::Cell => 10,
        }
    }

    /// Screen shake (intensity, duration ms) for this explosion.
    pub fn shake(self) -> (f32, f32) {
        match self {
            DestroyedKind::Bee => (2.0, 100.0),
            DestroyedKind::Hunter => (8.0, 300.0),
            DestroyedKind::Cell => (6.0, 250.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DestructionEvent {
    pub kind: DestroyedKind,
    pub position: Vec2,
    pub points: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionKind {
    Bee,
    Hunter,
    Cell,
    Player,
}

/// Requests for the presentation layer. The core never reads them back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CosmeticTrigger {
    Explosion { kind: ExplosionKind, position: Vec2 },
    Impact { kind: ProjectileKind, position: Vec2 },
    ScreenShake { intensity: f32, duration_ms: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    ShotFired,
    BeeExplosion,
    HunterExplosion,
    CellExplosion,
    HunterLaser,
    DropshipWarning,
    LightWeapon(LightWeapon),
    HeavyWeapon(HeavyWeapon),
    DefensiveWeapon(DefensiveWeapon),
    ShieldHit,
    HealthHit,
    WeaponPickup,
    LowHealthEnter,
    LowHealthExit,
    GameOver,
}

/// Everything that happened during one `advance` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub score_delta: u64,
    pub destructions: Vec<DestructionEvent>,
    pub game_over: bool,
    pub triggers: Vec<CosmeticTrigger>,
    pub sounds: Vec<SoundCue>,
}

impl ChangeSet {
    pub fn destroyed(&self, kind: DestroyedKind) -> usize {
        self.destructions.iter().filter(|d| d.kind == kind).count()
    }
}

/// Accumulator the systems write into during a tick.
#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    pub changes: ChangeSet,
}

impl TickEvents {
    pub fn sound(&mut self, cue: SoundCue) {
        self.changes.sounds.push(cue);
    }

    pub fn shake(&mut self, intensity: f32, duration_ms: f32) {
        self.changes
            .triggers
            .push(CosmeticTrigger::ScreenShake { intensity, duration_ms });
    }

    pub fn impact(&mut self, kind: ProjectileKind, position: Vec2) {
        self.changes.triggers.push(CosmeticTrigger::Impact { kind, position });
    }

    /// Record a destruction with its score, explosion, shake and sound.
    pub fn destroyed(&mut self, kind: DestroyedKind, position: Vec2) {
        let points = kind.points();
        self.changes.score_delta += points;
        self.changes.destructions.push(DestructionEvent { kind, position, points });

        let (explosion, cue) = match kind {
            DestroyedKind::Bee => (ExplosionKind::Bee, SoundCue::BeeExplosion),
            DestroyedKind::Hunter => (ExplosionKind::Hunter, SoundCue::HunterExplosion),
            DestroyedKind::Cell => (ExplosionKind::Cell, SoundCue::CellExplosion),
        };
        self.changes
            .triggers
            .push(CosmeticTrigger::Explosion { kind: explosion, position });
        let (intensity, duration_ms) = kind.shake();
        self.shake(intensity, duration_ms);
        self.sound(cue);
    }

    pub fn take(&mut self) -> ChangeSet {
        std::mem::take(&mut self.changes)
    }
}
