//! World-level resources shared across systems.

use bevy_ecs::prelude::*;
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f32::consts::TAU;

use crate::armory::PickupGrant;
use crate::components::{Dropship, Projectile, ProjectileKind};

/// Elapsed time of the current tick, in milliseconds.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct DeltaTime(pub f32);

/// Number of ticks advanced since the last reset.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SimTick(pub u64);

impl SimTick {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }
}

/// Seeded random source. Every random draw in a tick goes through here.
#[derive(Resource, Debug, Clone)]
pub struct SimRng(pub ChaCha8Rng);

impl SimRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(ChaCha8Rng::seed_from_u64(seed)),
            None => Self(ChaCha8Rng::from_entropy()),
        }
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.0.gen::<f32>()
    }

    /// Uniform in `[lo, hi)`. Tolerates `lo == hi`.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + self.unit() * (hi - lo)
    }

    /// Offset uniformly distributed in the square `[-half, half]²`.
    pub fn jitter(&mut self, half: f32) -> Vec2 {
        Vec2::new(self.range(-half, half), self.range(-half, half))
    }

    pub fn angle(&mut self) -> f32 {
        self.range(0.0, TAU)
    }

    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// A chance tuned per reference frame, rescaled for an arbitrary `dt`.
    pub fn chance_per_frame(&mut self, p: f32, dt_ms: f32) -> bool {
        let frames = crate::spatial::frames(dt_ms);
        let p = 1.0 - (1.0 - p.clamp(0.0, 1.0)).powf(frames);
        self.chance(p)
    }

    /// Uniform index into a collection of `len` items (`len > 0`).
    pub fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}

/// Score, clock and timers that are not owned by any entity.
#[derive(Resource, Debug, Clone, Default)]
pub struct GameState {
    pub score: u64,
    pub elapsed_ms: f64,
    pub game_over: bool,
    /// Time since the colony last grew.
    pub replenish_ms: f32,
    /// Time since the last weapon pickup appeared.
    pub pickup_ms: f32,
}

/// Entity creation requested during a tick.
#[derive(Debug, Clone)]
pub enum Spawn {
    Projectile { pos: Vec2, projectile: Projectile },
    Bee { pos: Vec2 },
    Hunter { pos: Vec2 },
    Dropship { pos: Vec2, dropship: Dropship },
    FreezeZone { pos: Vec2 },
    ElectricZone { pos: Vec2 },
    Singularity { pos: Vec2 },
    Railgun { origin: Vec2, angle: f32 },
    Shockwave { pos: Vec2 },
    Missile { pos: Vec2, heading: f32 },
    Pickup { pos: Vec2, grant: PickupGrant },
}

/// Spawns are deferred to the end of the tick so a new entity is first
/// advanced on the tick after it was created.
#[derive(Resource, Debug, Default)]
pub struct SpawnQueue(pub Vec<Spawn>);

impl SpawnQueue {
    pub fn push(&mut self, spawn: Spawn) {
        self.0.push(spawn);
    }

    pub fn projectile(&mut self, pos: Vec2, projectile: Projectile) {
        self.0.push(Spawn::Projectile { pos, projectile });
    }

    pub fn pending_of_kind(&self, kind: ProjectileKind) -> usize {
        self.0
            .iter()
            .filter(|s| matches!(s, Spawn::Projectile { projectile, .. } if projectile.kind == kind))
            .count()
    }

    pub fn has_pending_dropship(&self) -> bool {
        self.0.iter().any(|s| matches!(s, Spawn::Dropship { .. }))
    }
}
