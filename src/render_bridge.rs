//! Render Integration Bridge
//!
//! This module flattens a `Snapshot` into a single `Vec<f32>` that a
//! presentation host (a game engine plugin loading the `cdylib`) can copy
//! into a packed float array each frame without walking JSON.
//!
//! # Buffer Layout (Version 1)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │ HEADER (4 elements)                                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ [0] version           [1] bee_count                             │
//! │ [2] hunter_count      [3] projectile_count                      │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ BEES (bee_count × BEE_STRIDE)                                   │
//! │   [+0] x  [+1] y  [+2] state_id  [+3] health  [+4] health_max   │
//! │   [+5] cargo  [+6] frozen (1.0 while frozen)                    │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ HUNTERS (hunter_count × HUNTER_STRIDE)                          │
//! │   [+0] x  [+1] y  [+2] angle  [+3] health  [+4] health_max      │
//! │   [+5] shield  [+6] shield_max                                  │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ PROJECTILES (projectile_count × PROJECTILE_STRIDE)              │
//! │   [+0] x  [+1] y  [+2] angle  [+3] kind_id                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # State ID Mapping
//!
//! | State   | ID  |
//! |---------|-----|
//! | forage  | 0.0 |
//! | return  | 1.0 |
//! | idle    | 2.0 |
//! | attack  | 3.0 |
//! | hunt    | 4.0 |
//!
//! Projectile kinds: player shot 0.0, hive bullet 1.0, hunter laser 2.0.
//!
//! The hive, resource spots and effects change slowly and are read from
//! the JSON snapshot instead.

use crate::components::ProjectileKind;
use crate::world::Snapshot;

/// Bumped whenever a stride or field order changes.
pub const BUFFER_VERSION: f32 = 1.0;

pub const HEADER_SIZE: usize = 4;
pub const BEE_STRIDE: usize = 7;
pub const HUNTER_STRIDE: usize = 7;
pub const PROJECTILE_STRIDE: usize = 4;

pub const STATE_FORAGE: f32 = 0.0;
pub const STATE_RETURN: f32 = 1.0;
pub const STATE_IDLE: f32 = 2.0;
pub const STATE_ATTACK: f32 = 3.0;
pub const STATE_HUNT: f32 = 4.0;

/// Map a snapshot state name to its numeric ID. Unknown names map to forage.
#[inline]
pub fn state_to_id(state: &str) -> f32 {
    match state {
        "return" => STATE_RETURN,
        "idle" => STATE_IDLE,
        "attack" => STATE_ATTACK,
        "hunt" => STATE_HUNT,
        _ => STATE_FORAGE,
    }
}

#[inline]
pub fn projectile_kind_to_id(kind: ProjectileKind) -> f32 {
    match kind {
        ProjectileKind::PlayerShot => 0.0,
        ProjectileKind::HiveBullet => 1.0,
        ProjectileKind::HunterLaser => 2.0,
    }
}

/// Convert a snapshot to the flat render buffer.
///
/// Deterministic: the same `Snapshot` always produces the same buffer.
///
/// # Example
///
/// ```rust
/// use hive_sim::api::SimWorld;
/// use hive_sim::render_bridge::{snapshot_to_flatbuffer, BEE_STRIDE, HEADER_SIZE};
///
/// let mut sim = SimWorld::new();
/// let buffer = snapshot_to_flatbuffer(&sim.snapshot());
///
/// let bee_count = buffer[1] as usize;
/// assert!(buffer.len() >= HEADER_SIZE + bee_count * BEE_STRIDE);
/// ```
pub fn snapshot_to_flatbuffer(snapshot: &Snapshot) -> Vec<f32> {
    let buffer_size = calculate_buffer_size(
        snapshot.bees.len(),
        snapshot.hunters.len(),
        snapshot.projectiles.len(),
    );
    let mut buffer = Vec::with_capacity(buffer_size);

    buffer.push(BUFFER_VERSION);
    buffer.push(snapshot.bees.len() as f32);
    buffer.push(snapshot.hunters.len() as f32);
    buffer.push(snapshot.projectiles.len() as f32);

    for bee in &snapshot.bees {
        buffer.extend_from_slice(&[
            bee.x,
            bee.y,
            state_to_id(&bee.state),
            bee.health,
            bee.health_max,
            bee.cargo,
            if bee.frozen_ms > 0.0 { 1.0 } else { 0.0 },
        ]);
    }

    for hunter in &snapshot.hunters {
        buffer.extend_from_slice(&[
            hunter.x,
            hunter.y,
            hunter.angle,
            hunter.health,
            hunter.health_max,
            hunter.shield,
            hunter.shield_max,
        ]);
    }

    for projectile in &snapshot.projectiles {
        buffer.extend_from_slice(&[
            projectile.x,
            projectile.y,
            projectile.angle,
            projectile_kind_to_id(projectile.kind),
        ]);
    }

    debug_assert_eq!(buffer.len(), buffer_size, "Buffer size mismatch");
    buffer
}

#[inline]
pub fn calculate_buffer_size(bees: usize, hunters: usize, projectiles: usize) -> usize {
    HEADER_SIZE + bees * BEE_STRIDE + hunters * HUNTER_STRIDE + projectiles * PROJECTILE_STRIDE
}

/// Offset of bee `index`.
#[inline]
pub const fn bee_offset(index: usize) -> usize {
    HEADER_SIZE + index * BEE_STRIDE
}

/// Offset of hunter `index`, given how many bees precede the hunter block.
#[inline]
pub const fn hunter_offset(bee_count: usize, index: usize) -> usize {
    HEADER_SIZE + bee_count * BEE_STRIDE + index * HUNTER_STRIDE
}

#[inline]
pub const fn projectile_offset(bee_count: usize, hunter_count: usize, index: usize) -> usize {
    HEADER_SIZE + bee_count * BEE_STRIDE + hunter_count * HUNTER_STRIDE + index * PROJECTILE_STRIDE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SimWorld;
    use crate::components::Projectile;
    use crate::config::SimConfig;
    use glam::Vec2;

    fn seeded() -> SimWorld {
        SimWorld::with_config(SimConfig {
            seed: Some(11),
            ..Default::default()
        })
    }

    #[test]
    fn test_flatbuffer_layout() {
        let mut sim = seeded();
        sim.spawn_hunter(Vec2::new(300.0, 200.0));
        sim.spawn_projectile(Vec2::new(50.0, 60.0), Projectile::hive_bullet(0.0, 40.0));

        let snapshot = sim.snapshot();
        let buffer = snapshot_to_flatbuffer(&snapshot);

        let bees = snapshot.bees.len();
        assert_eq!(bees, 10);
        assert_eq!(buffer[0], BUFFER_VERSION);
        assert_eq!(buffer[1], 10.0);
        assert_eq!(buffer[2], 1.0);
        assert_eq!(buffer[3], 1.0);
        assert_eq!(buffer.len(), calculate_buffer_size(bees, 1, 1));

        let b = bee_offset(0);
        assert_eq!(buffer[b], snapshot.bees[0].x);
        assert_eq!(buffer[b + 2], STATE_FORAGE);

        let h = hunter_offset(bees, 0);
        assert_eq!(buffer[h], 300.0);
        assert_eq!(buffer[h + 1], 200.0);
        assert_eq!(buffer[h + 6], 25.0);

        let p = projectile_offset(bees, 1, 0);
        assert_eq!(buffer[p], 50.0);
        assert_eq!(buffer[p + 1], 60.0);
        assert_eq!(buffer[p + 3], 1.0);
    }

    #[test]
    fn test_flatbuffer_determinism() {
        let mut a = seeded();
        let mut b = seeded();
        assert_eq!(
            snapshot_to_flatbuffer(&a.snapshot()),
            snapshot_to_flatbuffer(&b.snapshot())
        );
    }

    #[test]
    fn test_state_to_id() {
        assert_eq!(state_to_id("forage"), STATE_FORAGE);
        assert_eq!(state_to_id("return"), STATE_RETURN);
        assert_eq!(state_to_id("hunt"), STATE_HUNT);
        assert_eq!(state_to_id("unknown"), STATE_FORAGE);
    }
}
