//! Bee AI: foraging, defending and swarming the player.
//!
//! Bees are advanced in entity order so that, for a fixed RNG state, the
//! same colony always produces the same tick. Colony-wide decisions (the
//! switch to hunting and flank assignment) run first, then each bee thinks
//! and moves on its own.

use bevy_ecs::prelude::*;
use glam::Vec2;
use std::f32::consts::{PI, TAU};

use crate::components::{Bee, BeeState, Debuffs, Position, Pursuit, WingBeat, Wobble};
use crate::config::SimConfig;
use crate::field::ResourceField;
use crate::hive::Hive;
use crate::player::PlayerStatus;
use crate::resources::{DeltaTime, GameState, SimRng, Spawn, SpawnQueue};
use crate::spatial::{angle_to, clamp_to_bounds, direction, frames, unit};

pub const ARRIVAL_RADIUS: f32 = 10.0;
/// Most a forager carries home per trip.
pub const CARGO_PER_TRIP: f32 = 5.0;
/// Honey added straight into a random cell when a forager drops off.
pub const CELL_TOP_UP: f32 = 3.0;
pub const ATTACK_HOLD_MS: f32 = 2000.0;
const ATTACK_SPEED: f32 = 1.5;
const FROZEN_SPEED: f32 = 0.1;

const SPOT_JITTER: f32 = 5.0;
const RETURN_JITTER: f32 = 7.0;
const IDLE_JITTER: f32 = 20.0;
const WOBBLE: f32 = 0.8;

const HUNT_CLOSE: f32 = 50.0;
const HUNT_MIN_FLANK: f32 = 30.0;
const HUNT_RETARGET_CHANCE: f32 = 0.01;
const HUNT_RETARGET_JITTER: f32 = 20.0;
const LOST_WANDER: f32 = 100.0;
const LOST_REROLL_MS: f32 = 800.0;

/// Replenishment needs this many honey-full cells.
const REPLENISH_FULL_CELLS: usize = 3;
const REPLENISH_BATCH: usize = 2;
const NEW_BEE_JITTER: f32 = 5.0;

/// Speed, wobble and wing-beat multipliers for a state.
fn state_multipliers(state: &BeeState, hunt_speed: f32) -> (f32, f32, f32) {
    match state {
        BeeState::Hunt { .. } => (hunt_speed, 0.2, 1.5),
        BeeState::Attack { .. } => (ATTACK_SPEED, 0.3, 1.3),
        BeeState::Idle { .. } => (1.0, 1.0, 0.7),
        _ => (1.0, 1.0, 1.0),
    }
}

/// Approach point for a hunting bee.
///
/// Each bee comes in from its own side of the player, `flank_offset`
/// radians around the hive-to-player axis, from a distance that halves
/// as it closes. Near the player it goes straight in.
pub fn flank_target(bee: Vec2, player: Vec2, hive_center: Vec2, flank_offset: f32) -> Vec2 {
    let dist = bee.distance(player);
    if dist <= HUNT_CLOSE {
        return player;
    }
    let flank = angle_to(hive_center, player) + flank_offset;
    player + unit(flank + PI) * (dist * 0.5).max(HUNT_MIN_FLANK)
}

/// Where the bee is heading in its current state, if anywhere.
fn target_of(state: &BeeState) -> Option<Vec2> {
    match *state {
        BeeState::Forage { target, .. } => target,
        BeeState::Return { target, .. } => Some(target),
        BeeState::Idle { target } => Some(target),
        BeeState::Attack { last_seen, .. } => Some(last_seen),
        BeeState::Hunt { target, .. } => Some(target),
    }
}

pub fn bee_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    status: Res<PlayerStatus>,
    mut field: ResMut<ResourceField>,
    mut hive: ResMut<Hive>,
    mut rng: ResMut<SimRng>,
    mut bees: Query<(Entity, &mut Position, &mut Bee, &mut Debuffs, &mut Wobble, &mut WingBeat)>,
) {
    let dt = dt.0;
    let step = frames(dt);
    let arena = config.arena();
    let center = hive.center;
    let depleted = field.all_depleted();
    let visible = status.visible_position();

    let mut order: Vec<Entity> = bees.iter().map(|(e, ..)| e).collect();
    order.sort();

    // Colony-wide switch to hunting once the field is bare.
    if depleted && visible.is_some() {
        for &entity in &order {
            if let Ok((_, _, mut bee, ..)) = bees.get_mut(entity) {
                if !matches!(bee.state, BeeState::Return { .. } | BeeState::Hunt { .. }) {
                    bee.state = BeeState::Hunt {
                        flank_offset: 0.0,
                        target: visible.unwrap_or(center),
                        pursuit: Pursuit::Tracking,
                    };
                }
            }
        }
    }

    // Spread the hunters evenly around the player.
    let hunting: Vec<Entity> = order
        .iter()
        .copied()
        .filter(|&e| bees.get(e).is_ok_and(|(_, _, bee, ..)| bee.state.is_hunting()))
        .collect();
    let pack = hunting.len().max(1) as f32;
    for (index, &entity) in hunting.iter().enumerate() {
        if let Ok((_, _, mut bee, ..)) = bees.get_mut(entity) {
            if let BeeState::Hunt { flank_offset, .. } = &mut bee.state {
                *flank_offset = TAU * index as f32 / pack;
            }
        }
    }

    for entity in order {
        let Ok((_, mut pos, mut bee, mut debuffs, mut wobble, mut wings)) = bees.get_mut(entity) else {
            continue;
        };

        debuffs.tick(dt);
        wobble.advance(dt);

        let here = pos.0;
        let next = match bee.state {
            BeeState::Hunt { flank_offset, target, pursuit } => match (status.position, depleted) {
                (Some(player), true) if !status.is_cloaked() => {
                    let mut target = flank_target(here, player, center, flank_offset);
                    if rng.chance_per_frame(HUNT_RETARGET_CHANCE, dt) {
                        target = player + rng.jitter(HUNT_RETARGET_JITTER);
                    }
                    BeeState::Hunt { flank_offset, target, pursuit: Pursuit::Tracking }
                }
                (Some(player), true) => {
                    let (sighting, wander, reroll_ms) = match pursuit {
                        Pursuit::Lost { sighting, wander, reroll_ms } => (sighting, wander, reroll_ms - dt),
                        Pursuit::Tracking => (player, target, 0.0),
                    };
                    let (wander, reroll_ms) = if reroll_ms <= 0.0 || here.distance(wander) < ARRIVAL_RADIUS {
                        (sighting + rng.jitter(LOST_WANDER), LOST_REROLL_MS)
                    } else {
                        (wander, reroll_ms)
                    };
                    BeeState::Hunt {
                        flank_offset,
                        target: wander,
                        pursuit: Pursuit::Lost { sighting, wander, reroll_ms },
                    }
                }
                _ => BeeState::default(),
            },
            BeeState::Attack { hold_ms, last_seen } => match visible {
                Some(player) if here.distance(player) <= config.bee_attack_range => BeeState::Attack {
                    hold_ms: ATTACK_HOLD_MS,
                    last_seen: player,
                },
                Some(_) if hold_ms - dt > 0.0 => BeeState::Attack { hold_ms: hold_ms - dt, last_seen },
                _ => BeeState::default(),
            },
            state @ (BeeState::Forage { .. } | BeeState::Idle { .. }) => match visible {
                Some(player) if here.distance(player) <= config.bee_attack_range => BeeState::Attack {
                    hold_ms: ATTACK_HOLD_MS,
                    last_seen: player,
                },
                _ => state,
            },
            state @ BeeState::Return { .. } => state,
        };
        bee.state = next;

        // A forager without a live spot asks the field for one.
        if let BeeState::Forage { spot, target } = bee.state {
            let live = spot.and_then(|s| field.spot(s)).filter(|s| !s.is_empty());
            bee.state = match (live, target) {
                (Some(_), Some(_)) => bee.state,
                (Some(s), None) => BeeState::Forage { spot, target: Some(s.pos + rng.jitter(SPOT_JITTER)) },
                (None, _) => match field.pick_spot(config.prefer_high_pct, &mut rng) {
                    Some(picked) => {
                        let pos = field.spot(picked).map_or(center, |s| s.pos);
                        BeeState::Forage {
                            spot: Some(picked),
                            target: Some(pos + rng.jitter(SPOT_JITTER)),
                        }
                    }
                    None => BeeState::Idle { target: center + rng.jitter(IDLE_JITTER) },
                },
            };
        }

        // Arrival
        if let Some(target) = target_of(&bee.state) {
            if here.distance(target) < ARRIVAL_RADIUS {
                match bee.state {
                    BeeState::Forage { spot: Some(spot), .. } => {
                        let taken = field.collect(spot, CARGO_PER_TRIP);
                        bee.state = if taken > 0.0 {
                            BeeState::Return { cargo: taken, target: center + rng.jitter(RETURN_JITTER) }
                        } else {
                            BeeState::default()
                        };
                    }
                    BeeState::Return { cargo, .. } => {
                        hive.deposit(cargo);
                        if !hive.cells.is_empty() {
                            let index = rng.index(hive.cells.len());
                            hive.top_up(index, CELL_TOP_UP, config.honey_per_cell);
                        }
                        bee.state = BeeState::default();
                    }
                    BeeState::Idle { .. } => {
                        bee.state = if field.all_depleted() {
                            BeeState::Idle { target: center + rng.jitter(IDLE_JITTER) }
                        } else {
                            BeeState::default()
                        };
                    }
                    _ => {}
                }
            }
        }

        let (speed_mult, wobble_mult, wing_mult) = state_multipliers(&bee.state, config.bee_hunt_speed_multiplier);
        let frozen = debuffs.is_frozen();
        wings.advance(dt, wing_mult, if frozen { 0.2 } else { 1.0 });

        let scale = debuffs.speed_scale(FROZEN_SPEED);
        if let Some(target) = target_of(&bee.state) {
            let remaining = here.distance(target);
            let travel = (bee.speed * speed_mult * scale * step).min(remaining);
            pos.0 += direction(here, target) * travel;
        }
        pos.0 += wobble.offset() * WOBBLE * wobble_mult * scale * step;
        pos.0 = clamp_to_bounds(pos.0, arena, 0.0);
    }
}

/// Grow the colony while the hive is well stocked.
pub fn colony_replenish_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    hive: Res<Hive>,
    mut state: ResMut<GameState>,
    mut rng: ResMut<SimRng>,
    mut spawns: ResMut<SpawnQueue>,
    bees: Query<(), With<Bee>>,
) {
    // The clock only restarts once bees actually hatch.
    state.replenish_ms = (state.replenish_ms + dt.0).min(config.bee_addition_interval_ms);
    if state.replenish_ms < config.bee_addition_interval_ms {
        return;
    }

    if hive.full_cells(config.honey_per_cell) < REPLENISH_FULL_CELLS {
        return;
    }
    let pending = spawns.0.iter().filter(|s| matches!(s, Spawn::Bee { .. })).count();
    let colony = bees.iter().count() + pending;
    let room = config.max_colony.saturating_sub(colony).min(REPLENISH_BATCH);
    if room == 0 {
        return;
    }
    for _ in 0..room {
        spawns.push(Spawn::Bee { pos: hive.center + rng.jitter(NEW_BEE_JITTER) });
    }
    state.replenish_ms = 0.0;
    log::debug!("colony grows by {room} to {}", colony + room);
}
