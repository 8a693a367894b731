//! Serializable view of the simulation state.
//!
//! The `Snapshot` struct is what a presentation host reads each frame to
//! draw the arena. It owns plain data only; nothing in it refers back into
//! the ECS world.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::armory::{Armory, Defenses, PickupGrant};
use crate::components::*;
use crate::error::SimResult;
use crate::field::{ResourceField, ResourceSpot};
use crate::hive::Hive;
use crate::player::{Player, PlayerSlot};
use crate::resources::{GameState, SimTick};
use crate::systems::serialization::{snapshot_to_json_pretty, snapshot_to_json_string};

/// Snapshot of a single bee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeeSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub state: String,
    pub health: f32,
    pub health_max: f32,
    pub cargo: f32,
    pub frozen_ms: f32,
    pub stunned_ms: f32,
    pub wing_phase: f32,
    pub bob_phase: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HunterSnapshot {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub health: f32,
    pub health_max: f32,
    pub shield: f32,
    pub shield_max: f32,
    pub size: f32,
    pub tracking: bool,
    pub frozen_ms: f32,
    pub stunned_ms: f32,
    pub wing_phase: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropshipSnapshot {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub phase: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSnapshot {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub radius: f32,
    pub kind: ProjectileKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub q: i32,
    pub r: i32,
    pub x: f32,
    pub y: f32,
    pub build_progress: f32,
    pub honey: f32,
    pub hp: f32,
    pub hp_max: f32,
}

/// Active weapon effects, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EffectSnapshot {
    Freeze { x: f32, y: f32, radius: f32, remaining_ms: f32 },
    Electric { x: f32, y: f32, radius: f32, remaining_ms: f32 },
    Singularity { x: f32, y: f32, radius: f32, phase: SingularityPhase },
    Railgun { x: f32, y: f32, angle: f32, length: f32, half_width: f32, progress: f32 },
    Shockwave { x: f32, y: f32, radius: f32, progress: f32 },
    Missile { x: f32, y: f32, heading: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupSnapshot {
    pub x: f32,
    pub y: f32,
    pub grant: PickupGrant,
    pub remaining_ms: f32,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in milliseconds.
    pub elapsed_ms: f64,
    pub score: u64,
    pub game_over: bool,
    /// `None` once the player has been destroyed.
    pub player: Option<Player>,
    pub bees: Vec<BeeSnapshot>,
    pub hunters: Vec<HunterSnapshot>,
    pub dropship: Option<DropshipSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub cells: Vec<CellSnapshot>,
    pub honey_reserve: f32,
    pub honey_delivered: f32,
    pub hive_protected: bool,
    pub spots: Vec<ResourceSpot>,
    pub effects: Vec<EffectSnapshot>,
    pub pickups: Vec<PickupSnapshot>,
    pub armory: Option<Armory>,
    pub defenses: Defenses,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    ///
    /// Entity lists are ordered by entity id so two snapshots of the same
    /// state compare equal.
    pub fn from_world(world: &mut World) -> Self {
        let mut bees: Vec<(Entity, BeeSnapshot)> = world
            .query::<(Entity, &Position, &Bee, &Health, &Debuffs, &WingBeat)>()
            .iter(world)
            .map(|(entity, pos, bee, health, debuffs, wings)| {
                (
                    entity,
                    BeeSnapshot {
                        id: entity.to_bits(),
                        x: pos.0.x,
                        y: pos.0.y,
                        state: bee.state.name().to_string(),
                        health: health.current,
                        health_max: health.max,
                        cargo: bee.state.cargo(),
                        frozen_ms: debuffs.frozen_ms,
                        stunned_ms: debuffs.stunned_ms,
                        wing_phase: wings.wing_phase,
                        bob_phase: wings.bob_phase,
                    },
                )
            })
            .collect();
        bees.sort_by_key(|(entity, _)| *entity);

        let mut hunters: Vec<(Entity, HunterSnapshot)> = world
            .query::<(Entity, &Position, &Hunter, &Health, &Shield, &Debuffs, &WingBeat)>()
            .iter(world)
            .map(|(entity, pos, hunter, health, shield, debuffs, wings)| {
                (
                    entity,
                    HunterSnapshot {
                        id: entity.to_bits(),
                        x: pos.0.x,
                        y: pos.0.y,
                        angle: hunter.angle,
                        health: health.current,
                        health_max: health.max,
                        shield: shield.current,
                        shield_max: shield.max,
                        size: hunter.size,
                        tracking: hunter.tracking == HunterTracking::Locked,
                        frozen_ms: debuffs.frozen_ms,
                        stunned_ms: debuffs.stunned_ms,
                        wing_phase: wings.wing_phase,
                    },
                )
            })
            .collect();
        hunters.sort_by_key(|(entity, _)| *entity);

        let dropship = world
            .query::<(&Position, &Dropship)>()
            .iter(world)
            .next()
            .map(|(pos, ship)| DropshipSnapshot {
                x: pos.0.x,
                y: pos.0.y,
                angle: ship.angle,
                phase: ship.phase.name().to_string(),
            });

        let mut projectiles: Vec<(Entity, ProjectileSnapshot)> = world
            .query::<(Entity, &Position, &Projectile)>()
            .iter(world)
            .map(|(entity, pos, projectile)| {
                (
                    entity,
                    ProjectileSnapshot {
                        x: pos.0.x,
                        y: pos.0.y,
                        angle: projectile.angle(),
                        radius: projectile.radius,
                        kind: projectile.kind,
                    },
                )
            })
            .collect();
        projectiles.sort_by_key(|(entity, _)| *entity);

        let effects = effect_snapshots(world);

        let mut pickups: Vec<(Entity, PickupSnapshot)> = world
            .query::<(Entity, &Position, &WeaponPickup, &Lifetime)>()
            .iter(world)
            .map(|(entity, pos, pickup, life)| {
                (
                    entity,
                    PickupSnapshot {
                        x: pos.0.x,
                        y: pos.0.y,
                        grant: pickup.grant,
                        remaining_ms: life.remaining_ms,
                    },
                )
            })
            .collect();
        pickups.sort_by_key(|(entity, _)| *entity);

        let hive = world.resource::<Hive>();
        let cells = hive
            .cells
            .iter()
            .map(|cell| {
                let center = hive.cell_center(cell.coord);
                CellSnapshot {
                    q: cell.coord.q,
                    r: cell.coord.r,
                    x: center.x,
                    y: center.y,
                    build_progress: cell.build_progress,
                    honey: cell.honey,
                    hp: cell.hp,
                    hp_max: cell.max_hp,
                }
            })
            .collect();
        let honey_reserve = hive.reserve;
        let honey_delivered = hive.delivered;
        let hive_protected = hive.is_protected();

        let state = world.resource::<GameState>();

        Self {
            tick: world.resource::<SimTick>().0,
            elapsed_ms: state.elapsed_ms,
            score: state.score,
            game_over: state.game_over,
            player: world.resource::<PlayerSlot>().player().copied(),
            bees: bees.into_iter().map(|(_, b)| b).collect(),
            hunters: hunters.into_iter().map(|(_, h)| h).collect(),
            dropship,
            projectiles: projectiles.into_iter().map(|(_, p)| p).collect(),
            cells,
            honey_reserve,
            honey_delivered,
            hive_protected,
            spots: world.resource::<ResourceField>().spots().to_vec(),
            effects,
            pickups: pickups.into_iter().map(|(_, p)| p).collect(),
            armory: Some(world.resource::<Armory>().clone()),
            defenses: *world.resource::<Defenses>(),
        }
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> SimResult<String> {
        snapshot_to_json_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> SimResult<String> {
        snapshot_to_json_pretty(self)
    }
}

fn effect_snapshots(world: &mut World) -> Vec<EffectSnapshot> {
    let mut effects: Vec<(Entity, EffectSnapshot)> = Vec::new();

    for (entity, pos, zone, life) in world.query::<(Entity, &Position, &FreezeZone, &Lifetime)>().iter(world) {
        effects.push((
            entity,
            EffectSnapshot::Freeze {
                x: pos.0.x,
                y: pos.0.y,
                radius: zone.radius,
                remaining_ms: life.remaining_ms,
            },
        ));
    }
    for (entity, pos, zone, life) in world.query::<(Entity, &Position, &ElectricZone, &Lifetime)>().iter(world) {
        effects.push((
            entity,
            EffectSnapshot::Electric {
                x: pos.0.x,
                y: pos.0.y,
                radius: zone.radius,
                remaining_ms: life.remaining_ms,
            },
        ));
    }
    for (entity, pos, vortex, life) in world.query::<(Entity, &Position, &Singularity, &Lifetime)>().iter(world) {
        let progress = life.progress();
        effects.push((
            entity,
            EffectSnapshot::Singularity {
                x: pos.0.x,
                y: pos.0.y,
                radius: vortex.current_radius(progress),
                phase: Singularity::phase(progress),
            },
        ));
    }
    for (entity, pos, beam, life) in world.query::<(Entity, &Position, &RailgunBeam, &Lifetime)>().iter(world) {
        effects.push((
            entity,
            EffectSnapshot::Railgun {
                x: pos.0.x,
                y: pos.0.y,
                angle: beam.angle,
                length: beam.current_length(life.elapsed_ms()),
                half_width: beam.half_width,
                progress: life.progress(),
            },
        ));
    }
    for (entity, pos, wave, life) in world.query::<(Entity, &Position, &Shockwave, &Lifetime)>().iter(world) {
        effects.push((
            entity,
            EffectSnapshot::Shockwave {
                x: pos.0.x,
                y: pos.0.y,
                radius: wave.current_radius(life.elapsed_ms()),
                progress: life.progress(),
            },
        ));
    }
    for (entity, pos, missile) in world.query::<(Entity, &Position, &Missile)>().iter(world) {
        effects.push((
            entity,
            EffectSnapshot::Missile {
                x: pos.0.x,
                y: pos.0.y,
                heading: missile.heading,
            },
        ));
    }

    effects.sort_by_key(|(entity, _)| *entity);
    effects.into_iter().map(|(_, e)| e).collect()
}
