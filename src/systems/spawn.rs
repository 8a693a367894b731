//! Materialise queued spawns at the very end of the tick.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::{
    Bee, BeeBundle, BeeState, Debuffs, ElectricZone, FreezeZone, Health, Hunter, HunterBundle, Lifetime, Missile,
    Position, ProjectileBundle, RailgunBeam, Shield, Shockwave, Singularity, WeaponPickup, WingBeat, Wobble,
};
use crate::config::SimConfig;
use crate::resources::{SimRng, Spawn, SpawnQueue};

/// A fresh forager with randomised speed and animation.
pub fn bee_bundle(pos: Vec2, config: &SimConfig, rng: &mut SimRng) -> BeeBundle {
    BeeBundle {
        bee: Bee {
            speed: rng.range(1.7, 2.2),
            state: BeeState::default(),
        },
        position: Position(pos),
        health: Health::new(config.bee_max_hp),
        debuffs: Debuffs::default(),
        wobble: Wobble {
            phase: rng.angle(),
            rate: rng.range(3.0, 5.0),
        },
        wings: WingBeat {
            wing_phase: rng.angle(),
            wing_rate: rng.range(25.0, 35.0),
            bob_phase: rng.angle(),
            bob_rate: rng.range(2.0, 3.0),
        },
    }
}

pub fn hunter_bundle(pos: Vec2, config: &SimConfig, rng: &mut SimRng) -> HunterBundle {
    HunterBundle {
        hunter: Hunter::new(config.hunter_speed, config.hunter_size),
        position: Position(pos),
        health: Health::new(config.hunter_hp),
        shield: Shield::new(config.hunter_shield),
        debuffs: Debuffs::default(),
        wobble: Wobble {
            phase: rng.angle(),
            rate: rng.range(2.0, 3.0),
        },
        wings: WingBeat {
            wing_phase: rng.angle(),
            wing_rate: rng.range(20.0, 25.0),
            bob_phase: rng.angle(),
            bob_rate: rng.range(1.5, 2.5),
        },
    }
}

/// Turn one queued request into an entity.
pub fn spawn_one(commands: &mut Commands, spawn: Spawn, config: &SimConfig, rng: &mut SimRng) {
    let w = &config.weapons;
    match spawn {
        Spawn::Projectile { pos, projectile } => {
            commands.spawn(ProjectileBundle {
                projectile,
                position: Position(pos),
            });
        }
        Spawn::Bee { pos } => {
            commands.spawn(bee_bundle(pos, config, rng));
        }
        Spawn::Hunter { pos } => {
            commands.spawn(hunter_bundle(pos, config, rng));
        }
        Spawn::Dropship { pos, dropship } => {
            commands.spawn((Position(pos), dropship));
        }
        Spawn::FreezeZone { pos } => {
            commands.spawn((
                Position(pos),
                FreezeZone { radius: w.freeze_radius },
                Lifetime::new(w.freeze_duration_ms),
            ));
        }
        Spawn::ElectricZone { pos } => {
            commands.spawn((
                Position(pos),
                ElectricZone { radius: w.electric_radius },
                Lifetime::new(w.electric_duration_ms),
            ));
        }
        Spawn::Singularity { pos } => {
            commands.spawn((
                Position(pos),
                Singularity {
                    radius: w.singularity_radius,
                    inner_radius: w.singularity_inner_radius,
                    pull: w.singularity_pull,
                    dps: w.singularity_dps,
                },
                Lifetime::new(w.singularity_duration_ms),
            ));
        }
        Spawn::Railgun { origin, angle } => {
            commands.spawn((
                Position(origin),
                RailgunBeam {
                    angle,
                    length: w.railgun_length,
                    half_width: w.railgun_half_width,
                    extend_ms: w.railgun_extend_ms,
                    dps: w.railgun_dps,
                },
                Lifetime::new(w.railgun_duration_ms),
            ));
        }
        Spawn::Shockwave { pos } => {
            commands.spawn((
                Position(pos),
                Shockwave {
                    max_radius: w.shockwave_radius,
                    expand_ms: w.shockwave_expand_ms,
                    stun_ms: w.shockwave_stun_ms,
                },
                Lifetime::new(w.shockwave_duration_ms),
            ));
        }
        Spawn::Missile { pos, heading } => {
            commands.spawn((
                Position(pos),
                Missile {
                    heading,
                    speed: w.missile_speed,
                    turn_rate: w.missile_turn_rate,
                    damage: w.missile_damage,
                    target: None,
                },
                Lifetime::new(w.missile_lifetime_ms),
            ));
        }
        Spawn::Pickup { pos, grant } => {
            commands.spawn((Position(pos), WeaponPickup { grant }, Lifetime::new(w.pickup_lifetime_ms)));
        }
    }
}

pub fn spawn_flush_system(
    mut commands: Commands,
    config: Res<SimConfig>,
    mut rng: ResMut<SimRng>,
    mut spawns: ResMut<SpawnQueue>,
) {
    for spawn in spawns.0.drain(..) {
        spawn_one(&mut commands, spawn, &config, &mut rng);
    }
}
