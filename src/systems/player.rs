//! Player phase: movement, weapons, and bee contact.
//!
//! Runs first each tick. Everything the player fires is queued, so shots
//! and effect zones start moving or ticking on the following tick.

use bevy_ecs::prelude::*;
use glam::Vec2;
use std::f32::consts::TAU;

use crate::armory::{Armory, DefensiveWeapon, Defenses, HeavyWeapon, LightWeapon};
use crate::components::{Bee, BeeState, HitOutcome, Position, Projectile};
use crate::config::SimConfig;
use crate::events::{SoundCue, TickEvents};
use crate::input::InputState;
use crate::player::{Player, PlayerSlot, PlayerStatus};
use crate::resources::{DeltaTime, Spawn, SpawnQueue};
use crate::spatial::{clamp_to_bounds, frames, unit};

/// Bee body radius used for contact.
const BEE_RADIUS: f32 = 4.0;
/// Extra slack on the contact test.
const CONTACT_SLACK: f32 = 2.0;
/// How far past contact a repelled bee is pushed.
const REPEL_DISTANCE: f32 = 15.0;
/// Shield drain per ms of contact.
const CONTACT_SHIELD_RATE: f32 = 0.1;
/// Health drain per ms of contact once the shield is gone.
const CONTACT_HEALTH_RATE: f32 = 0.15;
/// Shield regained per ms without contact.
const SHIELD_REGEN_RATE: f32 = 0.02;
/// Singularities open this far in front of the player.
const SINGULARITY_THROW: f32 = 120.0;

/// Contact damage multiplier by bee behaviour.
fn contact_multiplier(state: &BeeState) -> f32 {
    match state {
        BeeState::Hunt { .. } => 2.0,
        BeeState::Attack { .. } => 1.5,
        _ => 1.0,
    }
}

pub fn player_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    input: Res<InputState>,
    mut slot: ResMut<PlayerSlot>,
    mut armory: ResMut<Armory>,
    mut defenses: ResMut<Defenses>,
    mut spawns: ResMut<SpawnQueue>,
    mut events: ResMut<TickEvents>,
    mut bees: Query<(&mut Position, &Bee)>,
) {
    let Some(player) = slot.player_mut() else {
        return;
    };
    let dt = dt.0;
    let arena = config.arena();

    // Movement
    let movement = input.movement();
    if movement != Vec2::ZERO {
        player.facing = movement.y.atan2(movement.x);
    }
    player.pos = clamp_to_bounds(
        player.pos + movement * player.speed * frames(dt),
        arena,
        player.radius,
    );
    player.track_stationary(dt);
    player.invincible_ms = (player.invincible_ms - dt).max(0.0);

    // Primary fire
    player.fire_cooldown_ms = (player.fire_cooldown_ms - dt).max(0.0);
    if input.actions.fire && player.fire_cooldown_ms <= 0.0 {
        spawns.projectile(
            player.pos,
            Projectile::player_shot(player.facing, config.player_shot_distance),
        );
        player.fire_cooldown_ms = config.player_fire_interval_ms;
        events.sound(SoundCue::ShotFired);
    }

    if input.actions.cycle {
        armory.cycle();
    }
    if input.actions.use_light {
        if let Some(weapon) = armory.use_light() {
            use_light_weapon(weapon, player, &config, &mut spawns, &mut events);
        }
    }
    if input.actions.use_heavy {
        if let Some(weapon) = armory.take_heavy() {
            use_heavy_weapon(weapon, player, &config, &mut spawns, &mut events);
        }
    }
    if input.actions.use_defensive {
        if let Some(weapon) = armory.take_defensive() {
            use_defensive_weapon(weapon, player, &config, &mut defenses, &mut spawns, &mut events);
        }
    }

    resolve_contact(player, dt, defenses.is_shielded(), &mut bees, &mut events);

    if let Some(low) = player.update_low_health() {
        events.sound(if low {
            SoundCue::LowHealthEnter
        } else {
            SoundCue::LowHealthExit
        });
    }
}

fn use_light_weapon(
    weapon: LightWeapon,
    player: &mut Player,
    config: &SimConfig,
    spawns: &mut SpawnQueue,
    events: &mut TickEvents,
) {
    let tuning = &config.weapons;
    let facing = unit(player.facing);
    match weapon {
        LightWeapon::Freeze => {
            spawns.push(Spawn::FreezeZone {
                pos: player.pos - facing * tuning.freeze_drop_distance,
            });
        }
        LightWeapon::Electric => {
            spawns.push(Spawn::ElectricZone { pos: player.pos });
            events.shake(6.0, 200.0);
        }
        LightWeapon::Warp => {
            player.pos = clamp_to_bounds(player.pos + facing * tuning.warp_distance, config.arena(), 0.0);
        }
    }
    log::debug!("light weapon {:?} used at {:?}", weapon, player.pos);
    events.sound(SoundCue::LightWeapon(weapon));
}

fn use_heavy_weapon(
    weapon: HeavyWeapon,
    player: &Player,
    config: &SimConfig,
    spawns: &mut SpawnQueue,
    events: &mut TickEvents,
) {
    match weapon {
        HeavyWeapon::Singularity => {
            let pos = clamp_to_bounds(
                player.pos + unit(player.facing) * SINGULARITY_THROW,
                config.arena(),
                0.0,
            );
            spawns.push(Spawn::Singularity { pos });
        }
        HeavyWeapon::Railgun => {
            spawns.push(Spawn::Railgun { origin: player.pos, angle: player.facing });
            events.shake(5.0, 200.0);
        }
        HeavyWeapon::Shockwave => {
            spawns.push(Spawn::Shockwave { pos: player.pos });
            events.shake(10.0, 300.0);
        }
    }
    log::debug!("heavy weapon {:?} used at {:?}", weapon, player.pos);
    events.sound(SoundCue::HeavyWeapon(weapon));
}

fn use_defensive_weapon(
    weapon: DefensiveWeapon,
    player: &Player,
    config: &SimConfig,
    defenses: &mut Defenses,
    spawns: &mut SpawnQueue,
    events: &mut TickEvents,
) {
    let tuning = &config.weapons;
    match weapon {
        DefensiveWeapon::Shield => defenses.shield_ms = tuning.shield_duration_ms,
        DefensiveWeapon::Cloak => defenses.cloak_ms = tuning.cloak_duration_ms,
        DefensiveWeapon::Missiles => {
            let count = tuning.missile_count.max(1);
            for i in 0..count {
                let heading = player.facing + TAU * i as f32 / count as f32;
                spawns.push(Spawn::Missile { pos: player.pos, heading });
            }
        }
    }
    log::debug!("defensive weapon {:?} used", weapon);
    events.sound(SoundCue::DefensiveWeapon(weapon));
}

/// Bees touching the player drain shield (and get knocked back) or health.
/// While invincible or under the ablative shield they are only knocked back.
fn resolve_contact(
    player: &mut Player,
    dt: f32,
    shielded: bool,
    bees: &mut Query<(&mut Position, &Bee)>,
    events: &mut TickEvents,
) {
    let contact = BEE_RADIUS + player.radius + CONTACT_SLACK;
    let repel_to = player.radius + BEE_RADIUS + REPEL_DISTANCE;
    let mut hit: Option<HitOutcome> = None;

    for (mut pos, bee) in bees.iter_mut() {
        let offset = pos.0 - player.pos;
        if offset.length() >= contact {
            continue;
        }
        let away = offset.try_normalize().unwrap_or_else(|| unit(player.facing));
        let multiplier = contact_multiplier(&bee.state);

        if player.is_invincible() || shielded {
            pos.0 = player.pos + away * repel_to;
        } else if player.shield > 0.0 {
            player.shield = (player.shield - dt * CONTACT_SHIELD_RATE * multiplier).max(0.0);
            pos.0 = player.pos + away * repel_to;
            hit = Some(HitOutcome::Shield);
        } else {
            player.health = (player.health - dt * CONTACT_HEALTH_RATE * multiplier).max(0.0);
            hit = Some(HitOutcome::Health);
        }
    }

    match hit {
        Some(HitOutcome::Shield) => events.sound(SoundCue::ShieldHit),
        Some(HitOutcome::Health) => events.sound(SoundCue::HealthHit),
        None => player.shield = (player.shield + dt * SHIELD_REGEN_RATE).min(player.max_shield),
    }
}

/// Publish what the AI phases may know about the player this tick.
pub fn player_status_system(
    slot: Res<PlayerSlot>,
    defenses: Res<Defenses>,
    mut status: ResMut<PlayerStatus>,
) {
    *status = match slot.player() {
        Some(player) => PlayerStatus {
            position: Some(player.pos),
            cloaked: defenses.is_cloaked(),
            shielded: defenses.is_shielded(),
            stationary_ms: player.stationary_ms,
        },
        None => PlayerStatus::default(),
    };
}
