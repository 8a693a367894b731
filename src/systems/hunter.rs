//! Hunter AI and dropship deployment.
//!
//! A player who camps too long gets a dropship: it flies in, hovers while
//! deploying, releases two hunters and leaves. Hunters keep a stand-off
//! distance and snipe with lasers unless the player is cloaked or shielded.

use bevy_ecs::prelude::*;
use glam::Vec2;
use std::f32::consts::PI;

use crate::components::{Debuffs, Dropship, DropshipPhase, Hunter, HunterTracking, Position, Projectile, WingBeat, Wobble};
use crate::config::SimConfig;
use crate::events::{SoundCue, TickEvents};
use crate::player::{PlayerSlot, PlayerStatus};
use crate::resources::{DeltaTime, SimRng, Spawn, SpawnQueue};
use crate::spatial::{clamp_to_bounds, direction, frames, unit};

const DROPSHIP_EDGE_MARGIN: f32 = 50.0;
const DROPSHIP_APPROACH: f32 = 150.0;
const DROPSHIP_ARRIVE_SPEED: f32 = 3.0;
const DROPSHIP_LEAVE_SPEED: f32 = 4.0;
const DROPSHIP_LANDED: f32 = 5.0;
const DROPSHIP_DEPLOY_MS: f32 = 1500.0;
const DROPSHIP_EXIT_MARGIN: f32 = 100.0;
/// Local (along heading, across heading) offsets hunters drop at.
const DEPLOY_OFFSETS: [Vec2; 2] = [Vec2::new(-20.0, 15.0), Vec2::new(-20.0, -15.0)];

const STAND_OFF: f32 = 120.0;
const STAND_OFF_CONFUSED: f32 = 200.0;
const BACK_OFF_RATIO: f32 = 0.6;
const WOBBLE: f32 = 0.3;
const FROZEN_SPEED: f32 = 0.2;
const FIRE_RANGE: f32 = 300.0;
const FIRE_SPREAD: f32 = 0.15;
const WANDER_SPREAD: f32 = 75.0;
const WANDER_REROLL_MS: f32 = 1600.0;

/// Build a dropship headed for a landing point near `player`.
pub fn plan_dropship(player: Vec2, config: &SimConfig, rng: &mut SimRng) -> (Vec2, Dropship) {
    let angle = rng.angle();
    let landing = clamp_to_bounds(
        player + unit(angle) * config.hunter_spawn_distance,
        config.arena(),
        DROPSHIP_EDGE_MARGIN,
    );
    let start = landing - unit(angle) * DROPSHIP_APPROACH;
    let dropship = Dropship {
        landing,
        angle: angle + PI,
        phase: DropshipPhase::Arriving,
    };
    (start, dropship)
}

/// Where the deploy offsets land in world space.
pub fn deploy_points(pos: Vec2, heading: f32) -> [Vec2; 2] {
    let rot = Vec2::from_angle(heading);
    DEPLOY_OFFSETS.map(|offset| pos + rot.rotate(offset))
}

pub fn dropship_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mut slot: ResMut<PlayerSlot>,
    mut rng: ResMut<SimRng>,
    mut spawns: ResMut<SpawnQueue>,
    mut events: ResMut<TickEvents>,
    mut dropships: Query<(Entity, &mut Position, &mut Dropship)>,
    hunters: Query<(), With<Hunter>>,
) {
    let dt = dt.0;
    let step = frames(dt);

    // Idle detection
    if let Some(player) = slot.player_mut() {
        let quiet = dropships.is_empty() && hunters.is_empty() && !spawns.has_pending_dropship();
        if quiet && player.stationary_ms >= config.idle_threshold_ms {
            let (pos, dropship) = plan_dropship(player.pos, &config, &mut rng);
            log::debug!("dropship inbound to {:?}", dropship.landing);
            spawns.push(Spawn::Dropship { pos, dropship });
            player.stationary_ms = 0.0;
            player.anchor = player.pos;
            events.sound(SoundCue::DropshipWarning);
        }
    }

    let arena = config.arena();
    for (entity, mut pos, mut ship) in dropships.iter_mut() {
        match ship.phase {
            DropshipPhase::Arriving => {
                let remaining = pos.0.distance(ship.landing);
                if remaining > DROPSHIP_LANDED {
                    let travel = (DROPSHIP_ARRIVE_SPEED * step).min(remaining);
                    let cur = pos.0;
                    pos.0 += direction(cur, ship.landing) * travel;
                } else {
                    ship.phase = DropshipPhase::Deploying { remaining_ms: DROPSHIP_DEPLOY_MS };
                    log::debug!("dropship landed at {:?}", pos.0);
                }
            }
            DropshipPhase::Deploying { remaining_ms } => {
                let remaining_ms = remaining_ms - dt;
                if remaining_ms <= 0.0 {
                    for point in deploy_points(pos.0, ship.angle) {
                        spawns.push(Spawn::Hunter { pos: point });
                    }
                    ship.phase = DropshipPhase::Leaving;
                    log::debug!("dropship deployed hunters");
                } else {
                    ship.phase = DropshipPhase::Deploying { remaining_ms };
                }
            }
            DropshipPhase::Leaving => {
                pos.0 += unit(ship.angle + PI) * DROPSHIP_LEAVE_SPEED * step;
                let outside = pos.0.x < -DROPSHIP_EXIT_MARGIN
                    || pos.0.y < -DROPSHIP_EXIT_MARGIN
                    || pos.0.x > arena.x + DROPSHIP_EXIT_MARGIN
                    || pos.0.y > arena.y + DROPSHIP_EXIT_MARGIN;
                if outside {
                    commands.entity(entity).despawn();
                }
            }
        }
    }
}

pub fn hunter_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    status: Res<PlayerStatus>,
    mut rng: ResMut<SimRng>,
    mut spawns: ResMut<SpawnQueue>,
    mut events: ResMut<TickEvents>,
    mut hunters: Query<(Entity, &mut Position, &mut Hunter, &mut Debuffs, &mut Wobble, &mut WingBeat)>,
) {
    let dt = dt.0;
    let step = frames(dt);
    let arena = config.arena();

    let mut order: Vec<Entity> = hunters.iter().map(|(e, ..)| e).collect();
    order.sort();

    for entity in order {
        let Ok((_, mut pos, mut hunter, mut debuffs, mut wobble, mut wings)) = hunters.get_mut(entity) else {
            continue;
        };

        wobble.advance(dt);
        wings.advance(dt, 1.0, if debuffs.is_frozen() { 0.3 } else { 1.0 });
        debuffs.tick(dt);

        let Some(player) = status.position else {
            continue;
        };

        let target = if status.is_cloaked() {
            let anchor = hunter.last_seen.unwrap_or(player);
            let (wander, reroll_ms) = match hunter.tracking {
                HunterTracking::Lost { wander, reroll_ms } if reroll_ms - dt > 0.0 => {
                    (wander, reroll_ms - dt)
                }
                _ => (anchor + rng.jitter(WANDER_SPREAD), WANDER_REROLL_MS),
            };
            hunter.tracking = HunterTracking::Lost { wander, reroll_ms };
            wander
        } else {
            hunter.last_seen = Some(player);
            hunter.tracking = HunterTracking::Locked;
            player
        };

        let to_target = target - pos.0;
        let dist = to_target.length();
        let dir = to_target.normalize_or_zero();
        if dist > 0.0 {
            hunter.angle = to_target.y.atan2(to_target.x);
        }

        let stand_off = if status.is_cloaked() { STAND_OFF_CONFUSED } else { STAND_OFF };
        let scale = debuffs.speed_scale(FROZEN_SPEED);
        let stride = hunter.speed * scale * step;
        if dist > stand_off {
            pos.0 += dir * stride.min(dist - stand_off);
        } else if dist < stand_off * BACK_OFF_RATIO && !status.is_cloaked() {
            pos.0 -= dir * stride * 0.5;
        }
        pos.0 += wobble.offset() * WOBBLE * scale * step;
        pos.0 = clamp_to_bounds(pos.0, arena, hunter.size);

        hunter.fire_cooldown_ms = (hunter.fire_cooldown_ms - dt).max(0.0);
        let can_fire = hunter.fire_cooldown_ms <= 0.0
            && !status.is_cloaked()
            && !status.is_shielded()
            && !debuffs.is_frozen()
            && !debuffs.is_stunned()
            && pos.0.distance(player) < FIRE_RANGE;
        if can_fire {
            let aim = hunter.angle + (rng.unit() - 0.5) * FIRE_SPREAD;
            let muzzle = pos.0 + unit(hunter.angle) * hunter.size;
            spawns.projectile(
                muzzle,
                Projectile::hunter_laser(aim, config.hunter_laser_speed, config.hunter_laser_damage),
            );
            hunter.fire_cooldown_ms = config.hunter_fire_cooldown_ms;
            events.sound(SoundCue::HunterLaser);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Health, HunterBundle, ProjectileKind, Shield};
    use crate::player::Player;

    fn setup(player_pos: Vec2) -> World {
        let mut world = World::new();
        let mut player = Player::spawn(player_pos);
        player.invincible_ms = 0.0;
        world.insert_resource(DeltaTime(16.0));
        world.insert_resource(SimConfig::default());
        world.insert_resource(PlayerSlot(Some(player)));
        world.insert_resource(PlayerStatus {
            position: Some(player_pos),
            ..PlayerStatus::default()
        });
        world.insert_resource(SimRng::new(Some(7)));
        world.insert_resource(SpawnQueue::default());
        world.insert_resource(TickEvents::default());
        world
    }

    fn spawn_hunter(world: &mut World, pos: Vec2) -> Entity {
        world
            .spawn(HunterBundle {
                hunter: Hunter::new(2.5, 12.0),
                position: Position(pos),
                health: Health::new(8.0),
                shield: Shield::new(25.0),
                debuffs: Debuffs::default(),
                wobble: Wobble::default(),
                wings: WingBeat::default(),
            })
            .id()
    }

    fn run_hunters(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(hunter_system);
        schedule.run(world);
    }

    fn run_dropship(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(dropship_system);
        schedule.run(world);
    }

    fn lasers(world: &World) -> usize {
        world.resource::<SpawnQueue>().pending_of_kind(ProjectileKind::HunterLaser)
    }

    #[test]
    fn test_hunter_fires_when_in_range_and_respects_cooldown() {
        let mut world = setup(Vec2::new(400.0, 300.0));
        spawn_hunter(&mut world, Vec2::new(550.0, 300.0));
        run_hunters(&mut world);
        assert_eq!(lasers(&world), 1);

        // 1500 ms cooldown: nothing for the next second.
        for _ in 0..60 {
            run_hunters(&mut world);
        }
        assert_eq!(lasers(&world), 1);
    }

    #[test]
    fn test_hunter_holds_fire_when_cloaked_or_shielded() {
        let mut world = setup(Vec2::new(400.0, 300.0));
        world.resource_mut::<PlayerStatus>().shielded = true;
        spawn_hunter(&mut world, Vec2::new(550.0, 300.0));
        run_hunters(&mut world);
        assert_eq!(lasers(&world), 0);

        let mut status = world.resource_mut::<PlayerStatus>();
        status.shielded = false;
        status.cloaked = true;
        run_hunters(&mut world);
        assert_eq!(lasers(&world), 0);
    }

    #[test]
    fn test_frozen_hunter_does_not_fire() {
        let mut world = setup(Vec2::new(400.0, 300.0));
        let hunter = spawn_hunter(&mut world, Vec2::new(550.0, 300.0));
        world.get_mut::<Debuffs>(hunter).unwrap().freeze(1000.0);
        run_hunters(&mut world);
        assert_eq!(lasers(&world), 0);
    }

    #[test]
    fn test_hunter_keeps_stand_off() {
        let mut world = setup(Vec2::new(400.0, 300.0));
        let far = spawn_hunter(&mut world, Vec2::new(800.0, 300.0));
        let close = spawn_hunter(&mut world, Vec2::new(430.0, 300.0));
        run_hunters(&mut world);
        assert!(world.get::<Position>(far).unwrap().0.x < 800.0);
        // Inside 0.6x stand-off it backs away.
        assert!(world.get::<Position>(close).unwrap().0.x > 430.0);
    }

    #[test]
    fn test_cloak_sends_hunter_wandering_near_last_sighting() {
        let mut world = setup(Vec2::new(400.0, 300.0));
        let hunter = spawn_hunter(&mut world, Vec2::new(700.0, 300.0));
        run_hunters(&mut world);
        world.resource_mut::<PlayerStatus>().cloaked = true;
        world.resource_mut::<PlayerStatus>().position = Some(Vec2::new(100.0, 100.0));
        run_hunters(&mut world);

        let h = *world.get::<Hunter>(hunter).unwrap();
        assert_eq!(h.last_seen, Some(Vec2::new(400.0, 300.0)));
        match h.tracking {
            HunterTracking::Lost { wander, .. } => {
                assert!((wander - Vec2::new(400.0, 300.0)).abs().max_element() <= WANDER_SPREAD);
            }
            HunterTracking::Locked => panic!("hunter should have lost the player"),
        }
    }

    #[test]
    fn test_idle_player_summons_single_dropship() {
        let mut world = setup(Vec2::new(400.0, 300.0));
        world.resource_mut::<PlayerSlot>().player_mut().unwrap().stationary_ms = 6000.0;
        run_dropship(&mut world);
        run_dropship(&mut world);

        let queue = world.resource::<SpawnQueue>();
        assert_eq!(queue.0.iter().filter(|s| matches!(s, Spawn::Dropship { .. })).count(), 1);
        assert_eq!(world.resource::<PlayerSlot>().player().unwrap().stationary_ms, 0.0);
        assert!(world.resource::<TickEvents>().changes.sounds.contains(&SoundCue::DropshipWarning));
    }

    #[test]
    fn test_dropship_sequence_deploys_two_hunters_then_leaves() {
        let mut world = setup(Vec2::new(400.0, 300.0));
        let config = SimConfig::default();
        let mut rng = SimRng::new(Some(3));
        let (start, ship) = plan_dropship(Vec2::new(400.0, 300.0), &config, &mut rng);
        assert!((start.distance(ship.landing) - 150.0).abs() < 1e-3);
        let entity = world.spawn((Position(start), ship)).id();

        let mut deployed = false;
        for _ in 0..1000 {
            run_dropship(&mut world);
            if world.get::<Dropship>(entity).is_none() {
                break;
            }
            if !deployed {
                let hunters = world
                    .resource::<SpawnQueue>()
                    .0
                    .iter()
                    .filter(|s| matches!(s, Spawn::Hunter { .. }))
                    .count();
                if hunters > 0 {
                    assert_eq!(hunters, 2);
                    assert_eq!(world.get::<Dropship>(entity).unwrap().phase, DropshipPhase::Leaving);
                    deployed = true;
                }
            }
        }
        assert!(deployed);
        assert!(world.get::<Dropship>(entity).is_none());
    }

    #[test]
    fn test_deploy_points_are_symmetric() {
        let [a, b] = deploy_points(Vec2::ZERO, 0.0);
        assert_eq!(a, Vec2::new(-20.0, 15.0));
        assert_eq!(b, Vec2::new(-20.0, -15.0));
    }
}
