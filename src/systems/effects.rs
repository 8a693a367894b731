//! Weapon effect systems.
//!
//! Every effect is an entity with a `Position`, a `Lifetime` and its own
//! component. Effects find their victims through the `SpatialGrid`, which is
//! rebuilt right before this phase, and only ever touch creatures through
//! the shared `Creatures` query. Lifetimes are counted down last, so an
//! effect acts on the tick it expires.

use bevy_ecs::prelude::*;
use glam::Vec2;
use std::collections::HashSet;

use crate::armory::{Armory, DefensiveWeapon, Defenses, HeavyWeapon, PickupGrant};
use crate::components::{
    Bee, Debuffs, ElectricZone, FreezeZone, Health, Hunter, Lifetime, Missile, Position, RailgunBeam, Shield,
    Shockwave, Singularity, SingularityPhase, WeaponPickup,
};
use crate::config::SimConfig;
use crate::events::{SoundCue, TickEvents};
use crate::hive::Hive;
use crate::player::PlayerSlot;
use crate::resources::{DeltaTime, GameState, SimRng, Spawn, SpawnQueue};
use crate::spatial::{angle_to, frames, point_segment_distance, turn_towards, unit, SpatialGrid, TargetKind};

/// Shield damage multiplier hunters take from area weapons.
pub const SHIELD_FACTOR: f32 = 10.0;
/// Hunters resist freezing.
const HUNTER_FREEZE_SHARE: f32 = 0.5;
const ELECTRIC_BEE_DAMAGE: f32 = 0.5;
const ELECTRIC_HUNTER_DAMAGE: f32 = 0.3;
/// Missiles hit when within the target's body plus this.
const MISSILE_CONTACT: f32 = 4.0;
const BEE_BODY: f32 = 4.0;
const PICKUP_EDGE_MARGIN: f32 = 40.0;
const PICKUP_PLACEMENT_TRIES: u32 = 50;

/// Bees and hunters as seen by the weapon effects.
pub type Creatures<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Position,
        &'static mut Health,
        Option<&'static mut Shield>,
        &'static mut Debuffs,
    ),
    Or<(With<Bee>, With<Hunter>)>,
>;

/// Apply `amount` to health, or `amount * shield_factor` to a standing shield.
pub fn apply_damage(health: &mut Health, shield: Option<&mut Shield>, amount: f32, shield_factor: f32) {
    match shield {
        Some(shield) => {
            shield.absorb(health, amount * shield_factor, amount);
        }
        None => health.damage(amount),
    }
}

fn is_alive(creatures: &Creatures, target: Entity) -> bool {
    creatures.get(target).is_ok_and(|(_, health, ..)| health.is_alive())
}

// ============================================================================
// LIGHT WEAPONS
// ============================================================================

pub fn freeze_zone_system(
    grid: Res<SpatialGrid>,
    zones: Query<(&Position, &FreezeZone, &Lifetime), (Without<Bee>, Without<Hunter>)>,
    mut creatures: Creatures,
) {
    for (pos, zone, lifetime) in zones.iter() {
        let remaining = lifetime.remaining_ms.max(0.0);
        for entry in grid.query_radius(pos.0, zone.radius) {
            if let Ok((_, _, _, mut debuffs)) = creatures.get_mut(entry.entity) {
                match entry.kind {
                    TargetKind::Bee => debuffs.freeze(remaining),
                    TargetKind::Hunter => debuffs.freeze(remaining * HUNTER_FREEZE_SHARE),
                }
            }
        }
    }
}

pub fn electric_zone_system(
    dt: Res<DeltaTime>,
    grid: Res<SpatialGrid>,
    zones: Query<(&Position, &ElectricZone, &Lifetime), (Without<Bee>, Without<Hunter>)>,
    mut creatures: Creatures,
) {
    for (pos, zone, lifetime) in zones.iter() {
        let share = dt.0 / lifetime.total_ms.max(1.0);
        for entry in grid.query_radius(pos.0, zone.radius) {
            if let Ok((_, mut health, mut shield, _)) = creatures.get_mut(entry.entity) {
                let amount = match entry.kind {
                    TargetKind::Bee => ELECTRIC_BEE_DAMAGE,
                    TargetKind::Hunter => ELECTRIC_HUNTER_DAMAGE,
                } * share;
                apply_damage(&mut health, shield.as_deref_mut(), amount, SHIELD_FACTOR);
            }
        }
    }
}

// ============================================================================
// HEAVY WEAPONS
// ============================================================================

pub fn singularity_system(
    dt: Res<DeltaTime>,
    grid: Res<SpatialGrid>,
    singularities: Query<(&Position, &Singularity, &Lifetime), (Without<Bee>, Without<Hunter>)>,
    mut creatures: Creatures,
) {
    let step = frames(dt.0);
    for (center, vortex, lifetime) in singularities.iter() {
        if Singularity::phase(lifetime.progress()) != SingularityPhase::Active {
            continue;
        }
        for entry in grid.query_radius(center.0, vortex.radius) {
            let Ok((mut pos, mut health, mut shield, _)) = creatures.get_mut(entry.entity) else {
                continue;
            };
            let dist = pos.0.distance(center.0);
            let pull = (vortex.pull * (1.0 - dist / vortex.radius) * step).clamp(0.0, dist);
            let cur = pos.0;
            pos.0 += (center.0 - cur).normalize_or_zero() * pull;

            if dist <= vortex.inner_radius {
                apply_damage(&mut health, shield.as_deref_mut(), vortex.dps * dt.0 * 0.001, SHIELD_FACTOR);
            }
        }
    }
}

pub fn railgun_system(
    dt: Res<DeltaTime>,
    grid: Res<SpatialGrid>,
    beams: Query<(&Position, &RailgunBeam, &Lifetime), (Without<Bee>, Without<Hunter>)>,
    mut creatures: Creatures,
) {
    for (origin, beam, lifetime) in beams.iter() {
        // Damage only during the first half; the rest is afterglow.
        if lifetime.elapsed_ms() > lifetime.total_ms * 0.5 {
            continue;
        }
        let elapsed = lifetime.elapsed_ms() + dt.0;
        let tip = beam.tip(origin.0, elapsed);
        let reach = beam.current_length(elapsed) + beam.half_width;
        for entry in grid.query_radius(origin.0, reach) {
            if point_segment_distance(entry.pos, origin.0, tip) > beam.half_width {
                continue;
            }
            if let Ok((_, mut health, mut shield, _)) = creatures.get_mut(entry.entity) {
                apply_damage(&mut health, shield.as_deref_mut(), beam.dps * dt.0 * 0.001, SHIELD_FACTOR);
            }
        }
    }
}

pub fn shockwave_system(
    dt: Res<DeltaTime>,
    grid: Res<SpatialGrid>,
    waves: Query<(&Position, &Shockwave, &Lifetime), (Without<Bee>, Without<Hunter>)>,
    mut creatures: Creatures,
) {
    for (center, wave, lifetime) in waves.iter() {
        if !wave.is_expanding(lifetime.elapsed_ms()) {
            continue;
        }
        let radius = wave.current_radius(lifetime.elapsed_ms() + dt.0);
        for entry in grid.query_radius(center.0, radius) {
            if let Ok((_, _, _, mut debuffs)) = creatures.get_mut(entry.entity) {
                debuffs.stun(wave.stun_ms);
            }
        }
    }
}

// ============================================================================
// DEFENSIVE WEAPONS
// ============================================================================

/// Steer, move and detonate counter-missiles.
///
/// Each missile keeps a target no other missile holds. A missile whose
/// target died (or never had one) takes the nearest unclaimed creature in
/// range before steering.
pub fn missile_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    grid: Res<SpatialGrid>,
    mut missiles: Query<(Entity, &mut Position, &mut Missile), (Without<Bee>, Without<Hunter>)>,
    mut creatures: Creatures,
    hunters: Query<&Hunter>,
) {
    let step = frames(dt.0);

    let mut order: Vec<Entity> = missiles.iter().map(|(e, ..)| e).collect();
    order.sort();
    let mut claimed: HashSet<Entity> = missiles
        .iter()
        .filter_map(|(_, _, m)| m.target)
        .filter(|&t| is_alive(&creatures, t))
        .collect();

    for entity in order {
        let Ok((_, mut pos, mut missile)) = missiles.get_mut(entity) else {
            continue;
        };

        if missile.target.is_some_and(|t| !is_alive(&creatures, t)) {
            missile.target = None;
        }
        if missile.target.is_none() {
            missile.target = grid
                .nearest(pos.0, config.weapons.missile_acquire_range, |e| {
                    !claimed.contains(&e.entity) && is_alive(&creatures, e.entity)
                })
                .map(|e| e.entity);
            if let Some(target) = missile.target {
                claimed.insert(target);
            }
        }

        let target = missile
            .target
            .and_then(|t| creatures.get(t).ok().map(|(p, ..)| (t, p.0)));
        if let Some((_, aim)) = target {
            let desired = angle_to(pos.0, aim);
            missile.heading = turn_towards(missile.heading, desired, missile.turn_rate * step);
        }
        pos.0 += unit(missile.heading) * missile.speed * step;

        let Some((victim, aim)) = target else {
            continue;
        };
        let body = hunters.get(victim).map_or(BEE_BODY, |h| h.size);
        if pos.0.distance(aim) <= body + MISSILE_CONTACT {
            if let Ok((_, mut health, mut shield, _)) = creatures.get_mut(victim) {
                apply_damage(&mut health, shield.as_deref_mut(), missile.damage, SHIELD_FACTOR);
            }
            claimed.remove(&victim);
            commands.entity(entity).despawn();
        }
    }
}

pub fn defense_system(dt: Res<DeltaTime>, mut defenses: ResMut<Defenses>) {
    defenses.tick(dt.0);
}

// ============================================================================
// PICKUPS
// ============================================================================

/// All six weapons a pickup can carry.
pub const PICKUP_GRANTS: [PickupGrant; 6] = [
    PickupGrant::Heavy(HeavyWeapon::Singularity),
    PickupGrant::Heavy(HeavyWeapon::Railgun),
    PickupGrant::Heavy(HeavyWeapon::Shockwave),
    PickupGrant::Defensive(DefensiveWeapon::Shield),
    PickupGrant::Defensive(DefensiveWeapon::Missiles),
    PickupGrant::Defensive(DefensiveWeapon::Cloak),
];

/// Random arena point clear of the hive, or `None` if none was found.
pub fn pickup_position(config: &SimConfig, hive_center: Vec2, rng: &mut SimRng) -> Option<Vec2> {
    (0..PICKUP_PLACEMENT_TRIES).find_map(|_| {
        let pos = Vec2::new(
            rng.range(PICKUP_EDGE_MARGIN, config.width - PICKUP_EDGE_MARGIN),
            rng.range(PICKUP_EDGE_MARGIN, config.height - PICKUP_EDGE_MARGIN),
        );
        (pos.distance(hive_center) >= config.weapons.pickup_hive_clearance).then_some(pos)
    })
}

/// Collect pickups the player touches and drop new ones on a timer.
pub fn pickup_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    slot: Res<PlayerSlot>,
    hive: Res<Hive>,
    mut state: ResMut<GameState>,
    mut rng: ResMut<SimRng>,
    mut armory: ResMut<Armory>,
    mut spawns: ResMut<SpawnQueue>,
    mut events: ResMut<TickEvents>,
    pickups: Query<(Entity, &Position, &WeaponPickup)>,
) {
    let tuning = &config.weapons;
    let mut remaining = 0;

    for (entity, pos, pickup) in pickups.iter() {
        let touched = slot
            .player()
            .is_some_and(|p| p.pos.distance(pos.0) < tuning.pickup_radius);
        if touched {
            armory.grant(pickup.grant);
            events.sound(SoundCue::WeaponPickup);
            log::debug!("picked up {:?}", pickup.grant);
            commands.entity(entity).despawn();
        } else {
            remaining += 1;
        }
    }

    state.pickup_ms += dt.0;
    if state.pickup_ms < tuning.pickup_interval_ms {
        return;
    }
    state.pickup_ms = 0.0;

    let pending = spawns.0.iter().filter(|s| matches!(s, Spawn::Pickup { .. })).count();
    if remaining + pending >= tuning.pickup_max {
        return;
    }
    if let Some(pos) = pickup_position(&config, hive.center, &mut rng) {
        let grant = PICKUP_GRANTS[rng.index(PICKUP_GRANTS.len())];
        spawns.push(Spawn::Pickup { pos, grant });
    }
}

/// Count down every timed entity and remove the expired ones.
pub fn lifetime_system(mut commands: Commands, dt: Res<DeltaTime>, mut timed: Query<(Entity, &mut Lifetime)>) {
    for (entity, mut lifetime) in timed.iter_mut() {
        if lifetime.tick(dt.0) {
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BeeBundle, HunterBundle, WingBeat, Wobble};
    use crate::player::Player;
    use crate::spatial::spatial_grid_update_system;

    fn setup() -> World {
        let config = SimConfig::default();
        let mut world = World::new();
        world.insert_resource(DeltaTime(16.0));
        world.insert_resource(Hive::new(&config));
        world.insert_resource(Armory::new(&config.weapons));
        world.insert_resource(config);
        world.insert_resource(SpatialGrid::default());
        world.insert_resource(PlayerSlot(None));
        world.insert_resource(GameState::default());
        world.insert_resource(SimRng::new(Some(21)));
        world.insert_resource(SpawnQueue::default());
        world.insert_resource(TickEvents::default());
        world
    }

    fn spawn_bee(world: &mut World, pos: Vec2) -> Entity {
        world
            .spawn(BeeBundle {
                bee: Bee::default(),
                position: Position(pos),
                health: Health::new(3.0),
                debuffs: Debuffs::default(),
                wobble: Wobble::default(),
                wings: WingBeat::default(),
            })
            .id()
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

    fn run_with_grid<M>(world: &mut World, system: impl IntoSystemConfigs<M>) {
        let mut schedule = Schedule::default();
        schedule.add_systems((spatial_grid_update_system, system).chain());
        schedule.run(world);
    }

    #[test]
    fn test_freeze_zone_halved_for_hunters() {
        let mut world = setup();
        let bee = spawn_bee(&mut world, Vec2::new(110.0, 100.0));
        let hunter = spawn_hunter(&mut world, Vec2::new(90.0, 100.0));
        let outside = spawn_bee(&mut world, Vec2::new(300.0, 100.0));
        let mut lifetime = Lifetime::new(3000.0);
        lifetime.remaining_ms = 2000.0;
        world.spawn((Position::new(100.0, 100.0), FreezeZone { radius: 80.0 }, lifetime));
        run_with_grid(&mut world, freeze_zone_system);

        assert_eq!(world.get::<Debuffs>(bee).unwrap().frozen_ms, 2000.0);
        assert_eq!(world.get::<Debuffs>(hunter).unwrap().frozen_ms, 1000.0);
        assert_eq!(world.get::<Debuffs>(outside).unwrap().frozen_ms, 0.0);
    }

    #[test]
    fn test_electric_zone_respects_hunter_shield() {
        let mut world = setup();
        let bee = spawn_bee(&mut world, Vec2::new(110.0, 100.0));
        let hunter = spawn_hunter(&mut world, Vec2::new(90.0, 100.0));
        world.spawn((Position::new(100.0, 100.0), ElectricZone { radius: 100.0 }, Lifetime::new(500.0)));
        run_with_grid(&mut world, electric_zone_system);

        let bee_hp = world.get::<Health>(bee).unwrap().current;
        assert!((bee_hp - (3.0 - 0.5 * 16.0 / 500.0)).abs() < 1e-5);
        let shield = world.get::<Shield>(hunter).unwrap().current;
        assert!((shield - (25.0 - 10.0 * 0.3 * 16.0 / 500.0)).abs() < 1e-4);
        assert_eq!(world.get::<Health>(hunter).unwrap().current, 8.0);
    }

    #[test]
    fn test_singularity_pulls_only_while_active() {
        let mut world = setup();
        let bee = spawn_bee(&mut world, Vec2::new(200.0, 100.0));
        let vortex = Singularity { radius: 180.0, inner_radius: 30.0, pull: 2.5, dps: 4.0 };
        let growing = world.spawn((Position::new(100.0, 100.0), vortex, Lifetime::new(4000.0))).id();
        run_with_grid(&mut world, singularity_system);
        assert_eq!(world.get::<Position>(bee).unwrap().0, Vec2::new(200.0, 100.0));

        world.get_mut::<Lifetime>(growing).unwrap().remaining_ms = 2000.0;
        run_with_grid(&mut world, singularity_system);
        let x = world.get::<Position>(bee).unwrap().0.x;
        let expected = 200.0 - 2.5 * (1.0 - 100.0 / 180.0) * frames(16.0);
        assert!((x - expected).abs() < 1e-3);
        assert_eq!(world.get::<Health>(bee).unwrap().current, 3.0);
    }

    #[test]
    fn test_singularity_core_grinds() {
        let mut world = setup();
        let hunter = spawn_hunter(&mut world, Vec2::new(110.0, 100.0));
        let mut lifetime = Lifetime::new(4000.0);
        lifetime.remaining_ms = 2000.0;
        let vortex = Singularity { radius: 180.0, inner_radius: 30.0, pull: 2.5, dps: 4.0 };
        world.spawn((Position::new(100.0, 100.0), vortex, lifetime));
        run_with_grid(&mut world, singularity_system);
        let shield = world.get::<Shield>(hunter).unwrap().current;
        assert!((shield - (25.0 - 4.0 * 0.016 * 10.0)).abs() < 1e-4);
    }

    #[test]
    fn test_railgun_pierces_along_beam_during_first_half() {
        let mut world = setup();
        let near = spawn_bee(&mut world, Vec2::new(105.0, 100.0));
        let beside = spawn_bee(&mut world, Vec2::new(108.0, 110.0));
        let off = spawn_bee(&mut world, Vec2::new(108.0, 130.0));
        let beam = RailgunBeam { angle: 0.0, length: 900.0, half_width: 14.0, extend_ms: 80.0, dps: 20.0 };
        let shot = world.spawn((Position::new(100.0, 100.0), beam, Lifetime::new(600.0))).id();
        run_with_grid(&mut world, railgun_system);

        let hit = 3.0 - 20.0 * 0.016;
        assert!((world.get::<Health>(near).unwrap().current - hit).abs() < 1e-5);
        assert!((world.get::<Health>(beside).unwrap().current - hit).abs() < 1e-5);
        assert_eq!(world.get::<Health>(off).unwrap().current, 3.0);

        world.get_mut::<Lifetime>(shot).unwrap().remaining_ms = 200.0;
        run_with_grid(&mut world, railgun_system);
        assert!((world.get::<Health>(near).unwrap().current - hit).abs() < 1e-5);
    }

    #[test]
    fn test_shockwave_stuns_only_while_expanding() {
        let mut world = setup();
        let bee = spawn_bee(&mut world, Vec2::new(110.0, 100.0));
        let wave = Shockwave { max_radius: 220.0, expand_ms: 400.0, stun_ms: 2500.0 };
        let mut lifetime = Lifetime::new(900.0);
        lifetime.remaining_ms = 700.0;
        let entity = world.spawn((Position::new(100.0, 100.0), wave, lifetime)).id();
        run_with_grid(&mut world, shockwave_system);
        assert_eq!(world.get::<Debuffs>(bee).unwrap().stunned_ms, 2500.0);

        world.get_mut::<Debuffs>(bee).unwrap().stunned_ms = 0.0;
        world.get_mut::<Lifetime>(entity).unwrap().remaining_ms = 300.0;
        run_with_grid(&mut world, shockwave_system);
        assert_eq!(world.get::<Debuffs>(bee).unwrap().stunned_ms, 0.0);
    }

    #[test]
    fn test_missiles_split_targets_and_detonate() {
        let mut world = setup();
        let a = spawn_bee(&mut world, Vec2::new(130.0, 100.0));
        let b = spawn_bee(&mut world, Vec2::new(140.0, 100.0));
        let missile = Missile { heading: 0.0, speed: 7.0, turn_rate: 0.12, damage: 3.0, target: None };
        let first = world.spawn((Position::new(100.0, 100.0), missile, Lifetime::new(4000.0))).id();
        let second = world.spawn((Position::new(100.0, 100.0), missile, Lifetime::new(4000.0))).id();
        run_with_grid(&mut world, missile_system);

        let t1 = world.get::<Missile>(first).unwrap().target;
        let t2 = world.get::<Missile>(second).unwrap().target;
        assert_eq!(t1, Some(a));
        assert_eq!(t2, Some(b));

        for _ in 0..10 {
            run_with_grid(&mut world, missile_system);
        }
        assert!(world.get::<Missile>(first).is_none());
        assert!(world.get::<Missile>(second).is_none());
        assert_eq!(world.get::<Health>(a).unwrap().current, 0.0);
        assert_eq!(world.get::<Health>(b).unwrap().current, 0.0);
    }

    #[test]
    fn test_missile_reacquires_when_target_dies() {
        let mut world = setup();
        let doomed = spawn_bee(&mut world, Vec2::new(300.0, 100.0));
        let other = spawn_bee(&mut world, Vec2::new(100.0, 300.0));
        let missile = Missile { heading: 0.0, speed: 7.0, turn_rate: 0.12, damage: 3.0, target: Some(doomed) };
        let m = world.spawn((Position::new(100.0, 100.0), missile, Lifetime::new(4000.0))).id();
        world.get_mut::<Health>(doomed).unwrap().current = 0.0;
        run_with_grid(&mut world, missile_system);
        assert_eq!(world.get::<Missile>(m).unwrap().target, Some(other));
    }

    #[test]
    fn test_pickup_collected_replaces_slot() {
        let mut world = setup();
        world.insert_resource(PlayerSlot(Some(Player::spawn(Vec2::new(100.0, 100.0)))));
        world.resource_mut::<Armory>().heavy = Some(HeavyWeapon::Railgun);
        let pickup = world
            .spawn((
                Position::new(110.0, 100.0),
                WeaponPickup { grant: PickupGrant::Heavy(HeavyWeapon::Shockwave) },
                Lifetime::new(12_000.0),
            ))
            .id();
        run_with_grid(&mut world, pickup_system);

        assert!(world.get::<WeaponPickup>(pickup).is_none());
        assert_eq!(world.resource::<Armory>().heavy, Some(HeavyWeapon::Shockwave));
        assert!(world.resource::<TickEvents>().changes.sounds.contains(&SoundCue::WeaponPickup));
    }

    #[test]
    fn test_pickups_drop_on_interval_away_from_hive() {
        let mut world = setup();
        world.resource_mut::<GameState>().pickup_ms = 14_990.0;
        run_with_grid(&mut world, pickup_system);

        let center = world.resource::<Hive>().center;
        let queue = world.resource::<SpawnQueue>();
        assert_eq!(queue.0.len(), 1);
        let Spawn::Pickup { pos, .. } = queue.0[0] else {
            panic!("expected a pickup");
        };
        assert!(pos.distance(center) >= 150.0);
    }

    #[test]
    fn test_lifetime_expiry_despawns() {
        let mut world = setup();
        let zone = world.spawn((Position::new(0.0, 0.0), FreezeZone { radius: 10.0 }, Lifetime::new(20.0))).id();
        let mut schedule = Schedule::default();
        schedule.add_systems(lifetime_system);
        schedule.run(&mut world);
        assert!(world.get::<FreezeZone>(zone).is_some());
        schedule.run(&mut world);
        assert!(world.get::<FreezeZone>(zone).is_none());
    }
}
