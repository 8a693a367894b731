//! Projectile integration and collision resolution.
//!
//! Hostile fire (hive bullets, hunter lasers) only tests against the player
//! and the ablative shield. Player shots test hive cells first, then bees,
//! then hunters; the first hit consumes the shot. Damage is applied here but
//! nothing is despawned except the projectiles themselves: creatures and
//! cells at zero are collected by the reap phase.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::armory::Defenses;
use crate::components::{Bee, Health, HitOutcome, Hunter, Position, Projectile, ProjectileKind, Shield};
use crate::config::SimConfig;
use crate::events::{SoundCue, TickEvents};
use crate::hive::Hive;
use crate::player::PlayerSlot;
use crate::resources::DeltaTime;
use crate::spatial::{frames, in_bounds};

/// Bee body radius for shot collisions.
pub const BEE_HIT_RADIUS: f32 = 4.0;
/// A player shot costs a hunter this much shield while it holds.
pub const SHOT_SHIELD_DAMAGE: f32 = 15.0;
/// And this much health once the shield is down.
pub const SHOT_HULL_DAMAGE: f32 = 1.0;

/// Screen shake (intensity, duration ms) for a hit on the player.
fn hit_shake(kind: ProjectileKind, outcome: HitOutcome) -> (f32, f32) {
    match (kind, outcome) {
        (ProjectileKind::HunterLaser, HitOutcome::Shield) => (5.0, 150.0),
        (ProjectileKind::HunterLaser, HitOutcome::Health) => (10.0, 250.0),
        (_, HitOutcome::Shield) => (4.0, 150.0),
        (_, HitOutcome::Health) => (8.0, 200.0),
    }
}

pub fn projectile_system(
    mut commands: Commands,
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    mut slot: ResMut<PlayerSlot>,
    defenses: Res<Defenses>,
    mut hive: ResMut<Hive>,
    mut events: ResMut<TickEvents>,
    mut projectiles: Query<(Entity, &mut Position, &mut Projectile), (Without<Bee>, Without<Hunter>)>,
    mut bees: Query<(Entity, &Position, &mut Health), (With<Bee>, Without<Hunter>, Without<Projectile>)>,
    mut hunters: Query<
        (Entity, &Position, &Hunter, &mut Health, &mut Shield),
        (Without<Bee>, Without<Projectile>),
    >,
) {
    let step = frames(dt.0);
    let arena = config.arena();

    let mut order: Vec<Entity> = projectiles.iter().map(|(e, ..)| e).collect();
    order.sort();

    for entity in order {
        let Ok((_, mut pos, mut projectile)) = projectiles.get_mut(entity) else {
            continue;
        };

        let motion = projectile.velocity * step;
        pos.0 += motion;
        projectile.traveled += motion.length();
        if projectile.traveled >= projectile.max_range || !in_bounds(pos.0, arena) {
            commands.entity(entity).despawn();
            continue;
        }

        let at = pos.0;
        let hit = if projectile.kind.is_hostile() {
            strike_player(&projectile, at, &mut slot, &defenses, config.weapons.shield_radius, &mut events)
        } else {
            strike_hive(at, &mut hive, config.honey_damage_per_hit, &mut bees)
                || strike_bee(at, projectile.radius, &mut bees)
                || strike_hunter(at, projectile.radius, &mut hunters)
        };

        if hit {
            events.impact(projectile.kind, at);
            commands.entity(entity).despawn();
        }
    }
}

/// Hostile fire against the ablative shield and then the player.
fn strike_player(
    projectile: &Projectile,
    at: Vec2,
    slot: &mut PlayerSlot,
    defenses: &Defenses,
    shield_radius: f32,
    events: &mut TickEvents,
) -> bool {
    let Some(player) = slot.player_mut() else {
        return false;
    };
    let dist = at.distance(player.pos);
    if defenses.is_shielded() && dist <= shield_radius {
        return true;
    }
    if dist >= projectile.radius + player.radius {
        return false;
    }
    if !player.is_invincible() {
        let outcome = player.take_hit(projectile.damage);
        let (intensity, duration_ms) = hit_shake(projectile.kind, outcome);
        events.shake(intensity, duration_ms);
        events.sound(match outcome {
            HitOutcome::Shield => SoundCue::ShieldHit,
            HitOutcome::Health => SoundCue::HealthHit,
        });
    }
    true
}

/// A shot landing inside a cell hurts every bee in that hex and then the
/// cell itself, unless the hive is still protected.
fn strike_hive(
    at: Vec2,
    hive: &mut Hive,
    honey_damage: f32,
    bees: &mut Query<(Entity, &Position, &mut Health), (With<Bee>, Without<Hunter>, Without<Projectile>)>,
) -> bool {
    let Some(index) = hive.cell_at(at) else {
        return false;
    };
    for (_, pos, mut health) in bees.iter_mut() {
        if health.is_alive() && hive.contains(index, pos.0) {
            health.damage(SHOT_HULL_DAMAGE);
        }
    }
    hive.damage_cell(index, honey_damage);
    true
}

fn strike_bee(
    at: Vec2,
    radius: f32,
    bees: &mut Query<(Entity, &Position, &mut Health), (With<Bee>, Without<Hunter>, Without<Projectile>)>,
) -> bool {
    let reach = radius + BEE_HIT_RADIUS;
    let target = bees
        .iter()
        .filter(|(_, pos, health)| health.is_alive() && pos.0.distance(at) < reach)
        .map(|(e, pos, _)| (e, pos.0.distance(at)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let Some((entity, _)) = target else {
        return false;
    };
    if let Ok((_, _, mut health)) = bees.get_mut(entity) {
        health.damage(SHOT_HULL_DAMAGE);
    }
    true
}

fn strike_hunter(
    at: Vec2,
    radius: f32,
    hunters: &mut Query<(Entity, &Position, &Hunter, &mut Health, &mut Shield), (Without<Bee>, Without<Projectile>)>,
) -> bool {
    let target = hunters
        .iter()
        .filter(|(_, pos, hunter, health, _)| health.is_alive() && pos.0.distance(at) < radius + hunter.size)
        .map(|(e, pos, ..)| (e, pos.0.distance(at)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let Some((entity, _)) = target else {
        return false;
    };
    if let Ok((_, _, _, mut health, mut shield)) = hunters.get_mut(entity) {
        shield.absorb(&mut health, SHOT_SHIELD_DAMAGE, SHOT_HULL_DAMAGE);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BeeBundle, Debuffs, HunterBundle, ProjectileBundle, WingBeat, Wobble};
    use crate::hive::HiveCell;
    use crate::player::Player;
    use crate::spatial::HexCoord;

    fn setup(player: Option<Player>) -> World {
        let config = SimConfig::default();
        let mut hive = Hive::new(&config);
        hive.protection_ms = 0.0;
        let mut world = World::new();
        world.insert_resource(DeltaTime(16.0));
        world.insert_resource(hive);
        world.insert_resource(config);
        world.insert_resource(PlayerSlot(player));
        world.insert_resource(Defenses::default());
        world.insert_resource(TickEvents::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(projectile_system);
        schedule.run(world);
    }

    fn fire(world: &mut World, pos: Vec2, projectile: Projectile) -> Entity {
        world
            .spawn(ProjectileBundle {
                projectile,
                position: Position(pos),
            })
            .id()
    }

    fn spawn_bee(world: &mut World, pos: Vec2, hp: f32) -> Entity {
        world
            .spawn(BeeBundle {
                bee: Bee::default(),
                position: Position(pos),
                health: Health::new(hp),
                debuffs: Debuffs::default(),
                wobble: Wobble::default(),
                wings: WingBeat::default(),
            })
            .id()
    }

    fn spawn_hunter(world: &mut World, pos: Vec2, hp: f32, shield: f32) -> Entity {
        world
            .spawn(HunterBundle {
                hunter: Hunter::new(2.5, 12.0),
                position: Position(pos),
                health: Health::new(hp),
                shield: Shield::new(shield),
                debuffs: Debuffs::default(),
                wobble: Wobble::default(),
                wings: WingBeat::default(),
            })
            .id()
    }

    fn bare_player(pos: Vec2) -> Player {
        let mut player = Player::spawn(pos);
        player.shield = 0.0;
        player.invincible_ms = 0.0;
        player
    }

    #[test]
    fn test_hive_bullet_hits_health_when_shield_is_down() {
        let pos = Vec2::new(200.0, 200.0);
        let mut world = setup(Some(bare_player(pos)));
        let shot = fire(&mut world, pos - Vec2::new(3.0, 0.0), Projectile::hive_bullet(0.0, 40.0));
        run(&mut world);

        let player = world.resource::<PlayerSlot>().player().copied().unwrap();
        assert_eq!(player.health, 60.0);
        assert_eq!(player.shield, 0.0);
        assert!(world.get::<Projectile>(shot).is_none());
        let changes = &world.resource::<TickEvents>().changes;
        assert!(changes.sounds.contains(&SoundCue::HealthHit));
    }

    #[test]
    fn test_shot_expires_when_travel_reaches_range() {
        let mut world = setup(None);
        let mut spent = Projectile::player_shot(0.0, 350.0);
        spent.velocity = Vec2::ZERO;
        spent.traveled = 350.0;
        let spent = fire(&mut world, Vec2::new(50.0, 50.0), spent);
        let fresh = fire(&mut world, Vec2::new(50.0, 80.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);
        assert!(world.get::<Projectile>(spent).is_none());
        assert!(world.get::<Projectile>(fresh).is_some());
    }

    #[test]
    fn test_laser_drains_shield_only() {
        let pos = Vec2::new(200.0, 200.0);
        let mut player = bare_player(pos);
        player.shield = 10.0;
        let mut world = setup(Some(player));
        fire(&mut world, pos - Vec2::new(3.0, 0.0), Projectile::hunter_laser(0.0, 6.0, 15.0));
        run(&mut world);

        let player = world.resource::<PlayerSlot>().player().copied().unwrap();
        assert_eq!(player.shield, 0.0);
        assert_eq!(player.health, 100.0);
    }

    #[test]
    fn test_invincible_player_still_consumes_bullet() {
        let pos = Vec2::new(200.0, 200.0);
        let mut world = setup(Some(Player::spawn(pos)));
        let shot = fire(&mut world, pos, Projectile::hive_bullet(0.0, 40.0));
        run(&mut world);
        let player = world.resource::<PlayerSlot>().player().copied().unwrap();
        assert_eq!(player.shield, 100.0);
        assert!(world.get::<Projectile>(shot).is_none());
    }

    #[test]
    fn test_ablative_shield_absorbs_at_radius() {
        let pos = Vec2::new(200.0, 200.0);
        let mut world = setup(Some(bare_player(pos)));
        world.resource_mut::<Defenses>().shield_ms = 1000.0;
        let shot = fire(&mut world, pos - Vec2::new(40.0, 0.0), Projectile::hive_bullet(0.0, 40.0));
        run(&mut world);
        assert!(world.get::<Projectile>(shot).is_none());
        assert_eq!(world.resource::<PlayerSlot>().player().unwrap().health, 100.0);
    }

    #[test]
    fn test_shot_expires_at_max_range() {
        let mut world = setup(None);
        let shot = fire(&mut world, Vec2::new(100.0, 100.0), Projectile::player_shot(0.0, 10.0));
        run(&mut world);
        assert!(world.get::<Projectile>(shot).is_some());
        run(&mut world);
        assert!(world.get::<Projectile>(shot).is_none());
    }

    #[test]
    fn test_shot_leaving_arena_is_removed() {
        let mut world = setup(None);
        let shot = fire(&mut world, Vec2::new(2.0, 100.0), Projectile::player_shot(std::f32::consts::PI, 350.0));
        run(&mut world);
        assert!(world.get::<Projectile>(shot).is_none());
    }

    #[test]
    fn test_shot_hits_nearest_bee_only() {
        let mut world = setup(None);
        let near = spawn_bee(&mut world, Vec2::new(110.0, 100.0), 3.0);
        let far = spawn_bee(&mut world, Vec2::new(112.0, 100.0), 3.0);
        let shot = fire(&mut world, Vec2::new(100.0, 100.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);

        assert_eq!(world.get::<Health>(near).unwrap().current, 2.0);
        assert_eq!(world.get::<Health>(far).unwrap().current, 3.0);
        assert!(world.get::<Projectile>(shot).is_none());
    }

    #[test]
    fn test_shot_strips_hunter_shield_before_hull() {
        let mut world = setup(None);
        let hunter = spawn_hunter(&mut world, Vec2::new(110.0, 100.0), 1.0, 25.0);
        fire(&mut world, Vec2::new(100.0, 100.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);
        assert_eq!(world.get::<Shield>(hunter).unwrap().current, 10.0);
        assert_eq!(world.get::<Health>(hunter).unwrap().current, 1.0);

        world.get_mut::<Shield>(hunter).unwrap().current = 0.0;
        fire(&mut world, Vec2::new(100.0, 100.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);
        assert_eq!(world.get::<Health>(hunter).unwrap().current, 0.0);
    }

    #[test]
    fn test_shot_into_cell_drains_honey_then_structure_and_hurts_bees_inside() {
        let mut world = setup(None);
        let center = world.resource::<Hive>().center;
        world.resource_mut::<Hive>().cells[0].honey = 2.0;
        let inside = spawn_bee(&mut world, center + Vec2::new(5.0, 0.0), 3.0);
        let outside = spawn_bee(&mut world, center + Vec2::new(60.0, 0.0), 3.0);

        fire(&mut world, center - Vec2::new(10.0, 0.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);
        assert_eq!(world.resource::<Hive>().cells[0].honey, 0.0);
        assert_eq!(world.resource::<Hive>().cells[0].hp, 5.0);
        assert_eq!(world.get::<Health>(inside).unwrap().current, 2.0);
        assert_eq!(world.get::<Health>(outside).unwrap().current, 3.0);

        fire(&mut world, center - Vec2::new(10.0, 0.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);
        assert_eq!(world.resource::<Hive>().cells[0].hp, 4.0);
    }

    #[test]
    fn test_protected_hive_shrugs_off_shots() {
        let mut world = setup(None);
        world.resource_mut::<Hive>().protection_ms = 5000.0;
        let center = world.resource::<Hive>().center;
        fire(&mut world, center - Vec2::new(10.0, 0.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);
        assert_eq!(world.resource::<Hive>().cells[0].hp, 5.0);
    }

    #[test]
    fn test_growing_cell_is_smaller_target() {
        let mut world = setup(None);
        let center = world.resource::<Hive>().center;
        let coord = HexCoord::new(1, 0);
        let mut cell = HiveCell::new(coord, 5.0);
        cell.build_progress = 0.1;
        world.resource_mut::<Hive>().cells.push(cell);
        let cell_center = world.resource::<Hive>().cell_center(coord);
        assert!(cell_center.distance(center) > 30.0);

        // Well off centre for a cell that is only 10% grown.
        let shot = fire(&mut world, cell_center - Vec2::new(0.0, 18.0), Projectile::player_shot(0.0, 350.0));
        run(&mut world);
        assert!(world.get::<Projectile>(shot).is_some());
        assert_eq!(world.resource::<Hive>().cells[1].hp, 5.0);
    }
}
