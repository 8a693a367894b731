//! Hive economy: cell growth, turret fire and expansion.

use bevy_ecs::prelude::*;

use crate::components::Projectile;
use crate::config::SimConfig;
use crate::hive::Hive;
use crate::player::PlayerStatus;
use crate::resources::{DeltaTime, SimRng, SpawnQueue};
use crate::spatial::angle_to;

/// Turret spread with a freshly moving player, in radians.
pub const TURRET_SPREAD_WIDE: f32 = 0.3;
/// Turret spread against a player that has camped for `TURRET_SETTLE_MS`.
pub const TURRET_SPREAD_NARROW: f32 = 0.06;
pub const TURRET_SETTLE_MS: f32 = 2000.0;
/// A turret needs this share of a full cell's honey to fire.
const TURRET_HONEY_SHARE: f32 = 0.5;

/// Aim cone for a player that has been still for `stationary_ms`.
pub fn turret_spread(stationary_ms: f32) -> f32 {
    let settle = (stationary_ms / TURRET_SETTLE_MS).clamp(0.0, 1.0);
    TURRET_SPREAD_WIDE + (TURRET_SPREAD_NARROW - TURRET_SPREAD_WIDE) * settle
}

pub fn hive_system(
    dt: Res<DeltaTime>,
    config: Res<SimConfig>,
    status: Res<PlayerStatus>,
    mut hive: ResMut<Hive>,
    mut rng: ResMut<SimRng>,
    mut spawns: ResMut<SpawnQueue>,
) {
    // Expansion is gated on the hive as it stood when the tick began.
    let ready = hive.all_built();
    hive.tick(dt.0);

    if let Some(player) = status.position {
        let spread = turret_spread(status.stationary_ms);
        let threshold = config.honey_per_cell * TURRET_HONEY_SHARE;
        let center = hive.center;
        let size = hive.hex_size;
        for cell in hive.cells.iter_mut() {
            if !cell.is_built() || cell.honey < threshold || cell.fire_cooldown_ms > 0.0 {
                continue;
            }
            let origin = cell.coord.to_pixel(size, center);
            if origin.distance(player) > config.hive_fire_range {
                continue;
            }
            let aim = angle_to(origin, player) + (rng.unit() - 0.5) * spread;
            spawns.projectile(origin, Projectile::hive_bullet(aim, config.hive_bullet_damage));
            cell.fire_cooldown_ms = config.hive_fire_cooldown_ms;
        }
    }

    if ready {
        let built = hive.try_expand(config.honey_to_build, config.cell_max_hp);
        if !built.is_empty() {
            log::debug!(
                "hive grew {:?}, {} cells, reserve {:.1}",
                built,
                hive.cells.len(),
                hive.reserve
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ProjectileKind;
    use crate::resources::Spawn;
    use crate::spatial::HexCoord;
    use glam::Vec2;
    use std::collections::HashSet;

    fn setup(player: Option<Vec2>) -> World {
        let config = SimConfig::default();
        let mut world = World::new();
        world.insert_resource(DeltaTime(16.0));
        world.insert_resource(Hive::new(&config));
        world.insert_resource(config);
        world.insert_resource(PlayerStatus {
            position: player,
            ..PlayerStatus::default()
        });
        world.insert_resource(SimRng::new(Some(11)));
        world.insert_resource(SpawnQueue::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(hive_system);
        schedule.run(world);
    }

    fn bullets(world: &World) -> usize {
        world.resource::<SpawnQueue>().pending_of_kind(ProjectileKind::HiveBullet)
    }

    #[test]
    fn test_spread_narrows_with_stationary_time() {
        assert!((turret_spread(0.0) - 0.3).abs() < 1e-6);
        assert!((turret_spread(1000.0) - 0.18).abs() < 1e-6);
        assert!((turret_spread(2000.0) - 0.06).abs() < 1e-6);
        assert!((turret_spread(60_000.0) - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_turret_needs_half_honey_and_range() {
        let mut world = setup(None);
        let center = world.resource::<Hive>().center;
        world.resource_mut::<PlayerStatus>().position = Some(center + Vec2::new(200.0, 0.0));

        world.resource_mut::<Hive>().cells[0].honey = 5.0;
        run(&mut world);
        assert_eq!(bullets(&world), 0);

        world.resource_mut::<Hive>().cells[0].honey = 6.0;
        run(&mut world);
        assert_eq!(bullets(&world), 1);

        // Out of range.
        let mut world = setup(Some(center + Vec2::new(600.0, 0.0)));
        world.resource_mut::<Hive>().cells[0].honey = 12.0;
        run(&mut world);
        assert_eq!(bullets(&world), 0);
    }

    #[test]
    fn test_turret_cooldown_separates_shots() {
        let mut world = setup(None);
        let center = world.resource::<Hive>().center;
        world.resource_mut::<PlayerStatus>().position = Some(center + Vec2::new(100.0, 50.0));
        world.resource_mut::<Hive>().cells[0].honey = 12.0;

        let mut fired_at = Vec::new();
        for tick in 0..300u32 {
            let before = bullets(&world);
            run(&mut world);
            if bullets(&world) > before {
                fired_at.push(tick as f32 * 16.0);
            }
        }
        assert!(fired_at.len() >= 2);
        for pair in fired_at.windows(2) {
            assert!(pair[1] - pair[0] >= 2000.0 - 16.0);
        }
    }

    #[test]
    fn test_bullet_aim_stays_inside_cone() {
        let mut world = setup(None);
        let center = world.resource::<Hive>().center;
        let player = center + Vec2::new(0.0, -200.0);
        world.resource_mut::<PlayerStatus>().position = Some(player);
        world.resource_mut::<Hive>().cells[0].honey = 12.0;
        run(&mut world);

        let queue = world.resource::<SpawnQueue>();
        let Spawn::Projectile { projectile, .. } = &queue.0[0] else {
            panic!("expected a bullet");
        };
        let ideal = angle_to(center, player);
        assert!((projectile.angle() - ideal).abs() <= 0.15 + 1e-4);
        assert_eq!(projectile.damage, 40.0);
    }

    #[test]
    fn test_expansion_waits_for_complete_hive() {
        let mut world = setup(None);
        world.resource_mut::<Hive>().reserve = 100.0;
        run(&mut world);
        {
            let hive = world.resource::<Hive>();
            assert_eq!(hive.cells.len(), 3);
            assert!((hive.reserve - 70.0).abs() < 1e-4);
        }

        // The new cells need ~667 ms to grow; nothing is added meanwhile.
        for _ in 0..30 {
            run(&mut world);
        }
        assert_eq!(world.resource::<Hive>().cells.len(), 3);

        for _ in 0..60 {
            run(&mut world);
        }
        let hive = world.resource::<Hive>();
        assert!(hive.cells.len() > 3);
        assert!(hive.reserve >= 0.0);
        let unique: HashSet<HexCoord> = hive.cells.iter().map(|c| c.coord).collect();
        assert_eq!(unique.len(), hive.cells.len());
    }

    #[test]
    fn test_cells_completing_this_tick_do_not_expand_until_next() {
        let mut world = setup(None);
        {
            let mut hive = world.resource_mut::<Hive>();
            hive.reserve = 100.0;
            hive.cells.push(crate::hive::HiveCell::new(HexCoord::new(1, 0), 5.0));
            hive.cells[1].build_progress = 0.99;
        }
        run(&mut world);
        assert_eq!(world.resource::<Hive>().cells.len(), 2);
        assert!(world.resource::<Hive>().all_built());
        run(&mut world);
        assert_eq!(world.resource::<Hive>().cells.len(), 4);
    }
}
