//! End-of-tick cleanup: remove the dead and settle the score.
//!
//! Every earlier phase only marks damage. This is the one place creatures,
//! cells and the player are removed, so collision results never depend on
//! iteration order.

use bevy_ecs::prelude::*;

use crate::components::{Bee, Health, Hunter, Position};
use crate::events::{CosmeticTrigger, DestroyedKind, ExplosionKind, SoundCue, TickEvents};
use crate::hive::Hive;
use crate::player::PlayerSlot;
use crate::resources::GameState;

const PLAYER_DEATH_SHAKE: (f32, f32) = (15.0, 500.0);

pub fn reap_system(
    mut commands: Commands,
    mut hive: ResMut<Hive>,
    mut slot: ResMut<PlayerSlot>,
    mut state: ResMut<GameState>,
    mut events: ResMut<TickEvents>,
    creatures: Query<(Entity, &Position, &Health, Has<Hunter>), Or<(With<Bee>, With<Hunter>)>>,
) {
    let mut dead: Vec<(Entity, Position, bool)> = creatures
        .iter()
        .filter(|(_, _, health, _)| !health.is_alive())
        .map(|(entity, pos, _, is_hunter)| (entity, *pos, is_hunter))
        .collect();
    dead.sort_by_key(|(entity, ..)| *entity);

    for (entity, pos, is_hunter) in dead {
        let kind = if is_hunter {
            DestroyedKind::Hunter
        } else {
            DestroyedKind::Bee
        };
        events.destroyed(kind, pos.0);
        commands.entity(entity).despawn();
    }

    for center in hive.reap() {
        events.destroyed(DestroyedKind::Cell, center);
    }

    if let Some(player) = slot.player().copied() {
        if player.is_dead() {
            events.changes.triggers.push(CosmeticTrigger::Explosion {
                kind: ExplosionKind::Player,
                position: player.pos,
            });
            let (intensity, duration_ms) = PLAYER_DEATH_SHAKE;
            events.shake(intensity, duration_ms);
            events.sound(SoundCue::GameOver);
            events.changes.game_over = true;
            slot.0 = None;
            state.game_over = true;
            log::info!("player destroyed, final score {}", state.score + events.changes.score_delta);
        }
    }

    state.score += events.changes.score_delta;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{BeeBundle, Debuffs, HunterBundle, Shield, WingBeat, Wobble};
    use crate::config::SimConfig;
    use crate::player::Player;
    use glam::Vec2;

    fn setup() -> World {
        let config = SimConfig::default();
        let mut world = World::new();
        world.insert_resource(Hive::new(&config));
        world.insert_resource(config);
        world.insert_resource(PlayerSlot(Some(Player::spawn(Vec2::new(50.0, 50.0)))));
        world.insert_resource(GameState::default());
        world.insert_resource(TickEvents::default());
        world
    }

    fn run(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems(reap_system);
        schedule.run(world);
    }

    fn bee(world: &mut World, hp: f32) -> Entity {
        let mut health = Health::new(3.0);
        health.current = hp;
        world
            .spawn(BeeBundle {
                bee: Bee::default(),
                position: Position::new(10.0, 10.0),
                health,
                debuffs: Debuffs::default(),
                wobble: Wobble::default(),
                wings: WingBeat::default(),
            })
            .id()
    }

    #[test]
    fn test_dead_creatures_scored_once_and_removed() {
        let mut world = setup();
        let dead = bee(&mut world, 0.0);
        let alive = bee(&mut world, 1.0);
        let hunter = world
            .spawn(HunterBundle {
                hunter: Hunter::new(2.5, 12.0),
                position: Position::new(20.0, 20.0),
                health: Health { current: 0.0, max: 8.0 },
                shield: Shield::new(0.0),
                debuffs: Debuffs::default(),
                wobble: Wobble::default(),
                wings: WingBeat::default(),
            })
            .id();
        run(&mut world);

        assert!(world.get::<Bee>(dead).is_none());
        assert!(world.get::<Bee>(alive).is_some());
        assert!(world.get::<Hunter>(hunter).is_none());
        let changes = world.resource_mut::<TickEvents>().take();
        assert_eq!(changes.destroyed(DestroyedKind::Bee), 1);
        assert_eq!(changes.destroyed(DestroyedKind::Hunter), 1);
        assert_eq!(changes.score_delta, 30);
        assert_eq!(world.resource::<GameState>().score, 30);

        run(&mut world);
        assert_eq!(world.resource::<GameState>().score, 30);
    }

    #[test]
    fn test_destroyed_cell_scores() {
        let mut world = setup();
        world.resource_mut::<Hive>().cells[0].hp = 0.0;
        run(&mut world);
        assert!(world.resource::<Hive>().cells.is_empty());
        assert_eq!(world.resource::<TickEvents>().changes.destroyed(DestroyedKind::Cell), 1);
        assert_eq!(world.resource::<GameState>().score, 10);
    }

    #[test]
    fn test_dead_player_ends_game() {
        let mut world = setup();
        world.resource_mut::<PlayerSlot>().player_mut().unwrap().health = 0.0;
        run(&mut world);

        assert!(world.resource::<PlayerSlot>().player().is_none());
        assert!(world.resource::<GameState>().game_over);
        let changes = &world.resource::<TickEvents>().changes;
        assert!(changes.game_over);
        assert!(changes.sounds.contains(&SoundCue::GameOver));
        assert!(changes.triggers.contains(&CosmeticTrigger::Explosion {
            kind: ExplosionKind::Player,
            position: Vec2::new(50.0, 50.0),
        }));
    }
}
