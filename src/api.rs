//! Public API for the simulation.
//!
//! This module provides the main interface for a presentation host (game
//! engine plugin, demo, test harness) to drive the simulation.
//!
//! ## Variable Timestep
//!
//! The host calls `advance(dt_ms, intents)` once per rendered frame with the
//! real elapsed time. Every speed, cooldown and timer scales with `dt_ms`,
//! so the same game plays at any frame rate. With a seeded `SimConfig`, the
//! same sequence of `advance` calls always produces the same game.
//!
//! ## Lifecycle
//!
//! - `start()` begins a game: fresh state, a generated resource field and
//!   the starting colony. `SimWorld::new` calls it.
//! - `advance()` plays one tick and reports what happened as a `ChangeSet`.
//! - Once a `ChangeSet` reports `game_over`, `advance` does nothing until the
//!   host calls `reset()` or `start()`.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::armory::{Armory, Defenses, PickupGrant};
use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimResult;
use crate::events::{ChangeSet, TickEvents};
use crate::field::ResourceField;
use crate::hive::Hive;
use crate::input::{InputState, Intents};
use crate::player::{Player, PlayerSlot, PlayerStatus};
use crate::resources::{DeltaTime, GameState, SimRng, SimTick, SpawnQueue};
use crate::spatial::{spatial_grid_update_system, SpatialGrid};
use crate::systems::*;
use crate::world::Snapshot;

/// Player spawn keeps at least this far from the hive centre.
const PLAYER_SPAWN_CLEARANCE: f32 = 120.0;
const PLAYER_SPAWN_TRIES: usize = 50;
/// Starting bees scatter this far around the hive centre.
const COLONY_SPAWN_JITTER: f32 = 30.0;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Starting and resetting games
/// - Advancing the simulation one host frame at a time
/// - Extracting state snapshots
/// - Setting up scenarios in tests
pub struct SimWorld {
    world: World,
    schedule: Schedule,
}

impl SimWorld {
    /// Create a simulation with the default balance and start a game.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Validate `config`, then create a simulation and start a game.
    pub fn try_with_config(config: SimConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    /// Create a simulation with custom configuration and start a game.
    ///
    /// The configuration is used as given. Host-supplied values should go
    /// through [`SimWorld::try_with_config`] or [`SimConfig::from_json_str`].
    pub fn with_config(config: SimConfig) -> Self {
        let mut world = World::new();

        // Core resources
        world.insert_resource(DeltaTime::default());
        world.insert_resource(SimTick::default());
        world.insert_resource(SimRng::new(config.seed));
        world.insert_resource(GameState::default());
        world.insert_resource(SpawnQueue::default());
        world.insert_resource(TickEvents::default());
        world.insert_resource(InputState::default());
        world.insert_resource(SpatialGrid::default());

        // Game state, rebuilt by `reset`
        world.insert_resource(PlayerSlot::default());
        world.insert_resource(PlayerStatus::default());
        world.insert_resource(Armory::new(&config.weapons));
        world.insert_resource(Defenses::default());
        world.insert_resource(Hive::new(&config));
        world.insert_resource(ResourceField::default());
        world.insert_resource(config);

        let mut schedule = Schedule::default();

        // One strictly ordered tick. Each phase reads what the previous
        // phases wrote; commands are applied between them.
        schedule.add_systems(
            (
                // Player
                (player_system, player_status_system).chain(),
                // Hunters
                (dropship_system, hunter_system).chain(),
                // Hive economy
                hive_system,
                // Creatures
                (bee_system, colony_replenish_system).chain(),
                // Projectiles
                projectile_system,
                // Weapon effects
                (
                    spatial_grid_update_system,
                    freeze_zone_system,
                    electric_zone_system,
                    singularity_system,
                    railgun_system,
                    shockwave_system,
                    missile_system,
                    defense_system,
                    pickup_system,
                    lifetime_system,
                )
                    .chain(),
                // Cleanup
                (reap_system, spawn_flush_system).chain(),
            )
                .chain(),
        );

        let mut sim = Self { world, schedule };
        sim.start();
        sim
    }

    /// Clear every entity and rebuild the game state from the configuration.
    ///
    /// Leaves an empty arena: a single complete seed cell, a fresh player,
    /// no bees, no hunters, no projectiles and no resource spots. Calling it
    /// twice is the same as calling it once.
    pub fn reset(&mut self) {
        self.world.clear_entities();

        let config = self.world.resource::<SimConfig>().clone();
        let mut rng = SimRng::new(config.seed);
        let hive = Hive::new(&config);
        let player = Player::spawn(player_spawn_point(&config, hive.center, &mut rng));

        self.world.insert_resource(rng);
        self.world.insert_resource(hive);
        self.world.insert_resource(PlayerSlot(Some(player)));
        self.world.insert_resource(PlayerStatus::default());
        self.world.insert_resource(Armory::new(&config.weapons));
        self.world.insert_resource(Defenses::default());
        self.world.insert_resource(ResourceField::default());
        self.world.insert_resource(GameState::default());
        self.world.insert_resource(SimTick::default());
        self.world.insert_resource(DeltaTime::default());
        self.world.insert_resource(SpawnQueue::default());
        self.world.insert_resource(TickEvents::default());
        self.world.insert_resource(InputState::default());
        self.world.resource_mut::<SpatialGrid>().clear();

        log::debug!("simulation reset");
    }

    /// Reset, then scatter the resource field and hatch the starting colony.
    pub fn start(&mut self) {
        self.reset();

        let config = self.world.resource::<SimConfig>().clone();
        let center = self.world.resource::<Hive>().center;
        let (field, colony) = {
            let mut rng = self.world.resource_mut::<SimRng>();
            let field = ResourceField::generate(&config, &mut rng);
            let colony: Vec<BeeBundle> = (0..config.starting_colony)
                .map(|_| {
                    let pos = center + rng.jitter(COLONY_SPAWN_JITTER);
                    bee_bundle(pos, &config, &mut rng)
                })
                .collect();
            (field, colony)
        };
        self.world.insert_resource(field);
        for bee in colony {
            self.world.spawn(bee);
        }

        log::info!(
            "game started: {} bees, {} resource spots",
            config.starting_colony,
            config.resource_count
        );
    }

    /// Advance the simulation by `dt_ms` milliseconds of host time.
    ///
    /// After game over this only reports `game_over` again; nothing moves.
    pub fn advance(&mut self, dt_ms: f32, intents: Intents) -> ChangeSet {
        if self.is_game_over() {
            return ChangeSet {
                game_over: true,
                ..Default::default()
            };
        }
        let dt_ms = if dt_ms.is_finite() { dt_ms.max(0.0) } else { 0.0 };

        self.world.resource_mut::<InputState>().update(intents);
        self.world.resource_mut::<DeltaTime>().0 = dt_ms;
        self.world.resource_mut::<SimTick>().increment();
        self.world.resource_mut::<GameState>().elapsed_ms += f64::from(dt_ms);

        self.schedule.run(&mut self.world);

        self.world.resource_mut::<TickEvents>().take()
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> String {
        snapshot_to_json_string(&self.snapshot()).unwrap_or_else(|err| {
            log::warn!("snapshot serialization failed: {err}");
            "{}".to_string()
        })
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    /// `None` once the player has been destroyed.
    pub fn player(&self) -> Option<&Player> {
        self.world.resource::<PlayerSlot>().player()
    }

    pub fn player_status(&self) -> PlayerStatus {
        *self.world.resource::<PlayerStatus>()
    }

    pub fn hive(&self) -> &Hive {
        self.world.resource::<Hive>()
    }

    pub fn resource_field(&self) -> &ResourceField {
        self.world.resource::<ResourceField>()
    }

    pub fn armory(&self) -> &Armory {
        self.world.resource::<Armory>()
    }

    pub fn bee_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<(), With<Bee>>();
        query.iter(&self.world).count()
    }

    pub fn hunter_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<(), With<Hunter>>();
        query.iter(&self.world).count()
    }

    pub fn projectile_count(&mut self) -> usize {
        let mut query = self.world.query_filtered::<(), With<Projectile>>();
        query.iter(&self.world).count()
    }

    pub fn score(&self) -> u64 {
        self.world.resource::<GameState>().score
    }

    pub fn is_game_over(&self) -> bool {
        self.world.resource::<GameState>().game_over
    }

    /// Ticks advanced since the last reset.
    pub fn current_tick(&self) -> u64 {
        self.world.resource::<SimTick>().0
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.world.resource::<GameState>().elapsed_ms
    }

    /// Get the spatial grid reference (for debugging/visualization).
    pub fn spatial_grid(&self) -> &SpatialGrid {
        self.world.resource::<SpatialGrid>()
    }

    // ------------------------------------------------------------------
    // Scenario hooks
    // ------------------------------------------------------------------

    /// Spawn a foraging bee immediately.
    pub fn spawn_bee(&mut self, pos: Vec2) -> Entity {
        let config = self.world.resource::<SimConfig>().clone();
        let bundle = bee_bundle(pos, &config, &mut self.world.resource_mut::<SimRng>());
        self.world.spawn(bundle).id()
    }

    pub fn spawn_hunter(&mut self, pos: Vec2) -> Entity {
        let config = self.world.resource::<SimConfig>().clone();
        let bundle = hunter_bundle(pos, &config, &mut self.world.resource_mut::<SimRng>());
        self.world.spawn(bundle).id()
    }

    pub fn spawn_projectile(&mut self, pos: Vec2, projectile: Projectile) -> Entity {
        self.world
            .spawn(ProjectileBundle {
                projectile,
                position: Position(pos),
            })
            .id()
    }

    /// Replace the resource field wholesale.
    pub fn set_resource_field(&mut self, field: ResourceField) {
        self.world.insert_resource(field);
    }

    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.world.resource_mut::<PlayerSlot>().into_inner().player_mut()
    }

    /// Equip a heavy or defensive weapon as if it had been picked up.
    pub fn grant_weapon(&mut self, grant: PickupGrant) {
        self.world.resource_mut::<Armory>().grant(grant);
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Random arena point clear of the hive. Falls back to the last candidate
/// if none of the tries qualified.
fn player_spawn_point(config: &SimConfig, hive_center: Vec2, rng: &mut SimRng) -> Vec2 {
    let margin = Player::RADIUS;
    let mut pos = Vec2::new(margin, margin);
    for _ in 0..PLAYER_SPAWN_TRIES {
        pos = Vec2::new(
            rng.range(margin, config.width - margin),
            rng.range(margin, config.height - margin),
        );
        if pos.distance(hive_center) >= PLAYER_SPAWN_CLEARANCE {
            break;
        }
    }
    pos
}
