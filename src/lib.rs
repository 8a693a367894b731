//! Hive Defense - Simulation Core
//!
//! A deterministic, variable-timestep ECS simulation of a bee colony
//! defending its hive against a single player ship.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod armory;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod field;
pub mod hive;
pub mod input;
pub mod logging;
pub mod player;
pub mod render_bridge;
pub mod resources;
pub mod spatial;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use armory::{Armory, DefensiveWeapon, Defenses, HeavyWeapon, LightWeapon, PickupGrant};
pub use components::*;
pub use config::{SimConfig, WeaponTuning};
pub use error::{SimError, SimResult};
pub use events::{ChangeSet, CosmeticTrigger, DestroyedKind, DestructionEvent, ExplosionKind, SoundCue};
pub use field::{ResourceField, ResourceSpot, SpotRef};
pub use hive::{Hive, HiveCell};
pub use input::Intents;
pub use player::{Player, PlayerStatus};
pub use spatial::{HexCoord, SpatialEntry, SpatialGrid};
pub use world::Snapshot;
