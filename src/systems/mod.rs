//! ECS systems for the hive defense simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Tick Order
//!
//! Every system runs once per `advance`, strictly chained. Later phases read
//! state earlier phases wrote this tick:
//!
//! **Player**
//! - `player_system` - Movement, firing, weapon use, bee contact
//! - `player_status_system` - Publishes position/cloak/shield for the AI
//!
//! **Hunters**
//! - `dropship_system` - Idle-player punishment carrier
//! - `hunter_system` - Stand-off steering and laser fire
//!
//! **Hive economy**
//! - `hive_system` - Cell growth, turrets, expansion
//!
//! **Creatures**
//! - `bee_system` - Forage/return/idle/attack/hunt state machine
//! - `colony_replenish_system` - Periodic new bees
//!
//! **Projectiles**
//! - `projectile_system` - Movement and collision
//!
//! **Weapon effects** (after `spatial_grid_update_system`)
//! - `freeze_zone_system`, `electric_zone_system`, `singularity_system`,
//!   `railgun_system`, `shockwave_system`, `missile_system`
//! - `defense_system` - Shield and cloak timers
//! - `pickup_system` - Weapon pickups
//! - `lifetime_system` - Expires timed effects
//!
//! **Cleanup**
//! - `reap_system` - Removes the dead, settles the score
//! - `spawn_flush_system` - Materialises everything queued this tick

pub mod bee;
pub mod effects;
pub mod hive;
pub mod hunter;
pub mod player;
pub mod projectile;
pub mod reap;
pub mod serialization;
pub mod spawn;

pub use bee::*;
pub use effects::*;
pub use hive::*;
pub use hunter::*;
pub use player::*;
pub use projectile::*;
pub use reap::*;
pub use serialization::*;
pub use spawn::*;
