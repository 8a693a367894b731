//! Simulation tunables.
//!
//! `SimConfig` is inserted as a resource and read by every system. Hosts
//! can expose any of these as settings; the defaults reproduce the shipped
//! game balance. Per-frame speeds are in world units per 60 Hz reference
//! frame, durations in milliseconds.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::player::Player;

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Arena width in world units.
    pub width: f32,
    /// Arena height in world units.
    pub height: f32,
    /// RNG seed. `None` seeds from entropy.
    pub seed: Option<u64>,

    // Hive
    pub hex_size: f32,
    pub cell_max_hp: f32,
    pub honey_per_cell: f32,
    pub honey_to_build: f32,
    pub honey_damage_per_hit: f32,
    pub hive_fire_cooldown_ms: f32,
    pub hive_fire_range: f32,
    pub hive_protection_ms: f32,
    pub hive_bullet_damage: f32,

    // Bees
    pub bee_max_hp: f32,
    pub bee_attack_range: f32,
    pub bee_hunt_speed_multiplier: f32,
    pub bee_addition_interval_ms: f32,
    pub starting_colony: usize,
    pub max_colony: usize,

    // Hunters
    pub hunter_hp: f32,
    pub hunter_shield: f32,
    pub hunter_speed: f32,
    pub hunter_size: f32,
    pub hunter_fire_cooldown_ms: f32,
    pub hunter_laser_speed: f32,
    pub hunter_laser_damage: f32,
    pub hunter_spawn_distance: f32,
    pub idle_threshold_ms: f32,

    // Resource field
    pub resource_count: usize,
    pub resource_amount: f32,
    /// Percent chance (0-100) a forager restricts itself to near-full spots.
    pub prefer_high_pct: f32,

    // Player
    pub player_shot_distance: f32,
    pub player_fire_interval_ms: f32,

    pub weapons: WeaponTuning,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            seed: None,

            hex_size: 26.0,
            cell_max_hp: 5.0,
            honey_per_cell: 12.0,
            honey_to_build: 15.0,
            honey_damage_per_hit: 2.0,
            hive_fire_cooldown_ms: 2000.0,
            hive_fire_range: 500.0,
            hive_protection_ms: 10_000.0,
            hive_bullet_damage: 40.0,

            bee_max_hp: 3.0,
            bee_attack_range: 200.0,
            bee_hunt_speed_multiplier: 1.8,
            bee_addition_interval_ms: 1000.0,
            starting_colony: 10,
            max_colony: 40,

            hunter_hp: 8.0,
            hunter_shield: 25.0,
            hunter_speed: 2.5,
            hunter_size: 12.0,
            hunter_fire_cooldown_ms: 1500.0,
            hunter_laser_speed: 6.0,
            hunter_laser_damage: 15.0,
            hunter_spawn_distance: 250.0,
            idle_threshold_ms: 5000.0,

            resource_count: 6,
            resource_amount: 60.0,
            prefer_high_pct: 70.0,

            player_shot_distance: 350.0,
            player_fire_interval_ms: 150.0,

            weapons: WeaponTuning::default(),
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(json).map_err(SimError::Config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> SimResult<String> {
        serde_json::to_string_pretty(self).map_err(SimError::Config)
    }

    pub fn arena(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Where the seed cell sits.
    pub fn hive_center(&self) -> Vec2 {
        Vec2::new(self.width * 0.53, self.height * 0.55)
    }

    pub fn validate(&self) -> SimResult<()> {
        let positive = [
            ("width", self.width),
            ("height", self.height),
            ("hex_size", self.hex_size),
            ("cell_max_hp", self.cell_max_hp),
            ("honey_per_cell", self.honey_per_cell),
            ("honey_to_build", self.honey_to_build),
            ("hive_fire_cooldown_ms", self.hive_fire_cooldown_ms),
            ("bee_max_hp", self.bee_max_hp),
            ("bee_addition_interval_ms", self.bee_addition_interval_ms),
            ("hunter_hp", self.hunter_hp),
            ("hunter_speed", self.hunter_speed),
            ("hunter_size", self.hunter_size),
            ("hunter_fire_cooldown_ms", self.hunter_fire_cooldown_ms),
            ("hunter_laser_speed", self.hunter_laser_speed),
            ("player_shot_distance", self.player_shot_distance),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidConfig {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                });
            }
        }

        let margin = 2.0 * Player::RADIUS;
        if self.width <= margin || self.height <= margin {
            return Err(SimError::InvalidConfig {
                field: "width",
                reason: format!(
                    "arena {}x{} cannot hold the player (needs more than {margin})",
                    self.width, self.height
                ),
            });
        }
        if !(self.player_fire_interval_ms.is_finite() && self.player_fire_interval_ms >= 0.0) {
            return Err(SimError::InvalidConfig {
                field: "player_fire_interval_ms",
                reason: format!("must be zero or more, got {}", self.player_fire_interval_ms),
            });
        }

        if !(0.0..=100.0).contains(&self.prefer_high_pct) {
            return Err(SimError::InvalidConfig {
                field: "prefer_high_pct",
                reason: format!("must be within 0..=100, got {}", self.prefer_high_pct),
            });
        }
        if self.max_colony < self.starting_colony {
            return Err(SimError::InvalidConfig {
                field: "max_colony",
                reason: format!(
                    "{} is smaller than starting_colony {}",
                    self.max_colony, self.starting_colony
                ),
            });
        }
        if self.hunter_shield < 0.0 || self.resource_amount < 0.0 {
            return Err(SimError::InvalidConfig {
                field: "hunter_shield",
                reason: "shield and resource amounts cannot be negative".into(),
            });
        }
        Ok(())
    }
}

/// Parameters for every player weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    pub freeze_stock: u32,
    pub electric_stock: u32,
    pub warp_stock: u32,

    pub freeze_radius: f32,
    pub freeze_duration_ms: f32,
    pub freeze_drop_distance: f32,
    pub electric_radius: f32,
    pub electric_duration_ms: f32,
    pub warp_distance: f32,

    pub singularity_radius: f32,
    pub singularity_inner_radius: f32,
    pub singularity_duration_ms: f32,
    pub singularity_pull: f32,
    /// Damage per second inside the inner radius.
    pub singularity_dps: f32,

    pub railgun_length: f32,
    pub railgun_half_width: f32,
    pub railgun_duration_ms: f32,
    pub railgun_extend_ms: f32,
    pub railgun_dps: f32,

    pub shockwave_radius: f32,
    pub shockwave_expand_ms: f32,
    pub shockwave_duration_ms: f32,
    pub shockwave_stun_ms: f32,

    pub shield_duration_ms: f32,
    pub shield_radius: f32,
    pub cloak_duration_ms: f32,

    pub missile_count: u32,
    pub missile_speed: f32,
    pub missile_turn_rate: f32,
    pub missile_acquire_range: f32,
    pub missile_lifetime_ms: f32,
    pub missile_damage: f32,

    pub pickup_interval_ms: f32,
    pub pickup_max: usize,
    pub pickup_lifetime_ms: f32,
    pub pickup_radius: f32,
    pub pickup_hive_clearance: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            freeze_stock: 3,
            electric_stock: 3,
            warp_stock: 2,

            freeze_radius: 80.0,
            freeze_duration_ms: 3000.0,
            freeze_drop_distance: 30.0,
            electric_radius: 100.0,
            electric_duration_ms: 500.0,
            warp_distance: 150.0,

            singularity_radius: 180.0,
            singularity_inner_radius: 30.0,
            singularity_duration_ms: 4000.0,
            singularity_pull: 2.5,
            singularity_dps: 4.0,

            railgun_length: 900.0,
            railgun_half_width: 14.0,
            railgun_duration_ms: 600.0,
            railgun_extend_ms: 80.0,
            railgun_dps: 20.0,

            shockwave_radius: 220.0,
            shockwave_expand_ms: 400.0,
            shockwave_duration_ms: 900.0,
            shockwave_stun_ms: 2500.0,

            shield_duration_ms: 6000.0,
            shield_radius: 40.0,
            cloak_duration_ms: 5000.0,

            missile_count: 6,
            missile_speed: 7.0,
            missile_turn_rate: 0.12,
            missile_acquire_range: 400.0,
            missile_lifetime_ms: 4000.0,
            missile_damage: 3.0,

            pickup_interval_ms: 15_000.0,
            pickup_max: 2,
            pickup_lifetime_ms: 12_000.0,
            pickup_radius: 20.0,
            pickup_hive_clearance: 150.0,
        }
    }
}
