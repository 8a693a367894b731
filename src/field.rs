//! Resource field: the nectar spots foragers draw from.
//!
//! Bees only ever hold a `SpotRef`; the field owns the spots and is the
//! only place their amounts change.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::resources::SimRng;

/// Fullness a spot needs to count as "high" for the forager preference.
const HIGH_FULLNESS: f32 = 0.9;
/// Spots keep this far from the hive centre.
const HIVE_CLEARANCE: f32 = 120.0;
/// The top-left corner is reserved for the host's HUD.
const HUD_CORNER: Vec2 = Vec2::new(280.0, 250.0);
const PLACEMENT_TRIES: u32 = 50;

/// Handle to a spot inside the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpotRef(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceSpot {
    pub pos: Vec2,
    pub amount: f32,
    pub max: f32,
}

impl ResourceSpot {
    pub fn new(pos: Vec2, amount: f32) -> Self {
        Self { pos, amount, max: amount }
    }

    pub fn is_empty(&self) -> bool {
        self.amount <= 0.0
    }

    pub fn fullness(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.amount / self.max
        }
    }
}

#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceField {
    spots: Vec<ResourceSpot>,
}

impl ResourceField {
    pub fn new(spots: Vec<ResourceSpot>) -> Self {
        Self { spots }
    }

    /// Scatter `resource_count` spots across the arena, away from the hive
    /// and the HUD corner.
    pub fn generate(config: &SimConfig, rng: &mut SimRng) -> Self {
        let center = config.hive_center();
        let spots = (0..config.resource_count)
            .map(|_| {
                let mut pos = Vec2::ZERO;
                for _ in 0..PLACEMENT_TRIES {
                    pos = Vec2::new(rng.range(0.0, config.width), rng.range(0.0, config.height));
                    let near_hive = pos.distance(center) < HIVE_CLEARANCE;
                    let under_hud = pos.x < HUD_CORNER.x && pos.y < HUD_CORNER.y;
                    if !near_hive && !under_hud {
                        break;
                    }
                }
                let amount = config.resource_amount * rng.range(0.5, 1.3);
                ResourceSpot::new(pos, amount)
            })
            .collect();
        Self { spots }
    }

    pub fn spots(&self) -> &[ResourceSpot] {
        &self.spots
    }

    pub fn spot(&self, spot: SpotRef) -> Option<&ResourceSpot> {
        self.spots.get(spot.0)
    }

    /// True when nothing is left to forage (including an empty field).
    pub fn all_depleted(&self) -> bool {
        self.spots.iter().all(ResourceSpot::is_empty)
    }

    pub fn total_remaining(&self) -> f32 {
        self.spots.iter().map(|s| s.amount.max(0.0)).sum()
    }

    /// Choose a spot for a forager.
    ///
    /// With probability `prefer_high_pct`% only near-full spots qualify,
    /// falling back to any non-empty spot when none are; otherwise every
    /// non-empty spot is equally likely.
    pub fn pick_spot(&self, prefer_high_pct: f32, rng: &mut SimRng) -> Option<SpotRef> {
        let roll = rng.range(0.0, 100.0);
        let non_empty = || {
            self.spots
                .iter()
                .enumerate()
                .filter(|(_, s)| !s.is_empty())
                .map(|(i, _)| SpotRef(i))
        };

        let mut candidates: Vec<SpotRef> = if roll < prefer_high_pct {
            non_empty()
                .filter(|r| self.spots[r.0].fullness() >= HIGH_FULLNESS)
                .collect()
        } else {
            Vec::new()
        };
        if candidates.is_empty() {
            candidates = non_empty().collect();
        }
        if candidates.is_empty() {
            return None;
        }
        Some(candidates[rng.index(candidates.len())])
    }

    /// Take up to `amount` from a spot; returns what was actually taken.
    pub fn collect(&mut self, spot: SpotRef, amount: f32) -> f32 {
        match self.spots.get_mut(spot.0) {
            Some(s) => {
                let taken = amount.min(s.amount).max(0.0);
                s.amount -= taken;
                taken
            }
            None => 0.0,
        }
    }
}
