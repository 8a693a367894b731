//! Hex-grid hive economy.
//!
//! The hive is a resource rather than a set of entities: cells are keyed by
//! axial coordinate, share one honey reserve, and are only ever grown from
//! existing cells, so the grid stays connected around the seed at (0, 0).

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::spatial::{point_in_hex, HexCoord};

/// Build progress gained per millisecond.
pub const GROWTH_PER_MS: f32 = 0.0015;
/// Upper bound on new cells per tick.
pub const MAX_BUILDS_PER_TICK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HiveCell {
    pub coord: HexCoord,
    /// 0 when placed, 1 when complete.
    pub build_progress: f32,
    pub honey: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub fire_cooldown_ms: f32,
}

impl HiveCell {
    pub fn new(coord: HexCoord, max_hp: f32) -> Self {
        Self {
            coord,
            build_progress: 0.0,
            honey: 0.0,
            hp: max_hp,
            max_hp,
            fire_cooldown_ms: 0.0,
        }
    }

    pub fn is_built(&self) -> bool {
        self.build_progress >= 1.0
    }

    pub fn is_destroyed(&self) -> bool {
        self.hp <= 0.0
    }
}

/// Result of a player shot landing on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellHit {
    /// Hive is still protected; nothing changed.
    Shielded,
    Honey,
    Structure,
    Destroyed,
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct Hive {
    pub center: Vec2,
    pub hex_size: f32,
    pub cells: Vec<HiveCell>,
    /// Shared honey available for building.
    pub reserve: f32,
    /// Total cargo ever deposited by foragers.
    pub delivered: f32,
    /// Remaining post-spawn protection, in milliseconds.
    pub protection_ms: f32,
}

impl Hive {
    /// A fresh hive: one complete, empty seed cell.
    pub fn new(config: &SimConfig) -> Self {
        let mut seed = HiveCell::new(HexCoord::ORIGIN, config.cell_max_hp);
        seed.build_progress = 1.0;
        Self {
            center: config.hive_center(),
            hex_size: config.hex_size,
            cells: vec![seed],
            reserve: 0.0,
            delivered: 0.0,
            protection_ms: config.hive_protection_ms,
        }
    }

    pub fn cell_center(&self, coord: HexCoord) -> Vec2 {
        coord.to_pixel(self.hex_size, self.center)
    }

    pub fn has_cell(&self, coord: HexCoord) -> bool {
        self.cells.iter().any(|c| c.coord == coord)
    }

    pub fn all_built(&self) -> bool {
        self.cells.iter().all(HiveCell::is_built)
    }

    pub fn is_protected(&self) -> bool {
        self.protection_ms > 0.0
    }

    pub fn full_cells(&self, honey_per_cell: f32) -> usize {
        self.cells.iter().filter(|c| c.honey >= honey_per_cell).count()
    }

    pub fn total_honey(&self) -> f32 {
        self.reserve + self.cells.iter().map(|c| c.honey).sum::<f32>()
    }

    /// Advance growth, turret cooldowns and the protection window.
    pub fn tick(&mut self, dt_ms: f32) {
        self.protection_ms = (self.protection_ms - dt_ms).max(0.0);
        for cell in &mut self.cells {
            if !cell.is_built() {
                cell.build_progress = (cell.build_progress + dt_ms * GROWTH_PER_MS).min(1.0);
            }
            cell.fire_cooldown_ms = (cell.fire_cooldown_ms - dt_ms).max(0.0);
        }
    }

    /// Spend the reserve on new cells.
    ///
    /// Only runs when every cell is complete. Cells are scanned in order and
    /// each one's neighbours in `HEX_DIRECTIONS` order; the first free slots
    /// win. Stops after `MAX_BUILDS_PER_TICK` or when the reserve can no
    /// longer cover `cost`.
    pub fn try_expand(&mut self, cost: f32, max_hp: f32) -> Vec<HexCoord> {
        let mut built = Vec::new();
        if !self.all_built() || cost <= 0.0 {
            return built;
        }

        let existing: Vec<HexCoord> = self.cells.iter().map(|c| c.coord).collect();
        'scan: for coord in existing {
            for neighbor in coord.neighbors() {
                if built.len() >= MAX_BUILDS_PER_TICK || self.reserve < cost {
                    break 'scan;
                }
                if !self.has_cell(neighbor) {
                    self.reserve -= cost;
                    self.cells.push(HiveCell::new(neighbor, max_hp));
                    built.push(neighbor);
                }
            }
        }
        built
    }

    /// Add forager cargo to the shared reserve.
    pub fn deposit(&mut self, cargo: f32) {
        let cargo = cargo.max(0.0);
        self.reserve += cargo;
        self.delivered += cargo;
    }

    /// Add honey straight into one cell, capped at `cap`.
    pub fn top_up(&mut self, index: usize, amount: f32, cap: f32) {
        if let Some(cell) = self.cells.get_mut(index) {
            cell.honey = (cell.honey + amount).min(cap);
        }
    }

    /// Index of the first standing cell whose grown footprint contains `point`.
    pub fn cell_at(&self, point: Vec2) -> Option<usize> {
        self.cells.iter().position(|c| {
            !c.is_destroyed()
                && point_in_hex(point, self.cell_center(c.coord), self.hex_size, c.build_progress)
        })
    }

    /// Whether `point` lies in the footprint of the cell at `index`.
    pub fn contains(&self, index: usize, point: Vec2) -> bool {
        self.cells.get(index).is_some_and(|c| {
            point_in_hex(point, self.cell_center(c.coord), self.hex_size, c.build_progress)
        })
    }

    /// Apply one player shot to a cell: honey drains first, then structure.
    pub fn damage_cell(&mut self, index: usize, honey_damage: f32) -> CellHit {
        if self.is_protected() {
            return CellHit::Shielded;
        }
        let Some(cell) = self.cells.get_mut(index) else {
            return CellHit::Shielded;
        };
        if cell.honey > 0.0 {
            cell.honey = (cell.honey - honey_damage).max(0.0);
            CellHit::Honey
        } else {
            cell.hp -= 1.0;
            if cell.is_destroyed() {
                CellHit::Destroyed
            } else {
                CellHit::Structure
            }
        }
    }

    /// Remove destroyed cells, returning their centres.
    pub fn reap(&mut self) -> Vec<Vec2> {
        let removed: Vec<Vec2> = self
            .cells
            .iter()
            .filter(|c| c.is_destroyed())
            .map(|c| self.cell_center(c.coord))
            .collect();
        self.cells.retain(|c| !c.is_destroyed());
        removed
    }
}
