//! Spatial math and partitioning.
//!
//! Free functions cover the geometry every phase needs (distances, hex
//! containment, beam tests, angle stepping). `SpatialGrid` buckets live
//! creatures so area effects and homing munitions can query a radius in
//! O(k) instead of scanning every creature.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f32::consts::{PI, TAU};

use crate::components::{Bee, Health, Hunter, Position};

/// Milliseconds to "reference frames" (the tuning constants are per 60 Hz frame).
pub const FRAME_SCALE: f32 = 0.06;

/// Convert an elapsed time in milliseconds to reference frames.
#[inline]
pub fn frames(dt_ms: f32) -> f32 {
    dt_ms * FRAME_SCALE
}

#[inline]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Hex containment approximated by centre distance.
///
/// `build_progress` scales the effective radius so a growing cell is only
/// as solid as it looks.
#[inline]
pub fn point_in_hex(point: Vec2, center: Vec2, size: f32, build_progress: f32) -> bool {
    point.distance(center) <= size * build_progress
}

/// Shortest distance from `point` to the segment `a..b`.
pub fn point_segment_distance(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    point.distance(a + ab * t)
}

/// Angle of the vector pointing from `from` to `to`.
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit vector for an angle in radians.
#[inline]
pub fn unit(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Wrap an angle into `[-PI, PI)`.
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Rotate `current` towards `target`, by at most `max_step` radians.
pub fn turn_towards(current: f32, target: f32, max_step: f32) -> f32 {
    let delta = wrap_angle(target - current);
    if delta.abs() <= max_step {
        target
    } else {
        current + max_step * delta.signum()
    }
}

/// Unit direction from `from` to `to`, or zero when they coincide.
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Clamp a point into the rectangle `[margin, size - margin]`.
#[inline]
pub fn clamp_to_bounds(point: Vec2, size: Vec2, margin: f32) -> Vec2 {
    point.clamp(Vec2::splat(margin), size - Vec2::splat(margin))
}

#[inline]
pub fn in_bounds(point: Vec2, size: Vec2) -> bool {
    point.x >= 0.0 && point.y >= 0.0 && point.x <= size.x && point.y <= size.y
}

// ============================================================================
// HEX GRID
// ============================================================================

/// Axial hex coordinate (pointy-top layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

/// Neighbour offsets, in the order expansion scans them.
pub const HEX_DIRECTIONS: [HexCoord; 6] = [
    HexCoord { q: 1, r: 0 },
    HexCoord { q: 1, r: -1 },
    HexCoord { q: 0, r: -1 },
    HexCoord { q: -1, r: 0 },
    HexCoord { q: -1, r: 1 },
    HexCoord { q: 0, r: 1 },
];

impl HexCoord {
    pub const ORIGIN: HexCoord = HexCoord { q: 0, r: 0 };

    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn neighbors(self) -> impl Iterator<Item = HexCoord> {
        HEX_DIRECTIONS
            .iter()
            .map(move |d| HexCoord::new(self.q + d.q, self.r + d.r))
    }

    /// World position of this cell's centre.
    pub fn to_pixel(self, size: f32, origin: Vec2) -> Vec2 {
        let sqrt3 = 3f32.sqrt();
        let x = size * (sqrt3 * self.q as f32 + sqrt3 / 2.0 * self.r as f32);
        let y = size * (1.5 * self.r as f32);
        origin + Vec2::new(x, y)
    }
}

// ============================================================================
// SPATIAL GRID
// ============================================================================

/// What kind of creature a grid entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Bee,
    Hunter,
}

/// Entry in a spatial cell.
#[derive(Debug, Clone, Copy)]
pub struct SpatialEntry {
    pub entity: Entity,
    pub pos: Vec2,
    pub kind: TargetKind,
}

/// Grid-based spatial partitioning of live creatures.
///
/// Rebuilt once per tick after projectiles resolve, so the weapon-effect
/// phase sees post-collision positions.
#[derive(Resource, Debug)]
pub struct SpatialGrid {
    /// Cell size in world units.
    pub cell_size: f32,
    cells: HashMap<(i32, i32), Vec<SpatialEntry>>,
    count: usize,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(64.0)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            count: 0,
        }
    }

    #[inline]
    pub fn world_to_cell(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.count = 0;
    }

    pub fn insert(&mut self, entity: Entity, pos: Vec2, kind: TargetKind) {
        let cell = self.world_to_cell(pos);
        self.cells
            .entry(cell)
            .or_default()
            .push(SpatialEntry { entity, pos, kind });
        self.count += 1;
    }

    /// All entries within `radius` of `center`, closest first.
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<SpatialEntry> {
        let radius_sq = radius * radius;
        let reach = (radius / self.cell_size).ceil() as i32;
        let (cx, cy) = self.world_to_cell(center);

        let mut results = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                if let Some(entries) = self.cells.get(&(cx + dx, cy + dy)) {
                    results.extend(
                        entries
                            .iter()
                            .filter(|e| e.pos.distance_squared(center) <= radius_sq)
                            .copied(),
                    );
                }
            }
        }

        results.sort_by(|a, b| {
            let da = a.pos.distance_squared(center);
            let db = b.pos.distance_squared(center);
            da.partial_cmp(&db)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.entity.cmp(&b.entity))
        });
        results
    }

    /// Nearest entry within `radius` that passes `accept`.
    pub fn nearest(
        &self,
        center: Vec2,
        radius: f32,
        accept: impl Fn(&SpatialEntry) -> bool,
    ) -> Option<SpatialEntry> {
        self.query_radius(center, radius).into_iter().find(accept)
    }

    pub fn total_count(&self) -> usize {
        self.count
    }
}

/// Rebuild the grid from every living bee and hunter.
pub fn spatial_grid_update_system(
    mut grid: ResMut<SpatialGrid>,
    creatures: Query<(Entity, &Position, &Health, Has<Hunter>), Or<(With<Bee>, With<Hunter>)>>,
) {
    grid.clear();
    for (entity, pos, health, is_hunter) in creatures.iter() {
        if !health.is_alive() {
            continue;
        }
        let kind = if is_hunter {
            TargetKind::Hunter
        } else {
            TargetKind::Bee
        };
        grid.insert(entity, pos.0, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_hex_scales_with_progress() {
        let c = Vec2::new(100.0, 100.0);
        let p = Vec2::new(110.0, 100.0);
        assert!(point_in_hex(p, c, 26.0, 1.0));
        assert!(!point_in_hex(p, c, 26.0, 0.25));
    }

    #[test]
    fn test_point_segment_distance() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!((point_segment_distance(Vec2::new(5.0, 3.0), a, b) - 3.0).abs() < 1e-5);
        // Beyond the end clamps to the endpoint.
        assert!((point_segment_distance(Vec2::new(13.0, 4.0), a, b) - 5.0).abs() < 1e-5);
        // Degenerate segment.
        assert!((point_segment_distance(Vec2::new(3.0, 4.0), a, a) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_turn_towards_takes_short_way() {
        let turned = turn_towards(PI - 0.1, -PI + 0.1, 0.05);
        assert!(turned > PI - 0.1);
        assert_eq!(turn_towards(0.0, 0.02, 0.05), 0.02);
    }

    #[test]
    fn test_direction_zero_length_is_zero() {
        let p = Vec2::new(4.0, 4.0);
        assert_eq!(direction(p, p), Vec2::ZERO);
    }

    #[test]
    fn test_hex_neighbors_are_distinct_and_adjacent() {
        let origin = Vec2::ZERO;
        let neighbors: Vec<_> = HexCoord::ORIGIN.neighbors().collect();
        assert_eq!(neighbors.len(), 6);
        for n in &neighbors {
            let d = n.to_pixel(26.0, origin).length();
            assert!((d - 26.0 * 3f32.sqrt()).abs() < 1e-3);
        }
    }

    #[test]
    fn test_spatial_grid_query_sorted() {
        let mut grid = SpatialGrid::new(10.0);
        let e1 = Entity::from_raw(1);
        let e2 = Entity::from_raw(2);
        let e3 = Entity::from_raw(3);

        grid.insert(e1, Vec2::new(30.0, 0.0), TargetKind::Bee);
        grid.insert(e2, Vec2::new(5.0, 0.0), TargetKind::Hunter);
        grid.insert(e3, Vec2::new(200.0, 0.0), TargetKind::Bee);

        let found = grid.query_radius(Vec2::ZERO, 50.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].entity, e2);

        let bee = grid.nearest(Vec2::ZERO, 50.0, |e| e.kind == TargetKind::Bee);
        assert_eq!(bee.map(|e| e.entity), Some(e1));
        assert_eq!(grid.total_count(), 3);
    }
}
