//! ECS Components for the hive defense simulation.
//!
//! Components are pure data containers attached to entities.
//! All game logic lives in systems that query these components.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::armory::PickupGrant;
use crate::field::SpotRef;

// ============================================================================
// SPATIAL COMPONENTS
// ============================================================================

/// World position (x grows right, y grows down).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn distance_to(&self, other: &Position) -> f32 {
        self.0.distance(other.0)
    }
}

/// Procedural drift added on top of steering.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Wobble {
    pub phase: f32,
    /// Radians per second.
    pub rate: f32,
}

impl Wobble {
    pub fn advance(&mut self, dt_ms: f32) {
        self.phase += self.rate * dt_ms * 0.001;
    }

    /// Unscaled wobble direction for the current phase.
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.phase.cos(), (self.phase * 0.7).sin())
    }
}

/// Wing and body animation accumulators. Cosmetic only.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct WingBeat {
    pub wing_phase: f32,
    pub wing_rate: f32,
    pub bob_phase: f32,
    pub bob_rate: f32,
}

impl WingBeat {
    pub fn advance(&mut self, dt_ms: f32, wing_multiplier: f32, slow: f32) {
        let secs = dt_ms * 0.001 * slow;
        self.wing_phase += self.wing_rate * secs * wing_multiplier;
        self.bob_phase += self.bob_rate * secs;
    }
}

// ============================================================================
// COMBAT COMPONENTS
// ============================================================================

/// Structural hit points.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    pub fn damage(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }
}

/// Which pool a hit landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Shield,
    Health,
}

/// Energy shield that soaks hits before health.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Shield {
    pub current: f32,
    pub max: f32,
}

impl Shield {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_up(&self) -> bool {
        self.current > 0.0
    }

    /// Apply a hit. While the shield holds, only `shield_damage` is taken and
    /// nothing spills into health; otherwise `health_damage` goes to health.
    pub fn absorb(&mut self, health: &mut Health, shield_damage: f32, health_damage: f32) -> HitOutcome {
        if self.is_up() {
            self.current = (self.current - shield_damage).max(0.0);
            HitOutcome::Shield
        } else {
            health.damage(health_damage);
            HitOutcome::Health
        }
    }
}

/// Movement debuffs applied by weapon effects.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Debuffs {
    /// Slowed to a crawl while positive.
    pub frozen_ms: f32,
    /// Unable to move or fire while positive.
    pub stunned_ms: f32,
}

impl Debuffs {
    pub fn tick(&mut self, dt_ms: f32) {
        self.frozen_ms = (self.frozen_ms - dt_ms).max(0.0);
        self.stunned_ms = (self.stunned_ms - dt_ms).max(0.0);
    }

    pub fn freeze(&mut self, ms: f32) {
        self.frozen_ms = self.frozen_ms.max(ms);
    }

    pub fn stun(&mut self, ms: f32) {
        self.stunned_ms = self.stunned_ms.max(ms);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_ms > 0.0
    }

    pub fn is_stunned(&self) -> bool {
        self.stunned_ms > 0.0
    }

    /// Speed scale: stun halts, freeze slows to `frozen_scale`.
    pub fn speed_scale(&self, frozen_scale: f32) -> f32 {
        if self.is_stunned() {
            0.0
        } else if self.is_frozen() {
            frozen_scale
        } else {
            1.0
        }
    }
}

// ============================================================================
// BEES
// ============================================================================

/// Hunting bees that lost sight of the player circle their last sighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Pursuit {
    Tracking,
    Lost { sighting: Vec2, wander: Vec2, reroll_ms: f32 },
}

/// Bee behaviour, with the data that only makes sense in each state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeeState {
    Forage { spot: Option<SpotRef>, target: Option<Vec2> },
    Return { cargo: f32, target: Vec2 },
    Idle { target: Vec2 },
    Attack { hold_ms: f32, last_seen: Vec2 },
    Hunt { flank_offset: f32, target: Vec2, pursuit: Pursuit },
}

impl Default for BeeState {
    fn default() -> Self {
        BeeState::Forage { spot: None, target: None }
    }
}

impl BeeState {
    pub fn name(&self) -> &'static str {
        match self {
            BeeState::Forage { .. } => "forage",
            BeeState::Return { .. } => "return",
            BeeState::Idle { .. } => "idle",
            BeeState::Attack { .. } => "attack",
            BeeState::Hunt { .. } => "hunt",
        }
    }

    /// Stable numeric id for flat buffers.
    pub fn id(&self) -> u8 {
        match self {
            BeeState::Forage { .. } => 0,
            BeeState::Return { .. } => 1,
            BeeState::Idle { .. } => 2,
            BeeState::Attack { .. } => 3,
            BeeState::Hunt { .. } => 4,
        }
    }

    pub fn cargo(&self) -> f32 {
        match self {
            BeeState::Return { cargo, .. } => *cargo,
            _ => 0.0,
        }
    }

    pub fn is_hunting(&self) -> bool {
        matches!(self, BeeState::Hunt { .. })
    }
}

#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Bee {
    /// Base speed in units per reference frame.
    pub speed: f32,
    pub state: BeeState,
}

// ============================================================================
// HUNTERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HunterTracking {
    Locked,
    Lost { wander: Vec2, reroll_ms: f32 },
}

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Hunter {
    pub angle: f32,
    pub speed: f32,
    pub size: f32,
    pub fire_cooldown_ms: f32,
    pub last_seen: Option<Vec2>,
    pub tracking: HunterTracking,
}

impl Hunter {
    pub fn new(speed: f32, size: f32) -> Self {
        Self {
            angle: 0.0,
            speed,
            size,
            fire_cooldown_ms: 0.0,
            last_seen: None,
            tracking: HunterTracking::Locked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DropshipPhase {
    Arriving,
    Deploying { remaining_ms: f32 },
    Leaving,
}

impl DropshipPhase {
    pub fn name(&self) -> &'static str {
        match self {
            DropshipPhase::Arriving => "arriving",
            DropshipPhase::Deploying { .. } => "deploying",
            DropshipPhase::Leaving => "leaving",
        }
    }
}

/// Carrier that lands near an idle player and drops two hunters.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dropship {
    pub landing: Vec2,
    /// Heading while deploying; it leaves the opposite way it came.
    pub angle: f32,
    pub phase: DropshipPhase,
}

// ============================================================================
// PROJECTILES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    PlayerShot,
    HiveBullet,
    HunterLaser,
}

impl ProjectileKind {
    pub fn is_hostile(self) -> bool {
        !matches!(self, ProjectileKind::PlayerShot)
    }
}

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Projectile {
    pub kind: ProjectileKind,
    /// Units per reference frame.
    pub velocity: Vec2,
    pub radius: f32,
    pub traveled: f32,
    pub max_range: f32,
    pub damage: f32,
}

impl Projectile {
    pub const PLAYER_SHOT_SPEED: f32 = 8.0;
    pub const PLAYER_SHOT_RADIUS: f32 = 3.0;
    pub const HIVE_BULLET_SPEED: f32 = 4.0;
    pub const HIVE_BULLET_RADIUS: f32 = 5.0;
    pub const HIVE_BULLET_RANGE: f32 = 600.0;
    pub const LASER_RADIUS: f32 = 4.0;
    pub const LASER_RANGE: f32 = 400.0;

    pub fn player_shot(angle: f32, max_range: f32) -> Self {
        Self {
            kind: ProjectileKind::PlayerShot,
            velocity: crate::spatial::unit(angle) * Self::PLAYER_SHOT_SPEED,
            radius: Self::PLAYER_SHOT_RADIUS,
            traveled: 0.0,
            max_range,
            damage: 1.0,
        }
    }

    pub fn hive_bullet(angle: f32, damage: f32) -> Self {
        Self {
            kind: ProjectileKind::HiveBullet,
            velocity: crate::spatial::unit(angle) * Self::HIVE_BULLET_SPEED,
            radius: Self::HIVE_BULLET_RADIUS,
            traveled: 0.0,
            max_range: Self::HIVE_BULLET_RANGE,
            damage,
        }
    }

    pub fn hunter_laser(angle: f32, speed: f32, damage: f32) -> Self {
        Self {
            kind: ProjectileKind::HunterLaser,
            velocity: crate::spatial::unit(angle) * speed,
            radius: Self::LASER_RADIUS,
            traveled: 0.0,
            max_range: Self::LASER_RANGE,
            damage,
        }
    }

    pub fn angle(&self) -> f32 {
        self.velocity.y.atan2(self.velocity.x)
    }
}

// ============================================================================
// WEAPON EFFECTS
// ============================================================================

/// Countdown shared by every timed effect.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Lifetime {
    pub remaining_ms: f32,
    pub total_ms: f32,
}

impl Lifetime {
    pub fn new(total_ms: f32) -> Self {
        Self {
            remaining_ms: total_ms,
            total_ms,
        }
    }

    pub fn elapsed_ms(&self) -> f32 {
        self.total_ms - self.remaining_ms
    }

    /// 0 at creation, 1 at expiry.
    pub fn progress(&self) -> f32 {
        if self.total_ms <= 0.0 {
            1.0
        } else {
            (self.elapsed_ms() / self.total_ms).clamp(0.0, 1.0)
        }
    }

    /// Count down; true once expired.
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        self.remaining_ms -= dt_ms;
        self.remaining_ms <= 0.0
    }
}

/// Slows everything inside for as long as the zone lasts.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FreezeZone {
    pub radius: f32,
}

/// Short damage-over-time burst around the player.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ElectricZone {
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SingularityPhase {
    Growing,
    Active,
    Collapsing,
}

/// Vortex that drags creatures in and grinds the ones at its core.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Singularity {
    pub radius: f32,
    pub inner_radius: f32,
    pub pull: f32,
    pub dps: f32,
}

impl Singularity {
    /// Fraction of the lifetime spent growing, and again collapsing.
    pub const RAMP: f32 = 0.15;

    pub fn phase(progress: f32) -> SingularityPhase {
        if progress < Self::RAMP {
            SingularityPhase::Growing
        } else if progress > 1.0 - Self::RAMP {
            SingularityPhase::Collapsing
        } else {
            SingularityPhase::Active
        }
    }

    pub fn current_radius(&self, progress: f32) -> f32 {
        match Self::phase(progress) {
            SingularityPhase::Growing => self.radius * progress / Self::RAMP,
            SingularityPhase::Active => self.radius,
            SingularityPhase::Collapsing => self.radius * (1.0 - progress) / Self::RAMP,
        }
    }
}

/// Piercing beam fired along the player's facing.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RailgunBeam {
    pub angle: f32,
    pub length: f32,
    pub half_width: f32,
    pub extend_ms: f32,
    pub dps: f32,
}

impl RailgunBeam {
    pub fn current_length(&self, elapsed_ms: f32) -> f32 {
        if self.extend_ms <= 0.0 {
            self.length
        } else {
            self.length * (elapsed_ms / self.extend_ms).clamp(0.0, 1.0)
        }
    }

    pub fn tip(&self, origin: Vec2, elapsed_ms: f32) -> Vec2 {
        origin + crate::spatial::unit(self.angle) * self.current_length(elapsed_ms)
    }
}

/// Expanding ring that stuns what it sweeps over.
#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Shockwave {
    pub max_radius: f32,
    pub expand_ms: f32,
    pub stun_ms: f32,
}

impl Shockwave {
    pub fn is_expanding(&self, elapsed_ms: f32) -> bool {
        elapsed_ms < self.expand_ms
    }

    pub fn current_radius(&self, elapsed_ms: f32) -> f32 {
        if self.expand_ms <= 0.0 {
            self.max_radius
        } else {
            self.max_radius * (elapsed_ms / self.expand_ms).clamp(0.0, 1.0)
        }
    }
}

/// Homing counter-missile.
#[derive(Component, Debug, Clone, Copy)]
pub struct Missile {
    pub heading: f32,
    pub speed: f32,
    pub turn_rate: f32,
    pub damage: f32,
    pub target: Option<Entity>,
}

/// Collectible heavy or defensive weapon lying in the arena.
#[derive(Component, Debug, Clone, Copy)]
pub struct WeaponPickup {
    pub grant: PickupGrant,
}

// ============================================================================
// BUNDLES
// ============================================================================

#[derive(Bundle)]
pub struct BeeBundle {
    pub bee: Bee,
    pub position: Position,
    pub health: Health,
    pub debuffs: Debuffs,
    pub wobble: Wobble,
    pub wings: WingBeat,
}

#[derive(Bundle)]
pub struct HunterBundle {
    pub hunter: Hunter,
    pub position: Position,
    pub health: Health,
    pub shield: Shield,
    pub debuffs: Debuffs,
    pub wobble: Wobble,
    pub wings: WingBeat,
}

#[derive(Bundle)]
pub struct ProjectileBundle {
    pub projectile: Projectile,
    pub position: Position,
}
