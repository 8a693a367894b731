//! Player armament: light stock counters, the heavy and defensive slots,
//! and the timers of active defensive effects.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::WeaponTuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightWeapon {
    Freeze,
    Electric,
    Warp,
}

impl LightWeapon {
    pub const ALL: [LightWeapon; 3] = [LightWeapon::Freeze, LightWeapon::Electric, LightWeapon::Warp];

    fn index(self) -> usize {
        match self {
            LightWeapon::Freeze => 0,
            LightWeapon::Electric => 1,
            LightWeapon::Warp => 2,
        }
    }

    pub fn next(self) -> LightWeapon {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeavyWeapon {
    Singularity,
    Railgun,
    Shockwave,
}

impl HeavyWeapon {
    pub const ALL: [HeavyWeapon; 3] = [HeavyWeapon::Singularity, HeavyWeapon::Railgun, HeavyWeapon::Shockwave];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefensiveWeapon {
    Shield,
    Missiles,
    Cloak,
}

impl DefensiveWeapon {
    pub const ALL: [DefensiveWeapon; 3] = [DefensiveWeapon::Shield, DefensiveWeapon::Missiles, DefensiveWeapon::Cloak];
}

/// Weapon a pickup grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupGrant {
    Heavy(HeavyWeapon),
    Defensive(DefensiveWeapon),
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Armory {
    /// Indexed like `LightWeapon::ALL`.
    pub stock: [u32; 3],
    pub selected: LightWeapon,
    pub heavy: Option<HeavyWeapon>,
    pub defensive: Option<DefensiveWeapon>,
}

impl Armory {
    pub fn new(tuning: &WeaponTuning) -> Self {
        Self {
            stock: [tuning.freeze_stock, tuning.electric_stock, tuning.warp_stock],
            selected: LightWeapon::Freeze,
            heavy: None,
            defensive: None,
        }
    }

    pub fn stock_of(&self, weapon: LightWeapon) -> u32 {
        self.stock[weapon.index()]
    }

    pub fn cycle(&mut self) {
        self.selected = self.selected.next();
    }

    /// Spend one of the selected light weapon. An empty selection cycles to
    /// the next weapon instead and fires nothing.
    pub fn use_light(&mut self) -> Option<LightWeapon> {
        let weapon = self.selected;
        let count = &mut self.stock[weapon.index()];
        if *count == 0 {
            self.cycle();
            return None;
        }
        *count -= 1;
        Some(weapon)
    }

    pub fn take_heavy(&mut self) -> Option<HeavyWeapon> {
        self.heavy.take()
    }

    pub fn take_defensive(&mut self) -> Option<DefensiveWeapon> {
        self.defensive.take()
    }

    /// Equip a pickup, replacing whatever occupied that slot.
    pub fn grant(&mut self, grant: PickupGrant) {
        match grant {
            PickupGrant::Heavy(w) => self.heavy = Some(w),
            PickupGrant::Defensive(w) => self.defensive = Some(w),
        }
    }
}

/// Timers for defensive effects that follow the player.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Defenses {
    pub shield_ms: f32,
    pub cloak_ms: f32,
}

impl Defenses {
    pub fn tick(&mut self, dt_ms: f32) {
        self.shield_ms = (self.shield_ms - dt_ms).max(0.0);
        self.cloak_ms = (self.cloak_ms - dt_ms).max(0.0);
    }

    pub fn is_shielded(&self) -> bool {
        self.shield_ms > 0.0
    }

    pub fn is_cloaked(&self) -> bool {
        self.cloak_ms > 0.0
    }
}
