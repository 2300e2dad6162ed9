//! Unit module - live unit records and status effects
//!
//! A unit is one flat record: archetype fields copied from the catalog at
//! deploy time plus the mutable per-match fields. The optional `ability`
//! discriminates what `use_ability` can do with it.

use crate::core::catalog::UnitSpec;
use crate::types::{Ability, PlayerId, StatusKind, UnitId, UnitKind};

/// Timed effect attached to a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Remaining duration, decremented at the afflicted owner's turn-start
    pub turns: u32,
    /// Unit that imposed the effect
    pub by_unit: UnitId,
}

/// A live unit on the board
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub owner: PlayerId,
    pub kind: UnitKind,
    pub cost: u32,
    pub max_health: i32,
    pub damage: i32,
    pub range: u8,
    pub speed: u8,
    pub ability: Option<Ability>,
    pub heal_amount: i32,
    pub energy_per_turn: u32,
    pub lifetime: u32,
    pub health: i32,
    pub x: u8,
    pub y: u8,
    pub has_moved: bool,
    pub has_attacked: bool,
    pub status_effects: Vec<StatusEffect>,
    pub turns_active: u32,
}

impl Unit {
    /// Instantiate a unit from its catalog spec at full health
    pub fn from_spec(id: UnitId, owner: PlayerId, spec: &UnitSpec, x: u8, y: u8) -> Self {
        Self {
            id,
            owner,
            kind: spec.kind,
            cost: spec.cost,
            max_health: spec.health,
            damage: spec.damage,
            range: spec.range,
            speed: spec.speed,
            ability: spec.ability,
            heal_amount: spec.heal_amount,
            energy_per_turn: spec.energy_per_turn,
            lifetime: spec.lifetime,
            health: spec.health,
            x,
            y,
            has_moved: false,
            has_attacked: false,
            status_effects: Vec::new(),
            turns_active: 0,
        }
    }

    /// Manhattan distance to a grid position
    pub fn distance_to(&self, x: u8, y: u8) -> u32 {
        u32::from(self.x.abs_diff(x)) + u32::from(self.y.abs_diff(y))
    }

    /// The unit this one is forced to attack, if a taunt is active
    pub fn taunted_by(&self) -> Option<UnitId> {
        self.status_effects
            .iter()
            .find(|e| e.kind == StatusKind::Taunt)
            .map(|e| e.by_unit)
    }
}
