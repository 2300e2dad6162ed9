//! Catalog module - static unit archetype table
//!
//! Balance data lives here, isolated from the engine. Deployment copies a
//! spec into a fresh unit record; the engine never consults the catalog
//! again after that.

use crate::types::{Ability, UnitKind};

/// Static archetype definition consumed by deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitSpec {
    pub kind: UnitKind,
    pub cost: u32,
    pub health: i32,
    pub damage: i32,
    pub range: u8,
    pub speed: u8,
    pub ability: Option<Ability>,
    /// Health restored per heal (medic only)
    pub heal_amount: i32,
    /// Energy yielded at each owner turn-start (generator only)
    pub energy_per_turn: u32,
    /// Owner turn-starts a generator survives before self-destructing
    pub lifetime: u32,
}

const MELEE: UnitSpec = UnitSpec {
    kind: UnitKind::Melee,
    cost: 2,
    health: 100,
    damage: 25,
    range: 1,
    speed: 2,
    ability: None,
    heal_amount: 0,
    energy_per_turn: 0,
    lifetime: 0,
};

const RANGED: UnitSpec = UnitSpec {
    kind: UnitKind::Ranged,
    cost: 3,
    health: 60,
    damage: 30,
    range: 3,
    speed: 1,
    ability: None,
    heal_amount: 0,
    energy_per_turn: 0,
    lifetime: 0,
};

const MEDIC: UnitSpec = UnitSpec {
    kind: UnitKind::Medic,
    cost: 4,
    health: 50,
    damage: 0,
    range: 2,
    speed: 1,
    ability: Some(Ability::Heal),
    heal_amount: 30,
    energy_per_turn: 0,
    lifetime: 0,
};

const GUARDIAN: UnitSpec = UnitSpec {
    kind: UnitKind::Guardian,
    cost: 5,
    health: 150,
    damage: 15,
    range: 1,
    speed: 1,
    ability: Some(Ability::Taunt),
    heal_amount: 0,
    energy_per_turn: 0,
    lifetime: 0,
};

const GENERATOR: UnitSpec = UnitSpec {
    kind: UnitKind::Generator,
    cost: 6,
    health: 80,
    damage: 0,
    range: 0,
    speed: 0,
    ability: Some(Ability::Generate),
    heal_amount: 0,
    energy_per_turn: 1,
    lifetime: 10,
};

/// Look up the archetype for a unit kind
pub fn spec_for(kind: UnitKind) -> &'static UnitSpec {
    match kind {
        UnitKind::Melee => &MELEE,
        UnitKind::Ranged => &RANGED,
        UnitKind::Medic => &MEDIC,
        UnitKind::Guardian => &GUARDIAN,
        UnitKind::Generator => &GENERATOR,
    }
}
