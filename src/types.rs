//! Core types shared across the application
//! This module contains pure data types with no external dependencies

/// Board dimension (the grid is square)
pub const GRID_SIZE: u8 = 8;

/// Highest row of the host's deployable half; the joining player owns the rest
pub const HOST_ROW_MAX: u8 = 3;

/// Energy each player starts with
pub const STARTING_ENERGY: u32 = 10;

/// Energy granted at the start of every turn
pub const TURN_START_ENERGY: u32 = 2;

/// Flat energy cost of an attack, independent of distance and unit type
pub const ATTACK_COST: u32 = 2;

/// Flat energy cost of an ability use
pub const ABILITY_COST: u32 = 1;

/// Turns a taunt persists on the afflicted unit
pub const TAUNT_DURATION: u32 = 1;

/// Completed end-turns before the win condition may fire (two full turns
/// per player, so neither side can lose before it had a chance to deploy)
pub const WIN_CHECK_GRACE_TURNS: u32 = 4;

/// Player identity (equal to the owning connection id)
pub type PlayerId = u64;

/// Per-game monotonic unit identity
pub type UnitId = u32;

/// Connection identity assigned by the accept loop
pub type ConnId = u64;

/// Game identity, a short base36 token
pub type GameId = String;

/// Coarse game lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Waiting,
    Playing,
    Finished,
}

impl Phase {
    /// Convert to the wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Waiting => "waiting",
            Phase::Playing => "playing",
            Phase::Finished => "finished",
        }
    }
}

/// Unit archetypes available in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    Melee,
    Ranged,
    Medic,
    Guardian,
    Generator,
}

impl UnitKind {
    /// Parse unit kind from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "melee" => Some(UnitKind::Melee),
            "ranged" => Some(UnitKind::Ranged),
            "medic" => Some(UnitKind::Medic),
            "guardian" => Some(UnitKind::Guardian),
            "generator" => Some(UnitKind::Generator),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Melee => "melee",
            UnitKind::Ranged => "ranged",
            UnitKind::Medic => "medic",
            UnitKind::Guardian => "guardian",
            UnitKind::Generator => "generator",
        }
    }
}

/// Active abilities a unit can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ability {
    Heal,
    Taunt,
    Generate,
}

impl Ability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ability::Heal => "heal",
            Ability::Taunt => "taunt",
            Ability::Generate => "generate",
        }
    }
}

/// Status effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Taunt,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Taunt => "taunt",
        }
    }
}

/// Why an action was rejected
///
/// Every rejection is side-effect free: the operation validated its
/// preconditions against current state and mutated nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionError {
    GameNotFound,
    GameFull,
    AlreadyInGame,
    NotInGame,
    NotPlaying,
    NotYourTurn,
    UnknownUnitType,
    InsufficientEnergy,
    OutOfBounds,
    CellOccupied,
    WrongDeployRow,
    UnknownUnit,
    NotYourUnit,
    AlreadyMoved,
    AlreadyActed,
    MoveTooFar,
    OutOfRange,
    Taunted,
    HealTargetInvalid,
    TauntTargetInvalid,
    NoActiveAbility,
}

impl ActionError {
    /// Player-facing notice delivered with the `error` event
    pub fn message(&self) -> &'static str {
        match self {
            ActionError::GameNotFound => "Game not found",
            ActionError::GameFull => "Game is full",
            ActionError::AlreadyInGame => "Already in a game",
            ActionError::NotInGame => "Not in a game",
            ActionError::NotPlaying => "Game is not in progress",
            ActionError::NotYourTurn => "Not your turn",
            ActionError::UnknownUnitType => "Unknown unit type",
            ActionError::InsufficientEnergy => "Not enough energy",
            ActionError::OutOfBounds => "Target cell is out of bounds",
            ActionError::CellOccupied => "Target cell is occupied",
            ActionError::WrongDeployRow => "Cannot deploy outside your half",
            ActionError::UnknownUnit => "No such unit",
            ActionError::NotYourUnit => "Unit is not yours",
            ActionError::AlreadyMoved => "Unit has already moved this turn",
            ActionError::AlreadyActed => "Unit has already acted this turn",
            ActionError::MoveTooFar => "Destination is beyond the unit's speed",
            ActionError::OutOfRange => "Target is out of range",
            ActionError::Taunted => "Unit is taunted and must attack its taunter",
            ActionError::HealTargetInvalid => "Can only heal injured allies",
            ActionError::TauntTargetInvalid => "Can only taunt enemy units",
            ActionError::NoActiveAbility => "Unit has no usable ability",
        }
    }
}
