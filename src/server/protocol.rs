//! Protocol module - JSON message types for the game wire
//!
//! Line-delimited JSON, one message per line. Inbound messages are tagged
//! by `type` and carry the field names the browser client sends; outbound
//! events mirror the same convention.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::unit::Unit;
use crate::core::Game;
use crate::types::{Ability, GameId, Phase, PlayerId, StatusKind, UnitId, UnitKind, GRID_SIZE};

// ============== Client -> Server Messages ==============

/// Inbound action, implicitly attributed to the sending connection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "createGame")]
    CreateGame,
    #[serde(rename = "joinGame")]
    JoinGame {
        #[serde(rename = "gameId")]
        game_id: String,
    },
    #[serde(rename = "deployUnit")]
    DeployUnit {
        #[serde(rename = "unitType")]
        unit_type: String,
        x: i32,
        y: i32,
    },
    #[serde(rename = "moveUnit")]
    MoveUnit {
        #[serde(rename = "unitId")]
        unit_id: UnitId,
        x: i32,
        y: i32,
    },
    #[serde(rename = "attackUnit")]
    AttackUnit {
        #[serde(rename = "attackerId")]
        attacker_id: UnitId,
        #[serde(rename = "targetId")]
        target_id: UnitId,
    },
    #[serde(rename = "useAbility")]
    UseAbility {
        #[serde(rename = "unitId")]
        unit_id: UnitId,
        #[serde(rename = "targetId")]
        target_id: UnitId,
    },
    #[serde(rename = "endTurn")]
    EndTurn,
}

// ============== Server -> Client Messages ==============

// Outbound types are serialize-only: the server never parses its own events
// back, and clients consume them as plain JSON.

/// Outbound event
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "gameCreated")]
    GameCreated {
        #[serde(rename = "gameId")]
        game_id: GameId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    #[serde(rename = "gameJoined")]
    GameJoined {
        #[serde(rename = "gameId")]
        game_id: GameId,
        #[serde(rename = "playerId")]
        player_id: PlayerId,
    },
    #[serde(rename = "gameState")]
    GameState(GameStateMessage),
    #[serde(rename = "error")]
    Error { message: String },
}

/// Phase names as they appear on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseName {
    #[serde(rename = "waiting")]
    Waiting,
    #[serde(rename = "playing")]
    Playing,
    #[serde(rename = "finished")]
    Finished,
}

impl From<Phase> for PhaseName {
    fn from(value: Phase) -> Self {
        match value {
            Phase::Waiting => Self::Waiting,
            Phase::Playing => Self::Playing,
            Phase::Finished => Self::Finished,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnitKindName {
    #[serde(rename = "melee")]
    Melee,
    #[serde(rename = "ranged")]
    Ranged,
    #[serde(rename = "medic")]
    Medic,
    #[serde(rename = "guardian")]
    Guardian,
    #[serde(rename = "generator")]
    Generator,
}

impl From<UnitKind> for UnitKindName {
    fn from(value: UnitKind) -> Self {
        match value {
            UnitKind::Melee => Self::Melee,
            UnitKind::Ranged => Self::Ranged,
            UnitKind::Medic => Self::Medic,
            UnitKind::Guardian => Self::Guardian,
            UnitKind::Generator => Self::Generator,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AbilityName {
    #[serde(rename = "heal")]
    Heal,
    #[serde(rename = "taunt")]
    Taunt,
    #[serde(rename = "generate")]
    Generate,
}

impl From<Ability> for AbilityName {
    fn from(value: Ability) -> Self {
        match value {
            Ability::Heal => Self::Heal,
            Ability::Taunt => Self::Taunt,
            Ability::Generate => Self::Generate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusKindName {
    #[serde(rename = "taunt")]
    Taunt,
}

impl From<StatusKind> for StatusKindName {
    fn from(value: StatusKind) -> Self {
        match value {
            StatusKind::Taunt => Self::Taunt,
        }
    }
}

/// One grid cell of the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellState {
    pub occupied: bool,
    #[serde(rename = "unitId")]
    pub unit_id: Option<UnitId>,
}

/// Status effect entry of a unit snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusEffectState {
    #[serde(rename = "type")]
    pub kind: StatusKindName,
    pub turns: u32,
    #[serde(rename = "byUnitId")]
    pub by_unit: UnitId,
}

/// Full unit record carried in `units[]`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitState {
    pub id: UnitId,
    pub owner: PlayerId,
    #[serde(rename = "type")]
    pub kind: UnitKindName,
    pub cost: u32,
    pub health: i32,
    #[serde(rename = "maxHealth")]
    pub max_health: i32,
    pub damage: i32,
    pub range: u8,
    pub speed: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ability: Option<AbilityName>,
    #[serde(rename = "healAmount")]
    pub heal_amount: i32,
    #[serde(rename = "energyPerTurn")]
    pub energy_per_turn: u32,
    #[serde(rename = "maxTurns")]
    pub max_turns: u32,
    pub x: u8,
    pub y: u8,
    #[serde(rename = "hasMoved")]
    pub has_moved: bool,
    #[serde(rename = "hasAttacked")]
    pub has_attacked: bool,
    #[serde(rename = "statusEffects")]
    pub status_effects: Vec<StatusEffectState>,
    #[serde(rename = "turnsActive")]
    pub turns_active: u32,
}

impl From<&Unit> for UnitState {
    fn from(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            owner: unit.owner,
            kind: unit.kind.into(),
            cost: unit.cost,
            health: unit.health,
            max_health: unit.max_health,
            damage: unit.damage,
            range: unit.range,
            speed: unit.speed,
            ability: unit.ability.map(AbilityName::from),
            heal_amount: unit.heal_amount,
            energy_per_turn: unit.energy_per_turn,
            max_turns: unit.lifetime,
            x: unit.x,
            y: unit.y,
            has_moved: unit.has_moved,
            has_attacked: unit.has_attacked,
            status_effects: unit
                .status_effects
                .iter()
                .map(|e| StatusEffectState {
                    kind: e.kind.into(),
                    turns: e.turns,
                    by_unit: e.by_unit,
                })
                .collect(),
            turns_active: unit.turns_active,
        }
    }
}

/// Full-state snapshot pushed to both participants after every mutation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStateMessage {
    #[serde(rename = "gameId")]
    pub game_id: GameId,
    #[serde(rename = "currentTurn")]
    pub current_turn: PlayerId,
    #[serde(rename = "gameState")]
    pub game_state: PhaseName,
    pub winner: Option<PlayerId>,
    pub grid: [[CellState; GRID_SIZE as usize]; GRID_SIZE as usize],
    pub units: Vec<UnitState>,
    pub energy: BTreeMap<PlayerId, u32>,
    pub players: Vec<PlayerId>,
}

/// Build the full-state snapshot for a game
pub fn build_game_state(game: &Game) -> GameStateMessage {
    let empty = CellState {
        occupied: false,
        unit_id: None,
    };
    let mut grid = [[empty; GRID_SIZE as usize]; GRID_SIZE as usize];
    for y in 0..GRID_SIZE {
        for x in 0..GRID_SIZE {
            let occupant = game.board().occupant(x, y);
            grid[y as usize][x as usize] = CellState {
                occupied: occupant.is_some(),
                unit_id: occupant,
            };
        }
    }

    let energy = game
        .players()
        .filter_map(|p| game.energy_of(p).map(|e| (p, e)))
        .collect();

    GameStateMessage {
        game_id: game.id().to_string(),
        current_turn: game.current_turn(),
        game_state: game.phase().into(),
        winner: game.winner(),
        grid,
        units: game.units().map(UnitState::from).collect(),
        energy,
        players: game.players().collect(),
    }
}

/// Parse one inbound line
pub fn parse_message(json: &str) -> Result<ClientMessage, serde_json::Error> {
    serde_json::from_str(json)
}

/// Create an error notice
pub fn create_error(message: &str) -> ServerMessage {
    ServerMessage::Error {
        message: message.to_string(),
    }
}
