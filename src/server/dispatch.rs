//! Dispatch module - the single-consumer engine loop
//!
//! Every inbound event from every connection funnels through one task that
//! owns the session registry, so each action is applied atomically against
//! a consistent view of its game and no partial mutation is ever visible.
//! Snapshots go out through the broadcaster after every accepted mutation.

use tokio::sync::mpsc;

use crate::core::Game;
use crate::registry::SessionRegistry;
use crate::server::net::{InboundEvent, InboundPayload, Outbound};
use crate::server::protocol::{build_game_state, create_error, ClientMessage, ServerMessage};
use crate::types::{ActionError, ConnId, GameId, Phase, UnitKind};

/// Routes engine output to connections
#[derive(Debug, Clone)]
pub struct Broadcaster {
    out_tx: mpsc::UnboundedSender<Outbound>,
}

impl Broadcaster {
    pub fn new(out_tx: mpsc::UnboundedSender<Outbound>) -> Self {
        Self { out_tx }
    }

    /// Send one message to one connection.
    pub fn send(&self, conn: ConnId, message: ServerMessage) {
        let _ = self.out_tx.send(Outbound { conn, message });
    }

    /// Push a fresh snapshot to every participant of a game.
    pub fn broadcast_state(&self, game: &Game) {
        let snapshot = build_game_state(game);
        for player in game.players() {
            self.send(player, ServerMessage::GameState(snapshot.clone()));
        }
    }
}

/// Run the engine loop until the inbound channel closes.
pub async fn run_dispatch(mut event_rx: mpsc::Receiver<InboundEvent>, out: Broadcaster) {
    let mut registry = SessionRegistry::new();

    while let Some(event) = event_rx.recv().await {
        match event.payload {
            InboundPayload::Message(message) => {
                handle_message(&mut registry, &out, event.conn, message);
            }
            InboundPayload::Disconnected => {
                if let Some(game_id) = registry.disconnect(event.conn) {
                    if let Some(game) = registry.game(&game_id) {
                        out.broadcast_state(game);
                    }
                }
            }
        }
    }
}

fn handle_message(
    registry: &mut SessionRegistry,
    out: &Broadcaster,
    conn: ConnId,
    message: ClientMessage,
) {
    match message {
        ClientMessage::CreateGame => match registry.create_game(conn) {
            Ok((game_id, player_id)) => {
                println!("[Server] game {} created by player {}", game_id, player_id);
                out.send(conn, ServerMessage::GameCreated { game_id, player_id });
            }
            Err(e) => out.send(conn, create_error(e.message())),
        },
        ClientMessage::JoinGame { game_id } => match registry.join_game(conn, &game_id) {
            Ok(player_id) => {
                println!("[Server] player {} joined game {}", player_id, game_id);
                out.send(
                    conn,
                    ServerMessage::GameJoined {
                        game_id: game_id.clone(),
                        player_id,
                    },
                );
                if let Some(game) = registry.game(&game_id) {
                    out.broadcast_state(game);
                }
            }
            Err(e) => out.send(conn, create_error(e.message())),
        },
        action => match apply_action(registry, conn, action) {
            Ok(game_id) => {
                if let Some(game) = registry.game(&game_id) {
                    if game.phase() == Phase::Finished {
                        println!("[Server] game {} finished", game_id);
                    }
                    out.broadcast_state(game);
                }
            }
            Err(e) => out.send(conn, create_error(e.message())),
        },
    }
}

/// Apply a gameplay action; returns the game id to broadcast on success.
fn apply_action(
    registry: &mut SessionRegistry,
    conn: ConnId,
    message: ClientMessage,
) -> Result<GameId, ActionError> {
    let (game, player) = registry.resolve(conn).ok_or(ActionError::NotInGame)?;
    match message {
        ClientMessage::DeployUnit { unit_type, x, y } => {
            let kind = UnitKind::from_str(&unit_type).ok_or(ActionError::UnknownUnitType)?;
            game.deploy(player, kind, x, y)?;
        }
        ClientMessage::MoveUnit { unit_id, x, y } => {
            game.move_unit(player, unit_id, x, y)?;
        }
        ClientMessage::AttackUnit {
            attacker_id,
            target_id,
        } => {
            game.attack(player, attacker_id, target_id)?;
        }
        ClientMessage::UseAbility { unit_id, target_id } => {
            game.use_ability(player, unit_id, target_id)?;
        }
        ClientMessage::EndTurn => {
            game.end_turn(player)?;
        }
        // Session messages never reach this path.
        ClientMessage::CreateGame | ClientMessage::JoinGame { .. } => {
            return Err(ActionError::NotInGame);
        }
    }
    Ok(game.id().to_string())
}
