//! Session registry - maps connections to games
//!
//! Owns every live `Game` keyed by id, plus the connection -> (game, player)
//! bindings. All mutation happens on the dispatch task one event at a time,
//! so the maps need no interior locking.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::Game;
use crate::types::{ActionError, ConnId, GameId, PlayerId};

/// Where a connection is bound
#[derive(Debug, Clone)]
pub struct Binding {
    pub game_id: GameId,
    pub player_id: PlayerId,
}

/// LCG token generator for game ids, time-salted at construction
///
/// Tokens only need to be hard to collide, not unpredictable; nine base36
/// characters over a 64-bit state are plenty for both.
#[derive(Debug)]
struct IdGen {
    state: u64,
}

impl IdGen {
    fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        // Avoid the all-zero state.
        Self { state: seed | 1 }
    }

    fn next_u64(&mut self) -> u64 {
        // LCG constants from Knuth's MMIX
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// 9-character base36 token
    fn next_token(&mut self) -> GameId {
        const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
        let mut v = self.next_u64();
        let mut out = String::with_capacity(9);
        for _ in 0..9 {
            out.push(DIGITS[(v % 36) as usize] as char);
            v /= 36;
        }
        out
    }
}

/// Registry of live games and connection bindings
#[derive(Debug)]
pub struct SessionRegistry {
    games: HashMap<GameId, Game>,
    bindings: HashMap<ConnId, Binding>,
    ids: IdGen,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            games: HashMap::new(),
            bindings: HashMap::new(),
            ids: IdGen::new(),
        }
    }

    /// Create a game hosted by `conn` and bind the connection to it.
    pub fn create_game(&mut self, conn: ConnId) -> Result<(GameId, PlayerId), ActionError> {
        if self.bindings.contains_key(&conn) {
            return Err(ActionError::AlreadyInGame);
        }
        let player_id: PlayerId = conn;
        let mut game_id = self.ids.next_token();
        while self.games.contains_key(&game_id) {
            game_id = self.ids.next_token();
        }
        let mut game = Game::new(game_id.clone(), player_id);
        // A fresh game is never full.
        let _ = game.add_player(player_id);
        self.games.insert(game_id.clone(), game);
        self.bindings.insert(
            conn,
            Binding {
                game_id: game_id.clone(),
                player_id,
            },
        );
        Ok((game_id, player_id))
    }

    /// Bind `conn` as the second player of an existing game.
    pub fn join_game(&mut self, conn: ConnId, game_id: &str) -> Result<PlayerId, ActionError> {
        if self.bindings.contains_key(&conn) {
            return Err(ActionError::AlreadyInGame);
        }
        let game = self.games.get_mut(game_id).ok_or(ActionError::GameNotFound)?;
        if game.player_count() >= 2 {
            return Err(ActionError::GameFull);
        }
        let player_id: PlayerId = conn;
        game.add_player(player_id)?;
        self.bindings.insert(
            conn,
            Binding {
                game_id: game_id.to_string(),
                player_id,
            },
        );
        Ok(player_id)
    }

    /// Game and player bound to a connection
    pub fn resolve(&mut self, conn: ConnId) -> Option<(&mut Game, PlayerId)> {
        let binding = self.bindings.get(&conn)?;
        let player = binding.player_id;
        let game = self.games.get_mut(&binding.game_id)?;
        Some((game, player))
    }

    pub fn game(&self, game_id: &str) -> Option<&Game> {
        self.games.get(game_id)
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Unbind a connection and remove its player from the bound game.
    ///
    /// An emptied game is discarded. Returns the id of a game that survived
    /// the departure so the caller can broadcast its final state.
    pub fn disconnect(&mut self, conn: ConnId) -> Option<GameId> {
        let binding = self.bindings.remove(&conn)?;
        let game = self.games.get_mut(&binding.game_id)?;
        game.remove_player(binding.player_id);
        if game.player_count() == 0 {
            self.games.remove(&binding.game_id);
            None
        } else {
            Some(binding.game_id)
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
