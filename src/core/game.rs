//! Game module - the per-match rules engine
//!
//! One `Game` per active match. Every operation is an atomic
//! validate-then-mutate unit: all preconditions are checked against current
//! state before the first field changes, so a rejected action leaves no
//! trace. Broadcasting snapshots is the caller's concern.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;

use crate::core::board::Board;
use crate::core::catalog::spec_for;
use crate::core::unit::{StatusEffect, Unit};
use crate::types::{
    Ability, ActionError, GameId, Phase, PlayerId, StatusKind, UnitId, UnitKind, ABILITY_COST,
    ATTACK_COST, HOST_ROW_MAX, STARTING_ENERGY, TAUNT_DURATION, TURN_START_ENERGY,
    WIN_CHECK_GRACE_TURNS,
};

/// Per-player bookkeeping; the energy ledger lives here
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSlot {
    pub id: PlayerId,
    pub energy: u32,
    pub has_deployed: bool,
}

/// A single match
#[derive(Debug, Clone)]
pub struct Game {
    id: GameId,
    host: PlayerId,
    players: ArrayVec<PlayerSlot, 2>,
    phase: Phase,
    board: Board,
    /// Keyed by unit id; BTreeMap keeps snapshot ordering deterministic
    units: BTreeMap<UnitId, Unit>,
    next_unit_id: UnitId,
    current_turn: PlayerId,
    /// Count of completed end-turns
    turn_number: u32,
    winner: Option<PlayerId>,
}

impl Game {
    /// Create a match in the waiting phase with `host` to move first
    pub fn new(id: GameId, host: PlayerId) -> Self {
        Self {
            id,
            host,
            players: ArrayVec::new(),
            phase: Phase::Waiting,
            board: Board::new(),
            units: BTreeMap::new(),
            next_unit_id: 1,
            current_turn: host,
            turn_number: 0,
            winner: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn host(&self) -> PlayerId {
        self.host
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_turn(&self) -> PlayerId {
        self.current_turn
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|slot| slot.id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn has_deployed(&self, player: PlayerId) -> Option<bool> {
        self.slot(player).map(|slot| slot.has_deployed)
    }

    pub fn energy_of(&self, player: PlayerId) -> Option<u32> {
        self.slot(player).map(|slot| slot.energy)
    }

    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.get(&id)
    }

    pub fn unit_count_of(&self, player: PlayerId) -> usize {
        self.units.values().filter(|u| u.owner == player).count()
    }

    #[cfg(test)]
    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.get_mut(&id)
    }

    fn slot(&self, player: PlayerId) -> Option<&PlayerSlot> {
        self.players.iter().find(|slot| slot.id == player)
    }

    fn slot_mut(&mut self, player: PlayerId) -> Option<&mut PlayerSlot> {
        self.players.iter_mut().find(|slot| slot.id == player)
    }

    fn other_player(&self, player: PlayerId) -> Option<PlayerId> {
        self.players.iter().map(|slot| slot.id).find(|id| *id != player)
    }

    /// Add a player; the second join flips the phase to playing and runs
    /// the first start-of-turn for the host.
    pub fn add_player(&mut self, player: PlayerId) -> Result<(), ActionError> {
        if self.players.len() >= 2 {
            return Err(ActionError::GameFull);
        }
        self.players.push(PlayerSlot {
            id: player,
            energy: STARTING_ENERGY,
            has_deployed: false,
        });
        if self.players.len() == 2 {
            self.phase = Phase::Playing;
            self.start_turn();
        }
        Ok(())
    }

    /// Remove a player and every unit they own, freeing their cells.
    ///
    /// Leaving a running match forfeits it: the survivor wins.
    pub fn remove_player(&mut self, player: PlayerId) {
        self.players.retain(|slot| slot.id != player);

        let owned: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.owner == player)
            .map(|u| u.id)
            .collect();
        for id in owned {
            self.remove_unit(id);
        }

        if self.phase == Phase::Playing {
            if let Some(survivor) = self.players.first().map(|slot| slot.id) {
                self.phase = Phase::Finished;
                self.winner = Some(survivor);
            }
        }
    }

    /// Deploy a unit from the catalog onto the caller's half of the board.
    ///
    /// Returns the new unit's id.
    pub fn deploy(
        &mut self,
        player: PlayerId,
        kind: UnitKind,
        x: i32,
        y: i32,
    ) -> Result<UnitId, ActionError> {
        self.require_turn(player)?;
        let spec = spec_for(kind);
        let energy = self
            .slot(player)
            .map(|slot| slot.energy)
            .ok_or(ActionError::NotInGame)?;
        if energy < spec.cost {
            return Err(ActionError::InsufficientEnergy);
        }
        if !Board::in_bounds(x, y) {
            return Err(ActionError::OutOfBounds);
        }
        let (x, y) = (x as u8, y as u8);
        if !self.deploy_row_ok(player, y) {
            return Err(ActionError::WrongDeployRow);
        }
        if self.board.occupant(x, y).is_some() {
            return Err(ActionError::CellOccupied);
        }

        let id = self.next_unit_id;
        self.next_unit_id += 1;
        self.units.insert(id, Unit::from_spec(id, player, spec, x, y));
        self.board.occupy(x, y, id);
        if let Some(slot) = self.slot_mut(player) {
            slot.energy -= spec.cost;
            slot.has_deployed = true;
        }
        Ok(id)
    }

    /// Move a unit, paying 1 energy per tile of Manhattan distance.
    pub fn move_unit(
        &mut self,
        player: PlayerId,
        unit_id: UnitId,
        x: i32,
        y: i32,
    ) -> Result<(), ActionError> {
        self.require_turn(player)?;
        let unit = self.units.get(&unit_id).ok_or(ActionError::UnknownUnit)?;
        if unit.owner != player {
            return Err(ActionError::NotYourUnit);
        }
        if unit.has_moved {
            return Err(ActionError::AlreadyMoved);
        }
        if !Board::in_bounds(x, y) {
            return Err(ActionError::OutOfBounds);
        }
        let (nx, ny) = (x as u8, y as u8);
        if self.board.occupant(nx, ny).is_some() {
            return Err(ActionError::CellOccupied);
        }
        let distance = unit.distance_to(nx, ny);
        if distance > u32::from(unit.speed) {
            return Err(ActionError::MoveTooFar);
        }
        let energy = self.slot(player).map(|slot| slot.energy).unwrap_or(0);
        if energy < distance {
            return Err(ActionError::InsufficientEnergy);
        }

        let (ox, oy) = (unit.x, unit.y);
        if let Some(slot) = self.slot_mut(player) {
            slot.energy -= distance;
        }
        self.board.vacate(ox, oy);
        self.board.occupy(nx, ny, unit_id);
        if let Some(unit) = self.units.get_mut(&unit_id) {
            unit.x = nx;
            unit.y = ny;
            unit.has_moved = true;
        }
        Ok(())
    }

    /// Attack a unit within range for a flat energy cost.
    pub fn attack(
        &mut self,
        player: PlayerId,
        attacker_id: UnitId,
        target_id: UnitId,
    ) -> Result<(), ActionError> {
        self.require_turn(player)?;
        let attacker = self.units.get(&attacker_id).ok_or(ActionError::UnknownUnit)?;
        let target = self.units.get(&target_id).ok_or(ActionError::UnknownUnit)?;
        if attacker.owner != player {
            return Err(ActionError::NotYourUnit);
        }
        if attacker.has_attacked {
            return Err(ActionError::AlreadyActed);
        }
        // A taunted unit may only strike its tormentor.
        if let Some(taunter) = attacker.taunted_by() {
            if taunter != target_id {
                return Err(ActionError::Taunted);
            }
        }
        if attacker.distance_to(target.x, target.y) > u32::from(attacker.range) {
            return Err(ActionError::OutOfRange);
        }
        let energy = self.slot(player).map(|slot| slot.energy).unwrap_or(0);
        if energy < ATTACK_COST {
            return Err(ActionError::InsufficientEnergy);
        }

        let damage = attacker.damage;
        if let Some(slot) = self.slot_mut(player) {
            slot.energy -= ATTACK_COST;
        }
        if let Some(attacker) = self.units.get_mut(&attacker_id) {
            attacker.has_attacked = true;
        }
        let dead = match self.units.get_mut(&target_id) {
            Some(target) => {
                target.health -= damage;
                target.health <= 0
            }
            None => false,
        };
        if dead {
            self.remove_unit(target_id);
        }
        Ok(())
    }

    /// Use a unit's active ability on a target within range.
    ///
    /// Shares the action slot with attacking: a unit that attacked cannot
    /// use an ability this turn and vice versa.
    pub fn use_ability(
        &mut self,
        player: PlayerId,
        unit_id: UnitId,
        target_id: UnitId,
    ) -> Result<(), ActionError> {
        self.require_turn(player)?;
        let unit = self.units.get(&unit_id).ok_or(ActionError::UnknownUnit)?;
        let target = self.units.get(&target_id).ok_or(ActionError::UnknownUnit)?;
        if unit.owner != player {
            return Err(ActionError::NotYourUnit);
        }
        if unit.has_attacked {
            return Err(ActionError::AlreadyActed);
        }
        if unit.distance_to(target.x, target.y) > u32::from(unit.range) {
            return Err(ActionError::OutOfRange);
        }
        let energy = self.slot(player).map(|slot| slot.energy).unwrap_or(0);
        if energy < ABILITY_COST {
            return Err(ActionError::InsufficientEnergy);
        }

        let ability = unit.ability;
        let heal_amount = unit.heal_amount;
        match ability {
            Some(Ability::Heal) => {
                if target.owner != player || target.health >= target.max_health {
                    return Err(ActionError::HealTargetInvalid);
                }
                if let Some(target) = self.units.get_mut(&target_id) {
                    target.health = (target.health + heal_amount).min(target.max_health);
                }
            }
            Some(Ability::Taunt) => {
                if target.owner == player {
                    return Err(ActionError::TauntTargetInvalid);
                }
                if let Some(target) = self.units.get_mut(&target_id) {
                    target.status_effects.push(StatusEffect {
                        kind: StatusKind::Taunt,
                        turns: TAUNT_DURATION,
                        by_unit: unit_id,
                    });
                }
            }
            // A generator's yield is passive; it has nothing to aim.
            Some(Ability::Generate) | None => return Err(ActionError::NoActiveAbility),
        }

        if let Some(unit) = self.units.get_mut(&unit_id) {
            unit.has_attacked = true;
        }
        if let Some(slot) = self.slot_mut(player) {
            slot.energy -= ABILITY_COST;
        }
        Ok(())
    }

    /// End the caller's turn and run start-of-turn for the opponent.
    pub fn end_turn(&mut self, player: PlayerId) -> Result<(), ActionError> {
        self.require_turn(player)?;
        let next = self.other_player(player).ok_or(ActionError::NotPlaying)?;

        self.turn_number += 1;
        for unit in self.units.values_mut() {
            if unit.owner == player {
                // The ending player's units get their actions back.
                unit.has_moved = false;
                unit.has_attacked = false;
            } else if unit.owner == next {
                // Status effects on the player about to act tick down now.
                for effect in &mut unit.status_effects {
                    effect.turns = effect.turns.saturating_sub(1);
                }
                unit.status_effects.retain(|e| e.turns > 0);
            }
        }
        self.current_turn = next;
        self.start_turn();
        Ok(())
    }

    /// Start-of-turn processing: win check, energy grant, generator tick.
    fn start_turn(&mut self) {
        self.check_win_condition();
        if self.phase == Phase::Finished {
            return;
        }
        let player = self.current_turn;
        if let Some(slot) = self.slot_mut(player) {
            slot.energy += TURN_START_ENERGY;
        }
        self.process_generators();
    }

    /// Tick every generator owned by the player whose turn is starting:
    /// yield energy, then self-destruct once the lifetime is exhausted.
    fn process_generators(&mut self) {
        let player = self.current_turn;
        let generators: Vec<UnitId> = self
            .units
            .values()
            .filter(|u| u.kind == UnitKind::Generator && u.owner == player)
            .map(|u| u.id)
            .collect();

        for id in generators {
            let mut expired = false;
            let mut yield_amount = 0;
            if let Some(unit) = self.units.get_mut(&id) {
                unit.turns_active += 1;
                yield_amount = unit.energy_per_turn;
                expired = unit.turns_active >= unit.lifetime;
            }
            if let Some(slot) = self.slot_mut(player) {
                slot.energy += yield_amount;
            }
            if expired {
                self.remove_unit(id);
            }
        }
    }

    /// Declare a winner once a side has no units left.
    ///
    /// Skipped until both players have completed two full turns. Mutual
    /// annihilation is a draw: finished with no winner.
    fn check_win_condition(&mut self) {
        if self.players.len() < 2 {
            return;
        }
        if self.turn_number < WIN_CHECK_GRACE_TURNS {
            return;
        }
        let first = self.players[0].id;
        let second = self.players[1].id;
        let first_units = self.unit_count_of(first);
        let second_units = self.unit_count_of(second);
        match (first_units, second_units) {
            (0, 0) => {
                self.phase = Phase::Finished;
                self.winner = None;
            }
            (0, _) => {
                self.phase = Phase::Finished;
                self.winner = Some(second);
            }
            (_, 0) => {
                self.phase = Phase::Finished;
                self.winner = Some(first);
            }
            _ => {}
        }
    }

    fn require_turn(&self, player: PlayerId) -> Result<(), ActionError> {
        if self.phase != Phase::Playing {
            return Err(ActionError::NotPlaying);
        }
        if self.current_turn != player {
            return Err(ActionError::NotYourTurn);
        }
        Ok(())
    }

    fn deploy_row_ok(&self, player: PlayerId, y: u8) -> bool {
        if player == self.host {
            y <= HOST_ROW_MAX
        } else {
            y > HOST_ROW_MAX
        }
    }

    fn remove_unit(&mut self, id: UnitId) {
        if let Some(unit) = self.units.remove(&id) {
            self.board.vacate(unit.x, unit.y);
        }
    }

    /// Audit the grid/unit occupancy bijection.
    ///
    /// Every live unit must sit on exactly the cell that names it, and every
    /// occupied cell must name a live unit. Tests run this after mutations.
    pub fn occupancy_consistent(&self) -> bool {
        for unit in self.units.values() {
            if self.board.occupant(unit.x, unit.y) != Some(unit.id) {
                return false;
            }
        }
        self.board.occupied_count() == self.units.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOST: PlayerId = 1;
    const GUEST: PlayerId = 2;

    fn playing_game() -> Game {
        let mut game = Game::new("test-game".to_string(), HOST);
        game.add_player(HOST).unwrap();
        game.add_player(GUEST).unwrap();
        game
    }

    #[test]
    fn test_second_join_starts_match() {
        let mut game = Game::new("g".to_string(), HOST);
        game.add_player(HOST).unwrap();
        assert_eq!(game.phase(), Phase::Waiting);
        assert_eq!(game.energy_of(HOST), Some(10));

        game.add_player(GUEST).unwrap();
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.current_turn(), HOST);
        assert_eq!(game.turn_number(), 0);
        // The host's first turn already started: +2 over the initial 10.
        assert_eq!(game.energy_of(HOST), Some(12));
        assert_eq!(game.energy_of(GUEST), Some(10));
    }

    #[test]
    fn test_third_player_rejected() {
        let mut game = playing_game();
        assert_eq!(game.add_player(3), Err(ActionError::GameFull));
    }

    #[test]
    fn test_deploy_places_unit_and_charges_cost() {
        let mut game = playing_game();
        let id = game.deploy(HOST, UnitKind::Melee, 0, 0).unwrap();

        assert_eq!(game.energy_of(HOST), Some(10));
        let unit = game.unit(id).unwrap();
        assert_eq!(unit.health, 100);
        assert_eq!(unit.max_health, 100);
        assert_eq!((unit.x, unit.y), (0, 0));
        assert_eq!(game.board().occupant(0, 0), Some(id));
        assert_eq!(game.has_deployed(HOST), Some(true));
        assert!(game.occupancy_consistent());
    }

    #[test]
    fn test_deploy_rejections_leave_state_unchanged() {
        let mut game = playing_game();

        assert_eq!(
            game.deploy(GUEST, UnitKind::Melee, 0, 4),
            Err(ActionError::NotYourTurn)
        );
        assert_eq!(
            game.deploy(HOST, UnitKind::Melee, 0, 5),
            Err(ActionError::WrongDeployRow)
        );
        assert_eq!(
            game.deploy(HOST, UnitKind::Melee, -1, 0),
            Err(ActionError::OutOfBounds)
        );
        assert_eq!(
            game.deploy(HOST, UnitKind::Melee, 8, 0),
            Err(ActionError::OutOfBounds)
        );

        let id = game.deploy(HOST, UnitKind::Melee, 3, 3).unwrap();
        assert_eq!(
            game.deploy(HOST, UnitKind::Ranged, 3, 3),
            Err(ActionError::CellOccupied)
        );

        // Drain energy: 12 - 2 = 10, then two guardians leave 0.
        game.deploy(HOST, UnitKind::Guardian, 0, 0).unwrap();
        game.deploy(HOST, UnitKind::Guardian, 1, 0).unwrap();
        assert_eq!(game.energy_of(HOST), Some(0));
        assert_eq!(
            game.deploy(HOST, UnitKind::Melee, 2, 0),
            Err(ActionError::InsufficientEnergy)
        );

        assert_eq!(game.unit_count_of(HOST), 3);
        assert_eq!(game.unit(id).map(|u| u.health), Some(100));
        assert!(game.occupancy_consistent());
    }

    #[test]
    fn test_move_costs_one_energy_per_tile() {
        let mut game = playing_game();
        let id = game.deploy(HOST, UnitKind::Melee, 0, 0).unwrap();
        assert_eq!(game.energy_of(HOST), Some(10));

        game.move_unit(HOST, id, 1, 1).unwrap();
        assert_eq!(game.energy_of(HOST), Some(8));
        let unit = game.unit(id).unwrap();
        assert_eq!((unit.x, unit.y), (1, 1));
        assert!(unit.has_moved);
        assert_eq!(game.board().occupant(0, 0), None);
        assert_eq!(game.board().occupant(1, 1), Some(id));
        assert!(game.occupancy_consistent());

        assert_eq!(game.move_unit(HOST, id, 2, 1), Err(ActionError::AlreadyMoved));
    }

    #[test]
    fn test_move_beyond_speed_fails_cleanly() {
        let mut game = playing_game();
        let id = game.deploy(HOST, UnitKind::Melee, 0, 0).unwrap();
        let energy_before = game.energy_of(HOST);

        // Melee speed is 2; (1, 2) is 3 tiles away.
        assert_eq!(game.move_unit(HOST, id, 1, 2), Err(ActionError::MoveTooFar));
        assert_eq!(game.energy_of(HOST), energy_before);
        let unit = game.unit(id).unwrap();
        assert_eq!((unit.x, unit.y), (0, 0));
        assert!(!unit.has_moved);
    }

    #[test]
    fn test_move_requires_energy_for_distance() {
        let mut game = playing_game();
        // 12 -> 7 -> 5 -> 2 energy across three deploys.
        game.deploy(HOST, UnitKind::Guardian, 0, 0).unwrap();
        let melee = game.deploy(HOST, UnitKind::Melee, 1, 0).unwrap();
        game.deploy(HOST, UnitKind::Ranged, 2, 0).unwrap();
        assert_eq!(game.energy_of(HOST), Some(2));

        game.move_unit(HOST, melee, 1, 1).unwrap();
        assert_eq!(game.energy_of(HOST), Some(1));

        let other = game.unit_count_of(HOST);
        // Spend the last point on a 1-tile ranged step.
        let ranged = game
            .units()
            .find(|u| u.kind == UnitKind::Ranged)
            .map(|u| u.id)
            .unwrap();
        game.move_unit(HOST, ranged, 2, 1).unwrap();
        assert_eq!(game.energy_of(HOST), Some(0));

        let guardian = game
            .units()
            .find(|u| u.kind == UnitKind::Guardian)
            .map(|u| u.id)
            .unwrap();
        assert_eq!(
            game.move_unit(HOST, guardian, 0, 1),
            Err(ActionError::InsufficientEnergy)
        );
        assert_eq!(game.unit_count_of(HOST), other);
        assert!(game.occupancy_consistent());
    }

    #[test]
    fn test_attack_costs_flat_two_and_applies_damage() {
        let mut game = playing_game();
        let host_melee = game.deploy(HOST, UnitKind::Melee, 0, 3).unwrap();
        game.end_turn(HOST).unwrap();
        let guest_melee = game.deploy(GUEST, UnitKind::Melee, 0, 4).unwrap();
        game.end_turn(GUEST).unwrap();

        let energy_before = game.energy_of(HOST).unwrap();
        game.attack(HOST, host_melee, guest_melee).unwrap();
        assert_eq!(game.energy_of(HOST), Some(energy_before - 2));
        assert_eq!(game.unit(guest_melee).map(|u| u.health), Some(75));
        assert!(game.unit(host_melee).unwrap().has_attacked);

        assert_eq!(
            game.attack(HOST, host_melee, guest_melee),
            Err(ActionError::AlreadyActed)
        );
    }

    #[test]
    fn test_attack_out_of_range_changes_nothing() {
        let mut game = playing_game();
        let host_melee = game.deploy(HOST, UnitKind::Melee, 0, 0).unwrap();
        game.end_turn(HOST).unwrap();
        let guest_melee = game.deploy(GUEST, UnitKind::Melee, 0, 7).unwrap();
        game.end_turn(GUEST).unwrap();

        let energy_before = game.energy_of(HOST);
        assert_eq!(
            game.attack(HOST, host_melee, guest_melee),
            Err(ActionError::OutOfRange)
        );
        assert_eq!(game.energy_of(HOST), energy_before);
        assert_eq!(game.unit(guest_melee).map(|u| u.health), Some(100));
        assert!(!game.unit(host_melee).unwrap().has_attacked);
    }

    #[test]
    fn test_lethal_attack_removes_unit_and_frees_cell() {
        let mut game = playing_game();
        let ranged = game.deploy(HOST, UnitKind::Ranged, 0, 3).unwrap();
        game.end_turn(HOST).unwrap();
        let medic = game.deploy(GUEST, UnitKind::Medic, 0, 4).unwrap();
        game.end_turn(GUEST).unwrap();

        // Medic has 50 health; two ranged hits of 30 finish it.
        game.attack(HOST, ranged, medic).unwrap();
        assert_eq!(game.unit(medic).map(|u| u.health), Some(20));
        game.end_turn(HOST).unwrap();
        game.end_turn(GUEST).unwrap();
        game.attack(HOST, ranged, medic).unwrap();

        assert!(game.unit(medic).is_none());
        assert_eq!(game.board().occupant(0, 4), None);
        assert!(game.occupancy_consistent());
    }

    #[test]
    fn test_taunted_unit_must_attack_its_taunter() {
        let mut game = playing_game();
        let host_melee = game.deploy(HOST, UnitKind::Melee, 0, 3).unwrap();
        game.end_turn(HOST).unwrap();
        let guardian = game.deploy(GUEST, UnitKind::Guardian, 0, 4).unwrap();
        let guest_melee = game.deploy(GUEST, UnitKind::Melee, 1, 4).unwrap();
        game.end_turn(GUEST).unwrap();

        // Force a multi-turn taunt onto the host melee.
        game.unit_mut(host_melee).unwrap().status_effects.push(StatusEffect {
            kind: StatusKind::Taunt,
            turns: 2,
            by_unit: guardian,
        });

        assert_eq!(
            game.attack(HOST, host_melee, guest_melee),
            Err(ActionError::Taunted)
        );
        game.attack(HOST, host_melee, guardian).unwrap();
        // The taunt is removed by its duration, never by attacking.
        assert_eq!(game.unit(host_melee).unwrap().taunted_by(), Some(guardian));

        // Host turn start after one full round: duration 2 -> 1.
        game.end_turn(HOST).unwrap();
        game.end_turn(GUEST).unwrap();
        assert_eq!(game.unit(host_melee).unwrap().taunted_by(), Some(guardian));

        // Second round removes it.
        game.end_turn(HOST).unwrap();
        game.end_turn(GUEST).unwrap();
        assert_eq!(game.unit(host_melee).unwrap().taunted_by(), None);
    }

    #[test]
    fn test_taunt_ability_targets_enemies_only() {
        let mut game = playing_game();
        let host_melee = game.deploy(HOST, UnitKind::Melee, 0, 3).unwrap();
        game.end_turn(HOST).unwrap();
        let guardian = game.deploy(GUEST, UnitKind::Guardian, 0, 4).unwrap();
        let guest_melee = game.deploy(GUEST, UnitKind::Melee, 1, 4).unwrap();

        assert_eq!(
            game.use_ability(GUEST, guardian, guest_melee),
            Err(ActionError::TauntTargetInvalid)
        );

        let energy_before = game.energy_of(GUEST).unwrap();
        game.use_ability(GUEST, guardian, host_melee).unwrap();
        assert_eq!(game.energy_of(GUEST), Some(energy_before - 1));
        assert!(game.unit(guardian).unwrap().has_attacked);

        let effects = &game.unit(host_melee).unwrap().status_effects;
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].kind, StatusKind::Taunt);
        assert_eq!(effects[0].turns, 1);
        assert_eq!(effects[0].by_unit, guardian);

        // With duration 1 the effect is gone at the afflicted owner's next
        // turn-start, which is the guest's end-turn right here.
        game.end_turn(GUEST).unwrap();
        assert!(game.unit(host_melee).unwrap().status_effects.is_empty());
    }

    #[test]
    fn test_heal_requires_injured_ally_and_caps_at_max() {
        let mut game = playing_game();
        let medic = game.deploy(HOST, UnitKind::Medic, 0, 0).unwrap();
        let melee = game.deploy(HOST, UnitKind::Melee, 1, 0).unwrap();
        game.end_turn(HOST).unwrap();
        let guest_melee = game.deploy(GUEST, UnitKind::Melee, 0, 4).unwrap();
        game.end_turn(GUEST).unwrap();

        // Full-health ally is not a valid heal target.
        assert_eq!(
            game.use_ability(HOST, medic, melee),
            Err(ActionError::HealTargetInvalid)
        );
        // Neither is an enemy, hurt or not.
        assert_eq!(
            game.use_ability(HOST, medic, guest_melee),
            Err(ActionError::OutOfRange)
        );

        game.unit_mut(melee).unwrap().health = 50;
        let energy_before = game.energy_of(HOST).unwrap();
        game.use_ability(HOST, medic, melee).unwrap();
        assert_eq!(game.unit(melee).map(|u| u.health), Some(80));
        assert_eq!(game.energy_of(HOST), Some(energy_before - 1));
        assert!(game.unit(medic).unwrap().has_attacked);

        // Next turn, healing 90 -> capped at 100.
        game.end_turn(HOST).unwrap();
        game.end_turn(GUEST).unwrap();
        game.unit_mut(melee).unwrap().health = 90;
        game.use_ability(HOST, medic, melee).unwrap();
        assert_eq!(game.unit(melee).map(|u| u.health), Some(100));
    }

    #[test]
    fn test_heal_rejects_enemy_target_in_range() {
        let mut game = playing_game();
        let medic = game.deploy(HOST, UnitKind::Medic, 0, 3).unwrap();
        game.end_turn(HOST).unwrap();
        let guest_melee = game.deploy(GUEST, UnitKind::Melee, 0, 4).unwrap();
        game.end_turn(GUEST).unwrap();

        game.unit_mut(guest_melee).unwrap().health = 50;
        assert_eq!(
            game.use_ability(HOST, medic, guest_melee),
            Err(ActionError::HealTargetInvalid)
        );
        assert_eq!(game.unit(guest_melee).map(|u| u.health), Some(50));
    }

    #[test]
    fn test_ability_shares_action_slot_with_attack() {
        let mut game = playing_game();
        let medic = game.deploy(HOST, UnitKind::Medic, 0, 0).unwrap();
        let melee = game.deploy(HOST, UnitKind::Melee, 1, 0).unwrap();
        game.unit_mut(melee).unwrap().health = 50;

        game.use_ability(HOST, medic, melee).unwrap();
        assert_eq!(
            game.use_ability(HOST, medic, melee),
            Err(ActionError::AlreadyActed)
        );
    }

    #[test]
    fn test_units_without_active_ability_cannot_use_one() {
        let mut game = playing_game();
        let melee = game.deploy(HOST, UnitKind::Melee, 0, 0).unwrap();
        let other = game.deploy(HOST, UnitKind::Melee, 1, 0).unwrap();
        assert_eq!(
            game.use_ability(HOST, melee, other),
            Err(ActionError::NoActiveAbility)
        );

        let generator = game.deploy(HOST, UnitKind::Generator, 2, 0).unwrap();
        // Range 0 means only itself is reachable, and generate is passive.
        assert_eq!(
            game.use_ability(HOST, generator, generator),
            Err(ActionError::NoActiveAbility)
        );
    }

    #[test]
    fn test_end_turn_resets_only_the_ending_players_units() {
        let mut game = playing_game();
        let host_melee = game.deploy(HOST, UnitKind::Melee, 0, 3).unwrap();
        game.move_unit(HOST, host_melee, 1, 3).unwrap();
        game.end_turn(HOST).unwrap();

        assert_eq!(game.current_turn(), GUEST);
        assert_eq!(game.turn_number(), 1);
        assert!(!game.unit(host_melee).unwrap().has_moved);

        let guest_melee = game.deploy(GUEST, UnitKind::Melee, 1, 4).unwrap();
        game.attack(GUEST, guest_melee, host_melee).unwrap();
        assert!(game.unit(guest_melee).unwrap().has_attacked);
        game.end_turn(GUEST).unwrap();
        assert!(!game.unit(guest_melee).unwrap().has_attacked);
    }

    #[test]
    fn test_end_turn_out_of_turn_rejected() {
        let mut game = playing_game();
        assert_eq!(game.end_turn(GUEST), Err(ActionError::NotYourTurn));

        let mut waiting = Game::new("w".to_string(), HOST);
        waiting.add_player(HOST).unwrap();
        assert_eq!(waiting.end_turn(HOST), Err(ActionError::NotPlaying));
    }

    #[test]
    fn test_generator_yields_then_expires_on_tenth_turn() {
        let mut game = playing_game();
        let generator = game.deploy(HOST, UnitKind::Generator, 0, 0).unwrap();
        assert_eq!(game.energy_of(HOST), Some(6));
        game.end_turn(HOST).unwrap();
        game.deploy(GUEST, UnitKind::Melee, 0, 7).unwrap();
        game.end_turn(GUEST).unwrap();

        // First host turn-start with the generator: +2 turn grant +1 yield.
        assert_eq!(game.energy_of(HOST), Some(9));
        assert_eq!(game.unit(generator).unwrap().turns_active, 1);

        for _ in 0..8 {
            game.end_turn(HOST).unwrap();
            game.end_turn(GUEST).unwrap();
        }
        assert_eq!(game.unit(generator).unwrap().turns_active, 9);
        assert_eq!(game.energy_of(HOST), Some(9 + 8 * 3));

        // Tenth owner turn-start: final yield, then self-destruct.
        game.end_turn(HOST).unwrap();
        game.end_turn(GUEST).unwrap();
        assert!(game.unit(generator).is_none());
        assert_eq!(game.board().occupant(0, 0), None);
        assert_eq!(game.energy_of(HOST), Some(9 + 9 * 3));
        assert!(game.occupancy_consistent());
        assert_eq!(game.phase(), Phase::Playing);

        // The expiry left the host without units; the guest wins at the
        // next evaluation.
        game.end_turn(HOST).unwrap();
        assert_eq!(game.phase(), Phase::Finished);
        assert_eq!(game.winner(), Some(GUEST));
    }

    #[test]
    fn test_win_condition_waits_out_the_grace_period() {
        let mut game = playing_game();
        game.deploy(HOST, UnitKind::Melee, 0, 0).unwrap();

        // The guest never deploys, yet no winner before four end-turns.
        game.end_turn(HOST).unwrap();
        assert_eq!(game.phase(), Phase::Playing);
        game.end_turn(GUEST).unwrap();
        game.end_turn(HOST).unwrap();
        assert_eq!(game.phase(), Phase::Playing);
        assert_eq!(game.winner(), None);

        game.end_turn(GUEST).unwrap();
        assert_eq!(game.turn_number(), 4);
        assert_eq!(game.phase(), Phase::Finished);
        assert_eq!(game.winner(), Some(HOST));
    }

    #[test]
    fn test_mutual_elimination_is_a_draw() {
        let mut game = playing_game();
        for _ in 0..2 {
            game.end_turn(HOST).unwrap();
            game.end_turn(GUEST).unwrap();
        }
        assert_eq!(game.turn_number(), 4);
        assert_eq!(game.phase(), Phase::Finished);
        assert_eq!(game.winner(), None);

        // Nothing moves once the game is over.
        assert_eq!(game.end_turn(HOST), Err(ActionError::NotPlaying));
        assert_eq!(
            game.deploy(HOST, UnitKind::Melee, 0, 0),
            Err(ActionError::NotPlaying)
        );
    }

    #[test]
    fn test_leaving_a_running_match_forfeits_it() {
        let mut game = playing_game();
        let id = game.deploy(HOST, UnitKind::Melee, 0, 0).unwrap();
        game.remove_player(HOST);

        assert_eq!(game.player_count(), 1);
        assert!(game.unit(id).is_none());
        assert_eq!(game.board().occupant(0, 0), None);
        assert_eq!(game.phase(), Phase::Finished);
        assert_eq!(game.winner(), Some(GUEST));
        assert!(game.occupancy_consistent());
    }
}
