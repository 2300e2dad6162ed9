//! Core module - pure game logic with no external dependencies
//!
//! This module contains the rules engine: grid occupancy, the unit catalog,
//! and the per-match state machine. It has zero dependencies on networking
//! or I/O; snapshots and transport live under `server`.

pub mod board;
pub mod catalog;
pub mod game;
pub mod unit;

// Re-export commonly used types
pub use board::Board;
pub use catalog::{spec_for, UnitSpec};
pub use game::Game;
pub use unit::{StatusEffect, Unit};
