//! Deterministic board engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only enters through `tick(elapsed_ms)`
//! - Seeded RNG only
//! - Effects of a landing resolve synchronously, in a fixed order
//! - No rendering, audio, or platform dependencies

pub mod combo;
pub mod grid;
pub mod spawn;
pub mod state;
pub mod tick;

pub use combo::{Merge, NEIGHBOR_ORDER, apply_merge, find_merge};
pub use grid::{Board, Cell, TileFall};
pub use spawn::{pick_value, spawn_weight};
pub use state::{FallingPiece, GameEvent, GamePhase, GameState};
pub use tick::{Command, apply_command, drop_fast, step, tick};
