//! Game state and core simulation types
//!
//! Everything a session needs lives in `GameState`; there are no globals.
//! The presentation layer only reads state and drains `GameEvent`s.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::grid::{Board, Cell};
use crate::consts::DEFAULT_FALL_MS;
use crate::tuning::{LevelDef, Tuning};

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GamePhase {
    /// Start screen, no session running
    #[default]
    Idle,
    /// Piece falling, input accepted
    Playing,
    /// Ticks and input ignored until resumed
    Paused,
    /// Spawn cell was blocked
    GameOver,
}

/// The piece the player is steering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallingPiece {
    pub value: u8,
    pub cell: Cell,
}

/// Notifications for the presentation layer, in the order things happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    SessionStarted,
    /// A new piece appeared at the top; `next` is the preview value
    PieceSpawned { value: u8, next: u8 },
    /// Player shifted the piece sideways
    PieceMoved { row: usize, col: usize },
    /// Piece dropped one row on a tick
    PieceFell { row: usize, col: usize },
    PieceLanded { row: usize, col: usize, value: u8 },
    MergeStarted { landed: Cell, neighbor: Cell, result: u8 },
    MergeCompleted {
        target: Cell,
        value: u8,
        points: u32,
        celebration: String,
        score: u64,
    },
    /// Gravity moved a tile down after a merge
    TileFell {
        col: usize,
        from_row: usize,
        to_row: usize,
        value: u8,
    },
    LevelChanged { level: u32, fall_ms: u32 },
    Paused,
    Resumed,
    GameOver { final_score: u64 },
    SessionExited,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Level and combination tables (read-only)
    pub tuning: Tuning,
    pub board: Board,
    /// None between landing and the next spawn, and outside a session
    pub piece: Option<FallingPiece>,
    /// Value of the piece after the current one
    pub next_value: Option<u8>,
    pub score: u64,
    pub level: u32,
    /// Current fall interval
    pub fall_ms: u32,
    pub phase: GamePhase,
    /// Time banked toward the next fall step
    pub(crate) fall_accum_ms: u32,
    pub(crate) events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle game with the given tables and seed
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let fall_ms = tuning.level(1).map_or(DEFAULT_FALL_MS, |def| def.fall_ms);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            tuning,
            board: Board::new(),
            piece: None,
            next_value: None,
            score: 0,
            level: 1,
            fall_ms,
            phase: GamePhase::Idle,
            fall_accum_ms: 0,
            events: Vec::new(),
        }
    }

    /// Definition of the current level (first level if undefined)
    pub fn level_def(&self) -> &LevelDef {
        self.tuning.level_or_first(self.level)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Take all notifications emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        log::debug!("{:?}", event);
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(Tuning::default(), 42);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.level, 1);
        assert_eq!(state.score, 0);
        assert_eq!(state.fall_ms, 1500);
        assert!(state.piece.is_none());
        assert_eq!(state.board.tile_count(), 0);
    }

    #[test]
    fn test_drain_events_empties_queue() {
        let mut state = GameState::new(Tuning::default(), 42);
        state.emit(GameEvent::Paused);
        state.emit(GameEvent::Resumed);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::Paused, GameEvent::Resumed]
        );
        assert!(state.drain_events().is_empty());
    }
}
