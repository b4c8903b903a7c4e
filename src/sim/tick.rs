//! Session commands and the fall tick
//!
//! A landing runs the whole effect chain synchronously, in a fixed order:
//! land, merge, level check, gravity, re-check from the merged tile (repeat),
//! then spawn the next piece. The presentation can pace the resulting events
//! however it likes; the state is already final.

use super::combo::{apply_merge, find_merge};
use super::grid::Cell;
use super::spawn::pick_value;
use super::state::{FallingPiece, GameEvent, GamePhase, GameState};
use crate::consts::{MAX_STEPS_PER_ADVANCE, SPAWN_COL};

/// Inbound commands from the input layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start (or restart) a session
    Start,
    MoveLeft,
    MoveRight,
    /// Drop the piece as far as it goes and land it
    DropFast,
    Pause,
    Resume,
    /// Leave the session and go back to the start screen
    Exit,
}

/// Apply one command; commands that don't fit the current phase do nothing
pub fn apply_command(state: &mut GameState, command: Command) {
    match command {
        Command::Start => start_session(state),
        Command::MoveLeft => shift_piece(state, -1),
        Command::MoveRight => shift_piece(state, 1),
        Command::DropFast => drop_fast(state),
        Command::Pause => {
            if state.phase == GamePhase::Playing {
                state.phase = GamePhase::Paused;
                state.emit(GameEvent::Paused);
            }
        }
        Command::Resume => {
            if state.phase == GamePhase::Paused {
                state.phase = GamePhase::Playing;
                state.emit(GameEvent::Resumed);
            }
        }
        Command::Exit => exit_session(state),
    }
}

/// Feed `elapsed_ms` of wall time to the fall timer.
///
/// One fall step fires per full fall interval. Time spent outside `Playing`
/// is dropped, not queued. Returns the number of steps taken.
pub fn tick(state: &mut GameState, elapsed_ms: u32) -> u32 {
    if !state.is_playing() {
        return 0;
    }

    state.fall_accum_ms = state.fall_accum_ms.saturating_add(elapsed_ms);

    let mut steps = 0;
    while state.is_playing() && steps < MAX_STEPS_PER_ADVANCE {
        // Re-read every step: a level-up changes the interval
        let interval = state.fall_ms.max(1);
        if state.fall_accum_ms < interval {
            break;
        }
        state.fall_accum_ms -= interval;
        step(state);
        steps += 1;
    }

    if !state.is_playing() {
        state.fall_accum_ms = 0;
    } else {
        // Drop whatever the step cap left over
        state.fall_accum_ms %= state.fall_ms.max(1);
    }

    steps
}

/// One fall step: move down a row, or land when blocked
pub fn step(state: &mut GameState) {
    if !state.is_playing() {
        return;
    }
    let Some(piece) = state.piece else {
        return;
    };

    match piece.cell.offset(1, 0).filter(|&below| state.board.is_vacant(below)) {
        Some(below) => {
            state.piece = Some(FallingPiece { cell: below, ..piece });
            state.emit(GameEvent::PieceFell {
                row: below.row,
                col: below.col,
            });
        }
        None => land_piece(state),
    }
}

/// Slide the piece down until blocked, then land it immediately
pub fn drop_fast(state: &mut GameState) {
    if !state.is_playing() {
        return;
    }
    let Some(mut piece) = state.piece else {
        return;
    };

    while let Some(below) = piece.cell.offset(1, 0).filter(|&c| state.board.is_vacant(c)) {
        piece.cell = below;
    }
    state.piece = Some(piece);
    land_piece(state);
}

fn shift_piece(state: &mut GameState, d_col: isize) {
    if !state.is_playing() {
        return;
    }
    let Some(piece) = state.piece else {
        return;
    };

    let Some(target) = piece.cell.offset(0, d_col).filter(|&c| state.board.is_vacant(c)) else {
        return;
    };

    state.piece = Some(FallingPiece { cell: target, ..piece });
    state.emit(GameEvent::PieceMoved {
        row: target.row,
        col: target.col,
    });
}

fn start_session(state: &mut GameState) {
    state.board.clear();
    state.piece = None;
    state.next_value = None;
    state.score = 0;
    state.level = 1;
    state.fall_ms = state.level_def().fall_ms;
    state.fall_accum_ms = 0;
    state.phase = GamePhase::Playing;

    log::info!("Session started (seed {})", state.seed);
    state.emit(GameEvent::SessionStarted);
    spawn_piece(state);
}

fn exit_session(state: &mut GameState) {
    if state.phase == GamePhase::Idle {
        return;
    }
    state.board.clear();
    state.piece = None;
    state.next_value = None;
    state.fall_accum_ms = 0;
    state.phase = GamePhase::Idle;

    log::info!("Session exited with score {}", state.score);
    state.emit(GameEvent::SessionExited);
}

/// Draw the next value for the current level
fn draw_value(state: &mut GameState) -> u8 {
    let max_number = state.level_def().max_number;
    pick_value(&mut state.rng, max_number)
}

/// Bring in the queued piece at the top center; a blocked spawn ends the game
fn spawn_piece(state: &mut GameState) {
    let value = match state.next_value.take() {
        Some(value) => value,
        None => draw_value(state),
    };
    let next = draw_value(state);
    state.next_value = Some(next);

    let cell = Cell::new(0, SPAWN_COL);
    if !state.board.is_vacant(cell) {
        state.phase = GamePhase::GameOver;
        state.piece = None;
        state.fall_accum_ms = 0;
        log::info!("Game over, final score {}", state.score);
        state.emit(GameEvent::GameOver {
            final_score: state.score,
        });
        return;
    }

    state.piece = Some(FallingPiece { value, cell });
    state.emit(GameEvent::PieceSpawned { value, next });
}

/// Fix the piece into the board and run the effect chain
fn land_piece(state: &mut GameState) {
    let Some(piece) = state.piece.take() else {
        return;
    };

    state.board.set(piece.cell, piece.value);
    state.emit(GameEvent::PieceLanded {
        row: piece.cell.row,
        col: piece.cell.col,
        value: piece.value,
    });

    resolve_merges(state, piece.cell);

    if state.is_playing() {
        spawn_piece(state);
    }
}

/// Merge from `from`, then keep checking from wherever the result landed
fn resolve_merges(state: &mut GameState, from: Cell) {
    let mut at = from;

    // Each merge removes a tile, so the chain is finite
    while let Some(merge) = find_merge(&state.board, state.tuning.combos(), at) {
        state.emit(GameEvent::MergeStarted {
            landed: merge.source,
            neighbor: merge.neighbor,
            result: merge.rule.result,
        });

        apply_merge(&mut state.board, &merge);
        state.score += u64::from(merge.rule.points);

        state.emit(GameEvent::MergeCompleted {
            target: merge.target,
            value: merge.rule.result,
            points: merge.rule.points,
            celebration: merge.rule.celebration.clone(),
            score: state.score,
        });

        check_level_up(state);

        for fall in state.board.apply_gravity() {
            state.emit(GameEvent::TileFell {
                col: fall.col,
                from_row: fall.from_row,
                to_row: fall.to_row,
                value: fall.value,
            });
        }

        at = merge.target;
    }
}

/// Move up one level when the target is met and another level exists
fn check_level_up(state: &mut GameState) {
    let Some(target) = state.tuning.level(state.level).map(|def| def.target_score) else {
        return;
    };
    if state.score < target {
        return;
    }
    let Some(fall_ms) = state.tuning.level(state.level + 1).map(|def| def.fall_ms) else {
        return;
    };

    state.level += 1;
    state.fall_ms = fall_ms;
    state.fall_accum_ms = 0;

    log::info!("Level {} reached (fall every {}ms)", state.level, fall_ms);
    state.emit(GameEvent::LevelChanged {
        level: state.level,
        fall_ms,
    });
}
