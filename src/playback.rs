//! Watchable replay of engine events
//!
//! A landing resolves its whole merge chain at once. `EventPacer` spreads
//! that burst out over time, `BoardView` rebuilds what the player should
//! currently see from the released events, and `PhraseQueue` holds phrases
//! that are spoken a little later.

use std::collections::VecDeque;

use crate::consts::SPAWN_COL;
use crate::number_name;
use crate::sim::{Board, Cell, FallingPiece, GameEvent};

/// Tiles glow as "combining" this long before the result appears
pub const MERGE_MS: u32 = 400;
/// Settle time after a merge before the next check or spawn
pub const CHAIN_MS: u32 = 500;
/// Spawn hold after a level-up, long enough to hear the level phrase
pub const LEVEL_UP_HOLD_MS: u32 = 1800;

/// Releases events at the pace a player can follow
#[derive(Debug, Default)]
pub struct EventPacer {
    queue: VecDeque<(f64, GameEvent)>,
    /// Release time of the newest queued event
    last_due: f64,
    previous: Option<GameEvent>,
    level_up_held: bool,
}

impl EventPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pause inserted before `event`, given what came before it
    fn pause_before(&self, event: &GameEvent) -> u32 {
        let after_merge = matches!(
            self.previous,
            Some(
                GameEvent::MergeCompleted { .. }
                    | GameEvent::TileFell { .. }
                    | GameEvent::LevelChanged { .. }
            )
        );
        match event {
            GameEvent::MergeCompleted { .. } => MERGE_MS,
            GameEvent::MergeStarted { .. } if after_merge => CHAIN_MS,
            GameEvent::PieceSpawned { .. } | GameEvent::GameOver { .. } if self.level_up_held => {
                LEVEL_UP_HOLD_MS
            }
            GameEvent::PieceSpawned { .. } | GameEvent::GameOver { .. } if after_merge => CHAIN_MS,
            _ => 0,
        }
    }

    /// Queue events emitted at `now_ms`
    pub fn push(&mut self, now_ms: f64, events: impl IntoIterator<Item = GameEvent>) {
        for event in events {
            let due = self.last_due.max(now_ms) + f64::from(self.pause_before(&event));
            self.last_due = due;

            match event {
                GameEvent::LevelChanged { .. } => self.level_up_held = true,
                GameEvent::PieceSpawned { .. } | GameEvent::GameOver { .. } => {
                    self.level_up_held = false
                }
                _ => {}
            }
            self.previous = Some(event.clone());
            self.queue.push_back((due, event));
        }
    }

    /// Events whose time has come, oldest first
    pub fn release(&mut self, now_ms: f64) -> Vec<GameEvent> {
        let due = self.queue.iter().take_while(|(at, _)| *at <= now_ms).count();
        self.queue.drain(..due).map(|(_, event)| event).collect()
    }

    /// Nothing left to show
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drop everything not yet shown
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What the board looks like as of the last released event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub board: Board,
    pub piece: Option<FallingPiece>,
    pub next_value: Option<u8>,
    pub score: u64,
    pub level: u32,
    /// Tiles shown as combining
    pub combining: Vec<Cell>,
    /// Emoji floating over the newest merged tile
    pub celebration: Option<(Cell, String)>,
}

impl Default for BoardView {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardView {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            piece: None,
            next_value: None,
            score: 0,
            level: 1,
            combining: Vec::new(),
            celebration: None,
        }
    }

    /// Tile shown at `cell`, the falling piece included
    pub fn value_at(&self, cell: Cell) -> u8 {
        match self.piece {
            Some(piece) if piece.cell == cell => piece.value,
            _ => self.board.get(cell).unwrap_or(0),
        }
    }

    pub fn apply(&mut self, event: &GameEvent) {
        match event {
            GameEvent::SessionStarted | GameEvent::SessionExited => *self = Self::new(),
            GameEvent::PieceSpawned { value, next } => {
                self.piece = Some(FallingPiece {
                    value: *value,
                    cell: Cell::new(0, SPAWN_COL),
                });
                self.next_value = Some(*next);
            }
            GameEvent::PieceMoved { row, col } | GameEvent::PieceFell { row, col } => {
                if let Some(piece) = &mut self.piece {
                    piece.cell = Cell::new(*row, *col);
                }
            }
            GameEvent::PieceLanded { row, col, value } => {
                self.piece = None;
                self.board.set(Cell::new(*row, *col), *value);
            }
            GameEvent::MergeStarted {
                landed, neighbor, ..
            } => {
                self.combining = vec![*landed, *neighbor];
                self.celebration = None;
            }
            GameEvent::MergeCompleted {
                target,
                value,
                celebration,
                score,
                ..
            } => {
                for cell in self.combining.drain(..) {
                    self.board.set(cell, 0);
                }
                self.board.set(*target, *value);
                self.score = *score;
                self.celebration = (!celebration.is_empty()).then(|| (*target, celebration.clone()));
            }
            GameEvent::TileFell {
                col,
                from_row,
                to_row,
                value,
            } => {
                self.board.set(Cell::new(*from_row, *col), 0);
                self.board.set(Cell::new(*to_row, *col), *value);
            }
            GameEvent::LevelChanged { level, .. } => self.level = *level,
            GameEvent::GameOver { .. } => self.piece = None,
            GameEvent::Paused | GameEvent::Resumed => {}
        }
    }
}

/// Phrases waiting to be spoken, ordered by due time
#[derive(Debug, Default)]
pub struct PhraseQueue {
    pending: Vec<(f64, String)>,
}

impl PhraseQueue {
    pub fn push(&mut self, due_ms: f64, text: String) {
        let index = self.pending.partition_point(|(at, _)| *at <= due_ms);
        self.pending.insert(index, (due_ms, text));
    }

    /// The phrase to speak now, if any. Speaking cuts off the previous
    /// utterance, so when several are due at once only the latest is kept.
    pub fn take_due(&mut self, now_ms: f64) -> Option<String> {
        let due = self.pending.partition_point(|(at, _)| *at <= now_ms);
        self.pending.drain(..due).last().map(|(_, text)| text)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Markup for a tile: the digit on a block colored by value. Empty for a
/// vacant cell.
pub fn tile_html(value: u8, active: bool, combining: bool) -> String {
    let Some(name) = number_name(value) else {
        return String::new();
    };
    let mut class = String::from("numberblock");
    if active {
        class.push_str(" active");
    }
    if combining {
        class.push_str(" combining");
    }
    format!(
        r#"<div class="{}" data-value="{}" aria-label="{}"><span>{}</span></div>"#,
        class, value, name, value
    )
}

/// Floating emoji over a freshly merged tile
pub fn celebration_html(emoji: &str) -> String {
    format!(r#"<div class="celebration">{}</div>"#, emoji)
}
