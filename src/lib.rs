//! Number Blocks - a falling number blocks game for little ones
//!
//! Core modules:
//! - `sim`: Deterministic board engine (falling piece, merges, gravity, levels)
//! - `tuning`: Data-driven level and combination tables
//! - `settings`: Sound/music preferences
//! - `presentation`: Translation of game events into sound/speech/banner cues
//! - `playback`: Paced replay of events onto the board the player sees
//! - `speech`: Voice selection and speech styles
//! - `audio`: Web Audio sound effects and background music (player is wasm32 only)

pub mod audio;
pub mod playback;
pub mod presentation;
pub mod settings;
pub mod sim;
pub mod speech;
pub mod tuning;

pub use playback::{BoardView, EventPacer, PhraseQueue};
pub use presentation::{Cue, SoundEffect, cues_for};
pub use settings::Settings;
pub use tuning::{ComboRule, ComboTable, LevelDef, Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Board dimensions
    pub const COLS: usize = 8;
    pub const ROWS: usize = 12;

    /// Column where every new piece appears
    pub const SPAWN_COL: usize = COLS / 2;

    /// Highest tile value; merges producing more than this never fire
    pub const MAX_TILE: u8 = 10;

    /// Fall interval used when a level definition is missing (ms)
    pub const DEFAULT_FALL_MS: u32 = 1500;

    /// Maximum fall steps per `tick` call (a suspended tab must not
    /// slam the piece to the floor when it wakes up)
    pub const MAX_STEPS_PER_ADVANCE: u32 = 4;
}

/// Spoken name of a tile value
pub fn number_name(value: u8) -> Option<&'static str> {
    const NAMES: [&str; 10] = [
        "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten",
    ];
    NAMES.get(usize::from(value).checked_sub(1)?).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_names() {
        assert_eq!(number_name(1), Some("One"));
        assert_eq!(number_name(10), Some("Ten"));
        assert_eq!(number_name(0), None);
        assert_eq!(number_name(11), None);
    }
}
