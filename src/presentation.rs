//! Game events -> presentation cues
//!
//! The core never touches audio, speech, or the DOM. Each `GameEvent` is
//! turned into a list of cues here, and the browser adapter plays them.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// How long a merge celebration stays on screen
pub const CELEBRATION_MS: u32 = 1000;
/// How long the level-up banner stays on screen
pub const LEVEL_BANNER_MS: u32 = 2000;
/// Delay before the welcome phrase, after the first number is announced
pub const WELCOME_DELAY_MS: u32 = 300;
/// Delay before the level-up phrase, after the merged number is announced
pub const LEVEL_PHRASE_DELAY_MS: u32 = 200;
/// Delay before the final-score phrase, after the game-over sound
pub const GAME_OVER_PHRASE_DELAY_MS: u32 = 500;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// New piece appears
    Spawn,
    /// Piece shifted sideways
    Move,
    /// Piece settles into the board
    Land,
    /// Two tiles start combining
    Combine,
    LevelUp,
    GameOver,
}

/// One thing the presentation layer should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Sound(SoundEffect),
    /// Say a number's name
    SayNumber { value: u8, excited: bool },
    /// Say a short phrase once `delay_ms` has passed
    SayAfter { text: String, delay_ms: u32 },
    /// Flash text in the combo banner
    Banner { text: String, duration_ms: u32 },
    StartMusic,
    StopMusic,
    /// Cut off speech in progress
    Silence,
}

/// Cues for one event, with muted channels filtered out
pub fn cues_for(event: &GameEvent, settings: &Settings) -> Vec<Cue> {
    let mut cues = match event {
        GameEvent::SessionStarted => vec![
            Cue::StartMusic,
            Cue::SayAfter {
                text: "Let's count!".to_string(),
                delay_ms: WELCOME_DELAY_MS,
            },
        ],
        GameEvent::PieceSpawned { value, .. } => vec![
            Cue::Sound(SoundEffect::Spawn),
            Cue::SayNumber {
                value: *value,
                excited: false,
            },
        ],
        GameEvent::PieceMoved { .. } => vec![Cue::Sound(SoundEffect::Move)],
        GameEvent::PieceLanded { .. } => vec![Cue::Sound(SoundEffect::Land)],
        GameEvent::MergeStarted { .. } => vec![Cue::Sound(SoundEffect::Combine)],
        GameEvent::MergeCompleted {
            value, celebration, ..
        } => {
            let mut cues = Vec::with_capacity(2);
            if !celebration.is_empty() {
                cues.push(Cue::Banner {
                    text: celebration.clone(),
                    duration_ms: CELEBRATION_MS,
                });
            }
            cues.push(Cue::SayNumber {
                value: *value,
                excited: true,
            });
            cues
        }
        GameEvent::LevelChanged { level, .. } => vec![
            Cue::Sound(SoundEffect::LevelUp),
            Cue::Banner {
                text: format!("🎉 Level {}! 🎉", level),
                duration_ms: LEVEL_BANNER_MS,
            },
            Cue::SayAfter {
                text: format!("Level {}! Amazing!", level),
                delay_ms: LEVEL_PHRASE_DELAY_MS,
            },
        ],
        GameEvent::GameOver { final_score } => vec![
            Cue::StopMusic,
            Cue::Sound(SoundEffect::GameOver),
            Cue::SayAfter {
                text: format!("Great job! You scored {}!", final_score),
                delay_ms: GAME_OVER_PHRASE_DELAY_MS,
            },
        ],
        GameEvent::Paused | GameEvent::SessionExited => vec![Cue::StopMusic, Cue::Silence],
        GameEvent::Resumed => vec![Cue::StartMusic],
        GameEvent::PieceFell { .. } | GameEvent::TileFell { .. } => Vec::new(),
    };

    cues.retain(|cue| match cue {
        Cue::Sound(_) | Cue::SayNumber { .. } | Cue::SayAfter { .. } => {
            settings.sound_enabled
        }
        Cue::StartMusic => settings.music_enabled,
        Cue::Banner { .. } | Cue::StopMusic | Cue::Silence => true,
    });
    cues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Cell;

    fn merge_completed(celebration: &str) -> GameEvent {
        GameEvent::MergeCompleted {
            target: Cell::new(11, 3),
            value: 4,
            points: 20,
            celebration: celebration.to_string(),
            score: 20,
        }
    }

    #[test]
    fn test_spawn_says_number_calmly() {
        let cues = cues_for(
            &GameEvent::PieceSpawned { value: 3, next: 1 },
            &Settings::default(),
        );
        assert_eq!(
            cues,
            vec![
                Cue::Sound(SoundEffect::Spawn),
                Cue::SayNumber {
                    value: 3,
                    excited: false
                }
            ]
        );
    }

    #[test]
    fn test_session_start_welcome_is_delayed() {
        let cues = cues_for(&GameEvent::SessionStarted, &Settings::default());
        assert_eq!(cues[0], Cue::StartMusic);
        assert_eq!(
            cues[1],
            Cue::SayAfter {
                text: "Let's count!".to_string(),
                delay_ms: WELCOME_DELAY_MS
            }
        );
    }

    #[test]
    fn test_merge_celebrates() {
        let cues = cues_for(&merge_completed("🌟"), &Settings::default());
        assert_eq!(
            cues,
            vec![
                Cue::Banner {
                    text: "🌟".to_string(),
                    duration_ms: CELEBRATION_MS
                },
                Cue::SayNumber {
                    value: 4,
                    excited: true
                }
            ]
        );

        // No emoji, no banner
        let cues = cues_for(&merge_completed(""), &Settings::default());
        assert_eq!(cues.len(), 1);
    }

    #[test]
    fn test_level_up_and_game_over_phrases() {
        let cues = cues_for(
            &GameEvent::LevelChanged {
                level: 3,
                fall_ms: 1100,
            },
            &Settings::default(),
        );
        assert!(cues.contains(&Cue::SayAfter {
            text: "Level 3! Amazing!".to_string(),
            delay_ms: LEVEL_PHRASE_DELAY_MS
        }));
        assert!(cues.contains(&Cue::Sound(SoundEffect::LevelUp)));

        let cues = cues_for(&GameEvent::GameOver { final_score: 85 }, &Settings::default());
        assert_eq!(cues[0], Cue::StopMusic);
        assert!(cues.contains(&Cue::SayAfter {
            text: "Great job! You scored 85!".to_string(),
            delay_ms: GAME_OVER_PHRASE_DELAY_MS
        }));
    }

    #[test]
    fn test_muted_sound_keeps_visuals() {
        let settings = Settings {
            sound_enabled: false,
            ..Default::default()
        };
        let cues = cues_for(&merge_completed("⭐"), &settings);
        assert_eq!(
            cues,
            vec![Cue::Banner {
                text: "⭐".to_string(),
                duration_ms: CELEBRATION_MS
            }]
        );
        assert!(cues_for(&GameEvent::PieceMoved { row: 0, col: 3 }, &settings).is_empty());
    }

    #[test]
    fn test_music_toggle() {
        let settings = Settings {
            music_enabled: false,
            ..Default::default()
        };
        assert!(cues_for(&GameEvent::Resumed, &settings).is_empty());
        // Stopping is always allowed
        assert_eq!(
            cues_for(&GameEvent::Paused, &settings),
            vec![Cue::StopMusic, Cue::Silence]
        );
    }
}
