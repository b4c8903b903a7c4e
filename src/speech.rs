//! Spoken numbers and phrases
//!
//! Voice choice and utterance styles are plain data so they can be checked
//! natively. `Speaker` drives the browser's speech synthesis on wasm32.

use crate::number_name;

/// Friendly voices, best first (matched as substrings of the voice name)
pub const PREFERRED_VOICES: [&str; 6] = [
    "Samantha",
    "Karen",
    "Moira",
    "Google UK English Female",
    "Microsoft Zira",
    "Google US English",
];

/// What we need to know about an installed voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: String,
    pub lang: String,
}

/// Index of the voice to use: a preferred voice, else any English voice,
/// else the first one
pub fn choose_voice(voices: &[VoiceInfo]) -> Option<usize> {
    PREFERRED_VOICES
        .iter()
        .find_map(|preferred| voices.iter().position(|v| v.name.contains(preferred)))
        .or_else(|| voices.iter().position(|v| v.lang.starts_with("en")))
        .or_else(|| (!voices.is_empty()).then_some(0))
}

/// Rate/pitch/volume for an utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechStyle {
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl SpeechStyle {
    /// Newly spawned number: a bit slow for clarity
    pub const CALM: Self = Self {
        rate: 0.85,
        pitch: 1.2,
        volume: 1.0,
    };
    /// Freshly merged number
    pub const EXCITED: Self = Self {
        rate: 0.9,
        pitch: 1.4,
        volume: 1.0,
    };
    pub const PHRASE: Self = Self {
        rate: 0.9,
        pitch: 1.3,
        volume: 1.0,
    };
}

/// Text and style for announcing a tile value
pub fn number_utterance(value: u8, excited: bool) -> Option<(String, SpeechStyle)> {
    let name = number_name(value)?;
    Some(if excited {
        (format!("{}!", name), SpeechStyle::EXCITED)
    } else {
        (name.to_string(), SpeechStyle::CALM)
    })
}

#[cfg(target_arch = "wasm32")]
pub use web::Speaker;

#[cfg(target_arch = "wasm32")]
mod web {
    use wasm_bindgen::JsCast;
    use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance, SpeechSynthesisVoice};

    use super::{SpeechStyle, VoiceInfo, choose_voice};

    /// Browser speech synthesis wrapper
    pub struct Speaker {
        synth: Option<SpeechSynthesis>,
        voice: Option<SpeechSynthesisVoice>,
    }

    impl Default for Speaker {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Speaker {
        pub fn new() -> Self {
            let synth = web_sys::window().and_then(|w| w.speech_synthesis().ok());
            if synth.is_none() {
                log::warn!("Speech synthesis unavailable - numbers will not be spoken");
            }
            Self { synth, voice: None }
        }

        /// Voices load asynchronously; call until this returns true
        pub fn refresh_voice(&mut self) -> bool {
            if self.voice.is_some() {
                return true;
            }
            let Some(synth) = &self.synth else {
                return false;
            };

            let voices: Vec<SpeechSynthesisVoice> = synth
                .get_voices()
                .iter()
                .filter_map(|v| v.dyn_into().ok())
                .collect();
            let infos: Vec<VoiceInfo> = voices
                .iter()
                .map(|v| VoiceInfo {
                    name: v.name(),
                    lang: v.lang(),
                })
                .collect();

            if let Some(index) = choose_voice(&infos) {
                log::info!("Selected voice: {}", infos[index].name);
                self.voice = Some(voices[index].clone());
            }
            self.voice.is_some()
        }

        /// Say `text`, cutting off anything still being spoken
        pub fn speak(&self, text: &str, style: SpeechStyle) {
            let Some(synth) = &self.synth else { return };
            synth.cancel();

            let Ok(utterance) = SpeechSynthesisUtterance::new_with_text(text) else {
                return;
            };
            utterance.set_voice(self.voice.as_ref());
            utterance.set_rate(style.rate);
            utterance.set_pitch(style.pitch);
            utterance.set_volume(style.volume);
            synth.speak(&utterance);
        }

        pub fn cancel(&self) {
            if let Some(synth) = &self.synth {
                synth.cancel();
            }
        }

        pub fn is_speaking(&self) -> bool {
            self.synth.as_ref().is_some_and(|s| s.speaking())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(name: &str, lang: &str) -> VoiceInfo {
        VoiceInfo {
            name: name.to_string(),
            lang: lang.to_string(),
        }
    }

    #[test]
    fn test_preferred_voice_order() {
        let voices = vec![
            voice("Google US English", "en-US"),
            voice("Karen", "en-AU"),
            voice("Thomas", "fr-FR"),
        ];
        // Karen ranks above Google US English
        assert_eq!(choose_voice(&voices), Some(1));
    }

    #[test]
    fn test_fallback_to_english_then_first() {
        let voices = vec![voice("Thomas", "fr-FR"), voice("Daniel", "en-GB")];
        assert_eq!(choose_voice(&voices), Some(1));

        let voices = vec![voice("Thomas", "fr-FR"), voice("Anna", "de-DE")];
        assert_eq!(choose_voice(&voices), Some(0));

        assert_eq!(choose_voice(&[]), None);
    }

    #[test]
    fn test_number_utterance() {
        let (text, style) = number_utterance(3, false).unwrap();
        assert_eq!(text, "Three");
        assert_eq!(style, SpeechStyle::CALM);

        let (text, style) = number_utterance(10, true).unwrap();
        assert_eq!(text, "Ten!");
        assert_eq!(style, SpeechStyle::EXCITED);

        assert!(number_utterance(0, true).is_none());
    }
}
