//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects and a looping pentatonic tune -
//! no external files needed! Note timing is plain data; `AudioManager`
//! plays it on wasm32.

/// Melody as (frequency Hz, length in beat units), C major pentatonic
pub const MELODY: [(f32, f64); 17] = [
    (261.63, 0.25), // C4
    (329.63, 0.25), // E4
    (392.00, 0.25), // G4
    (440.00, 0.25), // A4
    (392.00, 0.25), // G4
    (329.63, 0.25), // E4
    (261.63, 0.5),  // C4
    (293.66, 0.25), // D4
    (329.63, 0.25), // E4
    (392.00, 0.25), // G4
    (440.00, 0.25), // A4
    (523.25, 0.5),  // C5
    (440.00, 0.25), // A4
    (392.00, 0.25), // G4
    (329.63, 0.25), // E4
    (293.66, 0.25), // D4
    (261.63, 0.5),  // C4
];

/// Bass line: C3 G2 A2 E2
pub const BASS: [f32; 4] = [130.81, 98.00, 110.00, 82.41];

/// Seconds between melody note onsets
pub const NOTE_SPACING: f64 = 0.18;
/// Seconds per beat unit
pub const TEMPO: f64 = 0.35;
/// Seconds between bass note onsets
pub const BASS_SPACING: f64 = 0.72;
/// How far ahead of the loop boundary the next loop gets scheduled
pub const LOOKAHEAD: f64 = 0.05;

/// Length of a bass note (s)
pub const BASS_NOTE: f64 = 0.7;
/// Time between loop starts (s)
pub const LOOP_SECONDS: f64 = MELODY.len() as f64 * NOTE_SPACING;

/// One note of the background loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub freq: f32,
    pub start: f64,
    pub stop: f64,
    pub bass: bool,
}

/// Melody and bass notes of a loop starting at `start`
pub fn loop_notes(start: f64) -> Vec<ScheduledNote> {
    let melody = MELODY.iter().enumerate().map(|(index, &(freq, beats))| {
        let t = start + index as f64 * NOTE_SPACING;
        ScheduledNote {
            freq,
            start: t,
            stop: t + beats * TEMPO,
            bass: false,
        }
    });
    let bass = BASS.iter().enumerate().map(|(index, &freq)| {
        let t = start + index as f64 * BASS_SPACING;
        ScheduledNote {
            freq,
            start: t,
            stop: t + BASS_NOTE,
            bass: true,
        }
    });
    melody.chain(bass).collect()
}

/// Forget notes that have stopped by `now`; ones still sounding are kept so
/// they can be cut off
pub fn prune_finished<T>(notes: &mut Vec<(T, f64)>, now: f64) {
    notes.retain(|(_, stop_at)| *stop_at > now);
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioNode, GainNode, OscillatorNode, OscillatorType};

    use super::{LOOKAHEAD, LOOP_SECONDS, loop_notes, prune_finished};
    use crate::presentation::SoundEffect;
    use crate::settings::Settings;

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        music_bus: Option<GainNode>,
        sfx_bus: Option<GainNode>,
        music_volume: f32,
        music_playing: bool,
        /// Context time at which the next melody loop starts
        next_loop_at: f64,
        /// Scheduled music notes with their stop times
        music_nodes: Vec<(OscillatorNode, f64)>,
        ducked: bool,
    }

    impl AudioManager {
        pub fn new(settings: &Settings) -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }

            let make_bus = |ctx: &AudioContext, volume: f32| -> Option<GainNode> {
                let bus = ctx.create_gain().ok()?;
                bus.gain().set_value(volume);
                bus.connect_with_audio_node(&ctx.destination()).ok()?;
                Some(bus)
            };
            let music_volume = settings.effective_music_volume();
            let music_bus = ctx.as_ref().and_then(|c| make_bus(c, music_volume));
            let sfx_bus = ctx
                .as_ref()
                .and_then(|c| make_bus(c, settings.effective_sfx_volume()));

            Self {
                ctx,
                music_bus,
                sfx_bus,
                music_volume,
                music_playing: false,
                next_loop_at: 0.0,
                music_nodes: Vec::new(),
                ducked: false,
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }

        /// Pick up changed volumes / toggles
        pub fn apply_settings(&mut self, settings: &Settings) {
            self.music_volume = settings.effective_music_volume();
            if let Some(bus) = &self.sfx_bus {
                bus.gain().set_value(settings.effective_sfx_volume());
            }
            if let Some(bus) = &self.music_bus {
                bus.gain().set_value(self.music_volume);
            }
            if !settings.music_enabled {
                self.stop_music();
            }
        }

        /// Play a sound effect
        pub fn play(&self, effect: SoundEffect) {
            let (Some(ctx), Some(bus)) = (&self.ctx, &self.sfx_bus) else {
                return;
            };
            self.resume();

            match effect {
                SoundEffect::Move => self.play_move(ctx, bus),
                SoundEffect::Land => self.play_land(ctx, bus),
                SoundEffect::Combine => self.play_combine(ctx, bus),
                SoundEffect::LevelUp => self.play_level_up(ctx, bus),
                SoundEffect::Spawn => self.play_spawn(ctx, bus),
                SoundEffect::GameOver => self.play_game_over(ctx, bus),
            }
        }

        pub fn start_music(&mut self) {
            let Some(ctx) = &self.ctx else { return };
            if self.music_playing {
                return;
            }
            self.music_playing = true;
            self.next_loop_at = ctx.current_time();
            self.update(false);
        }

        pub fn stop_music(&mut self) {
            self.music_playing = false;
            for (node, _) in self.music_nodes.drain(..) {
                // Already-finished nodes just refuse
                let _ = node.stop();
            }
        }

        /// Call once per frame: keeps the melody looping and ducks it under speech
        pub fn update(&mut self, speaking: bool) {
            if speaking != self.ducked {
                self.duck(speaking);
            }
            if !self.music_playing {
                return;
            }
            let Some(ctx) = self.ctx.clone() else { return };

            let now = ctx.current_time();
            if now + LOOKAHEAD < self.next_loop_at {
                return;
            }
            let start = self.next_loop_at.max(now);
            // Notes of the previous loop may still be sounding
            prune_finished(&mut self.music_nodes, now);
            self.schedule_loop(&ctx, start);
            self.next_loop_at = start + LOOP_SECONDS;
        }

        /// Lower the music while a number is being spoken
        fn duck(&mut self, duck: bool) {
            self.ducked = duck;
            let (Some(ctx), Some(bus)) = (&self.ctx, &self.music_bus) else {
                return;
            };
            let target = if duck {
                self.music_volume / 3.0
            } else {
                self.music_volume
            };
            let t = ctx.current_time();
            let gain = bus.gain();
            gain.cancel_scheduled_values(t).ok();
            gain.set_value_at_time(gain.value(), t).ok();
            gain.linear_ramp_to_value_at_time(target, t + 0.1).ok();
        }

        fn schedule_loop(&mut self, ctx: &AudioContext, start: f64) {
            let Some(bus) = self.music_bus.clone() else { return };

            for note in loop_notes(start) {
                let osc_type = if note.bass {
                    OscillatorType::Triangle
                } else {
                    OscillatorType::Sine
                };
                let Some((osc, gain)) = create_osc(ctx, &bus, note.freq, osc_type) else {
                    continue;
                };
                let t = note.start;

                // Soft attack and release
                let (peak, attack) = if note.bass { (0.15, 0.05) } else { (0.3, 0.02) };
                let release = if note.bass { 0.05 } else { 0.02 };
                gain.gain().set_value_at_time(0.0, t).ok();
                gain.gain().linear_ramp_to_value_at_time(peak, t + attack).ok();
                gain.gain()
                    .linear_ramp_to_value_at_time(0.0, note.stop - release)
                    .ok();

                osc.start_with_when(t).ok();
                osc.stop_with_when(note.stop).ok();
                self.music_nodes.push((osc, note.stop));
            }
        }

        // === Sound generators ===

        /// Move - short blip
        fn play_move(&self, ctx: &AudioContext, bus: &GainNode) {
            let Some((osc, gain)) = create_osc(ctx, bus, 500.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(0.15, t).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.05).ok();
        }

        /// Land - soft thud
        fn play_land(&self, ctx: &AudioContext, bus: &GainNode) {
            let Some((osc, gain)) = create_osc(ctx, bus, 150.0, OscillatorType::Triangle) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(0.2, t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.15).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.15).ok();
        }

        /// Combine - magical rising sweep
        fn play_combine(&self, ctx: &AudioContext, bus: &GainNode) {
            let Some((osc, gain)) = create_osc(ctx, bus, 400.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(0.25, t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.3).ok();
            osc.frequency().set_value_at_time(400.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(800.0, t + 0.2)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Level up - four-note arpeggio
        fn play_level_up(&self, ctx: &AudioContext, bus: &GainNode) {
            let Some((osc, gain)) = create_osc(ctx, bus, 523.0, OscillatorType::Square) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(0.2, t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.6).ok();
            osc.frequency().set_value_at_time(659.0, t + 0.15).ok();
            osc.frequency().set_value_at_time(784.0, t + 0.3).ok();
            osc.frequency().set_value_at_time(1047.0, t + 0.45).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.6).ok();
        }

        /// Spawn - little upward chirp
        fn play_spawn(&self, ctx: &AudioContext, bus: &GainNode) {
            let Some((osc, gain)) = create_osc(ctx, bus, 350.0, OscillatorType::Sine) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(0.1, t).ok();
            osc.frequency().set_value_at_time(350.0, t).ok();
            osc.frequency().linear_ramp_to_value_at_time(450.0, t + 0.08).ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.08).ok();
        }

        /// Game over - long falling buzz
        fn play_game_over(&self, ctx: &AudioContext, bus: &GainNode) {
            let Some((osc, gain)) = create_osc(ctx, bus, 400.0, OscillatorType::Sawtooth) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(0.15, t).ok();
            gain.gain().linear_ramp_to_value_at_time(0.0, t + 0.8).ok();
            osc.frequency().set_value_at_time(400.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(100.0, t + 0.8)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.8).ok();
        }
    }

    /// Create an oscillator with its own gain envelope, routed into `bus`
    fn create_osc(
        ctx: &AudioContext,
        bus: &AudioNode,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(bus).ok()?;

        Some((osc, gain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_note_counts_and_length() {
        let notes = loop_notes(0.0);
        assert_eq!(notes.iter().filter(|n| !n.bass).count(), MELODY.len());
        assert_eq!(notes.iter().filter(|n| n.bass).count(), BASS.len());
        assert!((LOOP_SECONDS - 3.06).abs() < 1e-9);
        // The bass line fits inside one loop
        assert!(notes.iter().filter(|n| n.bass).all(|n| n.stop <= LOOP_SECONDS));
    }

    #[test]
    fn test_last_note_outlives_next_loop_scheduling() {
        let notes = loop_notes(0.0);
        let last = notes.iter().filter(|n| !n.bass).last().unwrap();
        let scheduled_at = LOOP_SECONDS - LOOKAHEAD;
        assert!(last.stop > scheduled_at);

        // Still sounding when the next loop is queued, so it must be kept
        let mut nodes: Vec<(usize, f64)> = notes.iter().map(|n| n.stop).enumerate().collect();
        prune_finished(&mut nodes, scheduled_at);
        assert!(nodes.iter().any(|&(_, stop)| stop == last.stop));
        assert!(nodes.iter().all(|&(_, stop)| stop > scheduled_at));

        prune_finished(&mut nodes, LOOP_SECONDS + 1.0);
        assert!(nodes.is_empty());
    }
}
