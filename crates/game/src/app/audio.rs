//! Per-room music mix and the NPC speech babble.

use std::time::Duration;

use engine::AudioSink;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::world::{Flags, NpcType};

const MUSIC_FADE: Duration = Duration::from_secs(1);
/// Silences the plant choir in every room.
pub(crate) const PLANTS_ASLEEP: &str = "plants-asleep";

/// Target levels for the three looping tracks and their filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MixState {
    pub(crate) attic_gain: f32,
    pub(crate) overworld_filter: f32,
    pub(crate) overworld_gain: f32,
    pub(crate) plant_filter: f32,
    pub(crate) plant_gain: f32,
    pub(crate) plant_pan: f32,
}

impl MixState {
    fn params(&self) -> [(&'static str, f32); 6] {
        [
            ("attic_gain", self.attic_gain),
            ("overworld_filter", self.overworld_filter),
            ("overworld_gain", self.overworld_gain),
            ("plant_filter", self.plant_filter),
            ("plant_gain", self.plant_gain),
            ("plant_pan", self.plant_pan),
        ]
    }
}

pub(crate) fn mix_for_room(room: &str) -> Option<MixState> {
    let state = match room {
        "hall" => MixState {
            attic_gain: 0.0,
            overworld_filter: 24_000.0,
            overworld_gain: 1.0,
            plant_filter: 600.0,
            plant_gain: 1.0,
            plant_pan: -1.0,
        },
        "greenhouse" => MixState {
            attic_gain: 0.0,
            overworld_filter: 24_000.0,
            overworld_gain: 0.8,
            plant_filter: 24_000.0,
            plant_gain: 1.0,
            plant_pan: 0.0,
        },
        "attic" => MixState {
            attic_gain: 1.0,
            overworld_filter: 24_000.0,
            overworld_gain: 0.0,
            plant_filter: 1_000.0,
            plant_gain: 0.0,
            plant_pan: 0.0,
        },
        "cellar" => MixState {
            attic_gain: 0.0,
            overworld_filter: 800.0,
            overworld_gain: 0.6,
            plant_filter: 400.0,
            plant_gain: 0.4,
            plant_pan: 0.0,
        },
        _ => return None,
    };
    Some(state)
}

#[derive(Debug, Default)]
pub(crate) struct MusicDirector {
    current: Option<String>,
}

impl MusicDirector {
    pub(crate) fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Moves the mix to `room`'s settings with flag overrides applied.
    /// Unknown rooms keep the current mix.
    pub(crate) fn room_changed(
        &mut self,
        room: &str,
        immediate: bool,
        flags: &Flags,
        audio: &mut dyn AudioSink,
    ) {
        let Some(mut state) = mix_for_room(room) else {
            warn!(room, "music_state_unknown");
            return;
        };
        if flags.value(PLANTS_ASLEEP) {
            state.plant_gain = 0.0;
        }
        let fade = if immediate { Duration::ZERO } else { MUSIC_FADE };
        for (param, value) in state.params() {
            audio.set_mix_param(param, value, fade);
        }
        debug!(room, immediate, "music_room_changed");
        self.current = Some(room.to_string());
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpeechParams {
    pub(crate) sample: &'static str,
    /// Seconds between samples.
    pub(crate) interval: f32,
    pub(crate) variance: f32,
    pub(crate) shift: f32,
}

pub(crate) fn speech_params(npc: NpcType) -> SpeechParams {
    match npc {
        NpcType::Cat => SpeechParams {
            sample: "mahp",
            interval: 0.15,
            variance: 1.2,
            shift: 0.8,
        },
        NpcType::Ghost => SpeechParams {
            sample: "ghost-moan",
            interval: 0.22,
            variance: 2.0,
            shift: -0.6,
        },
    }
}

#[derive(Debug)]
struct SpeechLoop {
    generation: u64,
    params: SpeechParams,
    elapsed: f32,
    until_next: f32,
}

/// Pitch-shifted babble while someone talks. Starting or stopping replaces
/// the running loop and bumps the generation.
#[derive(Debug)]
pub(crate) struct Speech {
    generation: u64,
    timeout: f32,
    active: Option<SpeechLoop>,
    rng: SmallRng,
}

impl Speech {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self::with_rng(timeout, SmallRng::from_entropy())
    }

    pub(crate) fn with_rng(timeout: Duration, rng: SmallRng) -> Self {
        Self {
            generation: 0,
            timeout: timeout.as_secs_f32(),
            active: None,
            rng,
        }
    }

    pub(crate) fn is_speaking(&self) -> bool {
        self.active.is_some()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn start(&mut self, npc: NpcType) {
        self.generation += 1;
        self.active = Some(SpeechLoop {
            generation: self.generation,
            params: speech_params(npc),
            elapsed: 0.0,
            until_next: 0.0,
        });
        debug!(npc = ?npc, generation = self.generation, "speech_started");
    }

    pub(crate) fn stop(&mut self) {
        self.generation += 1;
        self.active = None;
    }

    pub(crate) fn tick(&mut self, dt: f32, audio: &mut dyn AudioSink) {
        let Some(speech) = self.active.as_mut() else {
            return;
        };
        speech.elapsed += dt;
        if speech.elapsed >= self.timeout {
            debug!(generation = speech.generation, "speech_timed_out");
            self.generation += 1;
            self.active = None;
            return;
        }
        speech.until_next -= dt;
        while speech.until_next <= 0.0 {
            let jitter = (self.rng.gen::<f32>() - 0.5) * speech.params.variance;
            audio.play_sfx(speech.params.sample, speech.params.shift + jitter);
            speech.until_next += speech.params.interval * self.rng.gen_range(0.5..1.5);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::RecordingAudio;

    fn speech() -> Speech {
        Speech::with_rng(Duration::from_secs(10), SmallRng::seed_from_u64(7))
    }

    #[test]
    fn known_room_sets_every_param() {
        let mut audio = RecordingAudio::default();
        let mut music = MusicDirector::default();
        music.room_changed("attic", false, &Flags::default(), &mut audio);
        assert_eq!(audio.events().len(), 6);
        assert_eq!(audio.last_mix_value("attic_gain"), Some(1.0));
        assert_eq!(music.current(), Some("attic"));
    }

    #[test]
    fn unknown_room_keeps_mix() {
        let mut audio = RecordingAudio::default();
        let mut music = MusicDirector::default();
        music.room_changed("hall", true, &Flags::default(), &mut audio);
        audio.clear();
        music.room_changed("broom-cupboard", false, &Flags::default(), &mut audio);
        assert!(audio.events().is_empty());
        assert_eq!(music.current(), Some("hall"));
    }

    #[test]
    fn sleeping_plants_silence_the_choir() {
        let mut audio = RecordingAudio::default();
        let mut music = MusicDirector::default();
        let mut flags = Flags::default();
        music.room_changed("greenhouse", true, &flags, &mut audio);
        assert_eq!(audio.last_mix_value("plant_gain"), Some(1.0));

        flags.enable(PLANTS_ASLEEP);
        music.room_changed("greenhouse", true, &flags, &mut audio);
        assert_eq!(audio.last_mix_value("plant_gain"), Some(0.0));
        assert_eq!(audio.last_mix_value("overworld_gain"), Some(0.8));
    }

    #[test]
    fn speech_plays_samples_until_stopped() {
        let mut audio = RecordingAudio::default();
        let mut speech = speech();
        speech.start(NpcType::Cat);
        speech.tick(0.5, &mut audio);
        assert!(!audio.sfx_names().is_empty());
        assert!(audio.sfx_names().iter().all(|name| *name == "mahp"));

        speech.stop();
        audio.clear();
        speech.tick(0.5, &mut audio);
        assert!(audio.events().is_empty());
    }

    #[test]
    fn restarting_speech_retires_the_old_loop() {
        let mut audio = RecordingAudio::default();
        let mut speech = speech();
        speech.start(NpcType::Cat);
        let first = speech.generation();
        speech.start(NpcType::Ghost);
        assert!(speech.generation() > first);
        speech.tick(0.1, &mut audio);
        assert!(audio.sfx_names().iter().all(|name| *name == "ghost-moan"));
    }

    #[test]
    fn stopping_bumps_the_generation() {
        let mut speech = speech();
        speech.start(NpcType::Cat);
        let started = speech.generation();
        speech.stop();
        assert!(!speech.is_speaking());
        assert_eq!(speech.generation(), started + 1);
    }

    #[test]
    fn speech_times_out() {
        let mut audio = RecordingAudio::default();
        let mut speech = speech();
        speech.start(NpcType::Ghost);
        speech.tick(10.5, &mut audio);
        assert!(!speech.is_speaking());
    }
}
