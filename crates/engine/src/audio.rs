use std::time::Duration;

use tracing::debug;

/// Output side of the sound system: one-shot effects and named mix params.
pub trait AudioSink {
    /// Plays a loaded effect, `pitch_shift` in semitone-ish units around 0.
    fn play_sfx(&mut self, name: &str, pitch_shift: f32);
    /// Ramps a named mixer parameter to `value` over `fade` (zero = jump).
    fn set_mix_param(&mut self, param: &str, value: f32, fade: Duration);
}

/// Sink that only logs. Used when no audio device is wired in.
#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play_sfx(&mut self, name: &str, pitch_shift: f32) {
        debug!(sfx = name, pitch_shift, "sfx_played");
    }

    fn set_mix_param(&mut self, param: &str, value: f32, fade: Duration) {
        debug!(
            param,
            value,
            fade_ms = fade.as_millis() as u64,
            "mix_param_set"
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AudioEvent {
    Sfx { name: String, pitch_shift: f32 },
    Mix { param: String, value: f32, fade: Duration },
}

/// Sink that remembers every call, for assertions.
#[derive(Debug, Default)]
pub struct RecordingAudio {
    events: Vec<AudioEvent>,
}

impl RecordingAudio {
    pub fn events(&self) -> &[AudioEvent] {
        &self.events
    }

    pub fn sfx_names(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                AudioEvent::Sfx { name, .. } => Some(name.as_str()),
                AudioEvent::Mix { .. } => None,
            })
            .collect()
    }

    pub fn last_mix_value(&self, param: &str) -> Option<f32> {
        self.events.iter().rev().find_map(|event| match event {
            AudioEvent::Mix {
                param: name, value, ..
            } if name == param => Some(*value),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl AudioSink for RecordingAudio {
    fn play_sfx(&mut self, name: &str, pitch_shift: f32) {
        self.events.push(AudioEvent::Sfx {
            name: name.to_string(),
            pitch_shift,
        });
    }

    fn set_mix_param(&mut self, param: &str, value: f32, fade: Duration) {
        self.events.push(AudioEvent::Mix {
            param: param.to_string(),
            value,
            fade,
        });
    }
}
