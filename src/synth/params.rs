use crate::dsp::oscillator::Waveform;
use crate::sequencing::scale::Scale;

/// Settings for one oscillator layer of a voice.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OscSettings {
    pub waveform: Waveform,
    /// Octave offset applied on top of the mapped frequency.
    pub octave: i8,
    /// Per-layer gain inside the voice.
    pub gain: f32,
}

impl OscSettings {
    /// Frequency multiplier combining the octave offset with a global
    /// pitch shift in semitones.
    pub fn pitch_multiplier(&self, pitch_shift_semitones: f32) -> f32 {
        2.0f32.powi(self.octave as i32) * 2.0f32.powf(pitch_shift_semitones / 12.0)
    }
}

/// One immutable snapshot of everything that shapes new notes.
///
/// Voices copy what they need at creation; changing a field here never
/// mutates a sounding voice behind its back. Live voices are retargeted
/// explicitly by the engine when a change should apply to them.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineParams {
    pub tempo: f64,
    pub scale: Scale,
    pub grid_size: u8,
    pub main_osc: OscSettings,
    pub sub_osc: OscSettings,
    /// Note attack in seconds.
    pub attack: f64,
    /// Note release in seconds.
    pub release: f64,
    /// Glide time in milliseconds; zero disables the arpeggiator's
    /// held-voice mode.
    pub glide_ms: f64,
    /// Exponential (portamento) rather than linear glide.
    pub portamento: bool,
    /// Global pitch shift in semitones.
    pub pitch_shift: f32,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            tempo: 222.0,
            scale: Scale::Pentatonic,
            grid_size: crate::sequencing::grid::DEFAULT_GRID_SIZE,
            main_osc: OscSettings {
                waveform: Waveform::Sine,
                octave: 0,
                gain: 0.1,
            },
            sub_osc: OscSettings {
                waveform: Waveform::Sine,
                octave: -2,
                gain: 0.2,
            },
            attack: 0.002,
            release: 0.05,
            glide_ms: 0.0,
            portamento: false,
            pitch_shift: 0.0,
        }
    }
}

impl EngineParams {
    /// Glide mode is on whenever the glide time is non-zero.
    pub fn glide_enabled(&self) -> bool {
        self.glide_ms > 0.0
    }

    pub fn glide_secs(&self) -> f64 {
        self.glide_ms / 1_000.0
    }
}
