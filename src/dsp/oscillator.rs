use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::dsp::param::AutomatedParam;

/// Oscillator waveform. A waveform is fixed for the lifetime of one
/// oscillator; changing the timbre of a sounding voice swaps oscillators
/// behind a crossfade instead of mutating this in place.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Parse a waveform from its UI name. Unknown names yield `None` so
    /// callers can treat them as a no-op.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sine" => Some(Waveform::Sine),
            "square" => Some(Waveform::Square),
            "sawtooth" => Some(Waveform::Sawtooth),
            "triangle" => Some(Waveform::Triangle),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::Square => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// Evaluate one cycle of the waveform at `phase` in [0, 1).
    #[inline]
    fn sample(&self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => {
                // Rises 0 -> 1 over the first quarter, falls to -1, rises back.
                let x = 4.0 * phase;
                if x < 1.0 {
                    x
                } else if x < 3.0 {
                    2.0 - x
                } else {
                    x - 4.0
                }
            }
        }
    }
}

/// Phase-accumulator oscillator with a rampable frequency.
///
/// Frequency is an `AutomatedParam` so glide and pitch-shift transitions are
/// scheduled as ramps in audio time rather than per-frame assignments.
pub struct Oscillator {
    waveform: Waveform,
    phase: f32,
    pub frequency: AutomatedParam,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency_hz: f32) -> Self {
        Self {
            waveform,
            phase: 0.0,
            frequency: AutomatedParam::new(frequency_hz),
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Produce the sample at `time`, then advance the phase by one sample.
    #[inline]
    pub fn next_sample(&mut self, time: f64, sample_rate: f32) -> f32 {
        let freq = self.frequency.value_at(time).max(0.0);
        let out = self.waveform.sample(self.phase);

        self.phase += freq / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_sine() {
        let sample_rate = 48_000.0;
        let frequency = 440.0;
        let mut osc = Oscillator::new(Waveform::Sine, frequency);

        let mut buffer = vec![0.0f32; 128];
        for (i, slot) in buffer.iter_mut().enumerate() {
            *slot = osc.next_sample(i as f64 / sample_rate as f64, sample_rate);
        }

        // sample n should be sin(2pi f n / sr)
        let sample_index = 12;
        let expected = (TAU * frequency * sample_index as f32 / sample_rate).sin();
        let actual = buffer[sample_index];
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn square_alternates() {
        let mut osc = Oscillator::new(Waveform::Square, 12_000.0);
        let sr = 48_000.0;
        let first = osc.next_sample(0.0, sr);
        let _ = osc.next_sample(1.0 / 48_000.0, sr);
        let third = osc.next_sample(2.0 / 48_000.0, sr);
        assert_eq!(first, 1.0);
        assert_eq!(third, -1.0);
    }

    #[test]
    fn frequency_ramp_changes_pitch() {
        let sr = 48_000.0;
        let mut osc = Oscillator::new(Waveform::Sine, 220.0);
        osc.frequency.set_value_at(220.0, 0.0);
        osc.frequency.exponential_ramp_to(880.0, 1.0);

        assert!((osc.frequency.value_at(0.0) - 220.0).abs() < 1e-3);
        assert!((osc.frequency.value_at(1.0) - 880.0).abs() < 1e-2);
        // Midpoint of an exponential sweep is the geometric mean.
        assert!((osc.frequency.value_at(0.5) - 440.0).abs() < 1.0);

        // Rendering through the ramp stays bounded.
        for i in 0..48_000 {
            let s = osc.next_sample(i as f64 / sr as f64, sr);
            assert!(s.abs() <= 1.0);
        }
    }

    #[test]
    fn waveform_names_round_trip() {
        for wf in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Triangle,
        ] {
            assert_eq!(Waveform::from_name(wf.name()), Some(wf));
        }
        assert_eq!(Waveform::from_name("noise"), None);
    }
}
