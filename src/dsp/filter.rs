use crate::dsp::param::AutomatedParam;

/*
Lowpass Filter
==============

Single biquad lowpass sitting at the head of the effects chain: every voice
is summed into one mono bus and shaped here before the dry/delay/reverb
split.

Both controls are automated parameters so a slider drag becomes a short ramp
(about one visual frame, 16 ms) instead of a coefficient jump:

  cutoff     20 Hz - 20 kHz, exponential ramp (perceptually even sweep)
  resonance  0 - 20, linear ramp. The control range is dB of peaking at the
             cutoff, Web-Audio style; internally it maps to a linear biquad
             Q of 10^(res/20) (1.0 at 0, 10.0 at 20).

Coefficients are recomputed from the ramp position once per rendered block.
*/

/// Ramp length for cutoff/resonance changes - about one frame at 60 fps.
pub const FILTER_SMOOTH_SECS: f64 = 0.016;

pub const CUTOFF_MIN_HZ: f32 = 20.0;
pub const CUTOFF_MAX_HZ: f32 = 20_000.0;
pub const RESONANCE_MAX: f32 = 20.0;

pub struct LowpassFilter {
    sample_rate: f32,
    cutoff: AutomatedParam,
    resonance: AutomatedParam,

    // Biquad coefficients (normalized by a0) and direct-form-1 state.
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl LowpassFilter {
    pub fn new(sample_rate: f32, cutoff_hz: f32, resonance: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            cutoff: AutomatedParam::new(cutoff_hz.clamp(CUTOFF_MIN_HZ, CUTOFF_MAX_HZ)),
            resonance: AutomatedParam::new(resonance.clamp(0.0, RESONANCE_MAX)),
            b0: 0.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.update_coefficients(0.0);
        filter
    }

    /// Re-target the cutoff with a short exponential ramp. Clamped to the
    /// audible range.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, now: f64) {
        let cutoff_hz = cutoff_hz.clamp(CUTOFF_MIN_HZ, CUTOFF_MAX_HZ);
        let current = self.cutoff.value_at(now);
        self.cutoff.cancel_scheduled(now);
        self.cutoff.set_value_at(current, now);
        self.cutoff
            .exponential_ramp_to(cutoff_hz, now + FILTER_SMOOTH_SECS);
    }

    /// Re-target the resonance with a short linear ramp. Clamped to [0, 20].
    pub fn set_resonance(&mut self, resonance: f32, now: f64) {
        let resonance = resonance.clamp(0.0, RESONANCE_MAX);
        let current = self.resonance.value_at(now);
        self.resonance.cancel_scheduled(now);
        self.resonance.set_value_at(current, now);
        self.resonance
            .linear_ramp_to(resonance, now + FILTER_SMOOTH_SECS);
    }

    pub fn cutoff_target(&self) -> f32 {
        self.cutoff.target()
    }

    pub fn resonance_target(&self) -> f32 {
        self.resonance.target()
    }

    fn update_coefficients(&mut self, time: f64) {
        let cutoff = self
            .cutoff
            .value_at(time)
            .clamp(CUTOFF_MIN_HZ, self.sample_rate * 0.45);
        let resonance_db = self.resonance.value_at(time).clamp(0.0, RESONANCE_MAX);
        let q = 10.0f32.powf(resonance_db / 20.0);

        // RBJ cookbook lowpass.
        let w0 = std::f32::consts::TAU * cutoff / self.sample_rate;
        let (sin_w0, cos_w0) = w0.sin_cos();
        let alpha = sin_w0 / (2.0 * q);

        let a0 = 1.0 + alpha;
        self.b0 = ((1.0 - cos_w0) / 2.0) / a0;
        self.b1 = (1.0 - cos_w0) / a0;
        self.b2 = self.b0;
        self.a1 = (-2.0 * cos_w0) / a0;
        self.a2 = (1.0 - alpha) / a0;
    }

    /// Filter the buffer in place. `t0` is the audio time of the first
    /// sample; coefficients follow any pending ramps block-by-block.
    pub fn render(&mut self, buffer: &mut [f32], t0: f64) {
        self.cutoff.advance_to(t0);
        self.resonance.advance_to(t0);
        self.update_coefficients(t0);

        for sample in buffer.iter_mut() {
            let x = *sample;
            let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
                - self.a1 * self.y1
                - self.a2 * self.y2;
            self.x2 = self.x1;
            self.x1 = x;
            self.y2 = self.y1;
            self.y1 = y;
            *sample = y;
        }
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_dc_when_open() {
        let mut filter = LowpassFilter::new(48_000.0, 20_000.0, 0.0);
        let mut buffer = vec![1.0f32; 4096];
        filter.render(&mut buffer, 0.0);

        // A fully open lowpass should settle near unity for DC input.
        let tail = buffer[4000];
        assert!((tail - 1.0).abs() < 0.05, "tail sample {tail}");
    }

    #[test]
    fn attenuates_high_frequencies() {
        let sr = 48_000.0;
        let mut filter = LowpassFilter::new(sr, 200.0, 0.0);

        // 10 kHz sine through a 200 Hz lowpass loses nearly all energy.
        let mut buffer: Vec<f32> = (0..4096)
            .map(|i| (std::f32::consts::TAU * 10_000.0 * i as f32 / sr).sin())
            .collect();
        filter.render(&mut buffer, 0.0);

        let rms: f32 =
            (buffer[2048..].iter().map(|s| s * s).sum::<f32>() / 2048.0).sqrt();
        assert!(rms < 0.05, "rms {rms}");
    }

    #[test]
    fn clamps_control_ranges() {
        let mut filter = LowpassFilter::new(48_000.0, 2_000.0, 0.0);
        filter.set_cutoff(1.0e9, 0.0);
        filter.set_resonance(500.0, 0.0);

        assert_eq!(filter.cutoff_target(), CUTOFF_MAX_HZ);
        assert_eq!(filter.resonance_target(), RESONANCE_MAX);

        filter.set_cutoff(0.0, 1.0);
        assert_eq!(filter.cutoff_target(), CUTOFF_MIN_HZ);
    }

    #[test]
    fn cutoff_change_is_ramped() {
        let mut filter = LowpassFilter::new(48_000.0, 2_000.0, 0.0);
        filter.set_cutoff(500.0, 1.0);

        // Mid-ramp the effective cutoff sits strictly between old and new.
        let mid = filter.cutoff.value_at(1.0 + FILTER_SMOOTH_SECS / 2.0);
        assert!(mid < 2_000.0 && mid > 500.0, "mid-ramp cutoff {mid}");
        assert_eq!(filter.cutoff_target(), 500.0);
    }
}
