use std::f32::consts::FRAC_PI_2;

use crate::dsp::compressor::{Compressor, CompressorParams};
use crate::dsp::convolver::{generate_impulse_response, StereoConvolver};
use crate::dsp::delay::DelayLine;
use crate::dsp::filter::LowpassFilter;
use crate::dsp::param::AutomatedParam;
use crate::MAX_BLOCK_SIZE;

/*
Effects Chain
=============

The fixed signal topology every voice plays into, built once per engine:

  voice bus -> [lowpass filter] -> dry ------------------------------\
                                -> left delay (0.3 s) --> pan L ------+--> [master] -> [compressor] -> out
                                -> right delay (0.4 s) -> pan R ------/          ^
                                     ^            ^                              |
                                     +-- cross-feedback (clamped <= 0.9) --+     |
                                delay taps ---> [convolution reverb] -> wet -----+

There is exactly one voice-input point (the filter input) and a small set of
named control points. Every control point moves through a ramp - filter
sweeps take ~16 ms, mix changes ~30-100 ms - so parameter changes are never
audible as steps.

The delay is the classic ping-pong: two independent lines with different
times, each feeding the *other* line through a feedback gain. The feedback
loop closes with one sample of delay, and its gain is hard-clamped at 0.9 so
the loop can never run away.

Dry/wet for the reverb follows an equal-power law (cos/sin of wet * pi/2)
and the wet path is boosted to make up the energy the convolution loses.
*/

/// Compensation for convolution energy loss on the wet path.
const WET_BOOST: f32 = 5.0;

/// Feedback gain ceiling; above this the ping-pong loop self-oscillates.
pub const MAX_FEEDBACK: f32 = 0.9;

/// Ramp used for mix-style control changes.
const MIX_SMOOTH_SECS: f64 = 0.03;

/// Ramp used for the reverb dry/wet balance.
const REVERB_SMOOTH_SECS: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct EffectsConfig {
    pub filter_cutoff: f32,
    pub filter_resonance: f32,
    /// Delay send level, 0..1.
    pub delay_amount: f32,
    /// Cross-feedback gain, clamped to [`MAX_FEEDBACK`].
    pub delay_feedback: f32,
    pub left_delay_secs: f32,
    pub right_delay_secs: f32,
    /// Reverb wet fraction, 0..1.
    pub reverb_wet: f32,
    /// Impulse-response length in seconds.
    pub reverb_duration: f32,
    pub master_gain: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            filter_cutoff: 2_000.0,
            filter_resonance: 0.0,
            delay_amount: 0.3,
            delay_feedback: 0.75,
            left_delay_secs: 0.3,
            right_delay_secs: 0.4,
            reverb_wet: 0.3,
            reverb_duration: 2.5,
            master_gain: 0.1,
        }
    }
}

pub struct EffectsChain {
    sample_rate: f32,

    filter: LowpassFilter,

    left_delay: DelayLine,
    right_delay: DelayLine,
    delay_mix: AutomatedParam,
    feedback: AutomatedParam,
    /// One-sample feedback memory: last wet sample of each panned side.
    fb_left: f32,
    fb_right: f32,

    reverb: StereoConvolver,
    dry_gain: AutomatedParam,
    wet_gain: AutomatedParam,

    master_gain: AutomatedParam,
    compressor: Compressor,

    // Block scratch (sized once, never reallocated on the render path).
    reverb_in: Vec<f32>,
    reverb_l: Vec<f32>,
    reverb_r: Vec<f32>,
}

impl EffectsChain {
    pub fn new(sample_rate: f32, config: EffectsConfig) -> Self {
        let (ir_left, ir_right) =
            generate_impulse_response(config.reverb_duration, sample_rate);
        let wet = config.reverb_wet.clamp(0.0, 1.0);

        Self {
            sample_rate,
            filter: LowpassFilter::new(sample_rate, config.filter_cutoff, config.filter_resonance),
            left_delay: DelayLine::new(config.left_delay_secs, sample_rate),
            right_delay: DelayLine::new(config.right_delay_secs, sample_rate),
            delay_mix: AutomatedParam::new(config.delay_amount.clamp(0.0, 1.0)),
            feedback: AutomatedParam::new(config.delay_feedback.clamp(0.0, MAX_FEEDBACK)),
            fb_left: 0.0,
            fb_right: 0.0,
            reverb: StereoConvolver::new(&ir_left, &ir_right),
            dry_gain: AutomatedParam::new((wet * FRAC_PI_2).cos()),
            wet_gain: AutomatedParam::new((wet * FRAC_PI_2).sin() * WET_BOOST),
            master_gain: AutomatedParam::new(config.master_gain.clamp(0.0, 1.0)),
            compressor: Compressor::new(sample_rate, CompressorParams::default()),
            reverb_in: vec![0.0; MAX_BLOCK_SIZE],
            reverb_l: vec![0.0; MAX_BLOCK_SIZE],
            reverb_r: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Process one block of the mono voice bus into stereo output.
    /// `t0` is the audio time of the first sample.
    pub fn process(&mut self, bus: &mut [f32], out_l: &mut [f32], out_r: &mut [f32], t0: f64) {
        let frames = bus.len();
        debug_assert!(frames <= MAX_BLOCK_SIZE);
        debug_assert_eq!(out_l.len(), frames);
        debug_assert_eq!(out_r.len(), frames);

        for p in [
            &mut self.delay_mix,
            &mut self.feedback,
            &mut self.dry_gain,
            &mut self.wet_gain,
            &mut self.master_gain,
        ] {
            p.advance_to(t0);
        }

        self.filter.render(bus, t0);

        let dt = 1.0 / self.sample_rate as f64;
        for i in 0..frames {
            let t = t0 + i as f64 * dt;
            let x = bus[i];

            let mix = self.delay_mix.value_at(t);
            let fb = self.feedback.value_at(t).min(MAX_FEEDBACK);

            // Each line hears the filtered signal plus the other side's
            // panned output, one sample late.
            let wet_l = mix * self.left_delay.process(x + fb * self.fb_right);
            let wet_r = mix * self.right_delay.process(x + fb * self.fb_left);
            self.fb_left = wet_l;
            self.fb_right = wet_r;

            let dry = self.dry_gain.value_at(t);
            out_l[i] = dry * (x + wet_l);
            out_r[i] = dry * (x + wet_r);
            self.reverb_in[i] = wet_l + wet_r;
        }

        self.reverb.process(
            &self.reverb_in[..frames],
            &mut self.reverb_l[..frames],
            &mut self.reverb_r[..frames],
        );

        for i in 0..frames {
            let t = t0 + i as f64 * dt;
            let wet = self.wet_gain.value_at(t);
            let master = self.master_gain.value_at(t);
            out_l[i] = (out_l[i] + self.reverb_l[i] * wet) * master;
            out_r[i] = (out_r[i] + self.reverb_r[i] * wet) * master;
        }

        self.compressor.process(out_l, out_r);
    }

    pub fn set_filter_cutoff(&mut self, cutoff_hz: f32, now: f64) {
        self.filter.set_cutoff(cutoff_hz, now);
    }

    pub fn set_filter_resonance(&mut self, resonance: f32, now: f64) {
        self.filter.set_resonance(resonance, now);
    }

    /// Delay send level (0..1), ramped.
    pub fn set_delay_amount(&mut self, amount: f32, now: f64) {
        let amount = amount.clamp(0.0, 1.0);
        retarget(&mut self.delay_mix, amount, now, MIX_SMOOTH_SECS);
    }

    /// Feedback as a 0..100 percentage; internally clamped to
    /// [`MAX_FEEDBACK`] regardless of input.
    pub fn set_delay_feedback(&mut self, percent: f32, now: f64) {
        let feedback = (percent / 100.0).clamp(0.0, MAX_FEEDBACK);
        retarget(&mut self.feedback, feedback, now, MIX_SMOOTH_SECS);
    }

    /// Reverb wet amount as a 0..100 percentage. Dry and wet move along an
    /// equal-power curve so perceived loudness holds steady.
    pub fn set_reverb(&mut self, percent: f32, now: f64) {
        let wet = (percent / 100.0).clamp(0.0, 1.0);
        let dry_target = (wet * FRAC_PI_2).cos();
        let wet_target = (wet * FRAC_PI_2).sin() * WET_BOOST;
        retarget(&mut self.dry_gain, dry_target, now, REVERB_SMOOTH_SECS);
        retarget(&mut self.wet_gain, wet_target, now, REVERB_SMOOTH_SECS);
    }

    pub fn set_volume(&mut self, volume: f32, now: f64) {
        retarget(&mut self.master_gain, volume.clamp(0.0, 1.0), now, MIX_SMOOTH_SECS);
    }

    pub fn filter_cutoff(&self) -> f32 {
        self.filter.cutoff_target()
    }

    pub fn filter_resonance(&self) -> f32 {
        self.filter.resonance_target()
    }

    pub fn delay_amount(&self) -> f32 {
        self.delay_mix.target()
    }

    /// The feedback gain currently in force (post-clamp).
    pub fn delay_feedback(&self) -> f32 {
        self.feedback.target()
    }

    pub fn master_gain(&self) -> f32 {
        self.master_gain.target()
    }
}

/// Cancel pending automation and ramp to a new target from the current
/// value - the standard shape of every live control change.
fn retarget(param: &mut AutomatedParam, target: f32, now: f64, secs: f64) {
    let current = param.value_at(now);
    param.cancel_scheduled(now);
    param.set_value_at(current, now);
    param.linear_ramp_to(target, now + secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> EffectsChain {
        // Short IR keeps construction cheap in tests.
        let config = EffectsConfig {
            reverb_duration: 0.1,
            ..EffectsConfig::default()
        };
        EffectsChain::new(48_000.0, config)
    }

    #[test]
    fn silence_in_silence_out() {
        let mut fx = chain();
        let mut bus = vec![0.0f32; 256];
        let mut l = vec![0.0f32; 256];
        let mut r = vec![0.0f32; 256];
        fx.process(&mut bus, &mut l, &mut r, 0.0);
        assert!(l.iter().chain(r.iter()).all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn signal_reaches_both_channels() {
        let mut fx = chain();
        let sr = 48_000.0f32;
        let mut l_energy = 0.0f32;
        let mut r_energy = 0.0f32;

        for block in 0..20 {
            let t0 = block as f64 * 256.0 / sr as f64;
            let mut bus: Vec<f32> = (0..256)
                .map(|i| {
                    let n = block * 256 + i;
                    (std::f32::consts::TAU * 440.0 * n as f32 / sr).sin() * 0.5
                })
                .collect();
            let mut l = vec![0.0f32; 256];
            let mut r = vec![0.0f32; 256];
            fx.process(&mut bus, &mut l, &mut r, t0);
            l_energy += l.iter().map(|s| s * s).sum::<f32>();
            r_energy += r.iter().map(|s| s * s).sum::<f32>();
        }

        assert!(l_energy > 0.0);
        assert!(r_energy > 0.0);
    }

    #[test]
    fn feedback_clamps_at_ceiling() {
        let mut fx = chain();
        fx.set_delay_feedback(150.0, 0.0);
        assert!(fx.delay_feedback() <= MAX_FEEDBACK);

        fx.set_delay_feedback(90.0, 1.0);
        assert!((fx.delay_feedback() - 0.9).abs() < 1e-6);

        fx.set_delay_feedback(-40.0, 2.0);
        assert_eq!(fx.delay_feedback(), 0.0);
    }

    #[test]
    fn output_stays_bounded_at_max_feedback() {
        let mut fx = chain();
        fx.set_delay_feedback(100.0, 0.0);

        let sr = 48_000.0f32;
        let mut peak = 0.0f32;
        for block in 0..200 {
            let t0 = block as f64 * 256.0 / sr as f64;
            let mut bus = vec![0.3f32; 256];
            let mut l = vec![0.0f32; 256];
            let mut r = vec![0.0f32; 256];
            fx.process(&mut bus, &mut l, &mut r, t0);
            for s in l.iter().chain(r.iter()) {
                peak = peak.max(s.abs());
            }
        }
        assert!(peak.is_finite());
        assert!(peak < 4.0, "feedback loop diverged, peak {peak}");
    }

    #[test]
    fn reverb_mix_is_equal_power() {
        let mut fx = chain();
        fx.set_reverb(0.0, 0.0);
        // Past the ramp, fully dry: dry gain 1, wet gain 0.
        assert!((fx.dry_gain.target() - 1.0).abs() < 1e-6);
        assert!(fx.wet_gain.target().abs() < 1e-6);

        fx.set_reverb(100.0, 1.0);
        assert!(fx.dry_gain.target().abs() < 1e-6);
        assert!((fx.wet_gain.target() - WET_BOOST).abs() < 1e-3);
    }

    #[test]
    fn control_changes_are_ramped_not_stepped() {
        let mut fx = chain();
        fx.set_volume(1.0, 0.0);
        // Halfway through the ramp the master gain is strictly between the
        // default (0.1) and the target.
        let mid = fx.master_gain.value_at(MIX_SMOOTH_SECS / 2.0);
        assert!(mid > 0.1 && mid < 1.0, "mid-ramp master {mid}");
    }
}
