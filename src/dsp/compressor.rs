/*
Master Dynamics Compressor
==========================

The last stage of the chain. With many grid cells sounding at once the
summed voices can easily exceed full scale; the compressor rides the master
bus so polyphony stays loud but never clips harshly.

Fixed characteristic (matching the engine's master-bus role):

  threshold  -24 dB     knee  30 dB (soft)     ratio  12:1
  attack     3 ms       release  250 ms

Detection is stereo-linked: one envelope follows the louder of the two
channels and a single gain is applied to both, so the stereo image does not
wander under compression. The envelope follower is a pair of one-pole
smoothers with separate attack and release coefficients:

  coeff = exp(-1 / (time * sample_rate))
*/

#[derive(Debug, Clone, Copy)]
pub struct CompressorParams {
    /// Threshold in dB.
    pub threshold_db: f32,
    /// Soft-knee width in dB.
    pub knee_db: f32,
    /// Compression ratio above the knee.
    pub ratio: f32,
    /// Attack time in seconds.
    pub attack: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            knee_db: 30.0,
            ratio: 12.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

pub struct Compressor {
    params: CompressorParams,
    attack_coeff: f32,
    release_coeff: f32,
    /// Linear envelope of the detected level.
    envelope: f32,
}

impl Compressor {
    pub fn new(sample_rate: f32, params: CompressorParams) -> Self {
        Self {
            params,
            attack_coeff: (-1.0 / (params.attack * sample_rate)).exp(),
            release_coeff: (-1.0 / (params.release * sample_rate)).exp(),
            envelope: 0.0,
        }
    }

    /// Gain reduction curve: input level in dB -> output level in dB.
    fn transfer_db(&self, level_db: f32) -> f32 {
        let p = &self.params;
        let overshoot = level_db - p.threshold_db;

        if 2.0 * overshoot < -p.knee_db {
            // Below the knee: unity.
            level_db
        } else if 2.0 * overshoot.abs() <= p.knee_db {
            // Inside the knee: quadratic interpolation toward the ratio.
            let half_knee = overshoot + p.knee_db / 2.0;
            level_db + (1.0 / p.ratio - 1.0) * half_knee * half_knee / (2.0 * p.knee_db)
        } else {
            // Above the knee: full ratio.
            p.threshold_db + overshoot / p.ratio
        }
    }

    /// Compress a stereo pair in place.
    pub fn process(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let level = l.abs().max(r.abs());

            let coeff = if level > self.envelope {
                self.attack_coeff
            } else {
                self.release_coeff
            };
            self.envelope = coeff * (self.envelope - level) + level;

            let level_db = 20.0 * self.envelope.max(1.0e-6).log10();
            let gain_db = self.transfer_db(level_db) - level_db;
            let gain = 10.0f32.powf(gain_db / 20.0);

            *l *= gain;
            *r *= gain;
        }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}
