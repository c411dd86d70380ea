pub mod dsp; // Realtime-safe signal primitives
pub mod graph; // Fixed effects topology (filter, ping-pong delay, reverb, compressor)
pub mod sequencing; // Grid cells, scales, frequency mapping, step clock
pub mod synth; // Voices, scheduling, and the audio engine

pub const MAX_BLOCK_SIZE: usize = 2048;

/// Floor for exponential gain ramps. Exponential automation cannot reach
/// zero, so releases land here and the voice is reaped shortly after.
pub(crate) const MIN_LEVEL: f32 = 0.001;
