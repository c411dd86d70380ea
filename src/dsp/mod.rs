//! Low-level, realtime-safe signal primitives.
//!
//! Everything here renders sample-by-sample or block-by-block with no
//! allocation after construction. Higher layers (`graph`, `synth`) compose
//! these into the fixed effects chain and per-note voices.

/// Master-bus dynamics compressor.
pub mod compressor;
/// Partitioned FFT convolution and synthetic impulse responses.
pub mod convolver;
/// Fixed-time ring-buffer delay line.
pub mod delay;
/// Lowpass biquad with ramped cutoff and resonance.
pub mod filter;
/// Phase-accumulator oscillators.
pub mod oscillator;
/// Scheduled parameter automation (the click-free ramp contract).
pub mod param;
