//! Benchmarks for DSP primitives and full-engine scenarios.
//!
//! Run with: cargo bench
//!
//! Everything here runs inside the audio callback, so each measurement is
//! judged against the real-time deadline for its block size.
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Low-level primitives (oscillator, filter, delay, ...)
//!   - scenarios/*  The whole engine under playing load

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    dsp::bench_oscillator,
    dsp::bench_filter,
    dsp::bench_delay,
    dsp::bench_convolver,
    dsp::bench_compressor,
    scenarios::bench_engine,
);
criterion_main!(benches);
