//! Low-level DSP primitive benchmarks.

mod compressor;
mod convolver;
mod delay;
mod filter;
mod oscillator;

pub use compressor::bench_compressor;
pub use convolver::bench_convolver;
pub use delay::bench_delay;
pub use filter::bench_filter;
pub use oscillator::bench_oscillator;
