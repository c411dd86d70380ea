//! Benchmarks for the master compressor.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gridtone::dsp::compressor::{Compressor, CompressorParams};

use crate::BLOCK_SIZES;

pub fn bench_compressor(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/compressor");

    for &size in BLOCK_SIZES {
        // Hot signal so the gain computer actually works.
        let mut left: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin() * 0.9).collect();
        let mut right = left.clone();
        let mut compressor = Compressor::new(48_000.0, CompressorParams::default());

        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                compressor.process(black_box(&mut left), black_box(&mut right));
            })
        });
    }
    group.finish();
}
