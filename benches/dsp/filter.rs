//! Benchmarks for the lowpass filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gridtone::dsp::filter::LowpassFilter;

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let mut buffer: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();

        // Static coefficients.
        let mut filter = LowpassFilter::new(48_000.0, 2_000.0, 4.0);
        group.bench_with_input(BenchmarkId::new("static", size), &size, |b, _| {
            b.iter(|| {
                filter.render(black_box(&mut buffer), black_box(0.0));
            })
        });

        // Sweeping cutoff forces a coefficient recompute per block.
        let mut filter = LowpassFilter::new(48_000.0, 2_000.0, 4.0);
        let mut t = 0.0f64;
        group.bench_with_input(BenchmarkId::new("sweeping", size), &size, |b, _| {
            b.iter(|| {
                filter.set_cutoff(500.0 + (t as f32 * 1_000.0) % 5_000.0, t);
                filter.render(black_box(&mut buffer), black_box(t));
                t += size as f64 / 48_000.0;
            })
        });
    }
    group.finish();
}
