//! Benchmarks for the delay line.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gridtone::dsp::delay::DelayLine;

use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut delay = DelayLine::new(0.3, 48_000.0);

        group.bench_with_input(BenchmarkId::new("process", size), &size, |b, _| {
            b.iter(|| {
                let mut acc = 0.0f32;
                for &sample in &input {
                    acc += delay.process(black_box(sample));
                }
                black_box(acc)
            })
        });
    }
    group.finish();
}
