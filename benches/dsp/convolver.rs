//! Benchmarks for partitioned FFT convolution.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gridtone::dsp::convolver::{generate_impulse_response, StereoConvolver};

use crate::BLOCK_SIZES;

pub fn bench_convolver(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/convolver");

    // IR lengths spanning a short room to the default hall.
    for ir_secs in [0.5f32, 2.5] {
        let (ir_l, ir_r) = generate_impulse_response(ir_secs, 48_000.0);
        for &size in BLOCK_SIZES {
            let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.07).sin()).collect();
            let mut out_l = vec![0.0f32; size];
            let mut out_r = vec![0.0f32; size];
            let mut convolver = StereoConvolver::new(&ir_l, &ir_r);

            let name = format!("ir_{ir_secs}s");
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    convolver.process(
                        black_box(&input),
                        black_box(&mut out_l),
                        black_box(&mut out_r),
                    );
                })
            });
        }
    }
    group.finish();
}
