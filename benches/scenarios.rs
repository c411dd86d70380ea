//! Whole-engine benchmarks: the render path under playing load.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use gridtone::graph::effects::EffectsConfig;
use gridtone::sequencing::grid::Cell;
use gridtone::synth::engine::{AudioEngine, EngineConfig};

use crate::BLOCK_SIZES;

fn engine() -> AudioEngine {
    AudioEngine::new(EngineConfig {
        effects: EffectsConfig {
            // Short IR keeps setup cheap; the block cost scales with
            // partitions, covered by the convolver group.
            reverb_duration: 0.5,
            ..EffectsConfig::default()
        },
        ..EngineConfig::default()
    })
}

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");

    for &size in BLOCK_SIZES {
        let mut out_l = vec![0.0f32; size];
        let mut out_r = vec![0.0f32; size];

        // Idle: clock ticking, nothing sounding.
        let mut idle = engine();
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| {
                idle.process_block(black_box(&mut out_l), black_box(&mut out_r));
            })
        });

        // A five-note chord held.
        let mut chord = engine();
        for x in 0..5 {
            chord.play_note(Cell::new(x * 2, 14));
        }
        group.bench_with_input(BenchmarkId::new("chord_5", size), &size, |b, _| {
            b.iter(|| {
                chord.process_block(black_box(&mut out_l), black_box(&mut out_r));
            })
        });

        // Arpeggiating with glide: the sustained voice retargets per step.
        let mut arp = engine();
        arp.set_glide_time(80.0);
        arp.play_arpeggio(&[Cell::new(0, 14), Cell::new(4, 14), Cell::new(8, 14)]);
        group.bench_with_input(BenchmarkId::new("arpeggio_glide", size), &size, |b, _| {
            b.iter(|| {
                arp.process_block(black_box(&mut out_l), black_box(&mut out_r));
            })
        });
    }
    group.finish();
}
