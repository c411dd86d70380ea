//! End-to-end engine behavior: note lifecycle, arpeggiation, mapping and
//! control clamps, driven purely through the public surface.

use gridtone::graph::effects::EffectsConfig;
use gridtone::sequencing::clock::StepClock;
use gridtone::sequencing::grid::{Cell, FrequencyMap};
use gridtone::sequencing::scale::Scale;
use gridtone::synth::engine::{AudioEngine, EngineConfig};

const SAMPLE_RATE: f32 = 48_000.0;

fn engine() -> AudioEngine {
    AudioEngine::new(EngineConfig {
        sample_rate: SAMPLE_RATE,
        effects: EffectsConfig {
            // Short impulse response keeps test setup fast.
            reverb_duration: 0.1,
            ..EffectsConfig::default()
        },
        ..EngineConfig::default()
    })
}

/// Advance the engine by rendering `seconds` of audio.
fn run(engine: &mut AudioEngine, seconds: f64) {
    let frames = (seconds * SAMPLE_RATE as f64) as usize;
    let mut l = [0.0f32; 256];
    let mut r = [0.0f32; 256];
    let mut done = 0;
    while done < frames {
        let n = (frames - done).min(256);
        engine.process_block(&mut l[..n], &mut r[..n]);
        done += n;
    }
}

fn cell(x: u8, y: u8) -> Cell {
    Cell { x, y }
}

#[test]
fn play_note_is_idempotent() {
    let mut engine = engine();
    engine.play_note(cell(7, 7));
    engine.play_note(cell(7, 7));
    engine.play_note(cell(7, 7));
    assert_eq!(engine.voice_count(), 1);
}

#[test]
fn stop_is_symmetric_with_play() {
    let mut engine = engine();
    for x in 0..4 {
        engine.play_note(cell(x, 10));
    }
    run(&mut engine, 0.05);
    for x in 0..4 {
        engine.stop_note(cell(x, 10));
    }
    // Past release + margin every voice has been reaped.
    run(&mut engine, 0.3);
    assert_eq!(engine.voice_count(), 0);

    // Stopping again is a harmless no-op.
    for x in 0..4 {
        engine.stop_note(cell(x, 10));
    }
}

#[test]
fn bottom_left_of_a_pentatonic_grid_is_the_base_frequency() {
    let engine = engine();
    assert_eq!(engine.frequency_of(cell(0, 14)), Some(220.0));
}

#[test]
fn frequency_map_is_deterministic() {
    let a = FrequencyMap::build(Scale::Blues, 15);
    let b = FrequencyMap::build(Scale::Blues, 15);
    for y in 0..15 {
        for x in 0..15 {
            assert_eq!(a.frequency(cell(x, y)), b.frequency(cell(x, y)));
        }
    }
}

#[test]
fn scale_change_round_trips_exactly() {
    let mut engine = engine();
    let before: Vec<Option<f32>> = (0..15)
        .flat_map(|y| (0..15).map(move |x| (x, y)))
        .map(|(x, y)| engine.frequency_of(cell(x, y)))
        .collect();

    engine.change_scale("major");
    engine.change_scale("pentatonic");

    let after: Vec<Option<f32>> = (0..15)
        .flat_map(|y| (0..15).map(move |x| (x, y)))
        .map(|(x, y)| engine.frequency_of(cell(x, y)))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn arpeggio_cycles_cells_in_insertion_order() {
    let mut engine = engine();
    let cells = [cell(0, 14), cell(3, 14), cell(6, 14)];
    engine.play_arpeggio(&cells);

    let mut order = Vec::new();
    let mut last = None;
    for _ in 0..400 {
        run(&mut engine, 0.005);
        let played = engine.last_arp_cell();
        if played != last {
            if let Some(c) = played {
                order.push(c);
            }
            last = played;
        }
    }

    assert!(order.len() >= 9, "observed only {} steps", order.len());
    for (i, c) in order.iter().enumerate() {
        assert_eq!(*c, cells[i % cells.len()], "step {i} broke the cycle");
    }
}

#[test]
fn delay_feedback_never_exceeds_the_ceiling() {
    let mut engine = engine();
    for pct in [150.0, 100.0, 99.9, 1_000.0] {
        engine.set_delay_feedback(pct);
        assert!(
            engine.delay_feedback() <= 0.9,
            "feedback {} escaped the clamp for input {pct}",
            engine.delay_feedback()
        );
    }
}

#[test]
fn stop_arpeggio_clears_every_reference() {
    let mut engine = engine();
    engine.set_glide_time(100.0);
    engine.play_arpeggio(&[cell(2, 14), cell(5, 14)]);
    run(&mut engine, 0.6);
    assert!(engine.has_arp_voice());
    assert!(engine.last_arp_cell().is_some());

    engine.stop_arpeggio();
    assert!(engine.arp_cells().is_empty());
    assert!(engine.last_arp_cell().is_none());

    // Past the fade + cleanup window the glide voice is gone too.
    run(&mut engine, 0.5);
    assert!(!engine.has_arp_voice());
}

#[test]
fn lookahead_never_duplicates_or_skips_a_step() {
    // tempo 222 -> stepInterval (60/222)/2 ~ 135.14 ms; a 100 ms window
    // sees at most one due step per drain.
    let mut clock = StepClock::new(0.0);
    let tempo = 222.0;
    let mut scheduled = Vec::new();

    // Tick every 25 ms of audio time for 2 simulated seconds.
    for tick in 0..80 {
        let now = tick as f64 * 0.025;
        while let Some((step, time)) = clock.next_due(now + 0.1, tempo) {
            scheduled.push((step, time));
        }
    }

    for (i, window) in scheduled.windows(2).enumerate() {
        assert_eq!(
            window[1].0,
            window[0].0 + 1,
            "step sequence broke at index {i}"
        );
        let dt = window[1].1 - window[0].1;
        assert!((dt - (60.0 / tempo) / 2.0).abs() < 1e-9);
    }
    assert!(scheduled.len() >= 14, "only {} steps in 2s", scheduled.len());
}

#[test]
fn output_is_finite_and_bounded_under_load() {
    let mut engine = engine();
    engine.set_delay_feedback(100.0);
    engine.set_reverb(80.0);
    for x in (0..15).step_by(2) {
        engine.play_note(cell(x, 14));
    }

    let mut l = [0.0f32; 256];
    let mut r = [0.0f32; 256];
    let mut peak = 0.0f32;
    for _ in 0..400 {
        engine.process_block(&mut l, &mut r);
        for s in l.iter().chain(r.iter()) {
            assert!(s.is_finite());
            peak = peak.max(s.abs());
        }
    }
    assert!(peak > 0.0, "eight held notes rendered silence");
    assert!(peak < 4.0, "compressed output peaked at {peak}");
}
