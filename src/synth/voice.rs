use crate::dsp::oscillator::{Oscillator, Waveform};
use crate::dsp::param::AutomatedParam;
use crate::sequencing::grid::Cell;
use crate::synth::params::EngineParams;
use crate::synth::tasks::TaskId;
use crate::MIN_LEVEL;

/*
Voices
======

A voice is two oscillator layers (main + sub, the sub sitting octaves below)
behind a shared note-gain envelope. Everything audible about a voice moves
through `AutomatedParam` timelines:

  attack      0 -> 0.7 linear over the attack time at note start
  release     cancel / snapshot / exponential to 0.001 at note stop
  glide       frequency ramp on both layers, linear or exponential

Timbre changes on a sounding voice never mutate an oscillator's waveform.
The slot swaps in a fresh oscillator and crossfades old against new over a
short window, then drops the old one. Swapping again mid-crossfade collapses
the unfinished fade first, so at most two oscillators ever run per slot.

A voice is done once its release tail plus a safety margin has passed; the
owner reaps it from the active set at that deadline.
*/

/// Sustain level every note envelope targets.
pub const NOTE_GAIN_TARGET: f32 = 0.7;

/// Extra tail kept after a release before a voice may be reaped.
pub const STOP_MARGIN_SECS: f64 = 0.1;

/// Length of the old-vs-new crossfade when swapping waveforms.
pub const SWAP_CROSSFADE_SECS: f64 = 0.03;

/// Ramp applied to live retunes and gain changes.
const RETUNE_SECS: f64 = 0.03;

enum SlotStage {
    Single(Oscillator),
    Crossfading {
        old: Oscillator,
        old_gain: AutomatedParam,
        new: Oscillator,
        new_gain: AutomatedParam,
        done_at: f64,
    },
}

/// One oscillator layer of a voice, with waveform swaps handled as
/// crossfades between a retiring and an incoming oscillator.
pub struct OscSlot {
    stage: SlotStage,
}

impl OscSlot {
    fn new(waveform: Waveform, frequency_hz: f32) -> Self {
        Self {
            stage: SlotStage::Single(Oscillator::new(waveform, frequency_hz)),
        }
    }

    /// The waveform the slot is heading towards.
    pub fn waveform(&self) -> Waveform {
        match &self.stage {
            SlotStage::Single(osc) => osc.waveform(),
            SlotStage::Crossfading { new, .. } => new.waveform(),
        }
    }

    /// Swap to `waveform` behind a crossfade starting at `now`. Same-value
    /// swaps are no-ops; a swap landing mid-crossfade collapses the
    /// unfinished fade first.
    pub fn swap_waveform(&mut self, waveform: Waveform, now: f64) {
        if self.waveform() == waveform {
            return;
        }
        self.collapse();

        let stage = std::mem::replace(&mut self.stage, SlotStage::new_placeholder());
        let old = match stage {
            SlotStage::Single(osc) => osc,
            // collapse() above guarantees Single.
            SlotStage::Crossfading { new, .. } => new,
        };

        let mut new = Oscillator::new(waveform, 0.0);
        new.frequency = old.frequency.clone();

        let mut old_gain = AutomatedParam::new(1.0);
        old_gain.set_value_at(1.0, now);
        old_gain.linear_ramp_to(0.0, now + SWAP_CROSSFADE_SECS);
        let mut new_gain = AutomatedParam::new(0.0);
        new_gain.set_value_at(0.0, now);
        new_gain.linear_ramp_to(1.0, now + SWAP_CROSSFADE_SECS);

        self.stage = SlotStage::Crossfading {
            old,
            old_gain,
            new,
            new_gain,
            done_at: now + SWAP_CROSSFADE_SECS,
        };
    }

    /// Drop the retiring oscillator once its fade has completed.
    fn maybe_collapse(&mut self, now: f64) {
        if let SlotStage::Crossfading { done_at, .. } = &self.stage {
            if now >= *done_at {
                self.collapse();
            }
        }
    }

    fn collapse(&mut self) {
        let stage = std::mem::replace(&mut self.stage, SlotStage::new_placeholder());
        self.stage = match stage {
            SlotStage::Single(osc) => SlotStage::Single(osc),
            SlotStage::Crossfading { new, .. } => SlotStage::Single(new),
        };
    }

    /// Apply `f` to every live frequency timeline in the slot.
    fn for_each_frequency(&mut self, mut f: impl FnMut(&mut AutomatedParam)) {
        match &mut self.stage {
            SlotStage::Single(osc) => f(&mut osc.frequency),
            SlotStage::Crossfading { old, new, .. } => {
                f(&mut old.frequency);
                f(&mut new.frequency);
            }
        }
    }

    #[inline]
    fn sample(&mut self, time: f64, sample_rate: f32) -> f32 {
        match &mut self.stage {
            SlotStage::Single(osc) => osc.next_sample(time, sample_rate),
            SlotStage::Crossfading {
                old,
                old_gain,
                new,
                new_gain,
                ..
            } => {
                old.next_sample(time, sample_rate) * old_gain.value_at(time)
                    + new.next_sample(time, sample_rate) * new_gain.value_at(time)
            }
        }
    }
}

impl SlotStage {
    fn new_placeholder() -> Self {
        SlotStage::Single(Oscillator::new(Waveform::Sine, 0.0))
    }
}

/// A sounding note: two oscillator layers under one envelope.
pub struct Voice {
    pub cell: Cell,
    main: OscSlot,
    sub: OscSlot,
    main_gain: AutomatedParam,
    sub_gain: AutomatedParam,
    note_gain: AutomatedParam,
    start_time: f64,
    /// Past this instant the voice renders nothing and may be reaped.
    stop_at: Option<f64>,
    released: bool,
    /// Pending reap task, cancelled if the voice is re-struck.
    pub reap_task: Option<TaskId>,
}

impl Voice {
    fn build(cell: Cell, frequency_hz: f32, params: &EngineParams, start_time: f64) -> Self {
        let main_hz = frequency_hz * params.main_osc.pitch_multiplier(params.pitch_shift);
        let sub_hz = frequency_hz * params.sub_osc.pitch_multiplier(params.pitch_shift);
        Self {
            cell,
            main: OscSlot::new(params.main_osc.waveform, main_hz),
            sub: OscSlot::new(params.sub_osc.waveform, sub_hz),
            main_gain: AutomatedParam::new(params.main_osc.gain),
            sub_gain: AutomatedParam::new(params.sub_osc.gain),
            note_gain: AutomatedParam::new(0.0),
            start_time,
            stop_at: None,
            released: false,
            reap_task: None,
        }
    }

    /// A held note: attack ramp to the sustain level, sounding until
    /// explicitly stopped.
    pub fn held(cell: Cell, frequency_hz: f32, params: &EngineParams, now: f64) -> Self {
        let mut voice = Self::build(cell, frequency_hz, params, now);
        voice.note_gain.set_value_at(0.0, now);
        voice
            .note_gain
            .linear_ramp_to(NOTE_GAIN_TARGET, now + params.attack);
        voice
    }

    /// The arpeggiator's gliding voice: held at the sustain level with no
    /// attack of its own, retargeted in pitch on every step.
    pub fn sustained(cell: Cell, frequency_hz: f32, params: &EngineParams, now: f64) -> Self {
        let mut voice = Self::build(cell, frequency_hz, params, now);
        voice.note_gain.set_value_at(NOTE_GAIN_TARGET, now);
        voice
    }

    /// One scheduled arpeggio note with its whole envelope written up
    /// front: attack, hold for `duration`, release. Renders nothing before
    /// `start` and finishes on its own.
    pub fn transient(
        cell: Cell,
        frequency_hz: f32,
        params: &EngineParams,
        start: f64,
        duration: f64,
        release: f64,
    ) -> Self {
        let mut voice = Self::build(cell, frequency_hz, params, start);
        voice.note_gain.set_value_at(0.0, start);
        voice
            .note_gain
            .linear_ramp_to(NOTE_GAIN_TARGET, start + params.attack);
        voice.note_gain.set_value_at(NOTE_GAIN_TARGET, start + duration);
        voice
            .note_gain
            .exponential_ramp_to(MIN_LEVEL, start + duration + release);
        voice.stop_at = Some(start + duration + release + STOP_MARGIN_SECS);
        voice.released = true;
        voice
    }

    /// Release the note: cancel pending envelope automation, hold the level
    /// reached so far, fade exponentially to near-silence. Returns the
    /// instant after which the voice may be reaped.
    pub fn stop(&mut self, now: f64, release: f64) -> f64 {
        let held = self.note_gain.value_at(now);
        self.note_gain.cancel_scheduled(now);
        self.note_gain.set_value_at(held, now);
        self.note_gain.exponential_ramp_to(MIN_LEVEL, now + release);

        let deadline = now + release + STOP_MARGIN_SECS;
        self.stop_at = Some(deadline);
        self.released = true;
        deadline
    }

    /// Schedule a release starting at a future instant `at`, leaving the
    /// envelope before `at` (an attack still in flight) untouched. Used by
    /// the sequencer to cut the previous arpeggio note at the next step.
    pub fn note_off_at(&mut self, at: f64, release: f64) -> f64 {
        self.note_gain.cancel_after(at);
        let held = self.note_gain.value_at(at);
        self.note_gain.set_value_at(held, at);
        self.note_gain.exponential_ramp_to(MIN_LEVEL, at + release);

        let deadline = at + release + STOP_MARGIN_SECS;
        self.stop_at = Some(deadline);
        self.released = true;
        deadline
    }

    /// Glide both layers to the pitch mapped from `frequency_hz`,
    /// exponential when portamento is on, linear otherwise.
    pub fn glide_to(&mut self, frequency_hz: f32, params: &EngineParams, now: f64) {
        let glide = params.glide_secs();
        let portamento = params.portamento;
        let targets = [
            frequency_hz * params.main_osc.pitch_multiplier(params.pitch_shift),
            frequency_hz * params.sub_osc.pitch_multiplier(params.pitch_shift),
        ];
        for (slot, target) in [&mut self.main, &mut self.sub].into_iter().zip(targets) {
            slot.for_each_frequency(|freq| {
                let current = freq.value_at(now);
                freq.cancel_scheduled(now);
                freq.set_value_at(current, now);
                if portamento {
                    freq.exponential_ramp_to(target, now + glide);
                } else {
                    freq.linear_ramp_to(target, now + glide);
                }
            });
        }
    }

    /// Retune the voice after a mapping change (scale, octave, pitch
    /// shift). `smooth` applies a short ramp; otherwise the change lands
    /// immediately.
    pub fn retune(&mut self, frequency_hz: f32, params: &EngineParams, now: f64, smooth: bool) {
        let targets = [
            frequency_hz * params.main_osc.pitch_multiplier(params.pitch_shift),
            frequency_hz * params.sub_osc.pitch_multiplier(params.pitch_shift),
        ];
        for (slot, target) in [&mut self.main, &mut self.sub].into_iter().zip(targets) {
            slot.for_each_frequency(|freq| {
                let current = freq.value_at(now);
                freq.cancel_scheduled(now);
                if smooth {
                    freq.set_value_at(current, now);
                    freq.exponential_ramp_to(target, now + RETUNE_SECS);
                } else {
                    freq.set_value_at(target, now);
                }
            });
        }
    }

    pub fn swap_main_waveform(&mut self, waveform: Waveform, now: f64) {
        self.main.swap_waveform(waveform, now);
    }

    pub fn swap_sub_waveform(&mut self, waveform: Waveform, now: f64) {
        self.sub.swap_waveform(waveform, now);
    }

    pub fn set_main_gain(&mut self, gain: f32, now: f64) {
        retarget_gain(&mut self.main_gain, gain, now);
    }

    pub fn set_sub_gain(&mut self, gain: f32, now: f64) {
        retarget_gain(&mut self.sub_gain, gain, now);
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Whether the voice has anything left to render after `time`.
    pub fn is_alive(&self, time: f64) -> bool {
        self.stop_at.map_or(true, |stop| time < stop)
    }

    /// Mix this voice into the mono bus. Returns false once the voice has
    /// run past its stop deadline and can be dropped.
    pub fn render(&mut self, bus: &mut [f32], t0: f64, sample_rate: f32) -> bool {
        let dt = 1.0 / sample_rate as f64;
        let t_end = t0 + bus.len() as f64 * dt;
        if !self.is_alive(t0) || t_end <= self.start_time {
            return self.is_alive(t_end);
        }

        self.main.maybe_collapse(t0);
        self.sub.maybe_collapse(t0);
        self.note_gain.advance_to(t0);
        self.main_gain.advance_to(t0);
        self.sub_gain.advance_to(t0);

        for (i, slot) in bus.iter_mut().enumerate() {
            let t = t0 + i as f64 * dt;
            if t < self.start_time {
                continue;
            }
            if let Some(stop) = self.stop_at {
                if t >= stop {
                    break;
                }
            }
            let layered = self.main.sample(t, sample_rate) * self.main_gain.value_at(t)
                + self.sub.sample(t, sample_rate) * self.sub_gain.value_at(t);
            *slot += layered * self.note_gain.value_at(t);
        }

        self.is_alive(t_end)
    }
}

fn retarget_gain(gain: &mut AutomatedParam, target: f32, now: f64) {
    let current = gain.value_at(now);
    gain.cancel_scheduled(now);
    gain.set_value_at(current, now);
    gain.linear_ramp_to(target, now + RETUNE_SECS);
}
