use std::collections::HashMap;

use crate::dsp::oscillator::Waveform;
use crate::graph::effects::{EffectsChain, EffectsConfig};
use crate::sequencing::clock::{StepClock, SCHEDULE_AHEAD_SECS};
use crate::sequencing::grid::{Cell, FrequencyMap};
use crate::sequencing::scale::Scale;
use crate::synth::params::EngineParams;
use crate::synth::sequencer::Arpeggio;
use crate::synth::tasks::{TaskKind, TaskQueue};
use crate::synth::voice::Voice;
use crate::MAX_BLOCK_SIZE;

/*
Audio Engine
============

Owns everything that sounds: the voice table (one held voice per grid
cell), the arpeggiator, the lookahead step clock, the deferred-task queue
and the effects chain. The whole engine advances from `process_block`,
which the audio callback drives; audio time is simply frames rendered so
far divided by the sample rate, so every scheduled event lands on an exact
sample.

Each block:

  1. drain deferred tasks whose frame deadline has passed (voice reaping,
     arpeggiator teardown)
  2. run the lookahead loop: schedule every step whose time falls inside
     the next 100 ms, even when nothing is active, so the clock stays
     phase-locked through silence
  3. mix every voice into the mono bus
  4. run the bus through the effects chain into the stereo output

Parameters live in one immutable `EngineParams` snapshot. Setters replace
the snapshot (shaping future notes) and then explicitly retarget live
voices with short ramps; nothing mutates a sounding voice behind its back.

Control calls arrive between blocks (same thread as the callback, via the
command queue), so there is exactly one writer and no locking.
*/

/// Release applied when the next arpeggio step cuts the previous note.
const ARP_NOTE_RELEASE: f64 = 0.15;

/// Fraction of one step a discrete arpeggio note nominally lasts.
const ARP_NOTE_BEAT_FRACTION: f64 = 0.9;

/// Fade applied to the glide voice when the arpeggiator stops.
const ARP_STOP_FADE: f64 = 0.1;

/// Delay before the stopped glide voice is torn down.
const ARP_STOP_CLEANUP: f64 = 0.2;

/// Fade and teardown delay when glide is switched off mid-arpeggio.
const GLIDE_OFF_FADE: f64 = 0.05;
const GLIDE_OFF_CLEANUP: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub sample_rate: f32,
    pub params: EngineParams,
    pub effects: EffectsConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            params: EngineParams::default(),
            effects: EffectsConfig::default(),
        }
    }
}

pub struct AudioEngine {
    sample_rate: f32,
    /// Frames rendered so far; `frames / sample_rate` is audio time.
    frames: u64,
    params: EngineParams,
    map: FrequencyMap,

    /// Held notes, at most one voice per cell.
    voices: HashMap<Cell, Voice>,
    /// Discrete arpeggio notes in flight; each carries its own envelope.
    transients: Vec<Voice>,
    /// The sustained glide voice, created lazily and reused across steps.
    arp_voice: Option<Voice>,
    arp: Arpeggio,

    clock: StepClock,
    tasks: TaskQueue,
    effects: EffectsChain,

    /// Pitch the last note departed from, anchoring held-note glides.
    last_frequency: Option<f32>,

    bus: Vec<f32>,
}

impl AudioEngine {
    pub fn new(config: EngineConfig) -> Self {
        let params = config.params;
        log::info!(
            "engine: sample rate {} Hz, {} scale, {}x{} grid",
            config.sample_rate,
            params.scale.name(),
            params.grid_size,
            params.grid_size,
        );
        Self {
            sample_rate: config.sample_rate,
            frames: 0,
            params,
            map: FrequencyMap::build(params.scale, params.grid_size),
            voices: HashMap::new(),
            transients: Vec::new(),
            arp_voice: None,
            arp: Arpeggio::new(),
            clock: StepClock::new(0.0),
            tasks: TaskQueue::new(),
            effects: EffectsChain::new(config.sample_rate, config.effects),
            last_frequency: None,
            bus: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    /// Current audio time in seconds.
    pub fn now(&self) -> f64 {
        self.frames as f64 / self.sample_rate as f64
    }

    fn frame_at(&self, time: f64) -> u64 {
        (time * self.sample_rate as f64).round() as u64
    }

    /// Render one block of stereo output. Larger slices are processed in
    /// chunks internally.
    pub fn process_block(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        debug_assert_eq!(out_l.len(), out_r.len());
        let mut offset = 0;
        while offset < out_l.len() {
            let n = (out_l.len() - offset).min(MAX_BLOCK_SIZE);
            self.render_chunk(
                &mut out_l[offset..offset + n],
                &mut out_r[offset..offset + n],
            );
            offset += n;
        }
    }

    fn render_chunk(&mut self, out_l: &mut [f32], out_r: &mut [f32]) {
        let n = out_l.len();
        let t0 = self.now();

        self.drain_tasks();
        self.tick(t0);

        let mut bus = std::mem::take(&mut self.bus);
        bus[..n].fill(0.0);
        for voice in self.voices.values_mut() {
            voice.render(&mut bus[..n], t0, self.sample_rate);
        }
        self.transients
            .retain_mut(|voice| voice.render(&mut bus[..n], t0, self.sample_rate));
        if let Some(voice) = self.arp_voice.as_mut() {
            voice.render(&mut bus[..n], t0, self.sample_rate);
        }

        self.effects.process(&mut bus[..n], out_l, out_r, t0);
        self.bus = bus;
        self.frames += n as u64;
    }

    fn drain_tasks(&mut self) {
        while let Some(task) = self.tasks.pop_due(self.frames) {
            match task {
                TaskKind::ReapVoice(cell) => {
                    // Only a released voice may be reaped; a re-struck cell
                    // cancelled its old task, but guard anyway.
                    if self.voices.get(&cell).is_some_and(Voice::is_released) {
                        self.voices.remove(&cell);
                    }
                }
                TaskKind::TearDownArp => {
                    self.arp_voice = None;
                }
            }
        }
    }

    /// The lookahead loop: schedule every step falling inside the window,
    /// whether or not anything is active, so the clock never drifts.
    fn tick(&mut self, now: f64) {
        let horizon = now + SCHEDULE_AHEAD_SECS;
        while let Some((step, time)) = self.clock.next_due(horizon, self.params.tempo) {
            self.schedule_step(step, time);
        }
    }

    fn schedule_step(&mut self, step: u64, time: f64) {
        let Some(cell) = self.arp.cell_for_step(step) else {
            return;
        };
        // A cell outside the current map drops silently.
        let Some(frequency) = self.map.frequency(cell) else {
            return;
        };

        if self.params.glide_enabled() {
            match self.arp_voice.as_mut() {
                Some(voice) => {
                    voice.glide_to(frequency, &self.params, time);
                    voice.cell = cell;
                }
                None => {
                    self.arp_voice =
                        Some(Voice::sustained(cell, frequency, &self.params, time));
                }
            }
        } else {
            // Cut the previous step's note at this step's start, then lay
            // down the new note with its whole envelope pre-scheduled.
            if let Some(prev) = self.transients.last_mut() {
                if prev.is_alive(time) {
                    prev.note_off_at(time, ARP_NOTE_RELEASE);
                }
            }
            let duration = (60.0 / self.params.tempo) * ARP_NOTE_BEAT_FRACTION;
            self.transients.push(Voice::transient(
                cell,
                frequency,
                &self.params,
                time,
                duration,
                ARP_NOTE_RELEASE,
            ));
        }
        self.arp.last_played = Some(cell);
        self.last_frequency = Some(frequency);
    }

    // ---- note control ----------------------------------------------------

    /// Start a sustained note for a cell. Starting a cell that is already
    /// sounding is a no-op; a cell outside the map is a silent no-op.
    pub fn play_note(&mut self, cell: Cell) {
        let Some(frequency) = self.map.frequency(cell) else {
            return;
        };
        let now = self.now();

        if let Some(existing) = self.voices.get_mut(&cell) {
            if !existing.is_released() {
                return;
            }
            // Re-striking a releasing cell replaces the voice; its pending
            // reap must never fire against the replacement.
            if let Some(task) = existing.reap_task.take() {
                self.tasks.cancel(task);
            }
        }

        let mut voice = match self.last_frequency {
            Some(prev) if self.params.glide_enabled() => {
                let mut voice = Voice::held(cell, prev, &self.params, now);
                voice.glide_to(frequency, &self.params, now);
                voice
            }
            _ => Voice::held(cell, frequency, &self.params, now),
        };
        voice.reap_task = None;
        self.voices.insert(cell, voice);
        self.last_frequency = Some(frequency);
    }

    /// Release the note for a cell. The teardown deadline is fixed from
    /// the release time in force right now; a later change to the release
    /// parameter does not move an already-scheduled teardown.
    pub fn stop_note(&mut self, cell: Cell) {
        let now = self.now();
        let release = self.params.release;
        let Some(voice) = self.voices.get_mut(&cell) else {
            return;
        };
        if voice.is_released() {
            return;
        }
        let deadline = voice.stop(now, release);
        let old = voice.reap_task.take();
        if let Some(old) = old {
            self.tasks.cancel(old);
        }
        let frame = self.frame_at(deadline);
        let task = self.tasks.schedule(frame, TaskKind::ReapVoice(cell));
        if let Some(voice) = self.voices.get_mut(&cell) {
            voice.reap_task = Some(task);
        }
    }

    /// Replace the arpeggiator's active set. Sound starts on the next
    /// scheduled step, not immediately.
    pub fn play_arpeggio(&mut self, cells: &[Cell]) {
        self.arp.clear();
        for &cell in cells {
            self.arp.add(cell);
        }
    }

    /// Clear the arpeggiator: fade and tear down the glide voice, and cut
    /// the last discrete note still sounding.
    pub fn stop_arpeggio(&mut self) {
        let now = self.now();
        self.arp.clear();

        if let Some(voice) = self.arp_voice.as_mut() {
            voice.stop(now, ARP_STOP_FADE);
            let frame = self.frame_at(now + ARP_STOP_CLEANUP);
            self.tasks.schedule(frame, TaskKind::TearDownArp);
        }
        if let Some(prev) = self.transients.last_mut() {
            if prev.is_alive(now) {
                prev.note_off_at(now, ARP_NOTE_RELEASE);
            }
        }
    }

    // ---- parameter surface -----------------------------------------------

    pub fn set_tempo(&mut self, tempo: f64) {
        if tempo > 0.0 {
            self.params.tempo = tempo;
        }
    }

    pub fn set_main_osc_type(&mut self, waveform: Waveform) {
        self.params.main_osc.waveform = waveform;
        let now = self.now();
        for voice in self.live_voices() {
            voice.swap_main_waveform(waveform, now);
        }
    }

    pub fn set_sub_osc_type(&mut self, waveform: Waveform) {
        self.params.sub_osc.waveform = waveform;
        let now = self.now();
        for voice in self.live_voices() {
            voice.swap_sub_waveform(waveform, now);
        }
    }

    pub fn set_main_osc_octave(&mut self, octave: i8) {
        self.params.main_osc.octave = octave;
        self.retune_live_voices(true);
    }

    pub fn set_sub_osc_octave(&mut self, octave: i8) {
        self.params.sub_osc.octave = octave;
        self.retune_live_voices(true);
    }

    pub fn set_main_osc_gain(&mut self, gain: f32) {
        let gain = gain.clamp(0.0, 1.0);
        self.params.main_osc.gain = gain;
        let now = self.now();
        for voice in self.live_voices() {
            voice.set_main_gain(gain, now);
        }
    }

    pub fn set_sub_osc_gain(&mut self, gain: f32) {
        let gain = gain.clamp(0.0, 1.0);
        self.params.sub_osc.gain = gain;
        let now = self.now();
        for voice in self.live_voices() {
            voice.set_sub_gain(gain, now);
        }
    }

    pub fn set_pitch_shift(&mut self, semitones: f32, smooth: bool) {
        self.params.pitch_shift = semitones;
        self.retune_live_voices(smooth);
    }

    /// Change the glide time. Setting it to zero while the glide voice is
    /// sounding fades that voice quickly and tears it down.
    pub fn set_glide_time(&mut self, glide_ms: f64) {
        self.params.glide_ms = glide_ms.max(0.0);
        if !self.params.glide_enabled() {
            let now = self.now();
            let frame = self.frame_at(now + GLIDE_OFF_CLEANUP);
            if let Some(voice) = self.arp_voice.as_mut() {
                voice.stop(now, GLIDE_OFF_FADE);
                self.tasks.schedule(frame, TaskKind::TearDownArp);
            }
        }
    }

    pub fn set_portamento_mode(&mut self, portamento: bool) {
        self.params.portamento = portamento;
    }

    pub fn set_attack(&mut self, seconds: f64) {
        self.params.attack = seconds.max(0.0);
    }

    pub fn set_release(&mut self, seconds: f64) {
        self.params.release = seconds.max(0.0);
    }

    pub fn set_filter_cutoff(&mut self, cutoff_hz: f32) {
        let now = self.now();
        self.effects.set_filter_cutoff(cutoff_hz, now);
    }

    pub fn set_filter_resonance(&mut self, resonance: f32) {
        let now = self.now();
        self.effects.set_filter_resonance(resonance, now);
    }

    pub fn set_delay_amount(&mut self, amount: f32) {
        let now = self.now();
        self.effects.set_delay_amount(amount, now);
    }

    pub fn set_delay_feedback(&mut self, percent: f32) {
        let now = self.now();
        self.effects.set_delay_feedback(percent, now);
    }

    pub fn set_reverb(&mut self, percent: f32) {
        let now = self.now();
        self.effects.set_reverb(percent, now);
    }

    pub fn set_volume(&mut self, volume: f32) {
        let now = self.now();
        self.effects.set_volume(volume, now);
    }

    /// Switch scales by name. Unknown names are ignored. Held notes are
    /// restarted under the new mapping; the arpeggiator set carries over
    /// and picks up new pitches on its next step.
    pub fn change_scale(&mut self, name: &str) {
        let Some(scale) = Scale::from_name(name) else {
            log::warn!("unknown scale {name:?} ignored");
            return;
        };
        self.set_scale(scale);
    }

    pub fn set_scale(&mut self, scale: Scale) {
        if scale == self.params.scale {
            return;
        }
        self.params.scale = scale;
        self.rebuild_map();
    }

    /// Resize the grid and rebuild the mapping. Held notes that fall
    /// outside the new grid are released.
    pub fn set_grid_size(&mut self, grid_size: u8) {
        if grid_size == 0 || grid_size == self.params.grid_size {
            return;
        }
        self.params.grid_size = grid_size;
        self.rebuild_map();
    }

    fn rebuild_map(&mut self) {
        self.map = FrequencyMap::build(self.params.scale, self.params.grid_size);
        let now = self.now();
        let held: Vec<Cell> = self
            .voices
            .iter()
            .filter(|(_, v)| !v.is_released())
            .map(|(cell, _)| *cell)
            .collect();
        for cell in held {
            match self.map.frequency(cell) {
                Some(frequency) => {
                    // Restart under the new mapping with a fresh attack.
                    self.voices
                        .insert(cell, Voice::held(cell, frequency, &self.params, now));
                }
                None => self.stop_note(cell),
            }
        }
    }

    fn retune_live_voices(&mut self, smooth: bool) {
        let now = self.now();
        let params = self.params;
        let mut retune = |voice: &mut Voice, map: &FrequencyMap| {
            if let Some(frequency) = map.frequency(voice.cell) {
                voice.retune(frequency, &params, now, smooth);
            }
        };
        for voice in self.voices.values_mut() {
            retune(voice, &self.map);
        }
        if let Some(voice) = self.arp_voice.as_mut() {
            retune(voice, &self.map);
        }
    }

    fn live_voices(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.values_mut().chain(self.arp_voice.as_mut())
    }

    // ---- introspection ---------------------------------------------------

    pub fn params(&self) -> &EngineParams {
        &self.params
    }

    pub fn frequency_of(&self, cell: Cell) -> Option<f32> {
        self.map.frequency(cell)
    }

    /// Whether a non-released voice is sounding for this cell.
    pub fn has_voice(&self, cell: Cell) -> bool {
        self.voices.get(&cell).is_some_and(|v| !v.is_released())
    }

    /// Voices still in the table, released tails included.
    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn has_arp_voice(&self) -> bool {
        self.arp_voice.is_some()
    }

    pub fn last_arp_cell(&self) -> Option<Cell> {
        self.arp.last_played
    }

    pub fn arp_cells(&self) -> &[Cell] {
        self.arp.cells()
    }

    pub fn current_step(&self) -> u64 {
        self.clock.current_step()
    }

    pub fn filter_cutoff(&self) -> f32 {
        self.effects.filter_cutoff()
    }

    pub fn filter_resonance(&self) -> f32 {
        self.effects.filter_resonance()
    }

    pub fn delay_amount(&self) -> f32 {
        self.effects.delay_amount()
    }

    pub fn delay_feedback(&self) -> f32 {
        self.effects.delay_feedback()
    }

    pub fn master_gain(&self) -> f32 {
        self.effects.master_gain()
    }
}
