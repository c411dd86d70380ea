use crate::dsp::oscillator::Waveform;
use crate::sequencing::grid::Cell;
use crate::sequencing::scale::Scale;
use crate::synth::engine::AudioEngine;

/// One control change crossing from the UI thread into the audio
/// callback. Commands are drained at the top of every block, so a change
/// takes effect at the next block boundary at the latest.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    PlayNote(Cell),
    StopNote(Cell),
    PlayArpeggio(Vec<Cell>),
    StopArpeggio,

    MainOscType(Waveform),
    SubOscType(Waveform),
    MainOscOctave(i8),
    SubOscOctave(i8),
    MainOscGain(f32),
    SubOscGain(f32),
    PitchShift { semitones: f32, smooth: bool },
    GlideTime(f64),
    PortamentoMode(bool),
    Attack(f64),
    Release(f64),

    FilterCutoff(f32),
    FilterResonance(f32),
    DelayAmount(f32),
    DelayFeedback(f32),
    Reverb(f32),
    Volume(f32),

    Tempo(f64),
    GridSize(u8),
    ChangeScale(Scale),
}

impl AudioEngine {
    /// Apply one queued command.
    pub fn apply(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::PlayNote(cell) => self.play_note(cell),
            EngineCommand::StopNote(cell) => self.stop_note(cell),
            EngineCommand::PlayArpeggio(cells) => self.play_arpeggio(&cells),
            EngineCommand::StopArpeggio => self.stop_arpeggio(),
            EngineCommand::MainOscType(wf) => self.set_main_osc_type(wf),
            EngineCommand::SubOscType(wf) => self.set_sub_osc_type(wf),
            EngineCommand::MainOscOctave(oct) => self.set_main_osc_octave(oct),
            EngineCommand::SubOscOctave(oct) => self.set_sub_osc_octave(oct),
            EngineCommand::MainOscGain(gain) => self.set_main_osc_gain(gain),
            EngineCommand::SubOscGain(gain) => self.set_sub_osc_gain(gain),
            EngineCommand::PitchShift { semitones, smooth } => {
                self.set_pitch_shift(semitones, smooth)
            }
            EngineCommand::GlideTime(ms) => self.set_glide_time(ms),
            EngineCommand::PortamentoMode(on) => self.set_portamento_mode(on),
            EngineCommand::Attack(secs) => self.set_attack(secs),
            EngineCommand::Release(secs) => self.set_release(secs),
            EngineCommand::FilterCutoff(hz) => self.set_filter_cutoff(hz),
            EngineCommand::FilterResonance(q) => self.set_filter_resonance(q),
            EngineCommand::DelayAmount(amount) => self.set_delay_amount(amount),
            EngineCommand::DelayFeedback(pct) => self.set_delay_feedback(pct),
            EngineCommand::Reverb(pct) => self.set_reverb(pct),
            EngineCommand::Volume(vol) => self.set_volume(vol),
            EngineCommand::Tempo(bpm) => self.set_tempo(bpm),
            EngineCommand::GridSize(n) => self.set_grid_size(n),
            EngineCommand::ChangeScale(scale) => self.set_scale(scale),
        }
    }

    /// Drain every pending command before rendering a block.
    pub fn drain_commands(&mut self, receiver: &mut impl CommandReceiver) {
        while let Some(command) = receiver.try_recv() {
            self.apply(command);
        }
    }
}

/// Source of queued commands, abstracted so tests can feed a plain Vec.
pub trait CommandReceiver {
    fn try_recv(&mut self) -> Option<EngineCommand>;
}

#[cfg(feature = "rtrb")]
impl CommandReceiver for rtrb::Consumer<EngineCommand> {
    fn try_recv(&mut self) -> Option<EngineCommand> {
        self.pop().ok()
    }
}

impl CommandReceiver for std::collections::VecDeque<EngineCommand> {
    fn try_recv(&mut self) -> Option<EngineCommand> {
        self.pop_front()
    }
}

/// UI-side handle to the command queue. Pushing into a full queue drops
/// the command with a warning rather than blocking the caller.
#[cfg(feature = "rtrb")]
pub struct EngineHandle {
    producer: rtrb::Producer<EngineCommand>,
}

#[cfg(feature = "rtrb")]
impl EngineHandle {
    /// Build a queue of `capacity` commands and the matching consumer for
    /// the audio callback.
    pub fn new(capacity: usize) -> (Self, rtrb::Consumer<EngineCommand>) {
        let (producer, consumer) = rtrb::RingBuffer::new(capacity);
        (Self { producer }, consumer)
    }

    pub fn send(&mut self, command: EngineCommand) {
        if let Err(rtrb::PushError::Full(dropped)) = self.producer.push(command) {
            log::warn!("command queue full, dropping {dropped:?}");
        }
    }
}
