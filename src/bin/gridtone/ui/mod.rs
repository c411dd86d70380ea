//! TUI for gridtone.
//!
//! The grid is the instrument: arrow keys move the cursor, space toggles a
//! cell, and the side panel tracks every engine parameter the keys adjust.

mod grid;
mod panel;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use rtrb::Consumer;

use gridtone::dsp::oscillator::Waveform;
use gridtone::sequencing::grid::Cell;
use gridtone::sequencing::scale::Scale;
use gridtone::synth::message::{EngineCommand, EngineHandle};
use gridtone::synth::params::EngineParams;

use grid::render_grid;
use panel::{render_params, render_transport, AudioStats};

/// Audio visualization buffer size.
const VIS_BUFFER_SIZE: usize = 1024;

const GLIDE_STEPS_MS: [f64; 3] = [0.0, 60.0, 120.0];
const WAVEFORMS: [Waveform; 4] = [
    Waveform::Sine,
    Waveform::Square,
    Waveform::Sawtooth,
    Waveform::Triangle,
];

/// The UI's mirror of engine state. The engine never reports back; the UI
/// applies the same clamps locally so the panel matches what sounds.
pub struct ParamsMirror {
    pub params: EngineParams,
    pub filter_cutoff: f32,
    pub filter_resonance: f32,
    pub delay_amount: f32,
    pub delay_feedback_pct: f32,
    pub reverb_pct: f32,
    pub volume: f32,
    pub arp_on: bool,
}

pub struct UiApp {
    handle: EngineHandle,
    audio_rx: Consumer<f32>,
    audio_buffer: Vec<f32>,
    sample_rate: f32,

    mirror: ParamsMirror,
    cursor: Cell,
    active: Vec<Cell>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        handle: EngineHandle,
        audio_rx: Consumer<f32>,
        params: EngineParams,
        sample_rate: f32,
    ) -> Self {
        Self {
            handle,
            audio_rx,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            sample_rate,
            mirror: ParamsMirror {
                params,
                filter_cutoff: 2_000.0,
                filter_resonance: 0.0,
                delay_amount: 0.3,
                delay_feedback_pct: 75.0,
                reverb_pct: 30.0,
                volume: 0.1,
                arp_on: false,
            },
            cursor: Cell::new(0, params.grid_size.saturating_sub(1)),
            active: Vec::new(),
            should_quit: false,
        }
    }

    /// Run the UI event loop.
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            terminal.draw(|frame| self.render(frame))?;

            // Non-blocking input at ~60 fps.
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        self.silence_all();
        Ok(())
    }

    fn poll_audio(&mut self) {
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.rotate_left(1);
            if let Some(last) = self.audio_buffer.last_mut() {
                *last = sample;
            }
        }
    }

    fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(frame.area());

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_transport(frame, rows[0], &self.mirror, &stats, self.sample_rate);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(34)])
            .split(rows[1]);

        render_grid(
            frame,
            cols[0],
            self.mirror.params.grid_size,
            &self.active,
            self.cursor,
        );
        render_params(frame, cols[1], &self.mirror);
    }

    fn handle_key(&mut self, code: KeyCode) {
        let grid_max = self.mirror.params.grid_size.saturating_sub(1);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,

            KeyCode::Left => self.cursor.x = self.cursor.x.saturating_sub(1),
            KeyCode::Right => self.cursor.x = (self.cursor.x + 1).min(grid_max),
            KeyCode::Up => self.cursor.y = self.cursor.y.saturating_sub(1),
            KeyCode::Down => self.cursor.y = (self.cursor.y + 1).min(grid_max),

            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_cell(),
            KeyCode::Char('a') => self.toggle_arpeggio(),
            KeyCode::Char('c') => self.silence_all(),

            KeyCode::Char(c @ '1'..='5') => self.choose_scale(c),
            KeyCode::Char('w') => self.cycle_waveform(false),
            KeyCode::Char('W') => self.cycle_waveform(true),
            KeyCode::Char('g') => self.cycle_glide(),
            KeyCode::Char('p') => {
                self.mirror.params.portamento = !self.mirror.params.portamento;
                self.handle
                    .send(EngineCommand::PortamentoMode(self.mirror.params.portamento));
            }

            KeyCode::Char('[') => self.nudge_cutoff(1.0 / 1.25),
            KeyCode::Char(']') => self.nudge_cutoff(1.25),
            KeyCode::Char('r') => self.nudge_resonance(-1.0),
            KeyCode::Char('R') => self.nudge_resonance(1.0),
            KeyCode::Char('d') => self.nudge_delay(-0.05),
            KeyCode::Char('D') => self.nudge_delay(0.05),
            KeyCode::Char('f') => self.nudge_feedback(-5.0),
            KeyCode::Char('F') => self.nudge_feedback(5.0),
            KeyCode::Char('v') => self.nudge_reverb(-5.0),
            KeyCode::Char('V') => self.nudge_reverb(5.0),
            KeyCode::Char('-') => self.nudge_volume(-0.02),
            KeyCode::Char('=') => self.nudge_volume(0.02),
            _ => {}
        }
    }

    fn toggle_cell(&mut self) {
        let cell = self.cursor;
        if let Some(pos) = self.active.iter().position(|c| *c == cell) {
            self.active.remove(pos);
            if !self.mirror.arp_on {
                self.handle.send(EngineCommand::StopNote(cell));
            }
        } else {
            self.active.push(cell);
            if !self.mirror.arp_on {
                self.handle.send(EngineCommand::PlayNote(cell));
            }
        }
        if self.mirror.arp_on {
            self.handle
                .send(EngineCommand::PlayArpeggio(self.active.clone()));
        }
    }

    fn toggle_arpeggio(&mut self) {
        self.mirror.arp_on = !self.mirror.arp_on;
        if self.mirror.arp_on {
            for cell in &self.active {
                self.handle.send(EngineCommand::StopNote(*cell));
            }
            self.handle
                .send(EngineCommand::PlayArpeggio(self.active.clone()));
        } else {
            self.handle.send(EngineCommand::StopArpeggio);
            for cell in &self.active {
                self.handle.send(EngineCommand::PlayNote(*cell));
            }
        }
    }

    fn silence_all(&mut self) {
        for cell in std::mem::take(&mut self.active) {
            self.handle.send(EngineCommand::StopNote(cell));
        }
        self.handle.send(EngineCommand::StopArpeggio);
    }

    fn choose_scale(&mut self, key: char) {
        let scale = match key {
            '1' => Scale::Pentatonic,
            '2' => Scale::Major,
            '3' => Scale::Minor,
            '4' => Scale::HarmonicMinor,
            _ => Scale::Blues,
        };
        self.mirror.params.scale = scale;
        self.handle.send(EngineCommand::ChangeScale(scale));
    }

    fn cycle_waveform(&mut self, sub: bool) {
        let current = if sub {
            self.mirror.params.sub_osc.waveform
        } else {
            self.mirror.params.main_osc.waveform
        };
        let idx = WAVEFORMS.iter().position(|w| *w == current).unwrap_or(0);
        let next = WAVEFORMS[(idx + 1) % WAVEFORMS.len()];
        if sub {
            self.mirror.params.sub_osc.waveform = next;
            self.handle.send(EngineCommand::SubOscType(next));
        } else {
            self.mirror.params.main_osc.waveform = next;
            self.handle.send(EngineCommand::MainOscType(next));
        }
    }

    fn cycle_glide(&mut self) {
        let current = self.mirror.params.glide_ms;
        let idx = GLIDE_STEPS_MS
            .iter()
            .position(|g| (*g - current).abs() < 1e-9)
            .unwrap_or(0);
        let next = GLIDE_STEPS_MS[(idx + 1) % GLIDE_STEPS_MS.len()];
        self.mirror.params.glide_ms = next;
        self.handle.send(EngineCommand::GlideTime(next));
    }

    fn nudge_cutoff(&mut self, factor: f32) {
        self.mirror.filter_cutoff = (self.mirror.filter_cutoff * factor).clamp(20.0, 20_000.0);
        self.handle
            .send(EngineCommand::FilterCutoff(self.mirror.filter_cutoff));
    }

    fn nudge_resonance(&mut self, delta: f32) {
        self.mirror.filter_resonance = (self.mirror.filter_resonance + delta).clamp(0.0, 20.0);
        self.handle
            .send(EngineCommand::FilterResonance(self.mirror.filter_resonance));
    }

    fn nudge_delay(&mut self, delta: f32) {
        self.mirror.delay_amount = (self.mirror.delay_amount + delta).clamp(0.0, 1.0);
        self.handle
            .send(EngineCommand::DelayAmount(self.mirror.delay_amount));
    }

    fn nudge_feedback(&mut self, delta: f32) {
        self.mirror.delay_feedback_pct =
            (self.mirror.delay_feedback_pct + delta).clamp(0.0, 100.0);
        self.handle
            .send(EngineCommand::DelayFeedback(self.mirror.delay_feedback_pct));
    }

    fn nudge_reverb(&mut self, delta: f32) {
        self.mirror.reverb_pct = (self.mirror.reverb_pct + delta).clamp(0.0, 100.0);
        self.handle.send(EngineCommand::Reverb(self.mirror.reverb_pct));
    }

    fn nudge_volume(&mut self, delta: f32) {
        self.mirror.volume = (self.mirror.volume + delta).clamp(0.0, 1.0);
        self.handle.send(EngineCommand::Volume(self.mirror.volume));
    }
}
