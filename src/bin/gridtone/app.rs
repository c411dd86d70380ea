//! Gridtone - audio setup and the render callback.

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use gridtone::graph::effects::EffectsConfig;
use gridtone::synth::engine::{AudioEngine, EngineConfig};
use gridtone::synth::message::EngineHandle;
use gridtone::MAX_BLOCK_SIZE;

use crate::ui::UiApp;

/// Commands the UI can queue before the audio thread notices.
const COMMAND_CAPACITY: usize = 256;

/// Samples tapped off for the waveform display.
const AUDIO_TAP_CAPACITY: usize = 8_192;

/// Application builder: owns the audio device setup and hands the engine
/// to the output stream, then runs the TUI on the main thread.
pub struct Gridtone {
    params: gridtone::synth::params::EngineParams,
    effects: EffectsConfig,
}

impl Gridtone {
    pub fn new() -> Self {
        Self {
            params: Default::default(),
            effects: EffectsConfig::default(),
        }
    }

    /// Run the application (takes over the terminal, plays audio).
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let channels = config.channels() as usize;
        if channels == 0 {
            return Err(eyre!("output device reports zero channels"));
        }

        let (handle, mut commands) = EngineHandle::new(COMMAND_CAPACITY);
        let (mut tap_tx, tap_rx) = rtrb::RingBuffer::<f32>::new(AUDIO_TAP_CAPACITY);

        let mut engine = AudioEngine::new(EngineConfig {
            sample_rate,
            params: self.params,
            effects: self.effects,
        });
        let initial = *engine.params();

        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _| {
                    engine.drain_commands(&mut commands);

                    let total_frames = data.len() / channels;
                    let mut frames_written = 0;
                    while frames_written < total_frames {
                        let n = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                        engine.process_block(&mut left[..n], &mut right[..n]);

                        let out_off = frames_written * channels;
                        for i in 0..n {
                            for ch in 0..channels {
                                let sample = if ch % 2 == 0 { left[i] } else { right[i] };
                                data[out_off + i * channels + ch] = sample;
                            }
                            // Mono tap for the display; a full buffer just
                            // drops samples.
                            let _ = tap_tx.push(0.5 * (left[i] + right[i]));
                        }
                        frames_written += n;
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start audio stream")?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(handle, tap_rx, initial, sample_rate).run(&mut terminal);
        ratatui::restore();
        result
    }
}

impl Default for Gridtone {
    fn default() -> Self {
        Self::new()
    }
}
