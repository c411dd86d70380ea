/// Fixed-time ring-buffer delay line.
///
/// The delay time is set at construction (the ping-pong effect uses two
/// lines with distinct times); the engine varies the send and feedback
/// levels around the line, not the line itself.
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
}

impl DelayLine {
    pub fn new(delay_secs: f32, sample_rate: f32) -> Self {
        let delay_samples = ((delay_secs * sample_rate) as usize).max(1);
        Self {
            buffer: vec![0.0; delay_samples],
            write_pos: 0,
            delay_samples,
        }
    }

    /// Write `input`, return the sample written `delay_samples` ago.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        // Buffer length equals the delay, so the slot about to be
        // overwritten is exactly the delayed sample.
        let delayed = self.buffer[self.write_pos];
        self.buffer[self.write_pos] = input;
        self.write_pos = (self.write_pos + 1) % self.delay_samples;
        delayed
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
