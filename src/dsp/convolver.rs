use std::collections::VecDeque;
use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

/*
Convolution Reverb
==================

The reverb convolves the delay sends against a procedurally generated
impulse response (IR) - a burst of decaying noise - rather than running an
algorithmic reverb network. The IR is a few seconds long (120k samples at
48 kHz for the default 2.5 s), far too long for direct convolution, so the
convolver uses uniform partitioned convolution:

  1. The IR is split into 1024-sample partitions; each partition's FFT is
     precomputed at construction.
  2. Incoming audio is gathered into 1024-sample blocks. Each block is
     FFT'd once and kept in a frequency-domain delay line.
  3. The output block is the inverse FFT of
        sum over j of  input_spectrum[now - j] * ir_spectrum[j]
     with overlap-add across block boundaries (FFT size 2048 = 2 blocks).

Cost per sample is O(num_partitions) complex multiplies amortized - flat and
allocation-free once constructed. The scheme introduces one partition of
latency on the wet path, which reads as a short pre-delay on the reverb.

Impulse response shape (per channel, independently random):

  n      = i / len
  sample = (1 - n)^2 * rand(0..1) * 0.5 * rand(-1..1)

i.e. white noise under a squared decay curve - a bright burst that darkens
into silence, the classic cheap-and-cheerful synthetic room.
*/

/// Partition length in samples; FFT size is twice this.
pub const PARTITION_SIZE: usize = 1024;
const FFT_SIZE: usize = 2 * PARTITION_SIZE;

/// Minimum impulse-response duration in seconds.
pub const MIN_IR_SECS: f32 = 0.1;

/// Generate one channel of a synthetic impulse response.
fn generate_channel(len: usize) -> Vec<f32> {
    let mut channel = Vec::with_capacity(len);
    for i in 0..len {
        let n = i as f32 / len as f32;
        let amplitude = (1.0 - n) * (1.0 - n) * fastrand::f32() * 0.5;
        channel.push(amplitude * (fastrand::f32() * 2.0 - 1.0));
    }
    channel
}

/// Generate an uncorrelated stereo impulse response of `duration_secs`
/// (floored at [`MIN_IR_SECS`]).
pub fn generate_impulse_response(duration_secs: f32, sample_rate: f32) -> (Vec<f32>, Vec<f32>) {
    let duration = duration_secs.max(MIN_IR_SECS);
    let len = (sample_rate * duration) as usize;
    (generate_channel(len), generate_channel(len))
}

/// Mono partitioned-FFT convolver.
pub struct Convolver {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    ifft_scratch: Vec<Complex<f32>>,

    /// Precomputed spectrum of each IR partition.
    ir_spectra: Vec<Vec<Complex<f32>>>,
    /// Ring of past input-block spectra, newest at `head`.
    input_spectra: Vec<Vec<Complex<f32>>>,
    head: usize,

    /// Input samples waiting to fill the next partition.
    pending: Vec<f32>,
    /// Second half of the previous inverse FFT, added to the next block.
    overlap: Vec<f32>,
    /// Rendered samples not yet handed to the caller.
    ready: VecDeque<f32>,

    /// Shared FFT workspace.
    work: Vec<Complex<f32>>,
    accum: Vec<Complex<f32>>,
}

impl Convolver {
    pub fn new(impulse_response: &[f32]) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let ifft = planner.plan_fft_inverse(FFT_SIZE);
        let fft_scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
        let ifft_scratch = vec![Complex::default(); ifft.get_inplace_scratch_len()];

        // Precompute each partition's spectrum, zero-padded to FFT_SIZE.
        let num_partitions = impulse_response.len().div_ceil(PARTITION_SIZE).max(1);
        let mut ir_spectra = Vec::with_capacity(num_partitions);
        let mut scratch = fft_scratch.clone();
        for part in 0..num_partitions {
            let start = part * PARTITION_SIZE;
            let end = (start + PARTITION_SIZE).min(impulse_response.len());
            let mut spectrum = vec![Complex::default(); FFT_SIZE];
            for (slot, &sample) in spectrum.iter_mut().zip(&impulse_response[start..end]) {
                slot.re = sample;
            }
            fft.process_with_scratch(&mut spectrum, &mut scratch);
            ir_spectra.push(spectrum);
        }

        let input_spectra = vec![vec![Complex::default(); FFT_SIZE]; num_partitions];

        Self {
            fft,
            ifft,
            fft_scratch,
            ifft_scratch,
            ir_spectra,
            input_spectra,
            head: 0,
            pending: Vec::with_capacity(PARTITION_SIZE),
            overlap: vec![0.0; PARTITION_SIZE],
            ready: VecDeque::with_capacity(2 * PARTITION_SIZE + 1),
            work: vec![Complex::default(); FFT_SIZE],
            accum: vec![Complex::default(); FFT_SIZE],
        }
    }

    pub fn num_partitions(&self) -> usize {
        self.ir_spectra.len()
    }

    /// Convolve `input` into `out` (equal lengths). Output lags the input
    /// by up to one partition while the first block fills.
    pub fn process(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), out.len());

        for (&sample, slot) in input.iter().zip(out.iter_mut()) {
            self.pending.push(sample);
            if self.pending.len() == PARTITION_SIZE {
                self.render_partition();
            }
            *slot = self.ready.pop_front().unwrap_or(0.0);
        }
    }

    fn render_partition(&mut self) {
        let parts = self.ir_spectra.len();

        // FFT the new input block into the ring.
        self.head = (self.head + 1) % parts;
        let spectrum = &mut self.input_spectra[self.head];
        for (slot, &sample) in spectrum.iter_mut().zip(self.pending.iter()) {
            *slot = Complex::new(sample, 0.0);
        }
        for slot in spectrum.iter_mut().skip(PARTITION_SIZE) {
            *slot = Complex::default();
        }
        self.fft.process_with_scratch(spectrum, &mut self.fft_scratch);
        self.pending.clear();

        // Multiply-accumulate over all partitions.
        self.accum.fill(Complex::default());
        for (age, ir_spectrum) in self.ir_spectra.iter().enumerate() {
            let idx = (self.head + parts - age) % parts;
            let block = &self.input_spectra[idx];
            for ((acc, &x), &h) in self.accum.iter_mut().zip(block).zip(ir_spectrum) {
                *acc += x * h;
            }
        }

        // Back to the time domain with overlap-add.
        self.work.copy_from_slice(&self.accum);
        self.ifft
            .process_with_scratch(&mut self.work, &mut self.ifft_scratch);
        let scale = 1.0 / FFT_SIZE as f32;
        for i in 0..PARTITION_SIZE {
            self.ready
                .push_back(self.work[i].re * scale + self.overlap[i]);
            self.overlap[i] = self.work[PARTITION_SIZE + i].re * scale;
        }
    }
}

/// Stereo convolver pair sharing one mono input (independent IR channels).
pub struct StereoConvolver {
    left: Convolver,
    right: Convolver,
}

impl StereoConvolver {
    pub fn new(ir_left: &[f32], ir_right: &[f32]) -> Self {
        Self {
            left: Convolver::new(ir_left),
            right: Convolver::new(ir_right),
        }
    }

    pub fn process(&mut self, input: &[f32], out_left: &mut [f32], out_right: &mut [f32]) {
        self.left.process(input, out_left);
        self.right.process(input, out_right);
    }
}
