//! Fixed signal topology from the voice bus to the stereo output.

/// Filter, ping-pong delay, convolution reverb, master gain and compressor.
pub mod effects;
