//! The playable instrument: voices, the lookahead sequencer, parameter
//! snapshots and the engine that ties them to the effects chain.

/// The engine: voice table, scheduler, tasks and render loop.
pub mod engine;
/// Commands crossing from the control thread into the audio callback.
pub mod message;
/// Immutable parameter snapshots shaping new notes.
pub mod params;
/// The arpeggiator's active set and step selection.
pub mod sequencer;
/// Deferred frame-deadline tasks (voice reaping, teardown).
pub mod tasks;
/// Two-oscillator voices with envelope and crossfade handling.
pub mod voice;
