/*
Lookahead Step Clock
====================

The sequencer never schedules "now": every step event carries a timestamp a
little ahead of the current audio time, so note starts are sample-accurate
no matter how coarsely the control loop ticks. The clock keeps two cursors:

  current_step     monotonically increasing step counter
  next_step_time   audio time the next step is due, in seconds

On each engine tick the owner drains every step whose time falls inside the
lookahead window (`now + SCHEDULE_AHEAD_SECS`) and schedules audio events at
the step's exact timestamp. The clock advances whether or not anything is
sounding - an idle sequencer stays phase-locked, so notes that arrive later
land on the grid of the ongoing pulse.

Two steps per beat: step_interval = (60 / tempo) / 2 seconds.
*/

/// How far ahead of the audio clock steps are scheduled.
pub const SCHEDULE_AHEAD_SECS: f64 = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct StepClock {
    current_step: u64,
    next_step_time: f64,
}

impl StepClock {
    pub fn new(start_time: f64) -> Self {
        Self {
            current_step: 0,
            next_step_time: start_time,
        }
    }

    /// Seconds between steps at `tempo` BPM (two steps per beat).
    pub fn step_interval(tempo: f64) -> f64 {
        (60.0 / tempo) / 2.0
    }

    /// Pop the next step if it is due before `horizon`, advancing the
    /// clock. Owners call this in a loop per tick:
    ///
    /// ```ignore
    /// while let Some((step, at)) = clock.next_due(now + SCHEDULE_AHEAD_SECS, tempo) {
    ///     schedule_step(step, at);
    /// }
    /// ```
    pub fn next_due(&mut self, horizon: f64, tempo: f64) -> Option<(u64, f64)> {
        if self.next_step_time >= horizon {
            return None;
        }
        let due = (self.current_step, self.next_step_time);
        self.current_step += 1;
        self.next_step_time += Self::step_interval(tempo);
        Some(due)
    }

    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    pub fn next_step_time(&self) -> f64 {
        self.next_step_time
    }
}
