/*
Scheduled Parameter Automation
==============================

Every audible control in the engine - note envelopes, oscillator frequency
glides, filter cutoff, send levels, master volume - moves through an
`AutomatedParam` rather than being assigned directly. The param holds a small
timeline of segments scheduled in audio time, so the render path can read a
sample-accurate value at any instant and control changes never produce an
audible step.

Vocabulary
----------

  segment     One scheduled transition: from (t0, v0) to (t1, v1) along a
              curve. A `Step` segment has t0 == t1 and represents an
              instantaneous set.

  anchor      The point a new ramp departs from: the end of the last
              scheduled segment. Callers that need a ramp to depart from
              "now" schedule a Step at the current value first (the
              cancel / set / ramp idiom used for note releases).

  cancel      Dropping every segment still pending at a given time. Used
              before writing a release ramp so that previously scheduled
              automation (an attack still in flight, a scheduled arpeggio
              release) cannot resurrect after a stop.

Exponential segments interpolate multiplicatively and therefore cannot pass
through zero; values are floored at a small epsilon. Gain releases target
0.001 and the owner reaps the node afterwards.
*/

/// Interpolation curve for one automation segment.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Curve {
    Step,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    t0: f64,
    v0: f32,
    t1: f64,
    v1: f32,
    curve: Curve,
}

impl Segment {
    fn value_at(&self, time: f64) -> f32 {
        if time >= self.t1 || self.t1 <= self.t0 {
            return self.v1;
        }
        if time <= self.t0 {
            return self.v0;
        }
        let progress = ((time - self.t0) / (self.t1 - self.t0)) as f32;
        match self.curve {
            Curve::Step => self.v0,
            Curve::Linear => self.v0 + (self.v1 - self.v0) * progress,
            Curve::Exponential => {
                // Multiplicative interpolation; both endpoints floored away
                // from zero so the ratio stays finite.
                let v0 = self.v0.max(EXP_FLOOR);
                let v1 = self.v1.max(EXP_FLOOR);
                v0 * (v1 / v0).powf(progress)
            }
        }
    }
}

/// Smallest magnitude an exponential segment endpoint may take.
const EXP_FLOOR: f32 = 1.0e-4;

/// A control value with a timeline of scheduled transitions.
#[derive(Debug, Clone)]
pub struct AutomatedParam {
    /// Value in effect before the first pending segment.
    base: f32,
    /// Pending segments, ordered by start time.
    segments: Vec<Segment>,
}

impl AutomatedParam {
    pub fn new(initial: f32) -> Self {
        Self {
            base: initial,
            segments: Vec::with_capacity(4),
        }
    }

    /// The value at `time`, accounting for every scheduled segment.
    pub fn value_at(&self, time: f64) -> f32 {
        let mut value = self.base;
        for seg in &self.segments {
            if time < seg.t0 {
                break;
            }
            value = seg.value_at(time);
            if time < seg.t1 {
                break;
            }
        }
        value
    }

    /// Schedule an instantaneous set at `time`.
    pub fn set_value_at(&mut self, value: f32, time: f64) {
        self.segments.push(Segment {
            t0: time,
            v0: value,
            t1: time,
            v1: value,
            curve: Curve::Step,
        });
    }

    /// Ramp linearly to `value`, arriving at `end_time`. The ramp departs
    /// from the end of the last scheduled segment, or holds instantaneously
    /// if nothing is scheduled.
    pub fn linear_ramp_to(&mut self, value: f32, end_time: f64) {
        self.push_ramp(value, end_time, Curve::Linear);
    }

    /// Ramp exponentially to `value`, arriving at `end_time`. Endpoints are
    /// floored at a small epsilon; use a near-zero target (0.001) for
    /// fade-outs, never zero itself.
    pub fn exponential_ramp_to(&mut self, value: f32, end_time: f64) {
        self.push_ramp(value.max(EXP_FLOOR), end_time, Curve::Exponential);
    }

    fn push_ramp(&mut self, value: f32, end_time: f64, curve: Curve) {
        let (t0, v0) = match self.segments.last() {
            Some(seg) => (seg.t1, seg.v1),
            // No anchor: behave as a set at the arrival time.
            None => (end_time, self.base),
        };
        let t0 = t0.min(end_time);
        self.segments.push(Segment {
            t0,
            v0,
            t1: end_time,
            v1: value,
            curve,
        });
    }

    /// Drop every segment still pending at `time`. The value the param
    /// reports afterwards is whatever the timeline had reached at `time`;
    /// callers typically follow up with `set_value_at` and a fresh ramp.
    pub fn cancel_scheduled(&mut self, time: f64) {
        // Completed history folds into the held value; pending segments die.
        self.base = self.value_at(time);
        self.segments.clear();
    }

    /// Drop only segments starting at or after `time`, leaving earlier
    /// automation (an attack still in flight) untouched. Used to rewrite
    /// the future of a timeline from a scheduled instant onwards.
    pub fn cancel_after(&mut self, time: f64) {
        self.segments.retain(|seg| seg.t0 < time);
    }

    /// Fold segments that completed before `time` into the base value.
    /// Called once per block by owners so timelines stay short-lived.
    pub fn advance_to(&mut self, time: f64) {
        let mut completed = 0;
        for seg in &self.segments {
            if seg.t1 <= time {
                completed += 1;
            } else {
                break;
            }
        }
        if completed > 0 {
            self.base = self.segments[completed - 1].v1;
            self.segments.drain(..completed);
        }
    }

    /// Whether any segment is still pending at `time`.
    pub fn is_ramping(&self, time: f64) -> bool {
        self.segments.iter().any(|seg| seg.t1 > time)
    }

    /// The value the timeline settles on once every segment completes.
    pub fn target(&self) -> f32 {
        self.segments.last().map(|seg| seg.v1).unwrap_or(self.base)
    }
}
