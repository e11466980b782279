use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepTimings {
    pub step: Duration,
    pub record: Duration,
    pub total: Duration,
    /// Events the step emitted.
    pub events: usize,
}

/// Hook for capturing per-step timings from a `HeadlessRunner`.
pub trait Profiler {
    fn on_step(&mut self, _frame: usize, _timings: StepTimings) {}
}

/// Discards timings; plain `HeadlessRunner::step` goes through this.
impl Profiler for () {}

/// Keeps the slowest step seen so far.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlowestStep {
    pub frame: usize,
    pub timings: StepTimings,
    pub steps: usize,
}

impl Profiler for SlowestStep {
    fn on_step(&mut self, frame: usize, timings: StepTimings) {
        self.steps += 1;
        if self.steps == 1 || timings.total > self.timings.total {
            self.frame = frame;
            self.timings = timings;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slowest_step_tracks_max_total() {
        let mut slowest = SlowestStep::default();
        let at = |ms| StepTimings {
            total: Duration::from_millis(ms),
            ..StepTimings::default()
        };

        slowest.on_step(1, at(3));
        slowest.on_step(2, at(9));
        slowest.on_step(3, at(4));

        assert_eq!(slowest.steps, 3);
        assert_eq!(slowest.frame, 2);
        assert_eq!(slowest.timings.total, Duration::from_millis(9));
    }
}
