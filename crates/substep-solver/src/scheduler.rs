//! Fixed-size sub-step scheduling within a host step.

use substep_core::config::SolverConfig;
use substep_core::time::{SimTime, SubstepClock};
use tracing::debug;

/// Counts the logical sub-steps that fit into the host time elapsed since the
/// last one.
///
/// Typical usage, once per host step:
/// ```ignore
/// while scheduler.is_due(now) {
///     // fire callbacks with scheduler.substep_secs()
///     let steps = scheduler.complete_substep();
/// }
/// let steps = scheduler.finish_host_step();
/// ```
#[derive(Debug, Clone)]
pub struct SubstepScheduler {
    clock: SubstepClock,
    dt: f32,
    steps: u32,
}

impl SubstepScheduler {
    /// Start scheduling at `start`; the first sub-step is due one delta later.
    pub fn new(config: &SolverConfig, start: SimTime) -> Self {
        let clock = SubstepClock::new(start, config.substep_delta());
        Self {
            dt: clock.delta_secs(),
            clock,
            steps: 0,
        }
    }

    /// Returns `true` if another whole sub-step fits before `now`.
    pub fn is_due(&self, now: SimTime) -> bool {
        self.clock.is_due(now)
    }

    /// Advance the clock by one sub-step and return the number of sub-steps
    /// run so far in this host step.
    pub fn complete_substep(&mut self) -> u32 {
        self.clock.tick();
        self.steps += 1;
        self.steps
    }

    /// Close the host step: return its sub-step count and start counting
    /// from zero again. The sub-delta remainder stays on the clock.
    pub fn finish_host_step(&mut self) -> u32 {
        std::mem::take(&mut self.steps)
    }

    /// Drop every whole sub-step due at `now` without running it and return
    /// how many were dropped. The sub-delta remainder stays on the clock.
    pub fn skip(&mut self, now: SimTime) -> u64 {
        let due = self.clock.pending(now);
        self.clock.skip(due);
        due
    }

    /// Sub-steps run so far in the current host step.
    pub const fn steps(&self) -> u32 {
        self.steps
    }

    pub const fn substep_secs(&self) -> f32 {
        self.dt
    }

    pub const fn last_tick(&self) -> SimTime {
        self.clock.last_tick()
    }

    /// Switch to a new rate. Time already elapsed since the last tick is
    /// measured against the new delta.
    pub fn reconfigure(&mut self, config: &SolverConfig) {
        self.clock.set_delta(config.substep_delta());
        self.dt = self.clock.delta_secs();
        debug!(operations = config.operations, dt = self.dt, "sub-step rate changed");
    }
}
