//! Wall-clock timing of kernel repetitions.
//!
//! [`Timer`] measures one open interval at a time. [`TimingStats`] folds the
//! per-pass measurements of one (kernel, variant, tuning) into the numbers that
//! end up in a result record.

use std::time::{Duration, Instant};

use crate::error::{Result, TimerSnafu};

/// Start/stop timer over a monotonic clock.
#[derive(Debug, Default)]
pub struct Timer {
    started: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an interval. Fails if one is already open.
    pub fn start(&mut self) -> Result<()> {
        snafu::ensure!(self.started.is_none(), TimerSnafu { reason: "start called while the timer is running" });
        self.started = Some(Instant::now());
        Ok(())
    }

    /// Close the open interval and return its length.
    pub fn stop(&mut self) -> Result<Duration> {
        match self.started.take() {
            Some(started) => Ok(Instant::now().saturating_duration_since(started)),
            None => TimerSnafu { reason: "stop called without a matching start" }.fail(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }
}

/// Timing summary over the passes of one measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingStats {
    /// Sum over all passes.
    pub total: Duration,
    /// Fastest pass.
    pub min: Duration,
    /// Average pass.
    pub mean: Duration,
    /// Every pass, in execution order.
    pub runs: Vec<Duration>,
}

impl TimingStats {
    pub fn from_runs(runs: Vec<Duration>) -> Self {
        let min = runs.iter().copied().min().unwrap_or(Duration::ZERO);
        let total: Duration = runs.iter().sum();
        let mean = total / u32::try_from(runs.len()).unwrap_or(u32::MAX).max(1);

        Self { total, min, mean, runs }
    }

    pub fn passes(&self) -> usize {
        self.runs.len()
    }
}
