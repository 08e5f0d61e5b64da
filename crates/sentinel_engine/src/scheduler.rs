use std::convert::Infallible;
use std::time::Duration;

use sentinel_logging::{set_cycle, sentinel_trace};
use tokio::time::Instant;

/// Work run once per poll cycle. Implementations handle their own errors:
/// nothing propagates out of a cycle.
#[async_trait::async_trait]
pub trait PollTask: Send {
    async fn run_once(&mut self);
}

/// Runs a task on a fixed cadence, compensating for how long the task took.
///
/// Cycles never overlap. A cycle that overruns the period is followed
/// immediately by the next one; missed cycles are not made up.
#[derive(Debug, Clone, Copy)]
pub struct PollScheduler {
    period: Duration,
    cycle: u64,
}

impl PollScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period, cycle: 0 }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Never returns; the process is stopped from outside.
    pub async fn run_forever(&mut self, task: &mut dyn PollTask) -> Infallible {
        loop {
            self.run_cycle(task).await;
        }
    }

    /// Runs exactly `cycles` cycles, including the trailing sleep of the last one.
    pub async fn run_cycles(&mut self, cycles: u64, task: &mut dyn PollTask) {
        for _ in 0..cycles {
            self.run_cycle(task).await;
        }
    }

    async fn run_cycle(&mut self, task: &mut dyn PollTask) {
        self.cycle += 1;
        set_cycle(self.cycle);

        let started = Instant::now();
        task.run_once().await;
        let elapsed = started.elapsed();

        let remaining = self.period.saturating_sub(elapsed);
        sentinel_trace!(
            "cycle {} took {:?}, sleeping {:?}",
            self.cycle,
            elapsed,
            remaining
        );
        if !remaining.is_zero() {
            tokio::time::sleep(remaining).await;
        }
    }
}
