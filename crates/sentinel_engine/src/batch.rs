use std::ops::RangeInclusive;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use sentinel_core::{BatchResult, SaveAttemptResult, SaveJob, SaveOutcome};
use sentinel_logging::{current_cycle, sentinel_info, sentinel_warn};

use crate::{SaveClient, SaveSettings, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Sleep between attempts of the same job, in milliseconds.
    pub backoff_ms: RangeInclusive<u64>,
    /// Sleep between consecutive jobs, in milliseconds.
    pub pause_ms: RangeInclusive<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff_ms: 400..=1000,
            pause_ms: 300..=700,
        }
    }
}

/// Runs a fixed list of save jobs with per-job bounded retry.
///
/// A job that exhausts its attempts is recorded as failed and the batch moves
/// on. No deduplication is done: a retry may resubmit an item set the endpoint
/// already accepted, which relies on the endpoint being idempotent per item id.
pub struct BatchSaveExecutor {
    client: Box<dyn SaveClient>,
    settings: SaveSettings,
    policy: RetryPolicy,
    rng: Box<dyn RngCore + Send + Sync>,
}

impl BatchSaveExecutor {
    pub fn new(client: Box<dyn SaveClient>, settings: SaveSettings, policy: RetryPolicy) -> Self {
        Self::with_rng(client, settings, policy, Box::new(StdRng::from_os_rng()))
    }

    /// Same as [`BatchSaveExecutor::new`] with an explicit jitter source.
    pub fn with_rng(
        client: Box<dyn SaveClient>,
        settings: SaveSettings,
        policy: RetryPolicy,
        rng: Box<dyn RngCore + Send + Sync>,
    ) -> Self {
        Self {
            client,
            settings,
            policy,
            rng,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// One result per job, in job order.
    pub async fn run_batch(&mut self, session: &dyn Session, jobs: &[SaveJob]) -> BatchResult {
        let mut results = Vec::with_capacity(jobs.len());
        for (index, job) in jobs.iter().enumerate() {
            results.push(self.run_job(session, job).await);
            if index + 1 < jobs.len() {
                let pause = self.jitter(self.policy.pause_ms.clone());
                tokio::time::sleep(pause).await;
            }
        }
        BatchResult { results }
    }

    async fn run_job(&mut self, session: &dyn Session, job: &SaveJob) -> SaveAttemptResult {
        let request = self.settings.request(&job.schedule_id, &job.items);
        let cycle = current_cycle();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            sentinel_info!(
                "[SAVE TRY] cycle={} schedule={} attempt={} items={}",
                cycle,
                job.schedule_id,
                attempt,
                job.items.len()
            );
            match self.client.save(session, &request).await {
                Ok(payload) => {
                    sentinel_info!(
                        "[SAVE OK] cycle={} schedule={} attempt={} payload={}",
                        cycle,
                        job.schedule_id,
                        attempt,
                        payload
                    );
                    return SaveAttemptResult {
                        schedule_id: job.schedule_id.clone(),
                        attempts: attempt,
                        outcome: SaveOutcome::Saved(payload),
                    };
                }
                Err(err) => {
                    sentinel_warn!(
                        "[SAVE ERR] cycle={} schedule={} attempt={} -> {}",
                        cycle,
                        job.schedule_id,
                        attempt,
                        err
                    );
                    last_error = err.to_string();
                    if attempt < max_attempts {
                        let backoff = self.jitter(self.policy.backoff_ms.clone());
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }

        SaveAttemptResult {
            schedule_id: job.schedule_id.clone(),
            attempts: max_attempts,
            outcome: SaveOutcome::Failed(last_error),
        }
    }

    fn jitter(&mut self, range_ms: RangeInclusive<u64>) -> Duration {
        if range_ms.is_empty() {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.random_range(range_ms))
    }
}
