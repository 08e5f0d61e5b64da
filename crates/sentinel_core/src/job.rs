use serde::{Deserialize, Serialize};

/// One unit of remote state to persist: a schedule and the ordered item ids to save into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveJob {
    pub schedule_id: String,
    pub items: Vec<u64>,
}

impl SaveJob {
    pub fn new(schedule_id: impl Into<String>, items: impl Into<Vec<u64>>) -> Self {
        Self {
            schedule_id: schedule_id.into(),
            items: items.into(),
        }
    }
}

/// Terminal outcome of a job after its retries are exhausted (or it succeeded).
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Payload returned by the endpoint on the successful attempt.
    Saved(serde_json::Value),
    /// Message of the last failed attempt.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveAttemptResult {
    pub schedule_id: String,
    pub attempts: u32,
    pub outcome: SaveOutcome,
}

impl SaveAttemptResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, SaveOutcome::Saved(_))
    }
}

/// Per-job outcomes of one batch, in job order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResult {
    pub results: Vec<SaveAttemptResult>,
}

impl BatchResult {
    pub fn succeeded_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &SaveAttemptResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
