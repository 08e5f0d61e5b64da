//! Sentinel core: pure change-detection state machine and shared data types.
mod effect;
mod fingerprint;
mod job;
mod msg;
mod state;
mod update;

pub use effect::{ArtifactCause, Effect};
pub use fingerprint::{fingerprint, normalize_text, Fingerprint};
pub use job::{BatchResult, SaveAttemptResult, SaveJob, SaveOutcome};
pub use msg::Msg;
pub use state::{AuthState, Classification, PollCycleRecord, TriggerLatch, WatchState};
pub use update::update;
