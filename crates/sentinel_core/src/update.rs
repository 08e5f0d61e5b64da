use crate::{ArtifactCause, Classification, Effect, Msg, PollCycleRecord, WatchState};

/// Pure update function: applies a cycle outcome to state and returns the effects to run.
pub fn update(mut state: WatchState, msg: Msg) -> (WatchState, Vec<Effect>) {
    let effects = match msg {
        Msg::Sampled {
            timestamp,
            fingerprint,
        } => {
            state.set_pending(None);
            let classification = state.classify(&fingerprint);
            let effects = match classification {
                Classification::Changed => {
                    let first = if state.latch_mut().try_fire() {
                        Effect::RunSaveBatch
                    } else {
                        Effect::ActionsSkipped
                    };
                    // Becomes the baseline once the artifacts are stored.
                    state.set_pending(Some(fingerprint.clone()));
                    vec![
                        first,
                        Effect::CaptureArtifacts {
                            cause: ArtifactCause::Change,
                        },
                    ]
                }
                Classification::Init | Classification::Unchanged | Classification::Error => {
                    state.set_baseline(fingerprint.clone());
                    Vec::new()
                }
            };
            state.record(PollCycleRecord {
                timestamp,
                fingerprint: Some(fingerprint),
                classification,
            });
            effects
        }
        Msg::TickFailed { timestamp } => {
            // Baseline is left alone so the next good sample compares against known-good state.
            state.set_pending(None);
            state.record(PollCycleRecord {
                timestamp,
                fingerprint: None,
                classification: Classification::Error,
            });
            Vec::new()
        }
        Msg::ArtifactsStored => {
            state.commit_pending();
            Vec::new()
        }
        Msg::ArtifactsFailed { timestamp } => {
            // The latch stays set: the save batch is not repeated.
            state.fail_last(timestamp);
            Vec::new()
        }
    };

    (state, effects)
}
