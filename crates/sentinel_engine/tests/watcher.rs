mod support;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sentinel_core::{fingerprint, AuthState, Classification, SaveJob};
use sentinel_engine::{
    BatchSaveExecutor, Credentials, GuardianSettings, RetryPolicy, SaveSettings, SessionGuardian,
    WatchSettings, Watcher,
};
use serde_json::json;
use support::{init_logging, FakeSession, MemorySink, ScriptedSaveClient};

const TARGET: &str = "https://portal.example/schedule/36646";

struct Rig {
    session: Arc<FakeSession>,
    client: ScriptedSaveClient,
    sink: MemorySink,
    watcher: Watcher,
}

fn rig(session: FakeSession, credentials: Option<Credentials>) -> Rig {
    let session = Arc::new(session);
    let client = ScriptedSaveClient::default();
    client.script("94601", vec![Ok(json!({"saved": true}))]);
    client.script("94600", vec![Ok(json!({"saved": true}))]);
    let sink = MemorySink::default();

    let clock = Arc::new(AtomicU64::new(0));
    let mut settings = WatchSettings::new(
        TARGET,
        vec![
            SaveJob::new("94601", vec![232314, 232315, 232329]),
            SaveJob::new("94600", vec![232526]),
        ],
    );
    settings.now_utc = Arc::new(move || {
        let second = clock.fetch_add(1, Ordering::SeqCst);
        format!("2026-10-15T12:00:{second:02}.000Z")
    });

    let executor = BatchSaveExecutor::with_rng(
        Box::new(client.clone()),
        SaveSettings::default(),
        RetryPolicy::default(),
        Box::new(StdRng::seed_from_u64(3)),
    );
    let watcher = Watcher::new(
        session.clone(),
        settings,
        SessionGuardian::new(credentials, GuardianSettings::default()),
        executor,
        Box::new(sink.clone()),
    );
    Rig {
        session,
        client,
        sink,
        watcher,
    }
}

#[tokio::test(start_paused = true)]
async fn first_change_runs_the_batch_once_and_later_changes_only_capture() {
    init_logging();
    let mut rig = rig(FakeSession::with_texts(&["seats: 0"]), None);

    let first = rig.watcher.tick().await;
    assert_eq!(first.classification, Classification::Init);
    assert_eq!(first.fingerprint, Some(fingerprint("seats: 0")));

    let second = rig.watcher.tick().await;
    assert_eq!(second.classification, Classification::Unchanged);
    assert!(rig.client.calls().is_empty());
    assert_eq!(rig.sink.count(), 0);

    rig.session.set_text("seats: 4");
    let third = rig.watcher.tick().await;
    assert_eq!(third.classification, Classification::Changed);
    assert!(rig.watcher.state().latch().is_set());
    assert_eq!(rig.client.calls(), vec!["94601", "94600"]);
    let batch = rig.watcher.last_batch().expect("batch ran");
    assert_eq!(batch.succeeded_count(), 2);
    assert_eq!(rig.sink.count(), 1);
    {
        let stored = rig.sink.stored.lock().unwrap();
        assert_eq!(stored[0].cause, "change");
        assert_eq!(stored[0].timestamp, "2026-10-15T12:00:02.000Z");
        assert!(stored[0].html.contains("seats: 4"));
    }

    rig.session.set_text("seats: 1");
    let fourth = rig.watcher.tick().await;
    assert_eq!(fourth.classification, Classification::Changed);
    assert_eq!(rig.client.calls().len(), 2);
    assert_eq!(rig.sink.count(), 2);
    assert_eq!(rig.watcher.state().baseline(), Some(&fingerprint("seats: 1")));
    assert_eq!(rig.watcher.state().cycles(), 4);
}

#[tokio::test(start_paused = true)]
async fn failed_cycle_keeps_the_baseline() {
    init_logging();
    let mut rig = rig(FakeSession::with_texts(&["idle"]), None);

    rig.watcher.tick().await;
    rig.session.state.lock().unwrap().failing_gotos = 1;

    let failed = rig.watcher.tick().await;
    assert_eq!(failed.classification, Classification::Error);
    assert_eq!(failed.fingerprint, None);
    assert_eq!(rig.watcher.state().baseline(), Some(&fingerprint("idle")));

    let recovered = rig.watcher.tick().await;
    assert_eq!(recovered.classification, Classification::Unchanged);
    assert!(rig.client.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn unstored_change_is_detected_again_without_rerunning_the_batch() {
    init_logging();
    let mut rig = rig(FakeSession::with_texts(&["seats: 0"]), None);
    rig.watcher.tick().await;

    rig.session.set_text("seats: 4");
    rig.sink.fail_next(1);
    let failed = rig.watcher.tick().await;

    assert_eq!(failed.classification, Classification::Error);
    assert_eq!(rig.watcher.state().baseline(), Some(&fingerprint("seats: 0")));
    assert!(rig.watcher.state().latch().is_set());
    assert_eq!(rig.client.calls(), vec!["94601", "94600"]);
    assert_eq!(rig.sink.count(), 0);

    let retried = rig.watcher.tick().await;
    assert_eq!(retried.classification, Classification::Changed);
    assert_eq!(rig.client.calls().len(), 2);
    assert_eq!(rig.sink.count(), 1);
    assert_eq!(rig.watcher.state().baseline(), Some(&fingerprint("seats: 4")));

    let settled = rig.watcher.tick().await;
    assert_eq!(settled.classification, Classification::Unchanged);
}

#[tokio::test(start_paused = true)]
async fn login_redirect_is_followed_by_renavigation() {
    init_logging();
    let form = GuardianSettings::default().form;
    let session = FakeSession::with_texts(&["timetable"]);
    session.show(&form.login_input.css);
    session.show(&form.password_input.css);
    {
        let mut state = session.state.lock().unwrap();
        state.submit_css = Some(form.submit.css.clone());
        state.cleared_on_submit = vec![form.login_input.css.clone(), form.password_input.css.clone()];
        state.url_after_submit = Some("https://portal.example/home".to_string());
    }
    let credentials = Credentials {
        login: "student".to_string(),
        password: "secret".to_string(),
    };
    let mut rig = rig(session, Some(credentials));

    let record = rig.watcher.tick().await;

    assert_eq!(record.classification, Classification::Init);
    assert_eq!(rig.watcher.guardian().state(), AuthState::Authenticated);
    assert_eq!(
        rig.session.actions(),
        vec![
            format!("goto:{TARGET}"),
            format!("fill:{}=student", form.login_input.css),
            format!("fill:{}=secret", form.password_input.css),
            format!("click:{}", form.submit.css),
            format!("goto:{TARGET}"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn login_prompt_without_credentials_is_an_error_cycle() {
    init_logging();
    let form = GuardianSettings::default().form;
    let session = FakeSession::with_texts(&["login"]);
    session.show(&form.password_input.css);
    let mut rig = rig(session, None);

    let record = rig.watcher.tick().await;

    assert_eq!(record.classification, Classification::Error);
    assert_eq!(rig.watcher.state().baseline(), None);
    assert_eq!(rig.watcher.guardian().state(), AuthState::LoginPromptVisible);
    assert_eq!(rig.sink.count(), 0);
}
