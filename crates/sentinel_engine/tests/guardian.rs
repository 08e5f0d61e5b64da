mod support;

use sentinel_core::AuthState;
use sentinel_engine::{Credentials, GuardianSettings, LoginForm, SessionGuardian, WatchError};
use support::{init_logging, FakeSession};

fn credentials() -> Option<Credentials> {
    Some(Credentials {
        login: "student".to_string(),
        password: "hunter2".to_string(),
    })
}

fn login_page(form: &LoginForm, clears: bool) -> FakeSession {
    let session = FakeSession::default();
    session.show(&form.login_input.css);
    session.show(&form.password_input.css);
    {
        let mut state = session.state.lock().unwrap();
        state.submit_css = Some(form.submit.css.clone());
        if clears {
            state.cleared_on_submit =
                vec![form.login_input.css.clone(), form.password_input.css.clone()];
        }
    }
    session
}

#[tokio::test(start_paused = true)]
async fn no_password_field_means_no_login_and_no_input() {
    init_logging();
    let session = FakeSession::with_texts(&["dashboard"]);
    let mut guardian = SessionGuardian::new(credentials(), GuardianSettings::default());

    let logged_in = guardian.ensure_authenticated(&session).await.unwrap();

    assert!(!logged_in);
    assert!(session.actions().is_empty());
    assert_eq!(guardian.state(), AuthState::Authenticated);
}

#[tokio::test(start_paused = true)]
async fn login_prompt_is_filled_and_submitted() {
    init_logging();
    let settings = GuardianSettings::default();
    let session = login_page(&settings.form, true);
    let form = settings.form.clone();
    let mut guardian = SessionGuardian::new(credentials(), settings);

    let logged_in = guardian.ensure_authenticated(&session).await.unwrap();

    assert!(logged_in);
    assert_eq!(guardian.state(), AuthState::Authenticated);
    assert_eq!(
        session.actions(),
        vec![
            format!("fill:{}=student", form.login_input.css),
            format!("fill:{}=hunter2", form.password_input.css),
            format!("click:{}", form.submit.css),
        ]
    );

    // Session now holds: a second call is a no-op.
    assert!(!guardian.ensure_authenticated(&session).await.unwrap());
    assert_eq!(session.actions().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn missing_credentials_fail_fast_with_config_error() {
    init_logging();
    let settings = GuardianSettings::default();
    let session = login_page(&settings.form, true);
    let mut guardian = SessionGuardian::new(None, settings);

    let err = guardian.ensure_authenticated(&session).await.unwrap_err();

    assert!(matches!(err, WatchError::Config(_)));
    assert_eq!(err.kind(), "ConfigError");
    assert!(session.actions().is_empty());
    assert_eq!(guardian.state(), AuthState::LoginPromptVisible);
}

#[tokio::test(start_paused = true)]
async fn persisting_prompt_is_an_authentication_error() {
    init_logging();
    let settings = GuardianSettings::default();
    let session = login_page(&settings.form, false);
    let mut guardian = SessionGuardian::new(credentials(), settings);

    let err = guardian.ensure_authenticated(&session).await.unwrap_err();

    assert!(matches!(err, WatchError::Authentication(_)));
    assert_eq!(guardian.state(), AuthState::LoginFailed);
    assert!(!guardian.state().is_authenticated());
}

#[tokio::test(start_paused = true)]
async fn invisible_inputs_time_out() {
    init_logging();
    let settings = GuardianSettings::default();
    let session = FakeSession::default();
    // Password field is in the DOM but the login input never shows.
    session.show(&settings.form.password_input.css);
    let mut guardian = SessionGuardian::new(credentials(), settings);

    let err = guardian.ensure_authenticated(&session).await.unwrap_err();

    assert!(matches!(err, WatchError::Session(_)));
    assert_eq!(err.kind(), "TimeoutError");
    assert!(session.actions().is_empty());
}
