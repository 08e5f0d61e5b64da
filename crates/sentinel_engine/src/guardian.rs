use std::fmt;
use std::time::Duration;

use sentinel_core::AuthState;
use sentinel_logging::{sentinel_info, sentinel_warn};

use crate::wait::{try_wait, wait_for_visibility};
use crate::{LoadState, Locator, Session, Visibility, WatchError};

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the login form lives on the page.
#[derive(Debug, Clone)]
pub struct LoginForm {
    pub login_input: Locator,
    /// Its presence is what identifies the login prompt.
    pub password_input: Locator,
    pub submit: Locator,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            login_input: Locator::css(
                r#"input.el-input__inner[type="text"][placeholder="Введите логин"]"#,
            ),
            password_input: Locator::css(
                r#"input.el-input__inner[type="password"][placeholder="Введите пароль"]"#,
            ),
            submit: Locator::css("button.el-button--primary").with_text("Вход"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuardianSettings {
    pub form: LoginForm,
    pub input_timeout: Duration,
    pub settle_timeout: Duration,
}

impl Default for GuardianSettings {
    fn default() -> Self {
        Self {
            form: LoginForm::default(),
            input_timeout: Duration::from_secs(30),
            settle_timeout: Duration::from_secs(60),
        }
    }
}

/// Detects the login prompt and signs in when it is showing.
///
/// Callers invoke [`SessionGuardian::ensure_authenticated`] before every read of
/// page content; it is a no-op while the session holds.
#[derive(Debug)]
pub struct SessionGuardian {
    credentials: Option<Credentials>,
    settings: GuardianSettings,
    state: AuthState,
}

impl SessionGuardian {
    pub fn new(credentials: Option<Credentials>, settings: GuardianSettings) -> Self {
        Self {
            credentials,
            settings,
            state: AuthState::Unknown,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Returns `true` if a login was just performed.
    pub async fn ensure_authenticated(&mut self, session: &dyn Session) -> Result<bool, WatchError> {
        let form = &self.settings.form;
        let prompt_visible = session
            .count(&form.password_input)
            .await
            .map(|count| count > 0)
            .unwrap_or(false);
        if !prompt_visible {
            self.state = AuthState::Authenticated;
            return Ok(false);
        }
        self.state = AuthState::LoginPromptVisible;
        sentinel_info!("[LOGIN] login prompt detected");

        let Some(credentials) = self.credentials.as_ref() else {
            return Err(WatchError::Config(
                "LOGIN/PASSWORD are not configured but the login prompt is showing".to_string(),
            ));
        };

        self.state = AuthState::Authenticating;
        let timeout = self.settings.input_timeout;
        wait_for_visibility(session, &form.login_input, Visibility::Visible, timeout).await?;
        wait_for_visibility(session, &form.password_input, Visibility::Visible, timeout).await?;

        session.fill(&form.login_input, &credentials.login).await?;
        session.fill(&form.password_input, &credentials.password).await?;

        let settle = self.settings.settle_timeout;
        let (_, clicked) = tokio::join!(
            try_wait(
                "login settle",
                settle,
                session.wait_for_load(LoadState::NetworkIdle, settle)
            ),
            session.click(&form.submit),
        );
        clicked?;

        let still_prompting = session
            .count(&form.password_input)
            .await
            .map(|count| count > 0)
            .unwrap_or(false);
        if still_prompting {
            self.state = AuthState::LoginFailed;
            sentinel_warn!("[LOGIN] password field still present after submit");
            return Err(WatchError::Authentication(
                "login did not clear the prompt: password field still present (wrong credentials or an extra verification step)"
                    .to_string(),
            ));
        }

        self.state = AuthState::Authenticated;
        sentinel_info!("[LOGIN] signed in as {}", credentials.login);
        Ok(true)
    }
}
