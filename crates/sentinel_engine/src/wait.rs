use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use sentinel_logging::sentinel_debug;
use tokio::time::Instant;

use crate::{Locator, Session, SessionError, SessionErrorKind, Visibility};

const VISIBILITY_POLL: Duration = Duration::from_millis(100);

/// Best-effort wait: runs `op` for at most `timeout`.
///
/// Returns `true` when `op` finished successfully in time. Errors and timeouts
/// are swallowed (logged at debug) and reported as `false`; the caller proceeds
/// either way.
pub async fn try_wait<F, T, E>(label: &str, timeout: Duration, op: F) -> bool
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, op).await {
        Ok(Ok(_)) => true,
        Ok(Err(err)) => {
            sentinel_debug!("wait '{}' gave up: {}", label, err);
            false
        }
        Err(_) => {
            sentinel_debug!("wait '{}' timed out after {:?}", label, timeout);
            false
        }
    }
}

/// Poll `locator` until it reaches `state`. Fails with a timeout error otherwise.
///
/// A missing element counts as hidden; lookup errors are retried until the deadline.
pub async fn wait_for_visibility(
    session: &dyn Session,
    locator: &Locator,
    state: Visibility,
    timeout: Duration,
) -> Result<(), SessionError> {
    let deadline = Instant::now() + timeout;
    loop {
        let visible = session.is_visible(locator).await.unwrap_or(false);
        let reached = match state {
            Visibility::Visible => visible,
            Visibility::Hidden => !visible,
        };
        if reached {
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(SessionError::new(
                SessionErrorKind::Timeout,
                format!("{locator} not {state:?} within {timeout:?}"),
            ));
        }
        tokio::time::sleep(VISIBILITY_POLL).await;
    }
}
