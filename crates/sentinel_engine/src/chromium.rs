//! `Session` implementation on a Chromium instance driven over CDP.
//!
//! Element operations are evaluated as small scripts inside the page so a
//! [`Locator`]'s text filter can be applied the same way everywhere.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::StreamExt;
use sentinel_logging::{sentinel_debug, sentinel_info, sentinel_warn};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{HttpReply, LoadState, Locator, Session, SessionError, SessionErrorKind};

const READY_STATE_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub request_timeout: Duration,
    /// Use this Chrome binary instead of the one found on the system.
    pub executable: Option<PathBuf>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: (1920, 1080),
            request_timeout: Duration::from_secs(30),
            executable: None,
        }
    }
}

pub struct ChromiumSession {
    _browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launches the browser and opens the single page the watcher drives.
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, SessionError> {
        let (width, height) = settings.window_size;
        let mut builder = BrowserConfig::builder()
            .request_timeout(settings.request_timeout)
            .window_size(width, height);
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = settings.executable.as_ref() {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|err| SessionError::new(SessionErrorKind::Transport, err))?;

        sentinel_info!("launching browser (headless={})", settings.headless);
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| transport(format!("failed to launch browser: {err}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    sentinel_warn!("browser handler error: {:?}", err);
                }
            }
            sentinel_debug!("browser event handler finished");
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|err| transport(format!("failed to open page: {err}")))?;

        Ok(Self {
            _browser: browser,
            page,
            handler,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T, SessionError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(|err| SessionError::new(SessionErrorKind::Script, err))?;
        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|err| SessionError::new(SessionErrorKind::Script, err.to_string()))?;
        result
            .into_value::<T>()
            .map_err(|err| SessionError::new(SessionErrorKind::Script, err.to_string()))
    }

    async fn wait_ready_state(&self, timeout: Duration) -> Result<(), SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            let state: String = self
                .eval("document.readyState".to_string())
                .await
                .unwrap_or_default();
            if state == "interactive" || state == "complete" {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::new(
                    SessionErrorKind::Timeout,
                    format!("document not ready within {timeout:?} (readyState={state:?})"),
                ));
            }
            tokio::time::sleep(READY_STATE_POLL).await;
        }
    }

    async fn wait_network_idle(&self, timeout: Duration) -> Result<(), SessionError> {
        let idle: bool = match tokio::time::timeout(
            timeout,
            self.eval::<bool>(network_idle_script(timeout)),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => false,
        };
        if idle {
            Ok(())
        } else {
            Err(SessionError::new(
                SessionErrorKind::Timeout,
                format!("network not idle within {timeout:?}"),
            ))
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[async_trait::async_trait]
impl Session for ChromiumSession {
    async fn goto(&self, url: &str, timeout: Duration) -> Result<(), SessionError> {
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(SessionError::new(
                SessionErrorKind::Navigation,
                format!("{url}: {err}"),
            )),
            Err(_) => Err(SessionError::new(
                SessionErrorKind::Timeout,
                format!("navigation to {url} exceeded {timeout:?}"),
            )),
        }
    }

    async fn current_url(&self) -> Result<String, SessionError> {
        self.page
            .url()
            .await
            .map(|url| url.unwrap_or_else(|| "about:blank".to_string()))
            .map_err(|err| transport(err.to_string()))
    }

    async fn wait_for_load(
        &self,
        state: LoadState,
        timeout: Duration,
    ) -> Result<(), SessionError> {
        match state {
            LoadState::DomContentLoaded => self.wait_ready_state(timeout).await,
            LoadState::NetworkIdle => self.wait_network_idle(timeout).await,
        }
    }

    async fn count(&self, locator: &Locator) -> Result<usize, SessionError> {
        self.eval(format!("({}).length", locate_js(locator))).await
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, SessionError> {
        self.eval(format!(
            r#"(() => {{
                const el = ({})[0];
                if (!el) return false;
                const style = window.getComputedStyle(el);
                const rect = el.getBoundingClientRect();
                return style.display !== 'none' && style.visibility !== 'hidden'
                    && (rect.width > 0 || rect.height > 0);
            }})()"#,
            locate_js(locator)
        ))
        .await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<(), SessionError> {
        let filled: bool = self
            .eval(format!(
                r#"(() => {{
                    const el = ({})[0];
                    if (!el) return false;
                    const value = {};
                    el.focus();
                    const proto = Object.getPrototypeOf(el);
                    const desc = Object.getOwnPropertyDescriptor(proto, 'value');
                    if (desc && desc.set) {{ desc.set.call(el, value); }} else {{ el.value = value; }}
                    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    return true;
                }})()"#,
                locate_js(locator),
                js_string(value)
            ))
            .await?;
        found_or_missing(filled, locator)
    }

    async fn click(&self, locator: &Locator) -> Result<(), SessionError> {
        let clicked: bool = self
            .eval(format!(
                r#"(() => {{
                    const el = ({})[0];
                    if (!el) return false;
                    el.click();
                    return true;
                }})()"#,
                locate_js(locator)
            ))
            .await?;
        found_or_missing(clicked, locator)
    }

    async fn inner_text(&self, locator: &Locator) -> Result<String, SessionError> {
        let text: Option<String> = self
            .eval(format!(
                r#"(() => {{
                    const el = ({})[0];
                    return el ? (el.innerText || el.textContent || '') : null;
                }})()"#,
                locate_js(locator)
            ))
            .await?;
        text.ok_or_else(|| missing(locator))
    }

    async fn content(&self) -> Result<String, SessionError> {
        self.page
            .content()
            .await
            .map_err(|err| transport(err.to_string()))
    }

    async fn screenshot(&self) -> Result<Vec<u8>, SessionError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .screenshot(params)
            .await
            .map_err(|err| transport(format!("screenshot failed: {err}")))
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, SessionError> {
        let reply: Value = self
            .eval(format!(
                r#"(async () => {{
                    const res = await fetch({}, {{
                        method: 'POST',
                        headers: {{ 'Content-Type': 'application/json', 'Accept': 'application/json' }},
                        credentials: 'include',
                        body: JSON.stringify({}),
                    }});
                    return {{ status: res.status, body: await res.text() }};
                }})()"#,
                js_string(url),
                body
            ))
            .await?;

        let status = reply
            .get("status")
            .and_then(Value::as_u64)
            .and_then(|status| u16::try_from(status).ok())
            .ok_or_else(|| transport("fetch reply carried no status".to_string()))?;
        let body = reply
            .get("body")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(HttpReply { status, body })
    }

    async fn cookie_header(&self) -> Result<Option<String>, SessionError> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .map_err(|err| transport(err.to_string()))?;
        if cookies.is_empty() {
            return Ok(None);
        }
        let header = cookies
            .iter()
            .map(|cookie| format!("{}={}", cookie.name, cookie.value))
            .collect::<Vec<_>>()
            .join("; ");
        Ok(Some(header))
    }
}

/// JS expression evaluating to the array of elements `locator` matches.
fn locate_js(locator: &Locator) -> String {
    let text = locator
        .text
        .as_deref()
        .map(js_string)
        .unwrap_or_else(|| "null".to_string());
    format!(
        "Array.from(document.querySelectorAll({css})).filter(el => {text} === null || (el.innerText || el.textContent || '').includes({text}))",
        css = js_string(&locator.css),
        text = text
    )
}

fn js_string(value: &str) -> String {
    Value::from(value).to_string()
}

/// Resolves `true` after three consecutive quiet checks, `false` at the deadline.
fn network_idle_script(timeout: Duration) -> String {
    format!(
        r#"new Promise((resolve) => {{
            let quiet = 0;
            let timer;
            const check = () => {{
                const active = performance.getEntriesByType('resource').filter(r => !r.responseEnd).length;
                quiet = active === 0 ? quiet + 1 : 0;
                if (quiet >= 3) {{ resolve(true); return; }}
                timer = setTimeout(check, 200);
            }};
            check();
            setTimeout(() => {{ clearTimeout(timer); resolve(false); }}, {});
        }})"#,
        timeout.as_millis()
    )
}

fn found_or_missing(found: bool, locator: &Locator) -> Result<(), SessionError> {
    if found {
        Ok(())
    } else {
        Err(missing(locator))
    }
}

fn missing(locator: &Locator) -> SessionError {
    SessionError::new(
        SessionErrorKind::ElementNotFound,
        format!("no element matches {locator}"),
    )
}

fn transport(message: String) -> SessionError {
    SessionError::new(SessionErrorKind::Transport, message)
}
