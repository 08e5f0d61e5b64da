use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, COOKIE};
use serde_json::Value;

use crate::{HttpReply, SaveError, Session};

pub const DEFAULT_SAVE_ENDPOINT: &str =
    "https://wsp2.kbtu.kz/bachelor/api/registration/student/{student}/schedule/{schedule}/save";

/// Save endpoint with `{student}` and `{schedule}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTemplate(String);

impl EndpointTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, student_id: &str, schedule_id: &str) -> String {
        self.0
            .replace("{student}", student_id)
            .replace("{schedule}", schedule_id)
    }
}

impl Default for EndpointTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_ENDPOINT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub schedule_id: String,
    pub items: Vec<u64>,
    pub url: String,
}

impl SaveRequest {
    pub fn body(&self) -> Value {
        Value::from(self.items.clone())
    }
}

#[derive(Debug, Clone)]
pub struct SaveSettings {
    pub endpoint: EndpointTemplate,
    pub student_id: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for SaveSettings {
    fn default() -> Self {
        Self {
            endpoint: EndpointTemplate::default(),
            student_id: "36646".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SaveSettings {
    pub fn request(&self, schedule_id: &str, items: &[u64]) -> SaveRequest {
        SaveRequest {
            schedule_id: schedule_id.to_string(),
            items: items.to_vec(),
            url: self.endpoint.render(&self.student_id, schedule_id),
        }
    }
}

/// Performs one remote save call. Retrying is the caller's business.
#[async_trait::async_trait]
pub trait SaveClient: Send + Sync {
    async fn save(&self, session: &dyn Session, request: &SaveRequest) -> Result<Value, SaveError>;
}

/// Issues the save from inside the page, so it inherits the page's cookies.
#[derive(Debug, Default, Clone, Copy)]
pub struct PageSaveClient;

#[async_trait::async_trait]
impl SaveClient for PageSaveClient {
    async fn save(&self, session: &dyn Session, request: &SaveRequest) -> Result<Value, SaveError> {
        let reply = session.post_json(&request.url, &request.body()).await?;
        judge_reply(reply)
    }
}

/// Issues the save directly with `reqwest`, forwarding the session's cookies.
#[derive(Debug, Clone)]
pub struct HttpSaveClient {
    client: reqwest::Client,
}

impl HttpSaveClient {
    pub fn new(settings: &SaveSettings) -> Result<Self, SaveError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SaveError::Transport(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl SaveClient for HttpSaveClient {
    async fn save(&self, session: &dyn Session, request: &SaveRequest) -> Result<Value, SaveError> {
        let mut builder = self
            .client
            .post(&request.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(request.body().to_string());
        if let Some(cookies) = session.cookie_header().await? {
            builder = builder.header(COOKIE, cookies);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        judge_reply(HttpReply { status, body })
    }
}

/// A reply counts as saved only with a 2xx status and a JSON body.
fn judge_reply(reply: HttpReply) -> Result<Value, SaveError> {
    if !(200..300).contains(&reply.status) {
        return Err(SaveError::HttpStatus(reply.status));
    }
    serde_json::from_str(&reply.body).map_err(|err| SaveError::MalformedPayload(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> SaveError {
    if err.is_timeout() {
        return SaveError::Timeout;
    }
    SaveError::Transport(err.to_string())
}
