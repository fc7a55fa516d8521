use reqwest::{Client, Method, StatusCode, Url};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(String),

    /// The backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
}

/// Client for the bot backend (creation, listing, deletion, personalization).
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// `GET /api/bots/`, optionally filtered by creator.
    pub async fn list_bots(&self, creator_username: Option<&str>) -> Result<Value, BackendError> {
        let url = format!("{}/api/bots/", self.base_url);
        let url = match creator_username {
            Some(creator) => Url::parse_with_params(&url, &[("creator_username", creator)]),
            None => Url::parse(&url),
        }
        .map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
        Self::send(self.http.get(url)).await
    }

    pub async fn create_bot(&self, body: &Value) -> Result<Value, BackendError> {
        self.call(Method::POST, "/api/bots/create", Some(body)).await
    }

    pub async fn get_bot(&self, bot_id: &str) -> Result<Value, BackendError> {
        self.call(Method::GET, &format!("/api/bots/{bot_id}"), None).await
    }

    pub async fn delete_bot(&self, bot_id: &str) -> Result<Value, BackendError> {
        self.call(Method::DELETE, &format!("/api/bots/{bot_id}"), None).await
    }

    /// Ask the backend to infer bot parameters.
    ///
    /// With a bot id the existing bot is personalized; without one the
    /// standalone endpoint generates parameters ahead of creation.
    pub async fn personalize(&self, bot_id: Option<&str>, body: &Value) -> Result<Value, BackendError> {
        let endpoint = match bot_id {
            Some(id) => format!("/api/bots/{id}/personalize"),
            None => "/api/bots/personalize-standalone".to_string(),
        };
        tracing::debug!(endpoint = %endpoint, "Routing personalization request");
        self.call(Method::POST, &endpoint, Some(body)).await
    }

    async fn call(&self, method: Method, endpoint: &str, body: Option<&Value>) -> Result<Value, BackendError> {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, endpoint));
        if let Some(body) = body {
            req = req.json(body);
        }
        Self::send(req).await
    }

    async fn send(req: reqwest::RequestBuilder) -> Result<Value, BackendError> {
        let resp = req.send().await?;
        let status = resp.status();

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        Ok(resp.json().await?)
    }
}

/// Pick the most useful message out of a backend error body: `detail`, then
/// `error`, then the raw text, then a generic description.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "error"] {
            match json.get(key) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(v) if !v.is_null() => return v.to_string(),
                _ => {}
            }
        }
    } else if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    format!("Backend request failed with status {}", status.as_u16())
}
