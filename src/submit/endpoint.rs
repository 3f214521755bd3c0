use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::submit::error::SaveError;
use crate::submit::request::{SaveRequest, SaveResponse};

/// The remote collaborator that persists saved posts.
#[async_trait]
pub trait SaveEndpoint: Send + Sync {
    /// Submit one post on behalf of the holder of `token`.
    ///
    /// Transport failures and non-2xx statuses are errors; a 2xx reply is
    /// returned as-is, including `success: false`.
    async fn save(&self, request: &SaveRequest, token: &str) -> Result<SaveResponse, SaveError>;
}

/// JSON-over-HTTP save endpoint at `<base_url>/save-post`.
#[derive(Debug, Clone)]
pub struct HttpSaveEndpoint {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSaveEndpoint {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn save_url(&self) -> String {
        format!("{}/save-post", self.base_url)
    }
}

#[async_trait]
impl SaveEndpoint for HttpSaveEndpoint {
    async fn save(&self, request: &SaveRequest, token: &str) -> Result<SaveResponse, SaveError> {
        let url = self.save_url();
        let network = |e: reqwest::Error| SaveError::Network {
            endpoint: self.base_url.clone(),
            reason: e.to_string(),
        };

        debug!(%url, post = %request.url, "posting save request");
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        let body = response.text().await.map_err(network)?;
        debug!(%url, status = status.as_u16(), "save endpoint replied");

        if status == StatusCode::UNAUTHORIZED {
            return Err(SaveError::Unauthorized(server_error(&body)));
        }

        if !status.is_success() {
            let message = server_error(&body).unwrap_or_else(|| body.trim().to_string());
            return Err(SaveError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| SaveError::InvalidResponse(e.to_string()))
    }
}

/// The `error` field of a JSON error body, when there is one.
fn server_error(body: &str) -> Option<String> {
    serde_json::from_str::<SaveResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .filter(|e| !e.trim().is_empty())
}
