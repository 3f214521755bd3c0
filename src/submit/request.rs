use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::extract::extractor::ExtractedPost;

/// Body of `POST <base>/save-post`. Built fresh for every click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRequest {
    pub url: String,
    pub platform: String,
    pub title: String,
    pub image_url: Option<String>,
    /// ISO-8601 UTC timestamp with millisecond precision.
    pub saved_at: String,
}

impl SaveRequest {
    pub fn new(post: &ExtractedPost, image_url: Option<String>, saved_at: DateTime<Utc>) -> Self {
        Self {
            url: post.url.clone(),
            platform: post.platform.clone(),
            title: post.title.clone(),
            image_url,
            saved_at: saved_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Reply from the save endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn rejected(error: &str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            message: None,
        }
    }
}
