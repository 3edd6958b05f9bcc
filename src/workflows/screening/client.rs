use std::future::Future;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::domain::{CompareResult, ScoreResult, TenantInputPayload};
use crate::config::ScoringServiceConfig;

pub const SCORE_PATH: &str = "/api/score";
pub const COMPARE_PATH: &str = "/api/score/compare";

/// Outbound scoring contract so the screening service can run against a stub.
pub trait ScoringService: Send + Sync {
    fn score(
        &self,
        payload: &TenantInputPayload,
    ) -> impl Future<Output = Result<ScoreResult, ScoringClientError>> + Send;

    fn compare(
        &self,
        payload: &TenantInputPayload,
    ) -> impl Future<Output = Result<CompareResult, ScoringClientError>> + Send;
}

/// Failure talking to the scoring service.
#[derive(Debug, thiserror::Error)]
pub enum ScoringClientError {
    #[error("Backend error ({status}): {body}")]
    Status { status: u16, body: String },
    #[error("scoring service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("scoring service returned an unreadable response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ScoringClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            Self::Decode(_) => None,
        }
    }

    /// Single operator-facing sentence; client and server failures only differ in wording.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { status, body } if (400..500).contains(status) => {
                format!("The scoring service rejected this submission ({status}): {body}")
            }
            Self::Status { status, body } => format!("Backend error ({status}): {body}"),
            Self::Transport(_) => {
                "The scoring service could not be reached. Try again shortly.".to_string()
            }
            Self::Decode(_) => "The scoring service returned a response we could not read.".to_string(),
        }
    }
}

/// `reqwest`-backed client for the external scoring service.
#[derive(Debug, Clone)]
pub struct HttpScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpScoringClient {
    pub fn new(config: &ScoringServiceConfig) -> Result<Self, ScoringClientError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_client(http, &config.base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<T>(
        &self,
        path: &str,
        payload: &TenantInputPayload,
    ) -> Result<T, ScoringClientError>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.endpoint(path);
        debug!(%url, "posting screening payload");

        let response = self.http.post(&url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "scoring service returned an error");
            let body = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or_default().to_string()
            } else {
                body
            };
            return Err(ScoringClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl ScoringService for HttpScoringClient {
    fn score(
        &self,
        payload: &TenantInputPayload,
    ) -> impl Future<Output = Result<ScoreResult, ScoringClientError>> + Send {
        self.post_json(SCORE_PATH, payload)
    }

    fn compare(
        &self,
        payload: &TenantInputPayload,
    ) -> impl Future<Output = Result<CompareResult, ScoringClientError>> + Send {
        self.post_json(COMPARE_PATH, payload)
    }
}
