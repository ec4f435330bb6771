use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::Locale,
    error::ApiError,
    protocol::{HealthResponse, QueryRequest, QueryResponse},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub mod config;
pub mod markdown;
mod query_session;
mod session;

pub use config::{load_settings, ConfigError, Settings};
pub use query_session::QuerySession;
pub use session::{PendingQuery, SessionController, SessionState};

/// Failure of a backend call as seen by the session controller.
///
/// Connectivity problems, error statuses and undecodable bodies all map to
/// this one kind; the underlying cause is only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("{message}")]
    NetworkOrServer { message: String },
}

impl SearchError {
    pub fn network_or_server(locale: Locale, detail: Option<&str>) -> Self {
        Self::NetworkOrServer {
            message: failure_message(locale, detail),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NetworkOrServer { message } => message,
        }
    }
}

pub fn failure_message(locale: Locale, detail: Option<&str>) -> String {
    let base = match locale {
        Locale::En => "Search failed. Check that the search server is running.",
        Locale::Ja => "検索に失敗しました。サーバーの動作を確認してください。",
    };
    match detail.map(str::trim).filter(|detail| !detail.is_empty()) {
        Some(detail) => format!("{base} ({detail})"),
        None => base.to_string(),
    }
}

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn query(&self, query: &str) -> Result<QueryResponse, SearchError>;
}

/// Search API client issuing exactly one request per call, without retries.
pub struct HttpSearchBackend {
    http: Client,
    query_url: Url,
    health_url: Url,
    locale: Locale,
}

impl HttpSearchBackend {
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            http: Client::new(),
            query_url: settings.query_url()?,
            health_url: settings.health_url()?,
            locale: settings.locale,
        })
    }

    pub fn query_url(&self) -> &Url {
        &self.query_url
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let health = self
            .http
            .get(self.health_url.clone())
            .send()
            .await
            .with_context(|| format!("failed to reach {}", self.health_url))?
            .error_for_status()?
            .json::<HealthResponse>()
            .await
            .context("malformed health response")?;
        Ok(health)
    }

    fn failure(&self, detail: Option<&str>) -> SearchError {
        SearchError::network_or_server(self.locale, detail)
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn query(&self, query: &str) -> Result<QueryResponse, SearchError> {
        let response = match self
            .http
            .post(self.query_url.clone())
            .json(&QueryRequest {
                query: query.to_string(),
            })
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %self.query_url, "search request failed: {err}");
                return Err(self.failure(None));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let detail = response.json::<ApiError>().await.ok().map(|err| err.detail);
            warn!(
                url = %self.query_url,
                status = status.as_u16(),
                detail = detail.as_deref().unwrap_or(""),
                "search API returned error status"
            );
            return Err(self.failure(detail.as_deref()));
        }

        match response.json::<QueryResponse>().await {
            Ok(body) => {
                debug!(results = body.results.len(), "search API answered");
                Ok(body)
            }
            Err(err) => {
                warn!(url = %self.query_url, "undecodable search response: {err}");
                Err(self.failure(None))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
