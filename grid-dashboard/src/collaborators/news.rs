use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::{secret_from_env, NewsConfig};

pub const STATUS_FALLBACK: &str = "Failed to fetch news. Please check the API key or try again later.";
pub const NETWORK_FALLBACK: &str = "News section unavailable. External connection issue or API key missing.";
pub const MALFORMED_FALLBACK: &str = "News feed returned an unexpected payload.";

#[derive(thiserror::Error, Debug)]
pub enum NewsError {
    #[error("news request failed: {0}")]
    Network(String),
    #[error("news API returned status {0}")]
    Status(u16),
    #[error("news API returned a malformed payload: {0}")]
    MalformedPayload(String),
}

impl NewsError {
    /// Message shown in place of headlines.
    pub fn fallback_notice(&self) -> &'static str {
        match self {
            Self::Network(_) => NETWORK_FALLBACK,
            Self::Status(_) => STATUS_FALLBACK,
            Self::MalformedPayload(_) => MALFORMED_FALLBACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
}

#[derive(Deserialize)]
struct ArticlesPayload {
    articles: Vec<Article>,
}

/// Headlines or, when fetching failed, an explanation of why there are none.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsFeed {
    pub articles: Vec<Article>,
    pub notice: Option<String>,
}

/// Client for a NewsAPI-style `/v2/everything` search.
#[derive(Clone)]
pub struct NewsClient {
    base_url: String,
    api_key: Option<String>,
    query: String,
    max_articles: usize,
    client: Client,
}

impl NewsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        query: impl Into<String>,
        max_articles: usize,
        timeout: Duration,
    ) -> Result<Self, NewsError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NewsError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            query: query.into(),
            max_articles,
            client,
        })
    }

    pub fn from_config(cfg: &NewsConfig) -> Result<Self, NewsError> {
        let api_key = secret_from_env(&cfg.api_key_env);
        if api_key.is_none() {
            tracing::warn!(env = %cfg.api_key_env, "news API key not set; headlines will fall back");
        }

        Self::new(
            cfg.base_url.clone(),
            api_key,
            cfg.query.clone(),
            cfg.max_articles,
            Duration::from_secs(cfg.timeout_secs),
        )
    }

    /// Single GET, first `max_articles` entries only. No retry.
    pub async fn fetch_articles(&self) -> Result<Vec<Article>, NewsError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| NewsError::Network("API key missing".to_string()))?;
        let url = format!("{}/v2/everything", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", self.query.as_str()), ("apiKey", api_key)])
            .send()
            .await
            .map_err(|e| NewsError::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(NewsError::Status(response.status().as_u16()));
        }

        let body = response.text().await.map_err(|e| NewsError::Network(e.to_string()))?;
        let payload: ArticlesPayload =
            serde_json::from_str(&body).map_err(|e| NewsError::MalformedPayload(e.to_string()))?;

        Ok(payload.articles.into_iter().take(self.max_articles).collect())
    }

    /// Never fails: errors degrade to an empty feed with a notice.
    pub async fn latest_news(&self) -> NewsFeed {
        match self.fetch_articles().await {
            Ok(articles) => NewsFeed {
                articles,
                notice: None,
            },
            Err(e) => {
                metrics::counter!("news_fetch_failures_total").increment(1);
                tracing::warn!(error = %e, "news fetch failed, showing fallback");
                NewsFeed {
                    articles: Vec::new(),
                    notice: Some(e.fallback_notice().to_string()),
                }
            }
        }
    }
}
