use std::future::Future;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{redirect, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::ClientConfig;
use crate::error::FeedError;
use crate::feed::{Article, ArticleDetail, Keyword, PageResponse};

const JSON: &str = "application/json";

/// Remote article collection as seen by the synchronizer.
pub trait ArticleSource: Send + Sync {
    /// One page of the listing, newest first.
    fn fetch_page(
        &self,
        page: u32,
    ) -> impl Future<Output = Result<PageResponse, FeedError>> + Send;

    /// Every article created strictly after `since`, newest first.
    fn fetch_since(
        &self,
        since: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<Article>, FeedError>> + Send;
}

#[derive(Serialize)]
struct NewKeyword<'a> {
    word: &'a str,
}

/// JSON-over-HTTP client for the article and keyword endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(5))
            .timeout(config.request_timeout())
            .user_agent(config.api.user_agent.clone())
            .build()?;
        Ok(Self::new(client, config.api_base()?))
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, FeedError> {
        Ok(self.base.join(path)?)
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub async fn fetch_article(&self, id: i64) -> Result<ArticleDetail, FeedError> {
        let url = self.endpoint(&format!("articles/{id}/"))?;
        self.send_json(self.client.get(url)).await
    }

    pub async fn list_keywords(&self) -> Result<Vec<Keyword>, FeedError> {
        let url = self.endpoint("keywords/")?;
        self.send_json(self.client.get(url)).await
    }

    pub async fn add_keyword(&self, word: &str) -> Result<Keyword, FeedError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(FeedError::Validation("keyword must not be empty".into()));
        }
        let url = self.endpoint("keywords/")?;
        self.send_json(self.client.post(url).json(&NewKeyword { word }))
            .await
    }

    pub async fn delete_keyword(&self, id: i64) -> Result<(), FeedError> {
        let url = self.endpoint(&format!("keywords/{id}/"))?;
        let request = self.client.delete(url).header(CONTENT_TYPE, JSON);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        Ok(())
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, FeedError> {
        let response = request
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            });
        }
        let bytes = response.bytes().await?;
        decode_body(&bytes)
    }
}

impl ArticleSource for ApiClient {
    async fn fetch_page(&self, page: u32) -> Result<PageResponse, FeedError> {
        let url = self.endpoint("articles/")?;
        debug!(page, "fetching article page");
        self.send_json(self.client.get(url).query(&[("page", page)]))
            .await
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>, FeedError> {
        let url = self.endpoint("articles/")?;
        let since = since.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        debug!(%since, "polling for new articles");
        self.send_json(self.client.get(url).query(&[("since", since)]))
            .await
    }
}

/// Non-JSON bodies are fetch failures; JSON of the wrong shape is a validation failure.
pub(crate) fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, FeedError> {
    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(FeedError::Parse)?;
    serde_json::from_value(value).map_err(|e| FeedError::Validation(e.to_string()))
}
