use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::api::ArticleSource;
use crate::config::ClientConfig;
use crate::error::FeedError;
use crate::feed::Article;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
        }
    }
}

impl From<&ClientConfig> for PollConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeltaPoller<S> {
    source: S,
}

impl<S: ArticleSource> DeltaPoller<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Articles created strictly after `since`, in server order (newest first).
    pub async fn poll_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>, FeedError> {
        let articles = self.source.fetch_since(since).await?;
        debug!(%since, found = articles.len(), "poll completed");
        Ok(articles)
    }
}
