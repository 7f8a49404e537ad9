use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub source_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
}

impl Article {
    /// Source url without scheme, leading `www.` and trailing slash.
    pub fn source_label(&self) -> &str {
        let url = self.source_url.as_str();
        let url = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        let url = url.strip_prefix("www.").unwrap_or(url);
        url.strip_suffix('/').unwrap_or(url)
    }
}

/// Single article as served by the detail endpoint, with its scraped body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleDetail {
    pub id: i64,
    pub title: String,
    pub link: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Keyword {
    pub id: i64,
    pub word: String,
}

/// Paginated listing envelope returned by `GET articles/?page=N`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageResponse {
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<Article>,
}

/// Newest `created_at` among `articles`, regardless of their order.
pub fn newest_created_at(articles: &[Article]) -> Option<DateTime<Utc>> {
    articles.iter().map(|article| article.created_at).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article_with_source(source_url: &str) -> Article {
        Article {
            id: 1,
            title: "t".into(),
            link: "https://example.com/a".into(),
            source_url: source_url.into(),
            created_at: Utc::now(),
            scraped_time: None,
            matched_keywords: Vec::new(),
        }
    }

    #[test]
    fn source_label_strips_scheme_www_and_trailing_slash() {
        assert_eq!(
            article_with_source("https://www.example.com/").source_label(),
            "example.com"
        );
        assert_eq!(
            article_with_source("http://news.example.org/tech/").source_label(),
            "news.example.org/tech"
        );
        assert_eq!(article_with_source("example.net").source_label(), "example.net");
    }

    #[test]
    fn deserializes_article_without_optional_fields() {
        let json = r#"{
            "id": 7,
            "title": "Rust 2.0",
            "link": "https://example.com/rust",
            "created_at": "2024-10-21T07:28:00Z"
        }"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.id, 7);
        assert!(article.matched_keywords.is_empty());
        assert_eq!(article.source_url, "");
        assert!(article.scraped_time.is_none());
    }

    #[test]
    fn page_response_requires_results() {
        let json = r#"{ "count": 3, "next": null, "previous": null }"#;
        assert!(serde_json::from_str::<PageResponse>(json).is_err());
    }
}
