#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use newswatch_core::{Article, ArticleSource, FeedError, PageResponse};

pub fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 21, hour, 0, 0).unwrap()
}

pub fn article(id: i64, hour: u32) -> Article {
    Article {
        id,
        title: format!("Article {id}"),
        link: format!("https://example.com/{id}"),
        source_url: "https://www.example.com/".into(),
        created_at: at(hour),
        scraped_time: None,
        matched_keywords: vec!["rust".into()],
    }
}

pub fn page_of(count: u64, results: Vec<Article>) -> PageResponse {
    PageResponse {
        count,
        next: None,
        previous: None,
        results,
    }
}

pub fn ids(articles: &[Article]) -> Vec<i64> {
    articles.iter().map(|a| a.id).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Page(u32),
    Since(DateTime<Utc>),
}

#[derive(Default)]
struct Script {
    pages: HashMap<u32, VecDeque<Option<PageResponse>>>,
    polls: VecDeque<Option<Vec<Article>>>,
    calls: Vec<Call>,
}

/// In-memory article source answering from queued responses.
///
/// A page with nothing queued fails with a 500; a poll with nothing queued
/// returns no articles.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, page: u32, response: PageResponse) {
        let mut script = self.script.lock().unwrap();
        script.pages.entry(page).or_default().push_back(Some(response));
    }

    pub fn push_page_failure(&self, page: u32) {
        let mut script = self.script.lock().unwrap();
        script.pages.entry(page).or_default().push_back(None);
    }

    pub fn push_poll(&self, articles: Vec<Article>) {
        self.script.lock().unwrap().polls.push_back(Some(articles));
    }

    pub fn push_poll_failure(&self) {
        self.script.lock().unwrap().polls.push_back(None);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn poll_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Since(_)))
            .count()
    }
}

impl ArticleSource for ScriptedSource {
    async fn fetch_page(&self, page: u32) -> Result<PageResponse, FeedError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call::Page(page));
            script.pages.get_mut(&page).and_then(VecDeque::pop_front)
        };
        match next {
            Some(Some(response)) => Ok(response),
            _ => Err(FeedError::Status {
                status: 500,
                url: format!("/api/articles/?page={page}"),
            }),
        }
    }

    async fn fetch_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>, FeedError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call::Since(since));
            script.polls.pop_front()
        };
        match next {
            Some(Some(articles)) => Ok(articles),
            Some(None) => Err(FeedError::Status {
                status: 503,
                url: "/api/articles/?since=".into(),
            }),
            None => Ok(Vec::new()),
        }
    }
}
