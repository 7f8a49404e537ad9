use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::ArticleSource;
use crate::error::FeedError;
use crate::feed::{newest_created_at, Article};
use crate::merge::merge;
use crate::pagination::{PageResult, PaginationController};
use crate::poller::DeltaPoller;
use crate::storage::{KeyValueStore, ReadStateStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Loading(u32),
    Ready(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedState {
    /// Newest first on page 1, server order elsewhere. Ids are unique.
    pub articles: Vec<Article>,
    pub current_page: u32,
    pub total_pages: u32,
    /// `created_at` of the newest article known on page 1. Never moves backwards.
    pub latest_seen: Option<DateTime<Utc>>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            articles: Vec::new(),
            current_page: 1,
            total_pages: 0,
            latest_seen: None,
        }
    }
}

/// Handed out by [`FeedSynchronizer::begin_page`]; only the latest one is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    epoch: u64,
}

/// Handed out by [`FeedSynchronizer::begin_poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket {
    pub since: DateTime<Utc>,
    epoch: u64,
}

/// Snapshot published to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedView {
    pub phase: SyncPhase,
    pub articles: Vec<Article>,
    pub current_page: u32,
    pub total_pages: u32,
    pub polling: bool,
    pub error: Option<String>,
    pub visited: HashSet<i64>,
}

impl FeedView {
    pub fn is_loading(&self) -> bool {
        matches!(self.phase, SyncPhase::Loading(_))
    }

    pub fn is_visited(&self, id: i64) -> bool {
        self.visited.contains(&id)
    }

    pub fn article(&self, id: i64) -> Option<&Article> {
        self.articles.iter().find(|article| article.id == id)
    }
}

/// Owns the feed state of one view and applies page fetches, poll results and
/// read marks to it, one at a time.
///
/// Every navigation bumps an epoch. Page and poll completions carry the epoch
/// they were started under, so anything resolving after a newer navigation is
/// dropped instead of overwriting the page the user is on.
pub struct FeedSynchronizer<S, K> {
    pager: PaginationController<S>,
    poller: DeltaPoller<S>,
    read_store: ReadStateStore<K>,
    state: FeedState,
    phase: SyncPhase,
    visited: HashSet<i64>,
    last_error: Option<String>,
    epoch: u64,
}

impl<S, K> FeedSynchronizer<S, K>
where
    S: ArticleSource + Clone,
    K: KeyValueStore,
{
    pub fn new(source: S, read_store: ReadStateStore<K>) -> Self {
        Self {
            pager: PaginationController::new(source.clone()),
            poller: DeltaPoller::new(source),
            read_store,
            state: FeedState::default(),
            phase: SyncPhase::Idle,
            visited: HashSet::new(),
            last_error: None,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn visited(&self) -> &HashSet<i64> {
        &self.visited
    }

    pub fn is_visited(&self, id: i64) -> bool {
        self.visited.contains(&id)
    }

    pub fn pager(&self) -> &PaginationController<S> {
        &self.pager
    }

    pub fn poller(&self) -> &DeltaPoller<S> {
        &self.poller
    }

    pub fn view(&self) -> FeedView {
        FeedView {
            phase: self.phase,
            articles: self.state.articles.clone(),
            current_page: self.state.current_page,
            total_pages: self.state.total_pages,
            polling: self.polling_armed(),
            error: self.last_error.clone(),
            visited: self.visited.clone(),
        }
    }

    pub fn load_read_state(&mut self) {
        self.visited = self.read_store.load();
        debug!(visited = self.visited.len(), "loaded read state");
    }

    /// Loads the read state, then the first page.
    pub async fn start(&mut self) -> Result<(), FeedError> {
        self.load_read_state();
        self.go_to_page(1).await
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<(), FeedError> {
        let request = self.begin_page(page);
        let result = self.pager.fetch_page(request.page).await;
        self.complete_page(request, result)
    }

    pub fn begin_page(&mut self, page: u32) -> PageRequest {
        self.epoch += 1;
        self.phase = SyncPhase::Loading(page);
        PageRequest {
            page,
            epoch: self.epoch,
        }
    }

    /// Applies a page response. On failure the previous articles stay in
    /// place, the error is recorded for display and returned.
    pub fn complete_page(
        &mut self,
        request: PageRequest,
        result: Result<PageResult, FeedError>,
    ) -> Result<(), FeedError> {
        if request.epoch != self.epoch {
            debug!(page = request.page, "discarding superseded page response");
            return Ok(());
        }

        match result {
            Ok(page) => {
                self.state.total_pages = page.total_pages();
                self.state.current_page = request.page;
                if request.page == 1 {
                    if let Some(newest) = newest_created_at(&page.items) {
                        self.advance_latest_seen(newest);
                    }
                }
                info!(
                    page = request.page,
                    total_pages = self.state.total_pages,
                    articles = page.items.len(),
                    "page loaded"
                );
                self.state.articles = page.items;
                self.phase = SyncPhase::Ready(request.page);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                warn!(page = request.page, error = %e, "failed to load page");
                self.phase = SyncPhase::Ready(self.state.current_page);
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// True on a settled page 1 once a timestamp is known.
    pub fn polling_armed(&self) -> bool {
        self.state.current_page == 1
            && self.phase == SyncPhase::Ready(1)
            && self.state.latest_seen.is_some()
    }

    pub fn begin_poll(&self) -> Option<PollTicket> {
        if !self.polling_armed() {
            return None;
        }
        self.state.latest_seen.map(|since| PollTicket {
            since,
            epoch: self.epoch,
        })
    }

    /// Merges a poll result and returns how many articles were added. Poll
    /// failures and stale results leave the state untouched.
    pub fn complete_poll(
        &mut self,
        ticket: PollTicket,
        result: Result<Vec<Article>, FeedError>,
    ) -> usize {
        if ticket.epoch != self.epoch || self.state.current_page != 1 {
            debug!("discarding poll result that resolved after navigation");
            return 0;
        }

        let incoming = match result {
            Ok(incoming) => incoming,
            Err(e) => {
                warn!(error = %e, "poll failed, keeping current feed");
                return 0;
            }
        };
        self.last_error = None;
        let Some(newest) = newest_created_at(&incoming) else {
            return 0;
        };

        let before = self.state.articles.len();
        let existing = std::mem::take(&mut self.state.articles);
        self.state.articles = merge(existing, incoming);
        self.advance_latest_seen(newest);

        let added = self.state.articles.len() - before;
        if added > 0 {
            info!(added, "merged new articles");
        }
        added
    }

    /// One scheduled poll: a no-op unless polling is armed.
    pub async fn poll_tick(&mut self) -> usize {
        let Some(ticket) = self.begin_poll() else {
            return 0;
        };
        let result = self.poller.poll_since(ticket.since).await;
        self.complete_poll(ticket, result)
    }

    /// Records that the user opened `id`. Persistence failures are logged and
    /// do not undo the in-memory mark. Returns false if it was already marked.
    pub fn mark_visited(&mut self, id: i64) -> bool {
        if !self.visited.insert(id) {
            debug!(article_id = id, "article already marked as visited");
            return false;
        }
        if let Err(e) = self.read_store.save(&self.visited) {
            warn!(article_id = id, error = %e, "failed to persist read state");
        }
        true
    }

    fn advance_latest_seen(&mut self, candidate: DateTime<Utc>) {
        match self.state.latest_seen {
            Some(current) if current >= candidate => {}
            _ => self.state.latest_seen = Some(candidate),
        }
    }
}
