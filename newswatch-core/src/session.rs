use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::api::ArticleSource;
use crate::error::FeedError;
use crate::feed::Article;
use crate::pagination::{has_next, has_previous, PageResult};
use crate::poller::PollConfig;
use crate::storage::KeyValueStore;
use crate::sync::{FeedSynchronizer, FeedView, PageRequest, PollTicket};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCommand {
    GoToPage(u32),
    NextPage,
    PreviousPage,
    Refresh,
    MarkVisited(i64),
}

enum Completion {
    Page(PageRequest, Result<PageResult, FeedError>),
    Poll(PollTicket, Result<Vec<Article>, FeedError>),
}

pub struct FeedHandle {
    commands: mpsc::Sender<FeedCommand>,
    view: watch::Receiver<FeedView>,
    cancel_tx: broadcast::Sender<()>,
    join: JoinHandle<()>,
}

impl FeedHandle {
    pub async fn send(&self, command: FeedCommand) -> Result<(), FeedError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| FeedError::SessionClosed)
    }

    pub async fn go_to_page(&self, page: u32) -> Result<(), FeedError> {
        self.send(FeedCommand::GoToPage(page)).await
    }

    pub async fn mark_visited(&self, id: i64) -> Result<(), FeedError> {
        self.send(FeedCommand::MarkVisited(id)).await
    }

    /// Latest published snapshot.
    pub fn view(&self) -> FeedView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedView> {
        self.view.clone()
    }

    /// Cancels the poll schedule and waits for the session task to finish.
    pub async fn stop(self) -> Result<(), FeedError> {
        let _ = self.cancel_tx.send(());
        self.join.await.map_err(FeedError::from)
    }
}

/// Runs `sync` on its own task: loads the read state, fetches page 1, then
/// polls on `config.interval` while page 1 is shown.
///
/// All state changes happen on that task in arrival order. The poll timer
/// only exists while polling is armed and is dropped on navigation.
pub fn spawn_feed_session<S, K>(mut sync: FeedSynchronizer<S, K>, config: PollConfig) -> FeedHandle
where
    S: ArticleSource + Clone + 'static,
    K: KeyValueStore + 'static,
{
    let (command_tx, mut command_rx) = mpsc::channel(32);
    let (cancel_tx, mut cancel_rx) = broadcast::channel(1);
    sync.load_read_state();
    let (view_tx, view_rx) = watch::channel(sync.view());

    let join = tokio::spawn(async move {
        let mut in_flight: FuturesUnordered<BoxFuture<'static, Completion>> =
            FuturesUnordered::new();
        let mut ticker: Option<Interval> = None;
        let mut poll_pending = false;

        let request = sync.begin_page(1);
        in_flight.push(page_fetch(&sync, request));
        view_tx.send_replace(sync.view());

        loop {
            tokio::select! {
                _ = cancel_rx.recv() => {
                    info!("feed session shutdown requested");
                    break;
                }
                command = command_rx.recv() => {
                    let Some(command) = command else {
                        debug!("all feed handles dropped");
                        break;
                    };
                    if let Some(page) = target_page(&sync, command) {
                        let request = sync.begin_page(page);
                        in_flight.push(page_fetch(&sync, request));
                    } else if let FeedCommand::MarkVisited(id) = command {
                        sync.mark_visited(id);
                    }
                }
                _ = next_tick(&mut ticker) => {
                    if poll_pending {
                        debug!("previous poll still in flight, skipping tick");
                    } else if let Some(ticket) = sync.begin_poll() {
                        poll_pending = true;
                        let poller = sync.poller().clone();
                        in_flight.push(
                            async move {
                                let result = poller.poll_since(ticket.since).await;
                                Completion::Poll(ticket, result)
                            }
                            .boxed(),
                        );
                    }
                }
                Some(done) = in_flight.next(), if !in_flight.is_empty() => {
                    match done {
                        Completion::Page(request, result) => {
                            if let Err(e) = sync.complete_page(request, result) {
                                debug!(error = %e, "page failure surfaced to view");
                            }
                        }
                        Completion::Poll(ticket, result) => {
                            poll_pending = false;
                            sync.complete_poll(ticket, result);
                        }
                    }
                }
            }

            refresh_timer(&mut ticker, sync.polling_armed(), config.interval);
            view_tx.send_replace(sync.view());
        }
    });

    FeedHandle {
        commands: command_tx,
        view: view_rx,
        cancel_tx,
        join,
    }
}

fn target_page<S, K>(sync: &FeedSynchronizer<S, K>, command: FeedCommand) -> Option<u32>
where
    S: ArticleSource + Clone,
    K: KeyValueStore,
{
    let state = sync.state();
    match command {
        FeedCommand::GoToPage(page) => Some(page),
        FeedCommand::Refresh => Some(state.current_page),
        FeedCommand::NextPage if has_next(state.current_page, state.total_pages) => {
            Some(state.current_page + 1)
        }
        FeedCommand::PreviousPage if has_previous(state.current_page) => {
            Some(state.current_page - 1)
        }
        FeedCommand::NextPage | FeedCommand::PreviousPage => {
            warn!(?command, page = state.current_page, "no page in that direction");
            None
        }
        FeedCommand::MarkVisited(_) => None,
    }
}

fn page_fetch<S, K>(
    sync: &FeedSynchronizer<S, K>,
    request: PageRequest,
) -> BoxFuture<'static, Completion>
where
    S: ArticleSource + Clone + 'static,
    K: KeyValueStore,
{
    let pager = sync.pager().clone();
    async move {
        let result = pager.fetch_page(request.page).await;
        Completion::Page(request, result)
    }
    .boxed()
}

fn refresh_timer(ticker: &mut Option<Interval>, armed: bool, period: Duration) {
    match (armed, ticker.is_some()) {
        (true, false) => {
            debug!(?period, "arming poll timer");
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            *ticker = Some(interval);
        }
        (false, true) => {
            debug!("suspending poll timer");
            *ticker = None;
        }
        _ => {}
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
