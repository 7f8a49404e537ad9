use std::collections::HashSet;

use newswatch_core::{ApiClient, FeedCommand, FeedError, FeedHandle, FeedView};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::render;

pub const HELP: &str = "\
commands:
  n            next page
  p            previous page
  <number>     jump to page
  r            reload the current page
  o <id>       open article in the browser
  s <id>       show article text
  c <id>       print the article link
  h            this help
  q            quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Next,
    Previous,
    Page(u32),
    Refresh,
    Open(i64),
    Show(i64),
    CopyLink(i64),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_input(line: &str) -> Input {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Input::Empty;
    };
    let argument = words.next();

    match (command, argument) {
        ("n" | "next", None) => Input::Next,
        ("p" | "prev", None) => Input::Previous,
        ("r" | "refresh", None) => Input::Refresh,
        ("h" | "help" | "?", None) => Input::Help,
        ("q" | "quit", None) => Input::Quit,
        ("o" | "open", Some(id)) => id.parse().map_or_else(|_| unknown(line), Input::Open),
        ("s" | "show", Some(id)) => id.parse().map_or_else(|_| unknown(line), Input::Show),
        ("c" | "copy", Some(id)) => id.parse().map_or_else(|_| unknown(line), Input::CopyLink),
        (number, None) => number.parse().map_or_else(|_| unknown(line), Input::Page),
        _ => unknown(line),
    }
}

fn unknown(line: &str) -> Input {
    Input::Unknown(line.trim().to_string())
}

pub struct WatchApp {
    handle: FeedHandle,
    api: ApiClient,
    last: Option<FeedView>,
}

impl WatchApp {
    pub fn new(handle: FeedHandle, api: ApiClient) -> Self {
        Self {
            handle,
            api,
            last: None,
        }
    }

    pub async fn run(mut self) -> Result<(), FeedError> {
        let mut views = self.handle.subscribe();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!("{HELP}");
        let initial = views.borrow_and_update().clone();
        self.draw(initial);

        loop {
            tokio::select! {
                changed = views.changed() => {
                    if changed.is_err() {
                        warn!("feed session ended");
                        break;
                    }
                    let view = views.borrow_and_update().clone();
                    self.draw(view);
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if !self.handle_input(parse_input(&line)).await? {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!(error = %e, "stdin read failed");
                            break;
                        }
                    }
                }
            }
        }

        info!("leaving watch mode");
        self.handle.stop().await
    }

    /// Returns false once the user asked to quit.
    async fn handle_input(&self, input: Input) -> Result<bool, FeedError> {
        match input {
            Input::Next => self.handle.send(FeedCommand::NextPage).await?,
            Input::Previous => self.handle.send(FeedCommand::PreviousPage).await?,
            Input::Page(page) => self.handle.go_to_page(page).await?,
            Input::Refresh => self.handle.send(FeedCommand::Refresh).await?,
            Input::Open(id) => self.open(id).await?,
            Input::Show(id) => self.show(id).await?,
            Input::CopyLink(id) => self.copy_link(id).await,
            Input::Help => println!("{HELP}"),
            Input::Quit => return Ok(false),
            Input::Empty => {}
            Input::Unknown(text) => println!("unknown command `{text}`, type h for help"),
        }
        Ok(true)
    }

    fn link_on_page(&self, id: i64) -> Option<String> {
        self.last
            .as_ref()
            .and_then(|view| view.article(id))
            .map(|article| article.link.clone())
    }

    /// Prints the bare link so the terminal can copy it. Articles off the
    /// current page are looked up through the detail endpoint.
    async fn copy_link(&self, id: i64) {
        if let Some(link) = self.link_on_page(id) {
            println!("{link}");
            return;
        }
        match self.api.fetch_article(id).await {
            Ok(detail) => println!("{}", detail.link),
            Err(e) => println!("Failed to fetch article: {e}"),
        }
    }

    async fn open(&self, id: i64) -> Result<(), FeedError> {
        let Some(link) = self.link_on_page(id) else {
            println!("article {id} is not on this page");
            return Ok(());
        };
        if let Err(e) = webbrowser::open(&link) {
            warn!(error = %e, %link, "could not open browser");
            println!("{link}");
        }
        self.handle.mark_visited(id).await
    }

    async fn show(&self, id: i64) -> Result<(), FeedError> {
        match self.api.fetch_article(id).await {
            Ok(detail) => {
                print!("{}", render::detail(&detail));
                self.handle.mark_visited(id).await?;
            }
            Err(e) => println!("Failed to fetch article: {e}"),
        }
        Ok(())
    }

    fn draw(&mut self, view: FeedView) {
        match &self.last {
            Some(last) if !needs_redraw(last, &view) => {
                let known: HashSet<i64> = last.articles.iter().map(|a| a.id).collect();
                let fresh: Vec<_> = view
                    .articles
                    .iter()
                    .filter(|article| !known.contains(&article.id))
                    .collect();
                if !fresh.is_empty() {
                    println!("{} new article(s):", fresh.len());
                    for article in fresh {
                        println!("{}", render::article_line(article, view.is_visited(article.id)));
                    }
                }
            }
            _ => print!("{}", render::feed(&view)),
        }
        self.last = Some(view);
    }
}

fn needs_redraw(last: &FeedView, next: &FeedView) -> bool {
    last.phase != next.phase
        || last.error != next.error
        || last.current_page != next.current_page
        || last.total_pages != next.total_pages
}
