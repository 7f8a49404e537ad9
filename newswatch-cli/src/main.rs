mod app;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use newswatch_core::{
    spawn_feed_session, ApiClient, ClientConfig, FeedError, FeedSynchronizer, FileStore,
    PollConfig, ReadStateStore,
};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::app::WatchApp;

const HEALTH_PROBE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Parser)]
#[command(
    name = "newswatch",
    version,
    about = "Follow keyword-matched news from the terminal"
)]
struct Args {
    /// API base URL, overrides the config file and NEWSWATCH_API_URL
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Follow the live feed (default)
    Watch,
    /// Print one page of articles
    Page {
        #[arg(default_value_t = 1)]
        number: u32,
    },
    /// Show an article with its matched keywords highlighted
    Show { id: i64 },
    /// Manage the keyword watch-list
    Keywords {
        #[command(subcommand)]
        action: Option<KeywordAction>,
    },
    /// Check that the API endpoints respond
    Health,
}

#[derive(Debug, Subcommand)]
enum KeywordAction {
    List,
    Add { word: String },
    Remove { id: i64 },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, kind = ?e.kind(), "newswatch failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(args: &Args) -> Result<ClientConfig, FeedError> {
    let config = match &args.config {
        Some(path) => ClientConfig::load_from(path)?,
        None => ClientConfig::load(),
    };
    Ok(config.with_env_overrides().with_api_url(args.api_url.clone()))
}

fn read_state(config: &ClientConfig) -> Result<ReadStateStore<FileStore>, FeedError> {
    Ok(ReadStateStore::new(FileStore::new(config.data_dir()?)))
}

async fn run(args: Args) -> Result<ExitCode, FeedError> {
    let config = load_config(&args)?;
    let api = ApiClient::from_config(&config)?;

    match args.command.unwrap_or(Command::Watch) {
        Command::Watch => {
            let sync = FeedSynchronizer::new(api.clone(), read_state(&config)?);
            let handle = spawn_feed_session(sync, PollConfig::from(&config));
            WatchApp::new(handle, api).run().await?;
        }
        Command::Page { number } => {
            let mut sync = FeedSynchronizer::new(api, read_state(&config)?);
            sync.load_read_state();
            sync.go_to_page(number).await?;
            print!("{}", render::feed(&sync.view()));
        }
        Command::Show { id } => {
            let detail = api.fetch_article(id).await?;
            print!("{}", render::detail(&detail));
        }
        Command::Keywords { action } => match action.unwrap_or(KeywordAction::List) {
            KeywordAction::List => {
                let keywords = api.list_keywords().await?;
                if keywords.is_empty() {
                    println!("No keywords yet. Add one with `newswatch keywords add <word>`.");
                }
                for keyword in keywords {
                    println!("{:>5}  {}", keyword.id, keyword.word);
                }
            }
            KeywordAction::Add { word } => {
                let keyword = api.add_keyword(&word).await?;
                println!("added keyword {} ({})", keyword.word, keyword.id);
            }
            KeywordAction::Remove { id } => {
                api.delete_keyword(id).await?;
                println!("removed keyword {id}");
            }
        },
        Command::Health => {
            let summary = api.check_health(HEALTH_PROBE_DELAY).await;
            print!("{}", render::health(api.base_url().as_str(), &summary));
            if !summary.is_healthy() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn watch_is_the_default() {
        let args =
            Args::try_parse_from(["newswatch", "--api-url", "http://news.local/api"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.api_url.as_deref(), Some("http://news.local/api"));
    }

    #[test]
    fn page_defaults_to_first() {
        let args = Args::try_parse_from(["newswatch", "page"]).unwrap();
        assert!(matches!(args.command, Some(Command::Page { number: 1 })));
    }

    #[test]
    fn keyword_subcommands() {
        let args = Args::try_parse_from(["newswatch", "keywords", "add", "rust"]).unwrap();
        let Some(Command::Keywords {
            action: Some(KeywordAction::Add { word }),
        }) = args.command
        else {
            panic!("expected a keywords add command");
        };
        assert_eq!(word, "rust");
    }
}
