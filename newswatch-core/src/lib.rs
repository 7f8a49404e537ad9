pub mod api;
pub mod config;
pub mod error;
pub mod feed;
pub mod health;
pub mod highlight;
pub mod merge;
pub mod pagination;
pub mod poller;
pub mod session;
pub mod storage;
pub mod sync;

pub use api::{ApiClient, ArticleSource};
pub use config::ClientConfig;
pub use error::{ErrorKind, FeedError};
pub use feed::{Article, ArticleDetail, Keyword, PageResponse};
pub use health::{HealthSummary, ProbeOutcome, ProbeReport};
pub use highlight::{highlight, Highlighter, Segment};
pub use merge::merge;
pub use pagination::{page_window, total_pages, PageResult, PaginationController, PAGE_SIZE};
pub use poller::{DeltaPoller, PollConfig};
pub use session::{spawn_feed_session, FeedCommand, FeedHandle};
pub use storage::{FileStore, KeyValueStore, MemoryStore, ReadStateStore, VISITED_ARTICLES_KEY};
pub use sync::{FeedState, FeedSynchronizer, FeedView, PageRequest, PollTicket, SyncPhase};
