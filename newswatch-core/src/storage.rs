use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::de::IgnoredAny;
use tracing::{debug, warn};

use crate::error::FeedError;

/// Key under which the visited article ids are stored.
pub const VISITED_ARTICLES_KEY: &str = "visitedNewsArticles";

/// String-valued durable storage, one value per key.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, FeedError>;
    fn set(&self, key: &str, value: &str) -> Result<(), FeedError>;
}

/// Stores each key as `<dir>/<key>.json`. Values are expected to be JSON.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn read_valid(path: &Path) -> Result<Option<String>, FeedError> {
        match std::fs::read_to_string(path) {
            Ok(raw) if serde_json::from_str::<IgnoredAny>(&raw).is_ok() => Ok(Some(raw)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, FeedError> {
        let path = self.path_for(key);
        if let Some(raw) = Self::read_valid(&path)? {
            return Ok(Some(raw));
        }
        // Only consulted when the main file is missing or corrupt.
        let tmp = path.with_extension("json.tmp");
        match Self::read_valid(&tmp)? {
            Some(raw) => {
                warn!(path = %path.display(), "stored value missing or corrupt, using temp file");
                Ok(Some(raw))
            }
            None => Ok(std::fs::read_to_string(&path).ok()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FeedError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "persisted value");
        Ok(())
    }
}

/// Process-local store. Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, FeedError> {
        let values = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), FeedError> {
        let mut values = self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Durable set of opened article ids, stored as a JSON array under one key.
#[derive(Debug, Clone)]
pub struct ReadStateStore<K> {
    backend: K,
    key: String,
}

impl<K: KeyValueStore> ReadStateStore<K> {
    pub fn new(backend: K) -> Self {
        Self::with_key(backend, VISITED_ARTICLES_KEY)
    }

    pub fn with_key(backend: K, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn backend(&self) -> &K {
        &self.backend
    }

    /// Never fails: missing or unreadable state means nothing was visited yet.
    pub fn load(&self) -> HashSet<i64> {
        let raw = match self.backend.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HashSet::new(),
            Err(e) => {
                warn!(error = %e, key = %self.key, "failed to read visited articles");
                return HashSet::new();
            }
        };
        match serde_json::from_str::<Vec<i64>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                warn!(error = %e, key = %self.key, "discarding unparsable visited articles");
                HashSet::new()
            }
        }
    }

    /// Writes `ids` as a sorted array. A stored value that already holds
    /// exactly these ids is left untouched, whatever its order.
    pub fn save(&self, ids: &HashSet<i64>) -> Result<(), FeedError> {
        if self.stored_ids().as_ref() == Some(ids) {
            return Ok(());
        }
        let mut sorted: Vec<i64> = ids.iter().copied().collect();
        sorted.sort_unstable();
        let raw = serde_json::to_string(&sorted).map_err(FeedError::Encode)?;
        self.backend.set(&self.key, &raw)
    }

    fn stored_ids(&self) -> Option<HashSet<i64>> {
        let raw = self.backend.get(&self.key).ok()??;
        let ids: Vec<i64> = serde_json::from_str(&raw).ok()?;
        Some(ids.into_iter().collect())
    }
}
