use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{CacheStorage, CachedResponse};
use crate::offline::http::{Response, ResponseType};
use crate::offline::StorageError;

/// Index file name inside each cache directory
const INDEX_FILE: &str = "index.json";

/// On-disk layout of one cache: `<root>/<cache>/index.json` plus one
/// `<id>.body` file per entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheIndex {
    name: String,
    next_id: u64,
    entries: BTreeMap<String, IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    body_file: String,
    url: String,
    status: u16,
    kind: ResponseType,
    headers: Vec<(String, String)>,
    cached_at: DateTime<Utc>,
}

impl CacheIndex {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }
}

/// Cache storage persisted under a directory, surviving restarts.
pub struct DiskStorage {
    root: PathBuf,
    // Serializes index read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl DiskStorage {
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn cache_dir(&self, cache: &str) -> PathBuf {
        let safe: String = cache
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(safe)
    }

    fn load_index(&self, cache: &str) -> Result<Option<CacheIndex>, StorageError> {
        let path = self.cache_dir(cache).join(INDEX_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Like `load_index`, but a corrupt index is thrown away together with
    /// its bodies so the cache can be repopulated.
    fn load_index_or_reset(&self, cache: &str) -> Result<Option<CacheIndex>, StorageError> {
        match self.load_index(cache) {
            Err(StorageError::Corrupt(e)) => {
                warn!(cache = %cache, error = %e, "Discarding corrupt cache index");
                let dir = self.cache_dir(cache);
                std::fs::remove_dir_all(&dir)?;
                std::fs::create_dir_all(&dir)?;
                Ok(None)
            }
            other => other,
        }
    }

    fn save_index(&self, index: &CacheIndex) -> Result<(), StorageError> {
        let dir = self.cache_dir(&index.name);
        std::fs::create_dir_all(&dir)?;
        let contents = serde_json::to_string_pretty(index)?;
        // Write then rename so a crash never leaves a half-written index.
        let tmp = dir.join(format!("{}.tmp", INDEX_FILE));
        std::fs::write(&tmp, contents)?;
        std::fs::rename(tmp, dir.join(INDEX_FILE))?;
        Ok(())
    }

    /// Write bodies and return the updated index, without committing it.
    fn stage(
        &self,
        cache: &str,
        entries: Vec<(String, Response)>,
    ) -> Result<(CacheIndex, Vec<PathBuf>), StorageError> {
        let dir = self.cache_dir(cache);
        std::fs::create_dir_all(&dir)?;

        let mut index = self
            .load_index_or_reset(cache)?
            .unwrap_or_else(|| CacheIndex::new(cache));
        let mut replaced = Vec::new();

        for (key, response) in entries {
            let body_file = format!("{}.body", index.next_id);
            index.next_id += 1;
            std::fs::write(dir.join(&body_file), &response.body)?;

            let entry = IndexEntry {
                body_file,
                url: response.url,
                status: response.status,
                kind: response.kind,
                headers: response.headers,
                cached_at: Utc::now(),
            };
            if let Some(old) = index.entries.insert(key, entry) {
                replaced.push(dir.join(old.body_file));
            }
        }

        Ok((index, replaced))
    }

    fn write_entries(&self, cache: &str, entries: Vec<(String, Response)>) -> Result<(), StorageError> {
        let (index, replaced) = self.stage(cache, entries)?;
        self.save_index(&index)?;
        for path in replaced {
            if let Err(e) = std::fs::remove_file(&path) {
                debug!(path = ?path, error = %e, "Failed to remove replaced cache body");
            }
        }
        Ok(())
    }

    fn read_entry(&self, cache: &str, key: &str) -> Result<Option<CachedResponse>, StorageError> {
        let Some(index) = self.load_index(cache)? else {
            return Ok(None);
        };
        let Some(entry) = index.entries.get(key) else {
            return Ok(None);
        };

        let body = std::fs::read(self.cache_dir(cache).join(&entry.body_file))?;
        Ok(Some(CachedResponse {
            response: Response {
                url: entry.url.clone(),
                status: entry.status,
                kind: entry.kind,
                headers: entry.headers.clone(),
                body,
            },
            cached_at: entry.cached_at,
        }))
    }

    /// Names of every cache under the root. A cache whose index cannot be
    /// read is listed under its directory name so it can still be deleted.
    fn list(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for dir_entry in std::fs::read_dir(&self.root)? {
            let path = match dir_entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!(root = ?self.root, error = %e, "Skipping unreadable cache entry");
                    continue;
                }
            };
            let index_path = path.join(INDEX_FILE);
            if !path.is_dir() || !index_path.exists() {
                continue;
            }
            match read_index_name(&index_path) {
                Ok(name) => names.push(name),
                Err(e) => {
                    warn!(path = ?index_path, error = %e, "Unreadable cache index");
                    if let Some(dir_name) = path.file_name().and_then(|n| n.to_str()) {
                        names.push(dir_name.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }
}

fn read_index_name(path: &Path) -> Result<String, StorageError> {
    let contents = std::fs::read_to_string(path)?;
    let index: CacheIndex = serde_json::from_str(&contents)?;
    Ok(index.name)
}

impl CacheStorage for DiskStorage {
    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, StorageError>> {
        async move { self.list() }.boxed()
    }

    fn has<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<bool, StorageError>> {
        async move { Ok(self.cache_dir(cache).join(INDEX_FILE).exists()) }.boxed()
    }

    fn open<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let _guard = self.write_lock.lock().await;
            if self.load_index_or_reset(cache)?.is_none() {
                self.save_index(&CacheIndex::new(cache))?;
            }
            Ok::<_, StorageError>(())
        }
        .boxed()
    }

    fn delete<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<bool, StorageError>> {
        async move {
            let _guard = self.write_lock.lock().await;
            let dir = self.cache_dir(cache);
            if !dir.exists() {
                return Ok(false);
            }
            std::fs::remove_dir_all(dir)?;
            Ok::<_, StorageError>(true)
        }
        .boxed()
    }

    fn match_entry<'a>(
        &'a self,
        cache: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<CachedResponse>, StorageError>> {
        async move { self.read_entry(cache, key) }.boxed()
    }

    fn put<'a>(
        &'a self,
        cache: &'a str,
        key: &'a str,
        response: Response,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let _guard = self.write_lock.lock().await;
            self.write_entries(cache, vec![(key.to_string(), response)])
        }
        .boxed()
    }

    fn put_all<'a>(
        &'a self,
        cache: &'a str,
        entries: Vec<(String, Response)>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let _guard = self.write_lock.lock().await;
            self.write_entries(cache, entries)
        }
        .boxed()
    }
}
