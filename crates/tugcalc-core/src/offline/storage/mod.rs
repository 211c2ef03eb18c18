//! Named response caches keyed by request identity.
//!
//! Each cache generation is one named cache. Two backends are provided:
//! - `MemoryStorage`: process-local, used by tests and ephemeral hosts
//! - `DiskStorage`: one directory per cache under the user cache dir

pub mod disk;
pub mod memory;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use super::http::Response;
use super::StorageError;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

/// A stored response and when it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub response: Response,
    pub cached_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(response: Response) -> Self {
        Self {
            response,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }
}

/// Blob cache capability provided by the host.
pub trait CacheStorage: Send + Sync {
    /// Names of all existing caches.
    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, StorageError>>;

    fn has<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<bool, StorageError>>;

    /// Create the cache if it does not exist yet.
    fn open<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Remove a cache and everything in it. Returns whether it existed.
    fn delete<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<bool, StorageError>>;

    fn match_entry<'a>(
        &'a self,
        cache: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<CachedResponse>, StorageError>>;

    /// Store a response, replacing any previous one for `key`.
    fn put<'a>(
        &'a self,
        cache: &'a str,
        key: &'a str,
        response: Response,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Store several responses in one step; either all land or none do.
    fn put_all<'a>(
        &'a self,
        cache: &'a str,
        entries: Vec<(String, Response)>,
    ) -> BoxFuture<'a, Result<(), StorageError>>;
}
