use std::collections::BTreeMap;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::RwLock;

use super::{CacheStorage, CachedResponse};
use crate::offline::http::Response;
use crate::offline::StorageError;

type Entries = BTreeMap<String, CachedResponse>;

/// In-process cache storage. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    caches: RwLock<BTreeMap<String, Entries>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in a cache, `None` if the cache does not exist.
    pub async fn len(&self, cache: &str) -> Option<usize> {
        self.caches.read().await.get(cache).map(|e| e.len())
    }
}

impl CacheStorage for MemoryStorage {
    fn keys(&self) -> BoxFuture<'_, Result<Vec<String>, StorageError>> {
        async move { Ok(self.caches.read().await.keys().cloned().collect()) }.boxed()
    }

    fn has<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<bool, StorageError>> {
        async move { Ok(self.caches.read().await.contains_key(cache)) }.boxed()
    }

    fn open<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.caches
                .write()
                .await
                .entry(cache.to_string())
                .or_default();
            Ok(())
        }
        .boxed()
    }

    fn delete<'a>(&'a self, cache: &'a str) -> BoxFuture<'a, Result<bool, StorageError>> {
        async move { Ok(self.caches.write().await.remove(cache).is_some()) }.boxed()
    }

    fn match_entry<'a>(
        &'a self,
        cache: &'a str,
        key: &'a str,
    ) -> BoxFuture<'a, Result<Option<CachedResponse>, StorageError>> {
        async move {
            Ok(self
                .caches
                .read()
                .await
                .get(cache)
                .and_then(|entries| entries.get(key))
                .cloned())
        }
        .boxed()
    }

    fn put<'a>(
        &'a self,
        cache: &'a str,
        key: &'a str,
        response: Response,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            self.caches
                .write()
                .await
                .entry(cache.to_string())
                .or_default()
                .insert(key.to_string(), CachedResponse::new(response));
            Ok(())
        }
        .boxed()
    }

    fn put_all<'a>(
        &'a self,
        cache: &'a str,
        entries: Vec<(String, Response)>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut caches = self.caches.write().await;
            let target = caches.entry(cache.to_string()).or_default();
            for (key, response) in entries {
                target.insert(key, CachedResponse::new(response));
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::http::ResponseType;
    use reqwest::Url;

    fn response(body: &str) -> Response {
        let url = Url::parse("https://tug.example/app.js").unwrap();
        Response::new(&url, 200, ResponseType::Basic, body)
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let storage = MemoryStorage::new();
        storage.put("static-v1", "k", response("one")).await.unwrap();
        let hit = storage.match_entry("static-v1", "k").await.unwrap().unwrap();
        assert_eq!(hit.response.body, b"one");
        assert!(storage.match_entry("static-v1", "other").await.unwrap().is_none());
        assert!(storage.match_entry("static-v2", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let storage = MemoryStorage::new();
        storage.put("c", "k", response("old")).await.unwrap();
        storage.put("c", "k", response("new")).await.unwrap();
        let hit = storage.match_entry("c", "k").await.unwrap().unwrap();
        assert_eq!(hit.response.body, b"new");
        assert_eq!(storage.len("c").await, Some(1));
    }

    #[tokio::test]
    async fn test_open_keys_delete() {
        let storage = MemoryStorage::new();
        storage.open("b").await.unwrap();
        storage.open("a").await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["a", "b"]);
        assert!(storage.has("a").await.unwrap());
        assert!(storage.delete("a").await.unwrap());
        assert!(!storage.delete("a").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["b"]);
    }
}
