use std::sync::Arc;

use futures::future::try_join_all;
use reqwest::{Method, Url};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::http::{cache_key, CacheMode, Request, Response};
use super::network::Network;
use super::storage::CacheStorage;
use super::{FetchError, InstallError};

/// Prefix for cache generation names
pub const DEFAULT_CACHE_PREFIX: &str = "tugcalc-static";

/// Relative path of the reference dataset
pub const DEFAULT_DATASET_PATH: &str = "./tug_requirements.csv";

/// Shell assets with stable paths, pre-cached on install.
pub const DEFAULT_ASSETS: [&str; 6] = [
    "./",
    "./styles.css",
    "./app.js",
    "./manifest.webmanifest",
    "./icons/icon-192.png",
    "./icons/icon-512.png",
];

/// Documents tried, in order, when a navigation fails offline.
const SHELL_FALLBACKS: [&str; 2] = ["./", "./index.html"];

/// What one cache generation serves and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Base URL the shell is served from; relative paths resolve against it.
    pub scope: Url,
    pub cache_prefix: String,
    pub version: String,
    pub assets: Vec<String>,
    pub dataset_path: String,
}

impl ShellConfig {
    pub fn new(scope: Url, version: &str) -> Self {
        Self {
            scope,
            cache_prefix: DEFAULT_CACHE_PREFIX.to_string(),
            version: version.to_string(),
            assets: DEFAULT_ASSETS.iter().map(|s| s.to_string()).collect(),
            dataset_path: DEFAULT_DATASET_PATH.to_string(),
        }
    }

    /// Name of the cache holding this generation, e.g. `tugcalc-static-v6`.
    pub fn cache_name(&self) -> String {
        format!("{}-{}", self.cache_prefix, self.version)
    }

    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.scope
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", path, e)))
    }

    pub fn dataset_url(&self) -> Result<Url, FetchError> {
        self.resolve(&self.dataset_path)
    }
}

/// Lifecycle of a cache generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Parsed,
    Installing,
    /// Populated, waiting to take over from the active generation.
    Installed,
    Activating,
    Activated,
    /// Failed to install, or replaced by a newer generation.
    Redundant,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleState::Parsed => write!(f, "parsed"),
            LifecycleState::Installing => write!(f, "installing"),
            LifecycleState::Installed => write!(f, "installed"),
            LifecycleState::Activating => write!(f, "activating"),
            LifecycleState::Activated => write!(f, "activated"),
            LifecycleState::Redundant => write!(f, "redundant"),
        }
    }
}

/// How an intercepted request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Page shell: network first, cached shell when offline.
    NavigationNetworkFirst,
    /// Reference dataset: network first, refresh the cached copy.
    DatasetNetworkFirst,
    /// Static assets: cache first, fill the cache on miss.
    CacheFirst,
}

/// One version of the offline shell and the cache that backs it.
pub struct CacheGeneration {
    config: ShellConfig,
    cache_name: String,
    dataset_url: Url,
    network: Arc<dyn Network>,
    storage: Arc<dyn CacheStorage>,
    state: LifecycleState,
    controls_clients: bool,
    // Cache writes still running after their response was handed back.
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl CacheGeneration {
    pub fn new(
        config: ShellConfig,
        network: Arc<dyn Network>,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<Self, FetchError> {
        let dataset_url = config.dataset_url()?;
        Ok(Self {
            cache_name: config.cache_name(),
            config,
            dataset_url,
            network,
            storage,
            state: LifecycleState::Parsed,
            controls_clients: false,
            background: Mutex::new(Vec::new()),
        })
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn controls_clients(&self) -> bool {
        self.controls_clients
    }

    pub(crate) fn set_state(&mut self, state: LifecycleState) {
        debug!(cache = %self.cache_name, from = %self.state, to = %state, "Cache generation state change");
        self.state = state;
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Populate the cache with every shell asset, all-or-nothing.
    pub async fn install(&mut self) -> Result<(), InstallError> {
        self.set_state(LifecycleState::Installing);
        info!(cache = %self.cache_name, assets = self.config.assets.len(), "Installing cache generation");

        match self.populate().await {
            Ok(()) => {
                self.set_state(LifecycleState::Installed);
                Ok(())
            }
            Err(e) => {
                warn!(cache = %self.cache_name, error = %e, "Cache install failed");
                self.set_state(LifecycleState::Redundant);
                Err(e)
            }
        }
    }

    async fn populate(&self) -> Result<(), InstallError> {
        self.storage
            .open(&self.cache_name)
            .await
            .map_err(|source| InstallError::Storage {
                cache: self.cache_name.clone(),
                source,
            })?;

        let fetches = self.config.assets.iter().map(|path| self.fetch_asset(path));
        let entries = try_join_all(fetches).await?;

        self.storage
            .put_all(&self.cache_name, entries)
            .await
            .map_err(|source| InstallError::Storage {
                cache: self.cache_name.clone(),
                source,
            })
    }

    async fn fetch_asset(&self, path: &str) -> Result<(String, Response), InstallError> {
        let url = self
            .config
            .resolve(path)
            .map_err(|_| InstallError::InvalidPath(path.to_string()))?;
        let request = Request::get(url);

        let response = self
            .network
            .fetch(&request)
            .await
            .map_err(|source| InstallError::Fetch {
                url: request.url.to_string(),
                source,
            })?;
        if !response.ok() {
            return Err(InstallError::BadStatus {
                url: request.url.to_string(),
                status: response.status,
            });
        }
        Ok((request.cache_key(), response))
    }

    /// True when this generation's cache already holds every shell asset,
    /// e.g. from an earlier run against persistent storage.
    pub async fn is_populated(&self) -> bool {
        match self.storage.has(&self.cache_name).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                debug!(cache = %self.cache_name, error = %e, "Failed to check cache");
                return false;
            }
        }
        for path in &self.config.assets {
            let Ok(url) = self.config.resolve(path) else {
                return false;
            };
            if self.cached(&cache_key(&url)).await.is_none() {
                return false;
            }
        }
        true
    }

    /// Delete every other cache generation and take control of open clients.
    /// Returns the names of the deleted caches.
    pub async fn activate(&mut self) -> Vec<String> {
        self.set_state(LifecycleState::Activating);

        let mut deleted = Vec::new();
        match self.storage.keys().await {
            Ok(names) => {
                for name in names.into_iter().filter(|n| *n != self.cache_name) {
                    match self.storage.delete(&name).await {
                        Ok(_) => {
                            info!(cache = %name, "Deleted stale cache generation");
                            deleted.push(name);
                        }
                        Err(e) => warn!(cache = %name, error = %e, "Failed to delete stale cache"),
                    }
                }
            }
            Err(e) => warn!(error = %e, "Failed to list caches during activation"),
        }

        self.controls_clients = true;
        self.set_state(LifecycleState::Activated);
        info!(cache = %self.cache_name, "Cache generation active");
        deleted
    }

    // =========================================================================
    // Fetch interception
    // =========================================================================

    /// Which policy applies, or `None` when the request is left to the
    /// network untouched (non-GET or cross-origin).
    pub fn strategy_for(&self, request: &Request) -> Option<Strategy> {
        if request.method != Method::GET {
            return None;
        }
        if request.url.origin() != self.config.scope.origin() {
            return None;
        }
        if request.is_html() {
            Some(Strategy::NavigationNetworkFirst)
        } else if request.url.path() == self.dataset_url.path() {
            Some(Strategy::DatasetNetworkFirst)
        } else {
            Some(Strategy::CacheFirst)
        }
    }

    /// Answer an intercepted request. `None` means not intercepted.
    pub async fn intercept(&self, request: &Request) -> Option<Response> {
        let strategy = self.strategy_for(request)?;
        debug!(url = %request.url, ?strategy, "Intercepting fetch");

        let response = match strategy {
            Strategy::NavigationNetworkFirst => self.navigation(request).await,
            Strategy::DatasetNetworkFirst => self.dataset(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
        };
        Some(response)
    }

    async fn navigation(&self, request: &Request) -> Response {
        let live = request.clone().with_cache(CacheMode::NoStore);
        match self.network.fetch(&live).await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %request.url, error = %e, "Navigation failed, serving cached shell");
                for path in SHELL_FALLBACKS {
                    let Ok(url) = self.config.resolve(path) else {
                        continue;
                    };
                    if let Some(hit) = self.cached(&cache_key(&url)).await {
                        return hit;
                    }
                }
                Response::error()
            }
        }
    }

    async fn dataset(&self, request: &Request) -> Response {
        let key = cache_key(&self.dataset_url);
        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store_in_background(key, response.clone()).await;
                }
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Dataset fetch failed, trying cache");
                self.cached(&key).await.unwrap_or_else(Response::error)
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> Response {
        let key = request.cache_key();
        if let Some(hit) = self.cached(&key).await {
            return hit;
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    if let Err(e) = self
                        .storage
                        .put(&self.cache_name, &key, response.clone())
                        .await
                    {
                        warn!(key = %key, error = %e, "Failed to cache asset");
                    }
                }
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Asset not cached and network unavailable");
                Response::error()
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<Response> {
        match self.storage.match_entry(&self.cache_name, key).await {
            Ok(Some(hit)) => {
                debug!(key, age = %hit.age_display(), "Serving from cache");
                Some(hit.response)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cache, treating as miss");
                None
            }
        }
    }

    /// Store without holding up the caller. Failures are logged only.
    async fn store_in_background(&self, key: String, response: Response) {
        let storage = Arc::clone(&self.storage);
        let cache = self.cache_name.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = storage.put(&cache, &key, response).await {
                warn!(cache = %cache, key = %key, error = %e, "Background cache update failed");
            }
        });

        let mut background = self.background.lock().await;
        background.retain(|h| !h.is_finished());
        background.push(handle);
    }

    /// Wait for outstanding background cache writes.
    pub async fn settle(&self) {
        let handles: Vec<JoinHandle<()>> = std::mem::take(&mut *self.background.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background cache task panicked");
            }
        }
    }
}
