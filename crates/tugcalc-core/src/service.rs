//! The surface the presentation layer calls into.
//!
//! `TugCalc` wires the offline cache in front of the network, loads the
//! reference dataset through it, and answers queries against a loaded
//! snapshot.

use std::sync::Arc;

use anyhow::Result;
use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dataset::{Dataset, ParseError};
use crate::lookup::{self, ValidationError};
use crate::models::{LookupOutcome, Operation};
use crate::offline::{
    CacheGeneration, CacheMode, CacheStorage, DiskStorage, FetchError, HttpNetwork, Network,
    Registration, Request, ShellConfig,
};

/// Subdirectory of the cache dir holding offline cache generations
const OFFLINE_DIR: &str = "offline";

/// The dataset could not be loaded. Fatal to this load attempt only.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to load CSV: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to load CSV (HTTP {0})")]
    Http(u16),

    #[error("CSV is not valid UTF-8 text.")]
    Encoding,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub struct TugCalc {
    registration: Registration,
    dataset_url: Url,
}

impl TugCalc {
    /// Start against the configured site, with the offline cache persisted
    /// under the user cache directory.
    pub async fn start(config: &Config) -> Result<Self> {
        let shell = config.shell_config()?;
        let network: Arc<dyn Network> = Arc::new(HttpNetwork::new(shell.scope.clone())?);
        let storage: Arc<dyn CacheStorage> =
            Arc::new(DiskStorage::new(config.cache_dir()?.join(OFFLINE_DIR))?);
        Self::with_backends(shell, network, storage).await
    }

    /// Start with explicit network and storage backends.
    ///
    /// If the current cache generation cannot be installed the tool still
    /// runs, fetching everything live.
    pub async fn with_backends(
        shell: ShellConfig,
        network: Arc<dyn Network>,
        storage: Arc<dyn CacheStorage>,
    ) -> Result<Self> {
        let dataset_url = shell.dataset_url()?;
        let mut registration = Registration::new(Arc::clone(&network));
        let generation = CacheGeneration::new(shell, network, storage)?;

        match registration.register_or_resume(generation).await {
            Ok(outcome) => debug!(?outcome, "Offline cache registered"),
            Err(e) => warn!(error = %e, "Offline cache unavailable, continuing online only"),
        }

        Ok(Self {
            registration,
            dataset_url,
        })
    }

    /// Fetch and parse the reference dataset.
    pub async fn load_dataset(&self) -> Result<Dataset, LoadError> {
        let request = Request::get(self.dataset_url.clone()).with_cache(CacheMode::NoCache);
        let response = self.registration.fetch(&request).await?;
        if !response.ok() {
            return Err(LoadError::Http(response.status));
        }

        let text = response.text().map_err(|_| LoadError::Encoding)?;
        let dataset = Dataset::parse(text)?;
        info!(
            bands = dataset.bands().len(),
            locations = dataset.locations().len(),
            "Loaded tug requirement dataset"
        );
        Ok(dataset)
    }

    /// Validate form input and look it up in `dataset`.
    pub fn compute_result(
        &self,
        dataset: &Dataset,
        location: &str,
        loa_text: &str,
        operation: Operation,
    ) -> Result<LookupOutcome, ValidationError> {
        lookup::compute_result(dataset, location, loa_text, operation)
    }

    pub fn registration(&self) -> &Registration {
        &self.registration
    }

    /// Let background cache writes finish before the process exits.
    pub async fn shutdown(&self) {
        self.registration.settle().await;
    }
}
