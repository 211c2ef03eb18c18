//! Offline asset cache for the application shell and reference dataset.
//!
//! A `CacheGeneration` is one version of the shell, backed by a named cache
//! (`tugcalc-static-<version>`). The `Registration` installs generations,
//! activates them (dropping older caches) and routes fetches through the
//! active one:
//!
//! - page navigations: network first, cached shell when offline
//! - the dataset: network first, cached copy refreshed in the background
//! - other same-origin GETs: cache first
//! - everything else: untouched

pub mod error;
pub mod generation;
pub mod http;
pub mod network;
pub mod registration;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{FetchError, InstallError, StorageError};
pub use generation::{CacheGeneration, LifecycleState, ShellConfig, Strategy};
pub use http::{CacheMode, Request, RequestMode, Response, ResponseType};
pub use network::{HttpNetwork, Network};
pub use registration::{ControlMessage, RegisterOutcome, Registration};
pub use storage::{CacheStorage, CachedResponse, DiskStorage, MemoryStorage};
