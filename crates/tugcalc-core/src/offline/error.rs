use thiserror::Error;

/// A fetch that never produced a response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache index is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Populating a new cache generation failed. The generation is discarded and
/// whatever was active before keeps serving.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to fetch {url} (HTTP {status})")]
    BadStatus { url: String, status: u16 },

    #[error("Failed to populate cache {cache}: {source}")]
    Storage {
        cache: String,
        #[source]
        source: StorageError,
    },

    #[error("Invalid asset path {0}")]
    InvalidPath(String),
}
