use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{header, Client, Url};
use tracing::debug;

use super::http::{CacheMode, Request, RequestMode, Response, ResponseType};
use super::FetchError;

/// HTTP request timeout in seconds.
/// The dataset and shell assets are small; 30s only trips on a dead link.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Live network access as seen by the cache manager.
///
/// `Err` means no response was produced at all (offline, DNS failure,
/// timeout). HTTP error statuses are still `Ok` responses.
pub trait Network: Send + Sync {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, FetchError>>;
}

/// `Network` backed by reqwest.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    scope: Url,
}

impl HttpNetwork {
    /// Create a client for the shell served from `scope`.
    /// Responses from the scope's origin are classified as same-origin.
    pub fn new(scope: Url) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, scope })
    }

    fn classify(&self, request: &Request, final_url: &Url) -> ResponseType {
        if final_url.origin() == self.scope.origin() {
            ResponseType::Basic
        } else if request.mode == RequestMode::NoCors {
            ResponseType::Opaque
        } else {
            ResponseType::Cors
        }
    }

    async fn send(&self, request: &Request) -> Result<Response, FetchError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        if let Some(ref accept) = request.accept {
            builder = builder.header(header::ACCEPT, accept.as_str());
        }
        match request.cache {
            CacheMode::Default => {}
            CacheMode::NoCache => builder = builder.header(header::CACHE_CONTROL, "no-cache"),
            CacheMode::NoStore => {
                builder = builder
                    .header(header::CACHE_CONTROL, "no-store")
                    .header(header::PRAGMA, "no-cache")
            }
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let kind = self.classify(request, &final_url);
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        debug!(url = %final_url, status, bytes = body.len(), "Network fetch complete");

        if kind == ResponseType::Opaque {
            // Cross-origin no-cors responses hide their status and body.
            return Ok(Response::new(&final_url, 0, kind, Vec::new()));
        }

        let mut out = Response::new(&final_url, status, kind, body);
        out.headers = headers;
        Ok(out)
    }
}

impl Network for HttpNetwork {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, FetchError>> {
        self.send(request).boxed()
    }
}
