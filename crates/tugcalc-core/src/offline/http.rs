//! Minimal request/response model for fetch interception.
//!
//! Only what the caching policies look at is modelled: method, URL, request
//! mode, the `Accept` header and the cache mode on the way in; status,
//! response type, headers and body on the way out.

use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};

/// How the request was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation.
    Navigate,
    #[default]
    SameOrigin,
    Cors,
    NoCors,
}

/// Whether intermediate HTTP caches may answer the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Default,
    /// Revalidate with the origin before using a stored response.
    NoCache,
    /// Bypass intermediate caches entirely.
    NoStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub accept: Option<String>,
    pub cache: CacheMode,
}

impl Request {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            mode: RequestMode::default(),
            accept: None,
            cache: CacheMode::default(),
        }
    }

    /// A page navigation, as issued when the shell is opened.
    pub fn navigate(url: Url) -> Self {
        Self {
            mode: RequestMode::Navigate,
            accept: Some("text/html,application/xhtml+xml".to_string()),
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_accept(mut self, accept: &str) -> Self {
        self.accept = Some(accept.to_string());
        self
    }

    pub fn with_cache(mut self, cache: CacheMode) -> Self {
        self.cache = cache;
        self
    }

    pub fn is_html(&self) -> bool {
        self.mode == RequestMode::Navigate
            || self
                .accept
                .as_deref()
                .map(|a| a.contains("text/html"))
                .unwrap_or(false)
    }

    /// Cache identity of the request: its URL without fragment.
    pub fn cache_key(&self) -> String {
        cache_key(&self.url)
    }
}

pub fn cache_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.to_string()
}

/// Response classification, following what a browser exposes to scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response with CORS.
    Cors,
    /// Cross-origin response without CORS; status and body are hidden.
    Opaque,
    /// Network error.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub kind: ResponseType,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: &Url, status: u16, kind: ResponseType, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.to_string(),
            status,
            kind,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// The generic failure handed back when neither network nor cache can
    /// answer.
    pub fn error() -> Self {
        Self {
            url: String::new(),
            status: 0,
            kind: ResponseType::Error,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 2xx status.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_error(&self) -> bool {
        self.kind == ResponseType::Error
    }

    /// Successful, non-opaque, same-origin: safe to keep for offline use.
    pub fn is_cacheable(&self) -> bool {
        self.ok() && self.kind == ResponseType::Basic
    }

    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }
}
