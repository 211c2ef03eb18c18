//! Scripted network for cache manager tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Url;

use super::generation::{ShellConfig, DEFAULT_ASSETS};
use super::http::{cache_key, Request, Response, ResponseType};
use super::network::Network;
use super::FetchError;

pub const SCOPE: &str = "https://tug.example/calc/";

pub fn scope() -> Url {
    Url::parse(SCOPE).unwrap()
}

pub fn url(path: &str) -> Url {
    scope().join(path).unwrap()
}

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Fresh directory path under the system temp dir, unique per call.
pub fn temp_root() -> PathBuf {
    let n = TEMP_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("tugcalc-test-{}-{}", std::process::id(), n))
}

pub fn shell(version: &str) -> ShellConfig {
    ShellConfig::new(scope(), version)
}

/// Serves fixed bodies per URL; can be switched offline.
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, (u16, Vec<u8>)>>,
    online: AtomicBool,
    log: Mutex<Vec<Request>>,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            routes: Mutex::new(HashMap::new()),
            online: AtomicBool::new(true),
            log: Mutex::new(Vec::new()),
        })
    }

    /// A network serving every default shell asset plus the dataset.
    pub fn with_shell() -> Arc<Self> {
        let net = Self::new();
        for path in DEFAULT_ASSETS {
            net.route(path, 200, &format!("asset {}", path));
        }
        net.route("./index.html", 200, "index page");
        net.route(
            "./tug_requirements.csv",
            200,
            "Location,Min Length M,Max Length M,Berthing Tugs No,Unberthing Tugs No\nFairport,50,100,2,1\n",
        );
        net
    }

    pub fn route(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(cache_key(&url(path)), (status, body.as_bytes().to_vec()));
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    fn respond(&self, request: &Request) -> Result<Response, FetchError> {
        self.log.lock().unwrap().push(request.clone());
        if !self.online.load(Ordering::SeqCst) {
            return Err(FetchError::Network("offline".to_string()));
        }

        let kind = if request.url.origin() == scope().origin() {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        };
        let mut key = request.url.clone();
        key.set_query(None);
        let routes = self.routes.lock().unwrap();
        Ok(match routes.get(&cache_key(&key)) {
            Some((status, body)) => Response::new(&request.url, *status, kind, body.clone()),
            None => Response::new(&request.url, 404, kind, "not found"),
        })
    }
}

impl Network for FakeNetwork {
    fn fetch<'a>(&'a self, request: &'a Request) -> BoxFuture<'a, Result<Response, FetchError>> {
        let result = self.respond(request);
        async move { result }.boxed()
    }
}
