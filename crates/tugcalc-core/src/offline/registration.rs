use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::generation::{CacheGeneration, LifecycleState};
use super::http::{Request, Response};
use super::network::Network;
use super::{FetchError, InstallError};

/// Buffer size for the control message channel.
/// Messages are rare (one per update prompt); 8 leaves ample headroom.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Messages a page can post to the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
    /// Activate the waiting generation now instead of when clients close.
    SkipWaiting,
}

/// Where a newly registered generation ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Activated,
    Waiting,
}

/// Owns the active cache generation and at most one waiting successor.
///
/// Fetches go through the active generation; with none active they pass
/// straight to the network.
pub struct Registration {
    network: Arc<dyn Network>,
    active: Option<CacheGeneration>,
    waiting: Option<CacheGeneration>,
    open_clients: usize,
    control_tx: mpsc::Sender<ControlMessage>,
    control_rx: mpsc::Receiver<ControlMessage>,
}

impl Registration {
    pub fn new(network: Arc<dyn Network>) -> Self {
        let (control_tx, control_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        Self {
            network,
            active: None,
            waiting: None,
            open_clients: 0,
            control_tx,
            control_rx,
        }
    }

    /// Sender for posting control messages; drained by `process_messages`.
    pub fn control_channel(&self) -> mpsc::Sender<ControlMessage> {
        self.control_tx.clone()
    }

    pub fn active(&self) -> Option<&CacheGeneration> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&CacheGeneration> {
        self.waiting.as_ref()
    }

    pub fn open_clients(&self) -> usize {
        self.open_clients
    }

    /// Install a generation. It activates at once when nothing is active or
    /// no client is open; otherwise it waits.
    ///
    /// A failed install leaves the current active generation serving.
    pub async fn register(
        &mut self,
        mut generation: CacheGeneration,
    ) -> Result<RegisterOutcome, InstallError> {
        generation.install().await?;
        Ok(self.settle_new(generation).await)
    }

    /// Like `register`, but skips the install when the generation's cache
    /// is already fully populated from a previous run.
    pub async fn register_or_resume(
        &mut self,
        mut generation: CacheGeneration,
    ) -> Result<RegisterOutcome, InstallError> {
        if generation.is_populated().await {
            info!(cache = %generation.cache_name(), "Resuming installed cache generation");
            generation.set_state(LifecycleState::Installed);
            return Ok(self.settle_new(generation).await);
        }
        self.register(generation).await
    }

    async fn settle_new(&mut self, generation: CacheGeneration) -> RegisterOutcome {
        if self.active.is_none() || self.open_clients == 0 {
            self.promote(generation).await;
            return RegisterOutcome::Activated;
        }

        info!(
            cache = %generation.cache_name(),
            clients = self.open_clients,
            "Cache generation installed, waiting for clients to close"
        );
        if let Some(mut previous) = self.waiting.replace(generation) {
            previous.set_state(LifecycleState::Redundant);
        }
        RegisterOutcome::Waiting
    }

    async fn promote(&mut self, mut generation: CacheGeneration) {
        if let Some(mut old) = self.active.take() {
            old.settle().await;
            old.set_state(LifecycleState::Redundant);
        }
        generation.activate().await;
        self.active = Some(generation);
    }

    async fn activate_waiting(&mut self) -> bool {
        match self.waiting.take() {
            Some(generation) => {
                self.promote(generation).await;
                true
            }
            None => false,
        }
    }

    pub fn client_opened(&mut self) {
        self.open_clients += 1;
    }

    /// A client page closed. When the last one goes, a waiting generation
    /// takes over.
    pub async fn client_closed(&mut self) {
        self.open_clients = self.open_clients.saturating_sub(1);
        if self.open_clients == 0 && self.activate_waiting().await {
            debug!("Last client closed, waiting generation activated");
        }
    }

    /// Drain pending control messages. Returns how many were handled.
    pub async fn process_messages(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.control_rx.try_recv() {
            handled += 1;
            match message {
                ControlMessage::SkipWaiting => {
                    if !self.activate_waiting().await {
                        debug!("SkipWaiting received with no waiting generation");
                    }
                }
            }
        }
        handled
    }

    /// Fetch through the active generation, or straight from the network.
    ///
    /// A generic failure response from the cache manager surfaces as
    /// `FetchError::Network`, the same as a failed live fetch.
    pub async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let intercepted = match self.active {
            Some(ref generation) => generation.intercept(request).await,
            None => None,
        };

        match intercepted {
            Some(response) if response.is_error() => {
                warn!(url = %request.url, "Offline and no cached copy available");
                Err(FetchError::Network(format!(
                    "{} is unavailable offline",
                    request.url
                )))
            }
            Some(response) => Ok(response),
            None => self.network.fetch(request).await,
        }
    }

    /// Wait for background cache writes of the active generation.
    pub async fn settle(&self) {
        if let Some(ref generation) = self.active {
            generation.settle().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offline::generation::CacheGeneration;
    use crate::offline::storage::{CacheStorage, MemoryStorage};
    use crate::offline::testing::{shell, url, FakeNetwork};
    use reqwest::Url;

    fn generation(
        version: &str,
        net: &Arc<FakeNetwork>,
        storage: &Arc<MemoryStorage>,
    ) -> CacheGeneration {
        CacheGeneration::new(shell(version), net.clone(), storage.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_first_generation_activates_immediately() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = Registration::new(net.clone());

        let outcome = reg.register(generation("v1", &net, &storage)).await.unwrap();

        assert_eq!(outcome, RegisterOutcome::Activated);
        assert_eq!(reg.active().unwrap().version(), "v1");
        assert_eq!(reg.active().unwrap().state(), LifecycleState::Activated);
    }

    #[tokio::test]
    async fn test_new_generation_waits_for_open_clients() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = Registration::new(net.clone());
        reg.register(generation("v1", &net, &storage)).await.unwrap();
        reg.client_opened();
        reg.client_opened();

        let outcome = reg.register(generation("v2", &net, &storage)).await.unwrap();

        assert_eq!(outcome, RegisterOutcome::Waiting);
        assert_eq!(reg.active().unwrap().version(), "v1");
        assert_eq!(reg.waiting().unwrap().state(), LifecycleState::Installed);
        // Both generations exist until the new one activates.
        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["tugcalc-static-v1", "tugcalc-static-v2"]
        );

        reg.client_closed().await;
        assert_eq!(reg.active().unwrap().version(), "v1");

        reg.client_closed().await;
        assert_eq!(reg.active().unwrap().version(), "v2");
        assert!(reg.waiting().is_none());
        assert_eq!(storage.keys().await.unwrap(), vec!["tugcalc-static-v2"]);
    }

    #[tokio::test]
    async fn test_skip_waiting_message_activates_now() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = Registration::new(net.clone());
        reg.register(generation("v1", &net, &storage)).await.unwrap();
        reg.client_opened();
        reg.register(generation("v2", &net, &storage)).await.unwrap();

        let tx = reg.control_channel();
        tx.send(ControlMessage::SkipWaiting).await.unwrap();
        let handled = reg.process_messages().await;

        assert_eq!(handled, 1);
        assert_eq!(reg.active().unwrap().version(), "v2");
        assert_eq!(reg.open_clients(), 1);
        assert!(reg.active().unwrap().controls_clients());
        assert_eq!(storage.keys().await.unwrap(), vec!["tugcalc-static-v2"]);
    }

    #[tokio::test]
    async fn test_skip_waiting_without_waiting_generation_is_noop() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = Registration::new(net.clone());
        reg.register(generation("v1", &net, &storage)).await.unwrap();

        reg.control_channel().send(ControlMessage::SkipWaiting).await.unwrap();
        assert_eq!(reg.process_messages().await, 1);
        assert_eq!(reg.active().unwrap().version(), "v1");
    }

    #[tokio::test]
    async fn test_failed_install_keeps_previous_generation() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = Registration::new(net.clone());
        reg.register(generation("v1", &net, &storage)).await.unwrap();

        net.route("./styles.css", 503, "unavailable");
        let result = reg.register(generation("v2", &net, &storage)).await;

        assert!(result.is_err());
        assert_eq!(reg.active().unwrap().version(), "v1");
        assert!(reg.waiting().is_none());

        net.set_online(false);
        let resp = reg.fetch(&Request::get(url("./styles.css"))).await.unwrap();
        assert_eq!(resp.body, b"asset ./styles.css");
    }

    #[tokio::test]
    async fn test_register_or_resume_skips_network_when_populated() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        {
            let mut reg = Registration::new(net.clone());
            reg.register(generation("v1", &net, &storage)).await.unwrap();
        }
        net.set_online(false);
        let before = net.request_count();

        let mut reg = Registration::new(net.clone());
        let outcome = reg
            .register_or_resume(generation("v1", &net, &storage))
            .await
            .unwrap();

        assert_eq!(outcome, RegisterOutcome::Activated);
        assert_eq!(net.request_count(), before);
        let resp = reg.fetch(&Request::get(url("./app.js"))).await.unwrap();
        assert_eq!(resp.body, b"asset ./app.js");
    }

    #[tokio::test]
    async fn test_fetch_without_active_generation_passes_through() {
        let net = FakeNetwork::with_shell();
        let reg = Registration::new(net.clone());

        let resp = reg.fetch(&Request::get(url("./app.js"))).await.unwrap();
        assert_eq!(resp.body, b"asset ./app.js");

        net.set_online(false);
        assert!(reg.fetch(&Request::get(url("./app.js"))).await.is_err());
    }

    #[tokio::test]
    async fn test_offline_dataset_read_uses_refreshed_copy() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = Registration::new(net.clone());
        reg.register(generation("v1", &net, &storage)).await.unwrap();

        net.route("./tug_requirements.csv", 200, "fresh table");
        reg.fetch(&Request::get(url("./tug_requirements.csv"))).await.unwrap();
        reg.settle().await;

        net.set_online(false);
        let resp = reg.fetch(&Request::get(url("./tug_requirements.csv"))).await.unwrap();
        assert_eq!(resp.body, b"fresh table");
    }

    #[tokio::test]
    async fn test_offline_uncached_fetch_is_network_error() {
        let net = FakeNetwork::with_shell();
        let storage = Arc::new(MemoryStorage::new());
        let mut reg = Registration::new(net.clone());
        reg.register(generation("v1", &net, &storage)).await.unwrap();
        net.set_online(false);

        let err = reg.fetch(&Request::get(url("./tug_requirements.csv"))).await.unwrap_err();
        assert!(matches!(err, FetchError::Network(_)));

        let cross = Request::get(Url::parse("https://cdn.example/lib.js").unwrap());
        assert!(reg.fetch(&cross).await.is_err());
    }
}
