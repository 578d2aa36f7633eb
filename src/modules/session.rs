use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::modules::helpers::settings::DEFAULT_POLL_INTERVAL_MS;
use crate::modules::pipeline::{Pipeline, TickStatus};
use crate::modules::timing_api::{SnapshotFetcher, TimingClient};
use crate::modules::timing_table::RowExtractor;
use crate::polling::poll_timing_page;

/// the session manager the server runs with
pub type LiveSessions = SessionManager<TimingClient>;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub url: String,
    pub poll_interval: Duration,
    pub auto_detect_pit: bool,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> SessionConfig {
        SessionConfig {
            url: url.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            auto_detect_pit: true,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub active: bool,
    pub url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub auto_detect_pit: bool,
    pub status: String,
}

struct ActivePoller {
    config: SessionConfig,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ActivePoller {
    /// signal the poller and wait until it has left its loop
    async fn shutdown(self) {
        let _ = self.cancel.send(true);
        if let Err(error) = self.handle.await {
            error!(target: "session:shutdown", "poller ended abnormally: {}", error);
        }
    }
}

/// starts and stops polling sessions and hands out the session state.
///
/// there is at most one poller at a time. starting while a session is running
/// stops the running one first and begins with an empty history.
pub struct SessionManager<F: SnapshotFetcher> {
    fetcher: Arc<F>,
    extractor: Arc<dyn RowExtractor>,
    pipeline: Arc<Mutex<Pipeline>>,
    active: Mutex<Option<ActivePoller>>,
}

impl<F: SnapshotFetcher> SessionManager<F> {
    pub fn new(fetcher: F, extractor: Arc<dyn RowExtractor>) -> SessionManager<F> {
        SessionManager {
            fetcher: Arc::new(fetcher),
            extractor,
            pipeline: Arc::new(Mutex::new(Pipeline::new(true))),
            active: Mutex::new(None),
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// # start a session
    /// start polling the given timing page with a fresh history.
    /// a running session is stopped first.
    ///
    /// ## Arguments
    /// * `config` - the page to poll and how
    pub async fn start(&self, config: SessionConfig) {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            info!(target: "session:start", "restarting, stopping poller of {}", previous.config.url);
            previous.shutdown().await;
        }

        *self.pipeline.lock().await = Pipeline::new(config.auto_detect_pit);

        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(poll_timing_page(
            config.url.clone(),
            config.poll_interval,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.extractor),
            Arc::clone(&self.pipeline),
            cancel_rx,
        ));

        info!(target: "session:start", "session started for {}", config.url);
        *active = Some(ActivePoller { config, cancel, handle });
    }

    /// # stop the session
    /// once this returns nothing is ingested anymore. the history stays readable.
    ///
    /// ## Returns
    /// * `bool` - false when no session was running
    pub async fn stop(&self) -> bool {
        let mut active = self.active.lock().await;
        match active.take() {
            Some(poller) => {
                let url = poller.config.url.clone();
                poller.shutdown().await;
                self.pipeline.lock().await.set_status(TickStatus::Stopped);
                info!(target: "session:stop", "session stopped for {}", url);
                true
            }
            None => false,
        }
    }

    pub async fn status(&self) -> SessionStatus {
        let active = self.active.lock().await;
        let pipeline = self.pipeline.lock().await;

        SessionStatus {
            active: active.is_some(),
            url: active.as_ref().map(|poller| poller.config.url.clone()),
            poll_interval_ms: active
                .as_ref()
                .map(|poller| poller.config.poll_interval.as_millis() as u64),
            auto_detect_pit: pipeline.auto_detect_pit(),
            status: pipeline.status().to_string(),
        }
    }

    /// read access to the session state, held for as long as the guard lives
    pub async fn pipeline(&self) -> MutexGuard<'_, Pipeline> {
        self.pipeline.lock().await
    }
}
