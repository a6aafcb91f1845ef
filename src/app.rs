//! Refresh orchestration: manual scans, status polls, and auto-refresh.
//!
//! The controller owns the shared [`DashState`] store; rendering layers only
//! take snapshots. Every dispatched request captures a sequence token, and a
//! completion is applied only while its token is still the newest one
//! dispatched, so a slow superseded response can never overwrite a newer
//! result.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::ScanParams;
use crate::domain::{
    aggregate, normalize, DashState, DataSource, Locale, MonitorState, PrewarmEntry,
    PrewarmStatusPayload, ScanPayload,
};
use crate::infra::api::{ApiError, ScanApiClient};

/// Fixed cadence of the monitor's auto-refresh loop.
pub const AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Slack added to the upstream worker budget before a scan is abandoned.
pub const SCAN_TIMEOUT_PAD: Duration = Duration::from_secs(6);

/// Source of scan and status payloads; the HTTP client in production, a
/// scripted double in tests.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    async fn fetch_scan(&self, params: &ScanParams) -> Result<ScanPayload, ApiError>;
    async fn fetch_status(&self, systems: &[String]) -> Result<PrewarmStatusPayload, ApiError>;
}

#[async_trait]
impl MarketFeed for ScanApiClient {
    async fn fetch_scan(&self, params: &ScanParams) -> Result<ScanPayload, ApiError> {
        self.scan(params).await
    }

    async fn fetch_status(&self, systems: &[String]) -> Result<PrewarmStatusPayload, ApiError> {
        self.prewarm_status(systems).await
    }
}

struct Store {
    state: Mutex<DashState>,
    changed: watch::Sender<u64>,
    scan_seq: AtomicU64,
    poll_seq: AtomicU64,
    polls_in_flight: AtomicUsize,
}

impl Store {
    fn new() -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            state: Mutex::new(DashState::default()),
            changed,
            scan_seq: AtomicU64::new(0),
            poll_seq: AtomicU64::new(0),
            polls_in_flight: AtomicUsize::new(0),
        }
    }

    fn bump(&self) {
        self.changed.send_modify(|epoch| *epoch += 1);
    }
}

/// Drives both pipelines and owns all mutation of the dashboard state.
pub struct RefreshController {
    feed: Arc<dyn MarketFeed>,
    store: Arc<Store>,
    auto_task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RefreshController {
    pub fn new(feed: Arc<dyn MarketFeed>) -> Self {
        Self {
            feed,
            store: Arc::new(Store::new()),
            auto_task: std::sync::Mutex::new(None),
        }
    }

    /// Receiver that ticks on every state change; readers await it instead of
    /// busy-polling snapshots.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.store.changed.subscribe()
    }

    pub async fn snapshot(&self) -> DashState {
        self.store.state.lock().await.clone()
    }

    pub async fn set_locale(&self, locale: Locale) {
        let mut state = self.store.state.lock().await;
        if state.locale != locale {
            state.locale = locale;
            drop(state);
            self.store.bump();
        }
    }

    /// Run one scan and apply the outcome unless a newer scan supersedes it.
    /// The loading flag is cleared on every exit path.
    pub async fn trigger_scan(&self, params: &ScanParams) {
        run_scan(&self.feed, &self.store, params).await;
    }

    /// Poll prewarm status once for the given systems.
    pub async fn poll_status(&self, systems: &[String]) {
        run_poll(&self.feed, &self.store, systems).await;
    }

    /// Start the auto-refresh loop: one poll immediately, then one per
    /// interval tick. A tick is skipped, not queued, while an older poll is
    /// still in flight. Enabling again replaces the running loop, it never
    /// stacks a second one.
    pub fn enable_auto_refresh(&self, systems: Vec<String>) {
        let feed = Arc::clone(&self.feed);
        let store = Arc::clone(&self.store);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(AUTO_REFRESH_INTERVAL);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if store.polls_in_flight.load(Ordering::SeqCst) > 0 {
                    tracing::debug!("auto-refresh tick skipped, poll still in flight");
                    continue;
                }
                run_poll(&feed, &store, &systems).await;
            }
        });
        if let Some(old) = self.auto_slot().replace(task) {
            old.abort();
        }
    }

    /// Stop the auto-refresh loop; the pending interval timer is dropped with
    /// the task.
    pub fn disable_auto_refresh(&self) {
        if let Some(task) = self.auto_slot().take() {
            task.abort();
        }
    }

    pub fn is_auto_refresh_enabled(&self) -> bool {
        self.auto_slot()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    fn auto_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        // A poisoned slot still holds the handle that must be replaced.
        self.auto_task
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for RefreshController {
    fn drop(&mut self) {
        if let Some(task) = self.auto_slot().take() {
            task.abort();
        }
    }
}

async fn run_scan(feed: &Arc<dyn MarketFeed>, store: &Arc<Store>, params: &ScanParams) {
    let seq = store.scan_seq.fetch_add(1, Ordering::SeqCst) + 1;
    {
        let mut state = store.state.lock().await;
        // An even newer dispatch may have raced us to the lock.
        if store.scan_seq.load(Ordering::SeqCst) == seq {
            state.loading = true;
            drop(state);
            store.bump();
        }
    }

    let deadline = Duration::from_secs(params.max_runtime_secs).saturating_add(SCAN_TIMEOUT_PAD);
    tracing::info!(
        start_system = %params.start_system,
        timeout_secs = deadline.as_secs(),
        "scan dispatched"
    );

    // Dropping the future on timeout cancels the transfer; the timer itself
    // is consumed either way, so nothing stale can fire later.
    let outcome = tokio::time::timeout(deadline, feed.fetch_scan(params)).await;

    let (routes, source) = match outcome {
        Ok(Ok(payload)) => {
            let source = if payload.cached {
                DataSource::Cached
            } else {
                DataSource::Live
            };
            (normalize(&payload, &params.start_system), source)
        }
        Ok(Err(error)) => {
            tracing::warn!(%error, "scan failed");
            (Vec::new(), DataSource::Error)
        }
        Err(_) => {
            tracing::warn!(timeout_secs = deadline.as_secs(), "scan timed out");
            (Vec::new(), DataSource::Error)
        }
    };

    let mut state = store.state.lock().await;
    if store.scan_seq.load(Ordering::SeqCst) != seq {
        tracing::debug!(seq, "scan outcome superseded, discarded");
        return;
    }
    tracing::info!(routes = routes.len(), source = source.label(), "scan applied");
    state.routes = routes;
    state.source = source;
    state.loading = false;
    drop(state);
    store.bump();
}

/// In-flight poll slot. Releasing on drop also covers the owning task being
/// aborted while parked at the fetch await.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

async fn run_poll(feed: &Arc<dyn MarketFeed>, store: &Arc<Store>, systems: &[String]) {
    let seq = store.poll_seq.fetch_add(1, Ordering::SeqCst) + 1;
    {
        let mut state = store.state.lock().await;
        if store.poll_seq.load(Ordering::SeqCst) == seq {
            state.monitor.entries = systems.iter().map(|s| PrewarmEntry::loading(s)).collect();
            // the previous summary and run stamp are blanked while loading
            state.monitor.summary = None;
            state.monitor.last_run = None;
            drop(state);
            store.bump();
        }
    }

    tracing::debug!(systems = systems.len(), "status poll dispatched");
    let result = {
        let _slot = InFlight::enter(&store.polls_in_flight);
        feed.fetch_status(systems).await
    };

    let now = OffsetDateTime::now_utc();
    let monitor = match result {
        Ok(payload) => {
            let entries: Vec<PrewarmEntry> = payload
                .systems
                .iter()
                .map(|row| PrewarmEntry::classified(row, now))
                .collect();
            let summary = aggregate(&entries);
            MonitorState {
                entries,
                summary: Some(summary),
                last_run: payload.last_run,
                polled_at: Some(now),
            }
        }
        Err(error) => {
            tracing::warn!(%error, "status poll failed");
            MonitorState {
                entries: systems.iter().map(|s| PrewarmEntry::errored(s)).collect(),
                summary: None,
                last_run: None,
                polled_at: Some(now),
            }
        }
    };

    let mut state = store.state.lock().await;
    if store.poll_seq.load(Ordering::SeqCst) != seq {
        tracing::debug!(seq, "status poll superseded, discarded");
        return;
    }
    if let Some(summary) = &monitor.summary {
        tracing::info!(
            fresh = summary.fresh,
            stale = summary.stale,
            missing = summary.missing,
            "status poll applied"
        );
    }
    state.monitor = monitor;
    drop(state);
    store.bump();
}
