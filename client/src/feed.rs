//! Live feed synchronization
//!
//! One generic synchronizer keeps a farm-scoped collection of feed entries
//! current: it opens a push subscription and fetches stored history when a
//! farm is bound, filters pushes against the feed's allow-list, caches
//! pushes that belong to other farms for a later bind, and schedules bounded
//! reconnect attempts when the subscription drops. A [`FeedProfile`] selects
//! the behavior differences between the alerts, recommendations and weather
//! feeds.
//!
//! All mutation happens through `&mut self`; `pump`/`run` drive the
//! subscription channel and the reconnect timer on one logical task, while
//! `handle_push`/`handle_status` stay callable directly.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{ConnectionStatus, FeedEntry, FeedKind, ALERT_EVENT_TYPES, RECOMMENDATION_EVENT_TYPES};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{self, Instant};

use crate::collaborators::{FeedCollaborator, FeedConnection, FeedSignal};
use crate::config::FeedConfig;
use crate::error::AppResult;
use crate::store::StateStore;

/// Behavior profile of one feed
#[derive(Debug, Clone)]
pub struct FeedProfile {
    pub kind: FeedKind,
    /// Accepted classifications; `None` accepts everything
    pub allowed_types: Option<&'static [&'static str]>,
    /// Whether consumed entries produce read receipts
    pub track_reads: bool,
    /// Freshness window for durable snapshots; `None` disables them
    pub cache_ttl: Option<Duration>,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
}

impl FeedProfile {
    pub fn alerts() -> Self {
        Self {
            kind: FeedKind::Alerts,
            allowed_types: Some(ALERT_EVENT_TYPES),
            track_reads: true,
            cache_ttl: None,
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }

    pub fn recommendations() -> Self {
        Self {
            kind: FeedKind::Recommendations,
            allowed_types: Some(RECOMMENDATION_EVENT_TYPES),
            track_reads: true,
            cache_ttl: None,
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }

    pub fn weather() -> Self {
        Self {
            kind: FeedKind::Weather,
            allowed_types: None,
            track_reads: false,
            cache_ttl: Some(Duration::from_secs(600)),
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }

    /// Apply the configured timing knobs
    pub fn with_timing(mut self, config: &FeedConfig) -> Self {
        self.reconnect_delay = Duration::from_secs(config.reconnect_delay_secs);
        self.max_reconnect_attempts = config.max_reconnect_attempts;
        if self.cache_ttl.is_some() {
            self.cache_ttl = Some(Duration::from_secs(config.weather_cache_ttl_secs));
        }
        self
    }

    fn allows(&self, classification: Option<&str>) -> bool {
        match (self.allowed_types, classification) {
            (None, _) => true,
            (Some(list), Some(code)) => list.contains(&code),
            (Some(_), None) => false,
        }
    }
}

/// Durable snapshot of a feed's entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSnapshot<E> {
    pub fetched_at: DateTime<Utc>,
    pub entries: Vec<E>,
}

/// Key for a feed's durable snapshot, e.g. `weather-cache:{user}:{farm}`
pub fn snapshot_key(kind: FeedKind, user_id: &str, farm_id: &str) -> String {
    format!("{}-cache:{}:{}", kind.as_str(), user_id, farm_id)
}

#[derive(Debug, Clone)]
struct FarmBinding {
    user_id: String,
    farm_id: String,
}

enum Wake<E> {
    Signal(Option<FeedSignal<E>>),
    Reconnect,
}

/// Farm-scoped synchronizer for one live feed
pub struct LiveFeedSynchronizer<E: FeedEntry, C: FeedCollaborator<E>> {
    collaborator: C,
    profile: FeedProfile,
    store: std::sync::Arc<dyn StateStore>,
    binding: Option<FarmBinding>,
    connection: Option<FeedConnection<E>>,
    entries: Vec<E>,
    /// Pushes that arrived for farms other than the bound one
    side_cache: HashMap<String, Vec<E>>,
    status_tx: watch::Sender<ConnectionStatus>,
    updates_tx: broadcast::Sender<E>,
    reconnect_at: Option<Instant>,
    reconnect_attempts: u32,
}

impl<E: FeedEntry, C: FeedCollaborator<E>> LiveFeedSynchronizer<E, C> {
    pub fn new(
        collaborator: C,
        profile: FeedProfile,
        store: std::sync::Arc<dyn StateStore>,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        let (updates_tx, _) = broadcast::channel(64);
        Self {
            collaborator,
            profile,
            store,
            binding: None,
            connection: None,
            entries: Vec::new(),
            side_cache: HashMap::new(),
            status_tx,
            updates_tx,
            reconnect_at: None,
            reconnect_attempts: 0,
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    pub fn entries(&self) -> &[E] {
        &self.entries
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Stream of entries accepted for the bound farm
    pub fn updates(&self) -> broadcast::Receiver<E> {
        self.updates_tx.subscribe()
    }

    pub fn reconnect_scheduled(&self) -> bool {
        self.reconnect_at.is_some()
    }

    // ========================================================================
    // Binding
    // ========================================================================

    /// Bind the feed to a farm: tear down any previous subscription, replay
    /// cached entries, open the push subscription and fetch stored history.
    /// Binding the already-bound farm with a live subscription is a no-op.
    pub async fn bind_farm(&mut self, user_id: &str, farm_id: &str) -> AppResult<()> {
        let same = self
            .binding
            .as_ref()
            .is_some_and(|b| b.user_id == user_id && b.farm_id == farm_id);
        if same && self.connection.is_some() {
            return Ok(());
        }

        self.teardown();
        let binding = FarmBinding {
            user_id: user_id.to_string(),
            farm_id: farm_id.to_string(),
        };

        if let Some(cached) = self.side_cache.remove(farm_id) {
            tracing::debug!(farm_id, count = cached.len(), "replaying cached entries");
            self.entries = cached;
        }
        self.preload_snapshot(&binding);
        self.binding = Some(binding.clone());

        self.set_status(ConnectionStatus::Connecting);
        match self.collaborator.connect(user_id, farm_id).await {
            Ok(connection) => {
                self.connection = Some(connection);
                self.reconnect_attempts = 0;
                self.set_status(ConnectionStatus::Connected);
            }
            Err(err) => {
                self.set_status(ConnectionStatus::Error);
                self.schedule_reconnect();
                return Err(err);
            }
        }

        match self.collaborator.history(farm_id).await {
            Ok(history) => {
                self.merge_history(history);
                self.save_snapshot(&binding);
            }
            Err(err) => {
                tracing::warn!(farm_id, error = %err, "history fetch failed; keeping cached entries");
            }
        }
        Ok(())
    }

    /// Drop the subscription and all farm-scoped state
    pub fn unbind_farm(&mut self) {
        self.teardown();
        self.binding = None;
        self.side_cache.clear();
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn teardown(&mut self) {
        self.connection = None;
        self.entries.clear();
        self.reconnect_at = None;
        self.reconnect_attempts = 0;
    }

    fn merge_history(&mut self, history: Vec<E>) {
        for entry in history {
            if !self.profile.allows(entry.classification()) {
                continue;
            }
            if self.entries.iter().any(|e| e.entry_id() == entry.entry_id()) {
                continue;
            }
            self.entries.push(entry);
        }
    }

    // ========================================================================
    // Push and status handling
    // ========================================================================

    /// Dispatch one pushed entry: accept it for the bound farm, cache it for
    /// any other farm, drop it when its classification is not allowed.
    pub fn handle_push(&mut self, entry: E) {
        let Some(binding) = &self.binding else {
            tracing::debug!("push received while unbound; dropped");
            return;
        };
        if !self.profile.allows(entry.classification()) {
            tracing::debug!(
                classification = ?entry.classification(),
                "push classification not allowed for this feed"
            );
            return;
        }
        if entry.farm_id() == binding.farm_id {
            self.entries.insert(0, entry.clone());
            let _ = self.updates_tx.send(entry);
            let binding = binding.clone();
            self.save_snapshot(&binding);
        } else {
            self.side_cache
                .entry(entry.farm_id().to_string())
                .or_default()
                .push(entry);
        }
    }

    /// Record a connection-status transition. A drop while bound schedules a
    /// reconnect attempt; recovery resets the attempt counter but leaves any
    /// scheduled attempt in place, since the attempt re-checks the live
    /// status when it fires.
    pub fn handle_status(&mut self, status: ConnectionStatus) {
        self.set_status(status);
        match status {
            ConnectionStatus::Connected => {
                self.reconnect_attempts = 0;
            }
            ConnectionStatus::Disconnected if self.binding.is_some() => {
                self.schedule_reconnect();
            }
            _ => {}
        }
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        self.status_tx.send_replace(status);
    }

    // ========================================================================
    // Reconnect
    // ========================================================================

    fn schedule_reconnect(&mut self) {
        if self.reconnect_at.is_some() {
            return;
        }
        if self.reconnect_attempts >= self.profile.max_reconnect_attempts {
            tracing::warn!(
                attempts = self.reconnect_attempts,
                "reconnect attempts exhausted"
            );
            return;
        }
        // linear growth, capped at three times the base delay
        let factor = (self.reconnect_attempts + 1).min(3);
        let delay = self.profile.reconnect_delay * factor;
        tracing::debug!(?delay, "reconnect scheduled");
        self.reconnect_at = Some(Instant::now() + delay);
    }

    async fn try_reconnect(&mut self) {
        if matches!(
            self.status(),
            ConnectionStatus::Connected | ConnectionStatus::Connecting
        ) {
            tracing::debug!("connection recovered; skipping scheduled reconnect");
            return;
        }
        let Some(binding) = self.binding.clone() else {
            return;
        };
        self.reconnect_attempts += 1;
        self.set_status(ConnectionStatus::Connecting);
        match self
            .collaborator
            .connect(&binding.user_id, &binding.farm_id)
            .await
        {
            Ok(connection) => {
                self.connection = Some(connection);
                self.reconnect_attempts = 0;
                self.set_status(ConnectionStatus::Connected);
            }
            Err(err) => {
                tracing::warn!(
                    farm_id = %binding.farm_id,
                    attempt = self.reconnect_attempts,
                    error = %err,
                    "reconnect attempt failed"
                );
                self.set_status(ConnectionStatus::Disconnected);
                self.schedule_reconnect();
            }
        }
    }

    /// Await the scheduled reconnect deadline, if any, then attempt it.
    /// The attempt is skipped when the connection recovered in the meantime.
    pub async fn run_pending_reconnect(&mut self) {
        let Some(deadline) = self.reconnect_at else {
            return;
        };
        time::sleep_until(deadline).await;
        self.reconnect_at = None;
        self.try_reconnect().await;
    }

    // ========================================================================
    // Event loop
    // ========================================================================

    /// Wait for the next subscription signal or reconnect deadline and
    /// handle it. Returns `false` when there is nothing left to wait on.
    pub async fn pump(&mut self) -> bool {
        let deadline = self.reconnect_at;
        let wake = match (self.connection.as_mut(), deadline) {
            (None, None) => return false,
            (Some(connection), None) => Wake::Signal(connection.signals.recv().await),
            (None, Some(at)) => {
                time::sleep_until(at).await;
                Wake::Reconnect
            }
            (Some(connection), Some(at)) => {
                tokio::select! {
                    signal = connection.signals.recv() => Wake::Signal(signal),
                    _ = time::sleep_until(at) => Wake::Reconnect,
                }
            }
        };

        match wake {
            Wake::Signal(Some(FeedSignal::Entry(entry))) => self.handle_push(entry),
            Wake::Signal(Some(FeedSignal::Status(status))) => self.handle_status(status),
            Wake::Signal(None) => {
                // subscription channel closed
                self.connection = None;
                self.handle_status(ConnectionStatus::Disconnected);
            }
            Wake::Reconnect => {
                self.reconnect_at = None;
                self.try_reconnect().await;
            }
        }
        true
    }

    /// Drive the feed until there is nothing left to wait on
    pub async fn run(&mut self) {
        while self.pump().await {}
    }

    // ========================================================================
    // Consumption
    // ========================================================================

    /// Remove an entry locally and, for read-tracking feeds, report it read.
    /// A failed read receipt is logged; the local removal stands.
    pub async fn mark_consumed(&mut self, entry_id: &str) {
        self.remove_entry(entry_id);
        self.report_read(entry_id).await;
    }

    pub fn remove_entry(&mut self, entry_id: &str) {
        self.entries.retain(|e| e.entry_id() != entry_id);
    }

    /// Remove all entries, reporting each read for read-tracking feeds
    pub async fn clear_all(&mut self) {
        let ids: Vec<String> = self
            .entries
            .iter()
            .map(|e| e.entry_id().to_string())
            .collect();
        self.entries.clear();
        for id in ids {
            self.report_read(&id).await;
        }
    }

    async fn report_read(&self, entry_id: &str) {
        if !self.profile.track_reads {
            return;
        }
        if let Err(err) = self.collaborator.mark_read(entry_id).await {
            tracing::warn!(entry_id, error = %err, "mark-as-read failed");
        }
    }

    // ========================================================================
    // Durable snapshots
    // ========================================================================

    fn preload_snapshot(&mut self, binding: &FarmBinding) {
        let Some(ttl) = self.profile.cache_ttl else {
            return;
        };
        let key = snapshot_key(self.profile.kind, &binding.user_id, &binding.farm_id);
        let raw = match self.store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "snapshot read failed");
                return;
            }
        };
        let snapshot: CachedSnapshot<E> = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "discarding unreadable snapshot");
                let _ = self.store.remove(&key);
                return;
            }
        };
        let age = Utc::now() - snapshot.fetched_at;
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::zero());
        if age > ttl {
            tracing::debug!(key = %key, "snapshot is stale; discarding");
            let _ = self.store.remove(&key);
            return;
        }
        self.merge_history(snapshot.entries);
    }

    fn save_snapshot(&self, binding: &FarmBinding) {
        if self.profile.cache_ttl.is_none() {
            return;
        }
        let key = snapshot_key(self.profile.kind, &binding.user_id, &binding.farm_id);
        let snapshot = CachedSnapshot {
            fetched_at: Utc::now(),
            entries: self.entries.clone(),
        };
        match serde_json::to_string(&snapshot) {
            Ok(raw) => {
                if let Err(err) = self.store.put(&key, &raw) {
                    tracing::warn!(key = %key, error = %err, "snapshot write failed");
                }
            }
            Err(err) => tracing::warn!(key = %key, error = %err, "snapshot serialization failed"),
        }
    }
}

/// Build the signal channel pair used by feed collaborators
pub fn signal_channel<E>(capacity: usize) -> (mpsc::Sender<FeedSignal<E>>, FeedConnection<E>) {
    let (tx, rx) = mpsc::channel(capacity);
    (tx, FeedConnection { signals: rx })
}
