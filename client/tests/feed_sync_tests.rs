//! Live feed synchronization tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use shared::{AdvisoryEvent, ConnectionStatus, FeedEntry, WeatherReading};
use smart_farm_client::collaborators::{FeedCollaborator, FeedConnection, FeedSignal};
use smart_farm_client::error::{AppError, AppResult};
use smart_farm_client::feed::{
    signal_channel, snapshot_key, CachedSnapshot, FeedProfile, LiveFeedSynchronizer,
};
use smart_farm_client::store::{MemoryStore, StateStore};
use tokio::sync::mpsc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

// ============================================================================
// Test doubles
// ============================================================================

struct FakeFeedInner<E> {
    connect_calls: AtomicU32,
    fail_connects: AtomicBool,
    fail_history: AtomicBool,
    history: Mutex<HashMap<String, Vec<E>>>,
    read_receipts: Mutex<Vec<String>>,
    fail_mark_read: AtomicBool,
    // keeps subscription channels open and pushable
    signal_txs: Mutex<Vec<mpsc::Sender<FeedSignal<E>>>>,
}

struct FakeFeed<E>(Arc<FakeFeedInner<E>>);

impl<E> Clone for FakeFeed<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> Default for FakeFeed<E> {
    fn default() -> Self {
        Self(Arc::new(FakeFeedInner {
            connect_calls: AtomicU32::new(0),
            fail_connects: AtomicBool::new(false),
            fail_history: AtomicBool::new(false),
            history: Mutex::new(HashMap::new()),
            read_receipts: Mutex::new(Vec::new()),
            fail_mark_read: AtomicBool::new(false),
            signal_txs: Mutex::new(Vec::new()),
        }))
    }
}

impl<E: FeedEntry> FakeFeed<E> {
    fn with_history(farm_id: &str, entries: Vec<E>) -> Self {
        let feed = Self::default();
        feed.0
            .history
            .lock()
            .unwrap()
            .insert(farm_id.to_string(), entries);
        feed
    }

    fn connect_calls(&self) -> u32 {
        self.0.connect_calls.load(Ordering::SeqCst)
    }

    fn read_receipts(&self) -> Vec<String> {
        self.0.read_receipts.lock().unwrap().clone()
    }

    async fn push(&self, signal: FeedSignal<E>) {
        let tx = self
            .0
            .signal_txs
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no live subscription");
        tx.send(signal).await.unwrap();
    }

    fn drop_subscriptions(&self) {
        self.0.signal_txs.lock().unwrap().clear();
    }
}

impl<E: FeedEntry> FeedCollaborator<E> for FakeFeed<E> {
    async fn connect(&self, _user_id: &str, _farm_id: &str) -> AppResult<FeedConnection<E>> {
        self.0.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_connects.load(Ordering::SeqCst) {
            return Err(AppError::Connectivity("connect refused".into()));
        }
        let (tx, connection) = signal_channel(16);
        self.0.signal_txs.lock().unwrap().push(tx);
        Ok(connection)
    }

    async fn history(&self, farm_id: &str) -> AppResult<Vec<E>> {
        if self.0.fail_history.load(Ordering::SeqCst) {
            return Err(AppError::Connectivity("history unavailable".into()));
        }
        Ok(self
            .0
            .history
            .lock()
            .unwrap()
            .get(farm_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn mark_read(&self, entry_id: &str) -> AppResult<()> {
        if self.0.fail_mark_read.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("receipt rejected".into()));
        }
        self.0
            .read_receipts
            .lock()
            .unwrap()
            .push(entry_id.to_string());
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn advisory(id: &str, farm_id: &str, classification: &str) -> AdvisoryEvent {
    AdvisoryEvent {
        id: id.into(),
        user_id: "farmer@example.com".into(),
        farm_id: farm_id.into(),
        recommended_seed: None,
        recommendation_type: classification.into(),
        advice: "advice".into(),
        reasoning: "reasoning".into(),
        weather_timestamp: None,
        metrics: HashMap::new(),
        received_at: None,
    }
}

fn reading(time: &str, farm_id: &str) -> WeatherReading {
    WeatherReading {
        user_id: "farmer@example.com".into(),
        time: time.into(),
        farm_id: farm_id.into(),
        lat: 47.3,
        lon: 8.5,
        weather_code: 3,
        temp: 18.0,
        received_at: None,
    }
}

fn alerts_sync(
    feed: &FakeFeed<AdvisoryEvent>,
    store: Arc<MemoryStore>,
) -> LiveFeedSynchronizer<AdvisoryEvent, FakeFeed<AdvisoryEvent>> {
    LiveFeedSynchronizer::new(feed.clone(), FeedProfile::alerts(), store)
}

fn weather_sync(
    feed: &FakeFeed<WeatherReading>,
    store: Arc<MemoryStore>,
) -> LiveFeedSynchronizer<WeatherReading, FakeFeed<WeatherReading>> {
    LiveFeedSynchronizer::new(feed.clone(), FeedProfile::weather(), store)
}

// ============================================================================
// Binding and history
// ============================================================================

#[tokio::test]
async fn bind_fetches_history_and_filters_by_allow_list() {
    init_tracing();
    let feed = FakeFeed::with_history(
        "farm-1",
        vec![
            advisory("a-1", "farm-1", "FROST_ALERT"),
            advisory("a-2", "farm-1", "IRRIGATION_NEEDED"),
        ],
    );
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));

    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    assert_eq!(sync.status(), ConnectionStatus::Connected);
    let ids: Vec<&str> = sync.entries().iter().map(|e| e.entry_id()).collect();
    assert_eq!(ids, vec!["a-1"]);
}

#[tokio::test]
async fn rebinding_the_same_farm_is_a_noop() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));

    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    assert_eq!(feed.connect_calls(), 1);
}

#[tokio::test]
async fn switching_farms_isolates_the_collections() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    sync.handle_push(advisory("a-1", "farm-1", "FROST_ALERT"));
    sync.handle_push(advisory("a-2", "farm-1", "HEAT_ALERT"));
    assert_eq!(sync.entries().len(), 2);

    sync.bind_farm("farmer@example.com", "farm-2").await.unwrap();
    assert!(sync.entries().is_empty());

    // a stray push for the old farm must not leak into the new view
    sync.handle_push(advisory("a-3", "farm-1", "FROST_ALERT"));
    assert!(sync.entries().is_empty());
}

#[tokio::test]
async fn cross_farm_pushes_replay_on_a_later_bind() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    sync.handle_push(advisory("b-1", "farm-2", "FROST_ALERT"));
    assert!(sync.entries().is_empty());

    sync.bind_farm("farmer@example.com", "farm-2").await.unwrap();
    let ids: Vec<&str> = sync.entries().iter().map(|e| e.entry_id()).collect();
    assert_eq!(ids, vec!["b-1"]);
}

#[tokio::test]
async fn history_failure_keeps_replayed_entries() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    sync.handle_push(advisory("b-1", "farm-2", "FROST_ALERT"));

    feed.0.fail_history.store(true, Ordering::SeqCst);
    sync.bind_farm("farmer@example.com", "farm-2").await.unwrap();
    assert_eq!(sync.entries().len(), 1);
}

#[tokio::test]
async fn unbind_clears_everything() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    sync.handle_push(advisory("a-1", "farm-1", "FROST_ALERT"));

    sync.unbind_farm();
    assert!(sync.entries().is_empty());
    assert_eq!(sync.status(), ConnectionStatus::Disconnected);

    // pushes while unbound are dropped
    sync.handle_push(advisory("a-2", "farm-1", "FROST_ALERT"));
    assert!(sync.entries().is_empty());
}

// ============================================================================
// Push dispatch
// ============================================================================

#[tokio::test]
async fn pushes_with_foreign_classification_are_dropped() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    sync.handle_push(advisory("r-1", "farm-1", "IRRIGATION_NEEDED"));
    assert!(sync.entries().is_empty());
}

#[tokio::test]
async fn accepted_pushes_go_newest_first_and_broadcast() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    let mut updates = sync.updates();

    sync.handle_push(advisory("a-1", "farm-1", "FROST_ALERT"));
    sync.handle_push(advisory("a-2", "farm-1", "HEAT_ALERT"));

    let ids: Vec<&str> = sync.entries().iter().map(|e| e.entry_id()).collect();
    assert_eq!(ids, vec!["a-2", "a-1"]);
    assert_eq!(updates.recv().await.unwrap().id, "a-1");
    assert_eq!(updates.recv().await.unwrap().id, "a-2");
}

#[tokio::test]
async fn pump_delivers_subscription_signals() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    feed.push(FeedSignal::Entry(advisory("a-1", "farm-1", "FROST_ALERT")))
        .await;
    assert!(sync.pump().await);
    assert_eq!(sync.entries().len(), 1);
}

#[tokio::test]
async fn closed_subscription_marks_disconnected_and_schedules_reconnect() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    feed.drop_subscriptions();
    assert!(sync.pump().await);
    assert_eq!(sync.status(), ConnectionStatus::Disconnected);
    assert!(sync.reconnect_scheduled());
}

// ============================================================================
// Reconnect policy
// ============================================================================

#[tokio::test(start_paused = true)]
async fn recovered_connection_makes_scheduled_reconnect_a_noop() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    assert_eq!(feed.connect_calls(), 1);

    sync.handle_status(ConnectionStatus::Disconnected);
    assert!(sync.reconnect_scheduled());
    sync.handle_status(ConnectionStatus::Connected);

    // the timer still fires, but finds the connection recovered
    sync.run_pending_reconnect().await;
    assert_eq!(feed.connect_calls(), 1);
    assert_eq!(sync.status(), ConnectionStatus::Connected);
}

#[tokio::test(start_paused = true)]
async fn still_disconnected_feed_reconnects_once() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    sync.handle_status(ConnectionStatus::Disconnected);
    sync.run_pending_reconnect().await;

    assert_eq!(feed.connect_calls(), 2);
    assert_eq!(sync.status(), ConnectionStatus::Connected);
    assert!(!sync.reconnect_scheduled());
}

#[tokio::test(start_paused = true)]
async fn failed_reconnects_stop_at_the_attempt_cap() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut profile = FeedProfile::alerts();
    profile.max_reconnect_attempts = 2;
    let mut sync =
        LiveFeedSynchronizer::new(feed.clone(), profile, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    assert_eq!(feed.connect_calls(), 1);

    feed.0.fail_connects.store(true, Ordering::SeqCst);
    sync.handle_status(ConnectionStatus::Disconnected);

    sync.run_pending_reconnect().await; // attempt 1
    assert!(sync.reconnect_scheduled());
    sync.run_pending_reconnect().await; // attempt 2
    assert_eq!(feed.connect_calls(), 3);

    // the cap is reached: no further attempt is scheduled
    assert!(!sync.reconnect_scheduled());
    sync.run_pending_reconnect().await;
    assert_eq!(feed.connect_calls(), 3);
}

// ============================================================================
// Consumption and read receipts
// ============================================================================

#[tokio::test]
async fn mark_consumed_removes_and_reports() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    sync.handle_push(advisory("a-1", "farm-1", "FROST_ALERT"));

    sync.mark_consumed("a-1").await;
    assert!(sync.entries().is_empty());
    assert_eq!(feed.read_receipts(), vec!["a-1".to_string()]);
}

#[tokio::test]
async fn failed_read_receipt_keeps_the_local_removal() {
    init_tracing();
    let feed = FakeFeed::<AdvisoryEvent>::default();
    feed.0.fail_mark_read.store(true, Ordering::SeqCst);
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    sync.handle_push(advisory("a-1", "farm-1", "FROST_ALERT"));

    sync.mark_consumed("a-1").await;
    assert!(sync.entries().is_empty());
}

#[tokio::test]
async fn clear_all_reports_every_entry() {
    let feed = FakeFeed::<AdvisoryEvent>::default();
    let mut sync = alerts_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    sync.handle_push(advisory("a-1", "farm-1", "FROST_ALERT"));
    sync.handle_push(advisory("a-2", "farm-1", "HEAT_ALERT"));

    sync.clear_all().await;
    assert!(sync.entries().is_empty());
    let mut receipts = feed.read_receipts();
    receipts.sort();
    assert_eq!(receipts, vec!["a-1".to_string(), "a-2".to_string()]);
}

#[tokio::test]
async fn weather_feed_sends_no_read_receipts() {
    let feed = FakeFeed::<WeatherReading>::default();
    let mut sync = weather_sync(&feed, Arc::new(MemoryStore::new()));
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    sync.handle_push(reading("t-1", "farm-1"));

    sync.mark_consumed("t-1").await;
    assert!(sync.entries().is_empty());
    assert!(feed.read_receipts().is_empty());
}

// ============================================================================
// Durable weather snapshots
// ============================================================================

fn seed_snapshot(store: &MemoryStore, age: Duration, entries: Vec<WeatherReading>) {
    let snapshot = CachedSnapshot {
        fetched_at: Utc::now() - age,
        entries,
    };
    let key = snapshot_key(shared::FeedKind::Weather, "farmer@example.com", "farm-1");
    store
        .put(&key, &serde_json::to_string(&snapshot).unwrap())
        .unwrap();
}

#[tokio::test]
async fn fresh_weather_snapshot_preloads_on_bind() {
    let store = Arc::new(MemoryStore::new());
    seed_snapshot(&store, Duration::minutes(5), vec![reading("t-1", "farm-1")]);
    let feed = FakeFeed::<WeatherReading>::default();
    let mut sync = weather_sync(&feed, store);

    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    let ids: Vec<&str> = sync.entries().iter().map(|e| e.entry_id()).collect();
    assert_eq!(ids, vec!["t-1"]);
}

#[tokio::test]
async fn stale_weather_snapshot_is_discarded() {
    let store = Arc::new(MemoryStore::new());
    seed_snapshot(&store, Duration::minutes(11), vec![reading("t-1", "farm-1")]);
    let feed = FakeFeed::<WeatherReading>::default();
    let mut sync = weather_sync(&feed, store.clone());

    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    assert!(sync.entries().is_empty());
    let key = snapshot_key(shared::FeedKind::Weather, "farmer@example.com", "farm-1");
    // bind saves a fresh (empty) snapshot after the history fetch
    let raw = store.get(&key).unwrap().unwrap();
    let snapshot: CachedSnapshot<WeatherReading> = serde_json::from_str(&raw).unwrap();
    assert!(snapshot.entries.is_empty());
}

#[tokio::test]
async fn weather_pushes_refresh_the_snapshot() {
    let store = Arc::new(MemoryStore::new());
    let feed = FakeFeed::<WeatherReading>::default();
    let mut sync = weather_sync(&feed, store.clone());
    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();

    sync.handle_push(reading("t-9", "farm-1"));

    let key = snapshot_key(shared::FeedKind::Weather, "farmer@example.com", "farm-1");
    let raw = store.get(&key).unwrap().unwrap();
    let snapshot: CachedSnapshot<WeatherReading> = serde_json::from_str(&raw).unwrap();
    assert_eq!(snapshot.entries.len(), 1);
    assert_eq!(snapshot.entries[0].time, "t-9");
}

#[tokio::test]
async fn weather_history_merges_behind_cached_entries() {
    let store = Arc::new(MemoryStore::new());
    seed_snapshot(&store, Duration::minutes(2), vec![reading("t-1", "farm-1")]);
    let feed = FakeFeed::with_history(
        "farm-1",
        vec![reading("t-1", "farm-1"), reading("t-2", "farm-1")],
    );
    let mut sync = weather_sync(&feed, store);

    sync.bind_farm("farmer@example.com", "farm-1").await.unwrap();
    let ids: Vec<&str> = sync.entries().iter().map(|e| e.entry_id()).collect();
    // t-1 deduplicates; t-2 arrives from history
    assert_eq!(ids, vec!["t-1", "t-2"]);
}
