use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use shepherd_core::error::ZoneStoreError;
use shepherd_core::presentation::ParkingStatus;
use shepherd_core::session::{ParkingStatusSession, SessionOptions};
use shepherd_core::sources::{
    ChannelOccupancyFeed, StaticZoneStore, ZoneStore, DEFAULT_SPOTS_PATH,
};
use shepherd_core::zones::ZoneDocument;
use shepherd_core::{ParkingSpot, UNKNOWN_ZONE};
use tokio::sync::{watch, Notify};

fn zone_documents() -> Vec<ZoneDocument> {
    vec![serde_json::from_value(json!({ "zone_1": ["A", "C"] })).expect("document")]
}

fn spots() -> Vec<ParkingSpot> {
    vec![
        ParkingSpot::free("A"),
        ParkingSpot::occupied("B"),
        ParkingSpot::free("C"),
    ]
}

fn zone_names(status: &ParkingStatus) -> Vec<&str> {
    status.zones.iter().map(|card| card.zone.as_str()).collect()
}

async fn wait_for(
    rx: &mut watch::Receiver<Arc<ParkingStatus>>,
    predicate: impl FnMut(&Arc<ParkingStatus>) -> bool,
) -> Arc<ParkingStatus> {
    let status = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("timed out waiting for status")
        .expect("session stopped publishing");
    Arc::clone(&status)
}

/// Holds the documents back until the test opens the gate.
struct GatedZoneStore {
    gate: Arc<Notify>,
    documents: Vec<ZoneDocument>,
}

#[async_trait]
impl ZoneStore for GatedZoneStore {
    async fn fetch_documents(&self, _collection: &str) -> Result<Vec<ZoneDocument>, ZoneStoreError> {
        self.gate.notified().await;
        Ok(self.documents.clone())
    }
}

/// Serves whatever documents are currently installed.
struct SwappableZoneStore {
    documents: Mutex<Vec<ZoneDocument>>,
}

#[async_trait]
impl ZoneStore for SwappableZoneStore {
    async fn fetch_documents(&self, _collection: &str) -> Result<Vec<ZoneDocument>, ZoneStoreError> {
        Ok(self.documents.lock().expect("documents").clone())
    }
}

/// Serves the documents once, then fails every later fetch.
struct FlakyZoneStore {
    calls: AtomicUsize,
    failed: Arc<Notify>,
    documents: Vec<ZoneDocument>,
}

#[async_trait]
impl ZoneStore for FlakyZoneStore {
    async fn fetch_documents(&self, _collection: &str) -> Result<Vec<ZoneDocument>, ZoneStoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(self.documents.clone());
        }
        self.failed.notify_one();
        Err(ZoneStoreError::Unavailable("zone collection offline".to_string()))
    }
}

#[tokio::test]
async fn initial_status_is_empty() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let store = Arc::new(StaticZoneStore::unavailable("offline"));
    let session = ParkingStatusSession::activate(feed, store, SessionOptions::default());

    let status = session.status();
    assert!(status.zones.is_empty());
    assert_eq!(status.total_spots, 0);
    assert!(!status.zone_mapping_loaded);

    session.close().await;
}

#[tokio::test]
async fn mapping_arriving_after_snapshot_regroups_spots() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let gate = Arc::new(Notify::new());
    let store = Arc::new(GatedZoneStore {
        gate: Arc::clone(&gate),
        documents: zone_documents(),
    });
    let session = ParkingStatusSession::activate(feed.clone(), store, SessionOptions::default());
    let mut rx = session.subscribe();

    feed.publish(spots());
    let before = wait_for(&mut rx, |status| status.total_spots == 3).await;
    assert!(!before.zone_mapping_loaded);
    assert_eq!(zone_names(&before), [UNKNOWN_ZONE]);
    assert_eq!(before.zones[0].free, 2);

    gate.notify_one();
    let after = wait_for(&mut rx, |status| status.zone_mapping_loaded).await;
    assert_eq!(zone_names(&after), [UNKNOWN_ZONE, "zone_1"]);
    assert_eq!(after.zones[0].spots[0].spot_id, "B");
    let zone_1: Vec<&str> = after.zones[1]
        .spots
        .iter()
        .map(|spot| spot.spot_id.as_str())
        .collect();
    assert_eq!(zone_1, ["A", "C"]);

    session.close().await;
}

#[tokio::test]
async fn mapping_arriving_before_snapshot_is_applied() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let store = Arc::new(StaticZoneStore::new(zone_documents()));
    let session = ParkingStatusSession::activate(feed.clone(), store, SessionOptions::default());
    let mut rx = session.subscribe();

    let loaded = wait_for(&mut rx, |status| status.zone_mapping_loaded).await;
    assert!(loaded.zones.is_empty());

    feed.publish(spots());
    let status = wait_for(&mut rx, |status| status.total_spots == 3).await;
    assert_eq!(zone_names(&status), [UNKNOWN_ZONE, "zone_1"]);
    assert_eq!(status.free_spots, 2);

    session.close().await;
}

#[tokio::test]
async fn missing_mapping_leaves_spots_in_unknown_zone() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let store = Arc::new(StaticZoneStore::unavailable("document store offline"));
    let session = ParkingStatusSession::activate(feed.clone(), store, SessionOptions::default());
    let mut rx = session.subscribe();

    feed.publish(spots());
    let status = wait_for(&mut rx, |status| status.total_spots == 3).await;

    assert!(!status.zone_mapping_loaded);
    assert_eq!(zone_names(&status), [UNKNOWN_ZONE]);
    let ids: Vec<&str> = status.zones[0]
        .spots
        .iter()
        .map(|spot| spot.spot_id.as_str())
        .collect();
    assert_eq!(ids, ["A", "C", "B"]);

    session.close().await;
}

#[tokio::test]
async fn snapshots_replace_previous_spots() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let store = Arc::new(StaticZoneStore::new(zone_documents()));
    let session = ParkingStatusSession::activate(feed.clone(), store, SessionOptions::default());
    let mut rx = session.subscribe();

    feed.publish(spots());
    wait_for(&mut rx, |status| status.total_spots == 3).await;

    feed.publish(vec![ParkingSpot::occupied("A")]);
    let status = wait_for(&mut rx, |status| status.total_spots == 1).await;
    assert_eq!(status.free_spots, 0);
    assert_eq!(status.zones[0].spots[0].spot_id, "A");

    session.close().await;
}

#[tokio::test]
async fn feed_failure_shows_empty_state() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let store = Arc::new(StaticZoneStore::new(zone_documents()));
    let session = ParkingStatusSession::activate(feed.clone(), store, SessionOptions::default());
    let mut rx = session.subscribe();

    feed.publish(spots());
    wait_for(&mut rx, |status| status.total_spots == 3).await;

    feed.fail("permission denied");
    let status = wait_for(&mut rx, |status| status.feed_error.is_some()).await;
    assert!(status.zones.is_empty());
    assert_eq!(status.total_spots, 0);
    assert!(status
        .feed_error
        .as_deref()
        .is_some_and(|message| message.contains("permission denied")));

    session.close().await;
}

#[tokio::test]
async fn reload_applies_new_mapping() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let store = Arc::new(SwappableZoneStore {
        documents: Mutex::new(zone_documents()),
    });
    let session =
        ParkingStatusSession::activate(feed.clone(), store.clone(), SessionOptions::default());
    let mut rx = session.subscribe();

    feed.publish(spots());
    wait_for(&mut rx, |status| {
        status.zone_mapping_loaded && status.total_spots == 3
    })
    .await;

    *store.documents.lock().expect("documents") =
        vec![serde_json::from_value(json!({ "zone_2": ["A", "B", "C"] })).expect("document")];
    session.reload_zones().await.expect("reload");

    let status = wait_for(&mut rx, |status| {
        status.zones.iter().any(|card| card.zone == "zone_2")
    })
    .await;
    assert_eq!(zone_names(&status), ["zone_2"]);
    assert_eq!(status.zones[0].label, "Zone 2");

    session.close().await;
}

#[tokio::test]
async fn failed_reload_keeps_applied_mapping() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let failed = Arc::new(Notify::new());
    let store = Arc::new(FlakyZoneStore {
        calls: AtomicUsize::new(0),
        failed: Arc::clone(&failed),
        documents: zone_documents(),
    });
    let session =
        ParkingStatusSession::activate(feed.clone(), store.clone(), SessionOptions::default());
    let mut rx = session.subscribe();

    feed.publish(spots());
    wait_for(&mut rx, |status| {
        status.zone_mapping_loaded && status.total_spots == 3
    })
    .await;

    session.reload_zones().await.expect("reload");
    tokio::time::timeout(Duration::from_secs(5), failed.notified())
        .await
        .expect("reload never reached the store");

    feed.publish(vec![
        ParkingSpot::occupied("A"),
        ParkingSpot::free("B"),
        ParkingSpot::occupied("C"),
        ParkingSpot::free("D"),
    ]);
    let status = wait_for(&mut rx, |status| status.total_spots == 4).await;

    assert!(status.zone_mapping_loaded);
    assert_eq!(zone_names(&status), [UNKNOWN_ZONE, "zone_1"]);
    let zone_1: Vec<&str> = status.zones[1]
        .spots
        .iter()
        .map(|spot| spot.spot_id.as_str())
        .collect();
    assert_eq!(zone_1, ["A", "C"]);
    assert_eq!(status.zones[1].free, 0);
    assert_eq!(store.calls.load(Ordering::SeqCst), 2);

    session.close().await;
}

#[tokio::test]
async fn close_stops_publishing() {
    let feed = Arc::new(ChannelOccupancyFeed::new(DEFAULT_SPOTS_PATH));
    let store = Arc::new(StaticZoneStore::new(zone_documents()));
    let session = ParkingStatusSession::activate(feed.clone(), store, SessionOptions::default());
    let mut rx = session.subscribe();

    session.close().await;
    rx.borrow_and_update();

    feed.publish(spots());
    assert!(rx.changed().await.is_err());
}
