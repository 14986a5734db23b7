//! Backends the session subscribes to.
//!
//! [`OccupancyFeed`] is the push side: a subscription yields a full snapshot
//! on every change. [`ZoneStore`] is queried on demand for the zone documents.
//! The implementations here are local stand-ins for the hosted services.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::error::{FeedError, ZoneStoreError};
use crate::types::{ParkingSpot, ZoneMap};
use crate::zones::{invert_zone_documents, parse_zone_documents, ZoneDocument};

pub const DEFAULT_SPOTS_PATH: &str = "parkingSpots";
pub const DEFAULT_ZONES_COLLECTION: &str = "parking_zones";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    Snapshot(Vec<ParkingSpot>),
    /// Terminal: the subscription delivers nothing after a failure.
    Failed(FeedError),
}

pub type OccupancySubscription = BoxStream<'static, FeedEvent>;

pub trait OccupancyFeed: Send + Sync {
    fn subscribe(&self, path: &str) -> OccupancySubscription;
}

#[async_trait]
pub trait ZoneStore: Send + Sync {
    async fn fetch_documents(&self, collection: &str) -> Result<Vec<ZoneDocument>, ZoneStoreError>;
}

/// Fetches the collection and inverts it into a per-spot lookup.
pub async fn load_zone_map(
    store: &dyn ZoneStore,
    collection: &str,
) -> Result<ZoneMap, ZoneStoreError> {
    let documents = store.fetch_documents(collection).await?;
    let zones = invert_zone_documents(&documents);
    debug!(
        collection,
        documents = documents.len(),
        spots = zones.len(),
        "loaded zone mapping"
    );
    Ok(zones)
}

const FEED_CAPACITY: usize = 64;

/// In-process occupancy feed. Publishers push complete snapshots; each new
/// subscriber first receives the latest one.
#[derive(Clone)]
pub struct ChannelOccupancyFeed {
    path: String,
    inner: Arc<Mutex<FeedState>>,
    sender: broadcast::Sender<FeedEvent>,
}

struct FeedState {
    latest: Option<FeedEvent>,
}

impl ChannelOccupancyFeed {
    pub fn new(path: impl Into<String>) -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self {
            path: path.into(),
            inner: Arc::new(Mutex::new(FeedState { latest: None })),
            sender,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn publish(&self, spots: Vec<ParkingSpot>) {
        self.send(FeedEvent::Snapshot(spots));
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.send(FeedEvent::Failed(FeedError::Cancelled {
            path: self.path.clone(),
            message: message.into(),
        }));
    }

    fn send(&self, event: FeedEvent) {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        state.latest = Some(event.clone());
        // no subscribers is fine; the event is kept as `latest`
        let _ = self.sender.send(event);
    }
}

impl OccupancyFeed for ChannelOccupancyFeed {
    fn subscribe(&self, path: &str) -> OccupancySubscription {
        if path != self.path {
            let event = FeedEvent::Failed(FeedError::Cancelled {
                path: path.to_string(),
                message: format!("no such collection (feed serves '{}')", self.path),
            });
            return stream::iter([event]).boxed();
        }

        // subscribe under the lock so nothing slips between `latest` and the receiver
        let (initial, receiver) = {
            let state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            (state.latest.clone(), self.sender.subscribe())
        };

        let path = self.path.clone();
        let live = stream::unfold(receiver, move |mut receiver| {
            let path = path.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(event) => return Some((event, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // snapshots are complete, the next one supersedes what was missed
                            warn!(path = %path, skipped, "occupancy subscriber lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        });

        stream::iter(initial).chain(live).boxed()
    }
}

/// Zone documents read from a JSON file (one document object or an array).
#[derive(Debug, Clone)]
pub struct JsonZoneStore {
    path: PathBuf,
}

impl JsonZoneStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ZoneStore for JsonZoneStore {
    async fn fetch_documents(&self, collection: &str) -> Result<Vec<ZoneDocument>, ZoneStoreError> {
        let shown = self.path.display().to_string();
        debug!(collection, path = %shown, "reading zone documents");

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ZoneStoreError::Io {
                path: shown.clone(),
                source,
            })?;
        let value = serde_json::from_str(&content).map_err(|source| ZoneStoreError::Json {
            path: shown,
            source,
        })?;

        Ok(parse_zone_documents(value)?)
    }
}

/// Fixed in-memory documents. An unavailable store fails every fetch.
#[derive(Debug, Clone, Default)]
pub struct StaticZoneStore {
    documents: Vec<ZoneDocument>,
    unavailable: Option<String>,
}

impl StaticZoneStore {
    pub fn new(documents: Vec<ZoneDocument>) -> Self {
        Self {
            documents,
            unavailable: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            documents: Vec::new(),
            unavailable: Some(message.into()),
        }
    }
}

#[async_trait]
impl ZoneStore for StaticZoneStore {
    async fn fetch_documents(&self, _collection: &str) -> Result<Vec<ZoneDocument>, ZoneStoreError> {
        match &self.unavailable {
            Some(message) => Err(ZoneStoreError::Unavailable(message.clone())),
            None => Ok(self.documents.clone()),
        }
    }
}
