//! Session adapter around the aggregator.
//!
//! A session stands for one activation of the parking status screen. It
//! subscribes to the occupancy feed, fetches the zone mapping concurrently and
//! funnels both into a single event loop. Each event replaces one input
//! wholesale, reruns [`aggregate`] over the latest pair and publishes the new
//! [`ParkingStatus`] on a watch channel.
//!
//! Neither failure stops the session:
//!
//! - feed failure clears the spots and publishes the empty state with the
//!   error attached; the subscription is not retried,
//! - zone fetch failure keeps whatever mapping is already applied.

use std::sync::Arc;

use chrono::Utc;
use futures::StreamExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::aggregator::aggregate;
use crate::error::{FeedError, Result, ShepherdError, ZoneStoreError};
use crate::presentation::ParkingStatus;
use crate::sources::{
    load_zone_map, FeedEvent, OccupancyFeed, ZoneStore, DEFAULT_SPOTS_PATH,
    DEFAULT_ZONES_COLLECTION,
};
use crate::types::{ParkingSpot, ZoneMap};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub spots_path: String,
    pub zones_collection: String,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            spots_path: DEFAULT_SPOTS_PATH.to_string(),
            zones_collection: DEFAULT_ZONES_COLLECTION.to_string(),
        }
    }
}

#[derive(Debug)]
enum SessionEvent {
    Snapshot(Vec<ParkingSpot>),
    FeedFailed(FeedError),
    FeedEnded,
    Zones { generation: u64, zones: ZoneMap },
    ZonesFailed { generation: u64, error: ZoneStoreError },
    ReloadZones,
}

pub struct ParkingStatusSession;

impl ParkingStatusSession {
    /// Starts a session on the current tokio runtime.
    pub fn activate(
        feed: Arc<dyn OccupancyFeed>,
        store: Arc<dyn ZoneStore>,
        options: SessionOptions,
    ) -> SessionHandle {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let (status_tx, status_rx) = watch::channel(Arc::new(ParkingStatus::empty(Utc::now())));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(
            spots_path = %options.spots_path,
            zones_collection = %options.zones_collection,
            "activating parking status session"
        );

        let forwarder = spawn_feed_forwarder(feed.as_ref(), &options.spots_path, events_tx.clone());

        let state = SessionState {
            spots: Vec::new(),
            zones: ZoneMap::new(),
            zone_generation: 0,
            applied_generation: None,
            feed_error: None,
            store,
            options,
            events_tx: events_tx.clone(),
            status_tx,
        };

        let task = tokio::spawn(state.run(events_rx, shutdown_rx, forwarder));

        SessionHandle {
            status_rx,
            events_tx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }
}

fn spawn_feed_forwarder(
    feed: &dyn OccupancyFeed,
    path: &str,
    events_tx: mpsc::Sender<SessionEvent>,
) -> JoinHandle<()> {
    let mut subscription = feed.subscribe(path);

    tokio::spawn(async move {
        while let Some(event) = subscription.next().await {
            let (message, terminal) = match event {
                FeedEvent::Snapshot(spots) => (SessionEvent::Snapshot(spots), false),
                FeedEvent::Failed(err) => (SessionEvent::FeedFailed(err), true),
            };
            if events_tx.send(message).await.is_err() || terminal {
                return;
            }
        }
        let _ = events_tx.send(SessionEvent::FeedEnded).await;
    })
}

struct SessionState {
    spots: Vec<ParkingSpot>,
    zones: ZoneMap,
    zone_generation: u64,
    applied_generation: Option<u64>,
    feed_error: Option<String>,
    store: Arc<dyn ZoneStore>,
    options: SessionOptions,
    events_tx: mpsc::Sender<SessionEvent>,
    status_tx: watch::Sender<Arc<ParkingStatus>>,
}

impl SessionState {
    async fn run(
        mut self,
        mut events_rx: mpsc::Receiver<SessionEvent>,
        mut shutdown_rx: oneshot::Receiver<()>,
        forwarder: JoinHandle<()>,
    ) {
        self.fetch_zones();

        loop {
            tokio::select! {
                // a dropped handle counts as shutdown too
                _ = &mut shutdown_rx => break,
                event = events_rx.recv() => match event {
                    Some(event) => self.handle(event),
                    None => break,
                },
            }
        }

        forwarder.abort();
        info!(spots_path = %self.options.spots_path, "parking status session closed");
    }

    fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Snapshot(spots) => {
                debug!(spots = spots.len(), "occupancy snapshot received");
                self.spots = spots;
                self.feed_error = None;
                self.publish();
            }
            SessionEvent::FeedFailed(err) => {
                error!(error = %err, "failed to read parking spots");
                self.spots.clear();
                self.feed_error = Some(err.to_string());
                self.publish();
            }
            SessionEvent::FeedEnded => {
                warn!(spots_path = %self.options.spots_path, "occupancy feed ended");
            }
            SessionEvent::Zones { generation, zones } => {
                if self.applied_generation.is_some_and(|applied| applied > generation) {
                    debug!(generation, "discarding superseded zone mapping");
                    return;
                }
                self.applied_generation = Some(generation);
                self.zones = zones;
                self.publish();
            }
            SessionEvent::ZonesFailed { generation, error } => {
                error!(
                    generation,
                    error = %error,
                    mapped_spots = self.zones.len(),
                    "error fetching zone data, keeping current mapping"
                );
            }
            SessionEvent::ReloadZones => self.fetch_zones(),
        }
    }

    fn fetch_zones(&mut self) {
        self.zone_generation += 1;
        let generation = self.zone_generation;
        let store = Arc::clone(&self.store);
        let collection = self.options.zones_collection.clone();
        let events_tx = self.events_tx.clone();

        // not cancelled on close; a late result is dropped with the channel
        tokio::spawn(async move {
            let event = match load_zone_map(store.as_ref(), &collection).await {
                Ok(zones) => SessionEvent::Zones { generation, zones },
                Err(error) => SessionEvent::ZonesFailed { generation, error },
            };
            let _ = events_tx.send(event).await;
        });
    }

    fn publish(&self) {
        let groups = aggregate(&self.spots, &self.zones);
        let status = ParkingStatus::from_groups(&groups, Utc::now())
            .with_zone_mapping_loaded(self.applied_generation.is_some())
            .with_feed_error(self.feed_error.clone());

        debug!(
            zones = status.zones.len(),
            spots = status.total_spots,
            free = status.free_spots,
            "publishing parking status"
        );
        self.status_tx.send_replace(Arc::new(status));
    }
}

/// Handle to a running session. Dropping it stops the session.
pub struct SessionHandle {
    status_rx: watch::Receiver<Arc<ParkingStatus>>,
    events_tx: mpsc::Sender<SessionEvent>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Latest published model.
    pub fn status(&self) -> Arc<ParkingStatus> {
        Arc::clone(&self.status_rx.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ParkingStatus>> {
        self.status_rx.clone()
    }

    /// Fetches the zone mapping again and recomputes once it arrives.
    pub async fn reload_zones(&self) -> Result<()> {
        self.events_tx
            .send(SessionEvent::ReloadZones)
            .await
            .map_err(|_| ShepherdError::SessionClosed)
    }

    /// Stops the session and waits for its loop to exit.
    pub async fn close(mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "parking status session task failed");
            }
        }
    }
}
