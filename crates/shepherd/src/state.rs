use std::sync::Arc;

use shepherd_core::config::Config;
use shepherd_core::feedback::{FeedbackStore, MemoryFeedbackStore};
use shepherd_core::late::{NotificationSink, OutboxNotificationSink};
use shepherd_core::session::{ParkingStatusSession, SessionHandle, SessionOptions};
use shepherd_core::sources::{ChannelOccupancyFeed, JsonZoneStore, StaticZoneStore, ZoneStore};
use tracing::{info, warn};

pub struct AppState {
    pub feed: Arc<ChannelOccupancyFeed>,
    pub session: SessionHandle,
    pub feedback: Arc<dyn FeedbackStore>,
    pub notifications: Arc<dyn NotificationSink>,
}

impl AppState {
    /// Must be called from within a tokio runtime; the session starts immediately.
    pub fn new(config: &Config) -> Arc<Self> {
        let store: Arc<dyn ZoneStore> = match &config.zones_file {
            Some(path) => {
                info!(path = %path.display(), "loading zone documents from file");
                Arc::new(JsonZoneStore::new(path.clone()))
            }
            None => {
                warn!("no zone documents configured, every spot will be listed under the unknown zone");
                Arc::new(StaticZoneStore::default())
            }
        };

        Self::with_sources(
            Arc::new(ChannelOccupancyFeed::new(config.spots_path.clone())),
            store,
            Arc::new(MemoryFeedbackStore::default()),
            Arc::new(OutboxNotificationSink::default()),
            config.session_options(),
        )
    }

    pub fn with_sources(
        feed: Arc<ChannelOccupancyFeed>,
        store: Arc<dyn ZoneStore>,
        feedback: Arc<dyn FeedbackStore>,
        notifications: Arc<dyn NotificationSink>,
        options: SessionOptions,
    ) -> Arc<Self> {
        let session = ParkingStatusSession::activate(feed.clone(), store, options);
        Arc::new(Self {
            feed,
            session,
            feedback,
            notifications,
        })
    }
}
