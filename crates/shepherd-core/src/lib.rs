//! Zone occupancy for the Shepherd parking service.
//!
//! Live spot occupancy and the zone-membership reference data arrive from two
//! independent sources. [`aggregator::aggregate`] is the pure merge between
//! them; [`session`] owns the subscriptions and republishes a fresh
//! [`presentation::ParkingStatus`] whenever either input changes.
//!
//! [`feedback`] and [`late`] carry the other two student flows: traffic
//! updates with their recent-updates board, and late-arrival notifications.

pub mod aggregator;
pub mod config;
pub mod error;
pub mod feedback;
pub mod late;
pub mod occupancy;
pub mod presentation;
pub mod session;
pub mod sources;
pub mod types;
pub mod zones;

pub use aggregator::{aggregate, SpotsByZone};
pub use error::{Result, ShepherdError};
pub use types::{ParkingSpot, ZoneMap, UNKNOWN_ZONE};
