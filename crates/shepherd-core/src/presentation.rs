//! Display model for the parking status screen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator::SpotsByZone;
use crate::types::ParkingSpot;

pub fn zone_label(zone: &str) -> String {
    zone.replace("zone_", "Zone ")
}

pub fn spot_label(spot_id: &str) -> String {
    format!("Spot {}", spot_id.replace("Spot", ""))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    Empty,
    Full,
}

impl SpotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpotStatus::Empty => "Empty",
            SpotStatus::Full => "Full",
        }
    }
}

impl From<&ParkingSpot> for SpotStatus {
    fn from(spot: &ParkingSpot) -> Self {
        if spot.is_full {
            SpotStatus::Full
        } else {
            SpotStatus::Empty
        }
    }
}

/// Sentence shown when a spot is selected.
pub fn spot_details(spot: &ParkingSpot, zone: &str) -> String {
    format!(
        "{} is located in {} and is currently {}.",
        spot_label(&spot.spot_id),
        zone_label(zone),
        SpotStatus::from(spot).as_str()
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotView {
    pub spot_id: String,
    pub label: String,
    pub status: SpotStatus,
    pub is_full: bool,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneCard {
    pub zone: String,
    pub label: String,
    pub free: usize,
    pub occupied: usize,
    pub spots: Vec<SpotView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingStatus {
    pub zones: Vec<ZoneCard>,
    pub total_spots: usize,
    pub free_spots: usize,
    pub zone_mapping_loaded: bool,
    pub feed_error: Option<String>,
    pub refreshed_at: DateTime<Utc>,
}

impl ParkingStatus {
    pub fn empty(refreshed_at: DateTime<Utc>) -> Self {
        Self {
            zones: Vec::new(),
            total_spots: 0,
            free_spots: 0,
            zone_mapping_loaded: false,
            feed_error: None,
            refreshed_at,
        }
    }

    /// Builds the display model, keeping the aggregator's zone and spot order.
    pub fn from_groups(groups: &SpotsByZone, refreshed_at: DateTime<Utc>) -> Self {
        let zones: Vec<ZoneCard> = groups
            .iter()
            .map(|(zone, spots)| {
                let occupied = spots.iter().filter(|spot| spot.is_full).count();
                ZoneCard {
                    zone: zone.clone(),
                    label: zone_label(zone),
                    free: spots.len() - occupied,
                    occupied,
                    spots: spots
                        .iter()
                        .map(|spot| SpotView {
                            spot_id: spot.spot_id.clone(),
                            label: spot_label(&spot.spot_id),
                            status: SpotStatus::from(spot),
                            is_full: spot.is_full,
                            details: spot_details(spot, zone),
                        })
                        .collect(),
                }
            })
            .collect();

        Self {
            total_spots: zones.iter().map(|card| card.spots.len()).sum(),
            free_spots: zones.iter().map(|card| card.free).sum(),
            zones,
            zone_mapping_loaded: false,
            feed_error: None,
            refreshed_at,
        }
    }

    pub fn with_zone_mapping_loaded(mut self, loaded: bool) -> Self {
        self.zone_mapping_loaded = loaded;
        self
    }

    pub fn with_feed_error(mut self, feed_error: Option<String>) -> Self {
        self.feed_error = feed_error;
        self
    }
}
