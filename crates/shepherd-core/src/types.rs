use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Zone assigned to spots that have no entry in the zone mapping.
pub const UNKNOWN_ZONE: &str = "Unknown Zone";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub spot_id: String,
    pub is_full: bool,
}

impl ParkingSpot {
    pub fn new(spot_id: impl Into<String>, is_full: bool) -> Self {
        Self {
            spot_id: spot_id.into(),
            is_full,
        }
    }

    pub fn free(spot_id: impl Into<String>) -> Self {
        Self::new(spot_id, false)
    }

    pub fn occupied(spot_id: impl Into<String>) -> Self {
        Self::new(spot_id, true)
    }
}

/// Per-spot zone lookup (spot id -> zone name).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneMap {
    zones: HashMap<String, String>,
}

impl ZoneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spot_id: impl Into<String>, zone: impl Into<String>) -> Option<String> {
        self.zones.insert(spot_id.into(), zone.into())
    }

    pub fn zone_of(&self, spot_id: &str) -> Option<&str> {
        self.zones.get(spot_id).map(String::as_str)
    }

    /// Zone for `spot_id`, falling back to [`UNKNOWN_ZONE`].
    pub fn zone_or_unknown(&self, spot_id: &str) -> &str {
        self.zone_of(spot_id).unwrap_or(UNKNOWN_ZONE)
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ZoneMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            zones: iter
                .into_iter()
                .map(|(spot, zone)| (spot.into(), zone.into()))
                .collect(),
        }
    }
}
