use std::collections::BTreeMap;

use crate::types::{ParkingSpot, ZoneMap};

/// Spots grouped by zone name. Keys iterate in ascending order; each group
/// lists free spots before occupied ones.
pub type SpotsByZone = BTreeMap<String, Vec<ParkingSpot>>;

/// Groups `spots` by their zone in `zones`, with unmapped spots under
/// [`crate::UNKNOWN_ZONE`].
///
/// Within a group, spots sharing an occupancy flag keep their input order.
/// Every input spot appears exactly once in the result.
pub fn aggregate(spots: &[ParkingSpot], zones: &ZoneMap) -> SpotsByZone {
    let mut groups = SpotsByZone::new();

    for spot in spots {
        groups
            .entry(zones.zone_or_unknown(&spot.spot_id).to_string())
            .or_default()
            .push(spot.clone());
    }

    for group in groups.values_mut() {
        // stable: false < true keeps free spots first
        group.sort_by_key(|spot| spot.is_full);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNKNOWN_ZONE;

    #[test]
    fn stable_within_occupancy_flag() {
        let spots = vec![
            ParkingSpot::occupied("S4"),
            ParkingSpot::free("S3"),
            ParkingSpot::occupied("S1"),
            ParkingSpot::free("S2"),
        ];

        let groups = aggregate(&spots, &ZoneMap::new());
        let ids: Vec<&str> = groups[UNKNOWN_ZONE]
            .iter()
            .map(|spot| spot.spot_id.as_str())
            .collect();

        assert_eq!(ids, ["S3", "S2", "S4", "S1"]);
    }

    #[test]
    fn mapping_entries_without_spots_create_no_groups() {
        let zones: ZoneMap = [("Ghost", "zone_9")].into_iter().collect();
        let groups = aggregate(&[ParkingSpot::free("A")], &zones);

        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key(UNKNOWN_ZONE));
    }
}
