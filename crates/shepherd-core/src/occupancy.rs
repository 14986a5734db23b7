//! Decoding of occupancy snapshots.
//!
//! The realtime backend delivers the whole `parkingSpots` collection on every
//! change: an object whose keys are spot ids and whose values are integer
//! occupancy codes. Only code `1` marks a spot as occupied; a whole-number
//! float such as `1.0` reads as the same integer.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::{json_kind, DecodeError};
use crate::types::ParkingSpot;

pub const OCCUPIED_CODE: i64 = 1;

/// Decodes a full snapshot into spots in the backend's child order.
///
/// A `null` snapshot is an empty collection.
pub fn decode_snapshot(snapshot: &Value) -> Result<Vec<ParkingSpot>, DecodeError> {
    let children = match snapshot {
        Value::Null => return Ok(Vec::new()),
        Value::Object(children) => children,
        other => {
            return Err(DecodeError::NotAnObject {
                found: json_kind(other),
            })
        }
    };

    let mut spots: Vec<ParkingSpot> = children
        .iter()
        .map(|(spot_id, code)| ParkingSpot::new(spot_id.clone(), is_occupied(code)))
        .collect();

    spots.sort_by(|a, b| compare_child_keys(&a.spot_id, &b.spot_id));
    Ok(spots)
}

pub fn is_occupied(code: &Value) -> bool {
    // integer codes and whole-number floats alike
    code.as_f64() == Some(OCCUPIED_CODE as f64)
}

/// Child ordering of the realtime backend: keys that are canonical 32-bit
/// integers come first in numeric order, every other key follows in
/// lexicographic order.
pub fn compare_child_keys(a: &str, b: &str) -> Ordering {
    match (integer_key(a), integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn integer_key(key: &str) -> Option<i32> {
    // "01" or "+1" are plain string keys
    key.parse::<i32>()
        .ok()
        .filter(|value| value.to_string() == key)
}
