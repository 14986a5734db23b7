//! Inversion of zone documents into a per-spot lookup.
//!
//! The document store holds `parking_zones` documents shaped like
//! `{ "zone_1": ["Spot1", "Spot2"], "zone_2": ["Spot3"] }`. The aggregator
//! needs the opposite direction, so every listed spot id is mapped back to the
//! field that listed it.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{json_kind, DecodeError};
use crate::types::ZoneMap;

/// One document from the zone collection: field name -> field value.
pub type ZoneDocument = BTreeMap<String, Value>;

/// Builds the per-spot lookup. When a spot is listed under several zones the
/// last one encountered wins.
pub fn invert_zone_documents(documents: &[ZoneDocument]) -> ZoneMap {
    let mut zones = ZoneMap::new();

    for document in documents {
        for (zone_key, value) in document {
            let Value::Array(spot_ids) = value else {
                continue;
            };
            for spot_id in spot_ids.iter().filter_map(Value::as_str) {
                zones.insert(spot_id, zone_key.as_str());
            }
        }
    }

    zones
}

/// Accepts either one document object or an array of them.
pub fn parse_zone_documents(value: Value) -> Result<Vec<ZoneDocument>, DecodeError> {
    match value {
        Value::Object(fields) => Ok(vec![fields.into_iter().collect()]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(fields) => Ok(fields.into_iter().collect()),
                other => Err(DecodeError::InvalidZoneDocuments {
                    found: json_kind(&other),
                }),
            })
            .collect(),
        other => Err(DecodeError::InvalidZoneDocuments {
            found: json_kind(&other),
        }),
    }
}
