use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use shepherd_core::presentation::ParkingStatus;
use shepherd_core::zones::{invert_zone_documents, parse_zone_documents};
use shepherd_core::{aggregate, ParkingSpot, ZoneMap};
use tracing::warn;

pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse JSON from '{}'", path.display()))
}

pub fn load_zones(path: &Path) -> Result<ZoneMap> {
    let documents = parse_zone_documents(read_json(path)?)
        .with_context(|| format!("invalid zone documents in '{}'", path.display()))?;
    Ok(invert_zone_documents(&documents))
}

/// Builds the model for a saved snapshot. The mapping counts as loaded when
/// the zone documents were read successfully, even if they list no spots.
pub fn status_from_inputs(
    spots: &[ParkingSpot],
    zones: Option<Result<ZoneMap>>,
    now: DateTime<Utc>,
) -> ParkingStatus {
    let (zones, loaded) = match zones {
        Some(Ok(zones)) => (zones, true),
        Some(Err(err)) => {
            warn!("error fetching zone data, continuing without it: {err:#}");
            (ZoneMap::new(), false)
        }
        None => (ZoneMap::new(), false),
    };

    ParkingStatus::from_groups(&aggregate(spots, &zones), now).with_zone_mapping_loaded(loaded)
}

/// One row per spot, grouped in zone order.
pub fn render_table(status: &ParkingStatus) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Zone", "Spot", "Status"]);

    for card in &status.zones {
        for spot in &card.spots {
            table.add_row(vec![
                Cell::new(&card.label),
                Cell::new(&spot.label),
                Cell::new(spot.status.as_str()),
            ]);
        }
    }

    table
}

pub fn summary_line(status: &ParkingStatus) -> String {
    format!(
        "{} of {} spots free across {} zones",
        status.free_spots,
        status.total_spots,
        status.zones.len()
    )
}
