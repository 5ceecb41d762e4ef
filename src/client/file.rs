//! Offline batches read from JSON files in the same shape the API serves.

use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::Result;
use crate::odds::OddsSnapshot;
use crate::parlay::Pick;

/// Read a snapshot batch (`GET /odds/live` body) from disk.
///
/// Undecodable records are dropped the same way as for a live fetch.
pub fn read_snapshots(path: &Path) -> Result<Vec<OddsSnapshot>> {
    let raw = std::fs::read_to_string(path)?;
    let snapshots = OddsSnapshot::decode_batch(&raw)?;
    debug!(path = %path.display(), count = snapshots.len(), "Loaded snapshot batch");
    Ok(snapshots)
}

/// Read a pick set (`GET /picks/today` body) from disk.
pub fn read_picks(path: &Path) -> Result<Vec<Pick>> {
    let picks: Vec<Pick> = read_json(path)?;
    debug!(path = %path.display(), count = picks.len(), "Loaded picks");
    Ok(picks)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
