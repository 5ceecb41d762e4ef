//! Price history per bookmaker for line-movement charts.
//!
//! Unlike the board this reads the raw history rather than the latest
//! projection.

use serde::Serialize;
use time::OffsetDateTime;

use super::bucket::resolve_bucket;
use super::types::{Bucket, Market, OddsSnapshot};

/// Maximum number of bookmakers charted per game.
pub const MAX_CHARTED_BOOKS: usize = 5;

/// One observed price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementPoint {
    /// When the price was observed.
    #[serde(with = "super::types::snapshot_time")]
    pub time: OffsetDateTime,
    /// Market.
    pub market: Market,
    /// Resolved side.
    pub bucket: Bucket,
    /// American odds.
    pub odds: i32,
}

/// Time-ordered prices from one bookmaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementSeries {
    /// Bookmaker name.
    pub bookmaker: String,
    /// Points in ascending time order.
    pub points: Vec<MovementPoint>,
}

/// Price series for a game, one per bookmaker in first-seen order, capped
/// at [`MAX_CHARTED_BOOKS`]. Snapshots without a price add no point.
pub fn line_movement(snapshots: &[OddsSnapshot], game_id: i64) -> Vec<MovementSeries> {
    let mut series: Vec<MovementSeries> = Vec::new();

    for snapshot in snapshots.iter().filter(|s| s.game_id == game_id) {
        let Some(odds) = snapshot.odds else {
            continue;
        };

        let index = match series.iter().position(|s| s.bookmaker == snapshot.bookmaker) {
            Some(index) => index,
            None if series.len() < MAX_CHARTED_BOOKS => {
                series.push(MovementSeries {
                    bookmaker: snapshot.bookmaker.clone(),
                    points: Vec::new(),
                });
                series.len() - 1
            }
            None => continue,
        };

        series[index].points.push(MovementPoint {
            time: snapshot.snapshot_time,
            market: snapshot.market,
            bucket: resolve_bucket(snapshot, snapshot.market),
            odds,
        });
    }

    for entry in &mut series {
        // Stable, so equal timestamps keep batch order.
        entry.points.sort_by_key(|point| point.time);
    }

    series
}
