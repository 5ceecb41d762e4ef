//! Latest-per-key projection over an append-only snapshot batch.

use std::collections::BTreeMap;

use super::bucket::resolve_bucket;
use super::types::{Bucket, Market, OddsSnapshot};

/// Identity of one board cell: a bookmaker's price for one side of one market.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComparisonKey {
    /// Contest identifier.
    pub game_id: i64,
    /// Bookmaker name.
    pub bookmaker: String,
    /// Market.
    pub market: Market,
    /// Resolved side.
    pub bucket: Bucket,
}

impl ComparisonKey {
    /// Build the key for a snapshot, resolving its bucket.
    pub fn of(snapshot: &OddsSnapshot) -> Self {
        Self {
            game_id: snapshot.game_id,
            bookmaker: snapshot.bookmaker.clone(),
            market: snapshot.market,
            bucket: resolve_bucket(snapshot, snapshot.market),
        }
    }

    /// Smallest key for `game_id`. Keys sort by game first, so a range
    /// starting here reaches that game's cells first.
    pub fn game_start(game_id: i64) -> Self {
        Self {
            game_id,
            bookmaker: String::new(),
            market: Market::H2h,
            bucket: Bucket::Home,
        }
    }
}

/// Legacy identity: bookmaker plus the raw side label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BookSideKey {
    /// Bookmaker name.
    pub bookmaker: String,
    /// Side label exactly as reported.
    pub side: String,
}

impl BookSideKey {
    /// Build the key for a snapshot.
    pub fn of(snapshot: &OddsSnapshot) -> Self {
        Self {
            bookmaker: snapshot.bookmaker.clone(),
            side: snapshot.side.clone(),
        }
    }
}

/// Keep the freshest snapshot for every key in one pass.
///
/// Input order is not assumed to follow `snapshot_time`. A later timestamp
/// always replaces an earlier one; on an identical timestamp the snapshot
/// appearing later in `snapshots` wins. Source polls stamp snapshots
/// uniquely, so the tie rule only needs to be deterministic.
pub fn latest_by_key<'a, K, F>(snapshots: &'a [OddsSnapshot], key_fn: F) -> BTreeMap<K, &'a OddsSnapshot>
where
    K: Ord,
    F: Fn(&OddsSnapshot) -> K,
{
    let mut latest: BTreeMap<K, &'a OddsSnapshot> = BTreeMap::new();

    for snapshot in snapshots {
        let key = key_fn(snapshot);
        let replace = latest
            .get(&key)
            .map_or(true, |current| snapshot.snapshot_time >= current.snapshot_time);
        if replace {
            latest.insert(key, snapshot);
        }
    }

    latest
}

/// Latest snapshot per board cell.
pub fn latest_comparison(snapshots: &[OddsSnapshot]) -> BTreeMap<ComparisonKey, &OddsSnapshot> {
    latest_by_key(snapshots, ComparisonKey::of)
}

/// Latest snapshot per bookmaker and raw side label.
pub fn latest_by_book_side(snapshots: &[OddsSnapshot]) -> BTreeMap<BookSideKey, &OddsSnapshot> {
    latest_by_key(snapshots, BookSideKey::of)
}
