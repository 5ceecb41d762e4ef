//! Best-price selection and per-market grouping for the comparison board.
//!
//! "Best" is the largest signed American price in a bucket. That treats
//! `+150` as better than `-110` and `-105` as better than `-110`, which is
//! the product's display convention. It is not an ordering by implied
//! probability and callers must not use it as one.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::Serialize;
use tracing::{debug, instrument};

use super::catalog::{list_games, GameSummary, SportFilter};
use super::dedup::{latest_comparison, ComparisonKey};
use super::types::{Bucket, Market, OddsSnapshot, PriceCell};
use crate::metrics;

/// One bookmaker's latest prices for one market, keyed by bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRow {
    /// Bookmaker name.
    pub bookmaker: String,
    /// At most one price per bucket.
    pub prices: BTreeMap<Bucket, PriceCell>,
}

impl BookRow {
    /// Create an empty row for a bookmaker.
    pub fn new(bookmaker: impl Into<String>) -> Self {
        Self {
            bookmaker: bookmaker.into(),
            prices: BTreeMap::new(),
        }
    }

    /// Add a price, returning the row (builder style). Pass `None` for a
    /// cell the book lists without a price.
    pub fn with_price(mut self, bucket: Bucket, odds: impl Into<Option<i32>>) -> Self {
        let odds = odds.into();
        self.prices.insert(bucket, PriceCell { odds, line: None });
        self
    }

    /// Price in a bucket, if the book quotes it.
    pub fn price(&self, bucket: Bucket) -> Option<&PriceCell> {
        self.prices.get(&bucket)
    }

    /// Whether the row quotes either displayed bucket of `market`.
    pub fn quotes(&self, market: Market) -> bool {
        let (first, second) = market.buckets();
        self.prices.contains_key(&first) || self.prices.contains_key(&second)
    }
}

/// Best odds in `bucket` across rows.
///
/// Rows without a price in the bucket, or whose price is absent, are
/// skipped rather than read as zero. [`Bucket::Unknown`] never has a best
/// price.
pub fn best_odds(rows: &[BookRow], bucket: Bucket) -> Option<i32> {
    if !bucket.is_known() {
        return None;
    }

    rows.iter()
        .filter_map(|row| row.price(bucket))
        .filter_map(|cell| cell.odds)
        .max()
}

/// Comparison rows for one market of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketGroup {
    /// Market.
    pub market: Market,
    /// Display label.
    pub label: &'static str,
    /// Rows sorted by bookmaker name ascending.
    pub rows: Vec<BookRow>,
    /// Best price in the first bucket (home or over).
    pub best_first: Option<i32>,
    /// Best price in the second bucket (away or under).
    pub best_second: Option<i32>,
}

impl MarketGroup {
    /// Build a group from rows, computing best prices.
    pub fn new(market: Market, mut rows: Vec<BookRow>) -> Self {
        rows.sort_by(|a, b| a.bookmaker.cmp(&b.bookmaker));
        let (first, second) = market.buckets();
        let best_first = best_odds(&rows, first);
        let best_second = best_odds(&rows, second);

        Self {
            market,
            label: market.label(),
            rows,
            best_first,
            best_second,
        }
    }

    /// Best price for a bucket of this market.
    pub fn best(&self, bucket: Bucket) -> Option<i32> {
        let (first, second) = self.market.buckets();
        if bucket == first {
            self.best_first
        } else if bucket == second {
            self.best_second
        } else {
            None
        }
    }

    /// Whether `row`'s price in `bucket` equals the group's best. Ties all count.
    pub fn is_best(&self, row: &BookRow, bucket: Bucket) -> bool {
        match (self.best(bucket), row.price(bucket)) {
            (Some(best), Some(cell)) => cell.odds == Some(best),
            _ => false,
        }
    }

    /// Highlight flags per row, `(first, second)`, in row order.
    pub fn highlights(&self) -> Vec<(bool, bool)> {
        let (first, second) = self.market.buckets();
        self.rows
            .iter()
            .map(|row| (self.is_best(row, first), self.is_best(row, second)))
            .collect()
    }

    /// Whether any row quotes a displayed bucket.
    pub fn is_displayable(&self) -> bool {
        self.rows.iter().any(|row| row.quotes(self.market))
    }
}

/// Group the latest-per-cell projection of one game into market groups.
///
/// Groups come back in [`Market::ALL`] order. A market whose rows only hold
/// unresolved sides is dropped; within a kept market such rows stay visible.
pub fn groups_for_game(
    latest: &BTreeMap<ComparisonKey, &OddsSnapshot>,
    game_id: i64,
) -> Vec<MarketGroup> {
    let mut by_market: BTreeMap<Market, BTreeMap<&str, BookRow>> = BTreeMap::new();

    let cells = latest
        .range((Bound::Included(ComparisonKey::game_start(game_id)), Bound::Unbounded))
        .take_while(|(key, _)| key.game_id == game_id);

    for (key, snapshot) in cells {
        by_market
            .entry(key.market)
            .or_default()
            .entry(key.bookmaker.as_str())
            .or_insert_with(|| BookRow::new(key.bookmaker.clone()))
            .prices
            .insert(key.bucket, PriceCell::from(*snapshot));
    }

    Market::ALL
        .iter()
        .filter_map(|market| {
            let rows = by_market.remove(market)?;
            let group = MarketGroup::new(*market, rows.into_values().collect());
            if group.is_displayable() {
                Some(group)
            } else {
                debug!(game_id, market = %market, "Skipping market with no resolved sides");
                None
            }
        })
        .collect()
}

/// Deduplicate a batch and build the market groups for one game.
pub fn build_market_groups(snapshots: &[OddsSnapshot], game_id: i64) -> Vec<MarketGroup> {
    let latest = latest_comparison(snapshots);
    groups_for_game(&latest, game_id)
}

/// Board state recomputed from a full snapshot batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardProjection {
    /// Games visible under the board's sport filter.
    pub games: Vec<GameSummary>,
    /// Market groups per game.
    pub markets: BTreeMap<i64, Vec<MarketGroup>>,
}

impl BoardProjection {
    /// Market groups for a game (empty if not on the board).
    pub fn groups(&self, game_id: i64) -> &[MarketGroup] {
        self.markets.get(&game_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the board shows nothing.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// Pull-style comparison board: hand it the latest batch, get a fresh projection.
#[derive(Debug, Clone, Default)]
pub struct OddsBoard {
    filter: SportFilter,
}

impl OddsBoard {
    /// Create a board showing games matching `filter`.
    pub fn new(filter: SportFilter) -> Self {
        Self { filter }
    }

    /// Sport filter in effect.
    pub fn filter(&self) -> &SportFilter {
        &self.filter
    }

    /// Recompute the projection from a whole snapshot batch.
    #[instrument(skip_all, fields(snapshots = snapshots.len()))]
    pub fn refresh(&self, snapshots: &[OddsSnapshot]) -> BoardProjection {
        let _timer = metrics::timer_board_refresh();
        metrics::inc_snapshots_processed(snapshots.len());

        let latest = latest_comparison(snapshots);
        let games = list_games(snapshots, &self.filter);
        let markets = games
            .iter()
            .map(|game| (game.game_id, groups_for_game(&latest, game.game_id)))
            .collect();

        debug!(games = games.len(), cells = latest.len(), "Board refreshed");

        BoardProjection { games, markets }
    }
}
