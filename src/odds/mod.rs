//! Odds comparison module.
//!
//! This module handles:
//! - Snapshot types and wire format
//! - Latest-per-key deduplication of the snapshot stream
//! - Side normalization into buckets
//! - Best-price selection and per-market grouping
//! - Game catalog and line-movement series

pub mod board;
pub mod bucket;
pub mod catalog;
pub mod dedup;
pub mod movement;
pub mod types;

pub use board::{best_odds, build_market_groups, BoardProjection, BookRow, MarketGroup, OddsBoard};
pub use bucket::{normalize_label, resolve_bucket};
pub use catalog::{list_games, sport_counts, sport_label, GameSummary, SportFilter};
pub use dedup::{latest_by_book_side, latest_by_key, latest_comparison, BookSideKey, ComparisonKey};
pub use movement::{line_movement, MovementPoint, MovementSeries};
pub use types::{Bucket, Market, OddsSnapshot, PriceCell};

#[cfg(test)]
pub(crate) mod fixtures {
    use time::macros::datetime;
    use time::Duration;

    use super::{Market, OddsSnapshot};

    /// NBA snapshot for Knicks @ Celtics, `minute` minutes after a fixed base time.
    pub fn snapshot(
        game_id: i64,
        bookmaker: &str,
        market: Market,
        side: &str,
        odds: i32,
        minute: i64,
    ) -> OddsSnapshot {
        OddsSnapshot {
            game_id,
            home_team: "Boston Celtics".to_string(),
            away_team: "New York Knicks".to_string(),
            sport_key: "basketball_nba".to_string(),
            bookmaker: bookmaker.to_string(),
            market,
            side: side.to_string(),
            canonical_side: None,
            odds: Some(odds),
            line: None,
            snapshot_time: datetime!(2025-01-10 18:00 UTC) + Duration::minutes(minute),
        }
    }
}
