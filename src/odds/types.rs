//! Odds snapshot types for the comparison board.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use time::OffsetDateTime;
use tracing::warn;

use crate::metrics;

/// Bet type offered by a bookmaker.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Market {
    /// Moneyline.
    H2h,
    /// Point spread.
    Spreads,
    /// Game total.
    Totals,
}

impl Market {
    /// All markets in board display order.
    pub const ALL: [Market; 3] = [Market::H2h, Market::Spreads, Market::Totals];

    /// Whether sides in this market are teams rather than over/under.
    pub fn is_team_market(&self) -> bool {
        matches!(self, Market::H2h | Market::Spreads)
    }

    /// Column heading shown for this market.
    pub fn label(&self) -> &'static str {
        match self {
            Market::H2h => "Moneyline",
            Market::Spreads => "Spread",
            Market::Totals => "Total",
        }
    }

    /// The two buckets shown for this market, first column first.
    pub fn buckets(&self) -> (Bucket, Bucket) {
        if self.is_team_market() {
            (Bucket::Home, Bucket::Away)
        } else {
            (Bucket::Over, Bucket::Under)
        }
    }
}

/// Normalized side of a market.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Bucket {
    /// Home team.
    Home,
    /// Away team.
    Away,
    /// Total goes over the line.
    Over,
    /// Total stays under the line.
    Under,
    /// Side label could not be resolved.
    Unknown,
}

impl Bucket {
    /// Whether the side was resolved.
    pub fn is_known(&self) -> bool {
        !matches!(self, Bucket::Unknown)
    }
}

/// One timestamped price observation from one bookmaker.
///
/// Snapshots are append-only; every board view is a projection over the
/// full batch and never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsSnapshot {
    /// Contest identifier.
    pub game_id: i64,
    /// Home team name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub home_team: String,
    /// Away team name.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub away_team: String,
    /// Sport key (e.g. `basketball_nba`).
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sport_key: String,
    /// Bookmaker name.
    pub bookmaker: String,
    /// Market of this price.
    pub market: Market,
    /// Side label as reported by the bookmaker.
    pub side: String,
    /// Upstream-normalized side (`home`/`away`) when available.
    #[serde(default)]
    pub canonical_side: Option<String>,
    /// American odds; `None` when the book posted no price.
    #[serde(default)]
    pub odds: Option<i32>,
    /// Spread or total line.
    #[serde(default)]
    pub line: Option<Decimal>,
    /// When the price was observed.
    #[serde(with = "snapshot_time")]
    pub snapshot_time: OffsetDateTime,
}

/// A single price shown in a board cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCell {
    /// American odds; absent values never win best price.
    pub odds: Option<i32>,
    /// Spread or total line.
    pub line: Option<Decimal>,
}

impl From<&OddsSnapshot> for PriceCell {
    fn from(snapshot: &OddsSnapshot) -> Self {
        Self {
            odds: snapshot.odds,
            line: snapshot.line,
        }
    }
}

impl OddsSnapshot {
    /// Decode a batch record by record.
    ///
    /// Records that fail to decode (an unsupported market, a malformed
    /// timestamp) are dropped with a warning so the rest of the batch still
    /// reaches the board. Only a body that is not a JSON array is an error.
    pub fn decode_batch(body: &str) -> serde_json::Result<Vec<OddsSnapshot>> {
        let records: Vec<Value> = serde_json::from_str(body)?;
        let total = records.len();

        let snapshots: Vec<OddsSnapshot> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(index, error = %e, "Dropping undecodable odds snapshot");
                    None
                }
            })
            .collect();

        metrics::inc_snapshots_rejected(total - snapshots.len());
        Ok(snapshots)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// RFC 3339 on the way out; RFC 3339 or naive ISO-8601 (read as UTC) on the way in.
pub(crate) mod snapshot_time {
    use serde::{de, ser, Deserialize, Deserializer, Serializer};
    use time::format_description::well_known::{Iso8601, Rfc3339};
    use time::{OffsetDateTime, PrimitiveDateTime};

    pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = value.format(&Rfc3339).map_err(ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub fn parse(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
        OffsetDateTime::parse(raw, &Rfc3339).or_else(|_| {
            PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc)
        })
    }
}
