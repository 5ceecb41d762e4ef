//! Pick, conflict and parlay build types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::odds::Market;

/// Pick identifier as assigned by the picks service.
pub type PickId = i64;

/// A recommended bet the user can add to a parlay. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pick {
    /// Pick identifier.
    pub id: PickId,
    /// Contest identifier; some picks arrive without one.
    #[serde(default)]
    pub game_id: Option<i64>,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Market.
    pub market: Market,
    /// Side label (team name, over/under).
    pub side: String,
    /// Sport key.
    #[serde(default)]
    pub sport_key: Option<String>,
    /// Spread or total line.
    #[serde(default)]
    pub line: Option<Decimal>,
    /// Best available American odds.
    #[serde(default)]
    pub odds_american: Option<i32>,
    /// Expected value in percent, computed upstream.
    #[serde(default)]
    pub ev_pct: Option<Decimal>,
}

impl Pick {
    /// Game identity used for conflict grouping.
    pub fn game_key(&self) -> GameKey {
        match self.game_id {
            Some(id) => GameKey::Id(id),
            None => GameKey::Matchup(
                format!("{} @ {}", self.away_team, self.home_team).to_lowercase(),
            ),
        }
    }

    /// `"Away @ Home"` for display.
    pub fn matchup(&self) -> String {
        format!("{} @ {}", self.away_team, self.home_team)
    }
}

/// Identity of a game: its id when known, else the lowercase matchup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GameKey {
    /// Numeric game id.
    Id(i64),
    /// Lowercase `"away @ home"`.
    Matchup(String),
}

/// Two selected picks that cannot share a parlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Conflict {
    /// Pick kept (earliest in selection order).
    pub keep: PickId,
    /// Pick to drop.
    pub remove: PickId,
}

/// Payload submitted for parlay validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    /// Correlates the eventual response with this request.
    #[serde(skip)]
    pub ticket: u64,
    /// Legs in selection order.
    pub pick_ids: Vec<PickId>,
}

/// Server verdict on a proposed parlay.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildResponse {
    /// Whether the legs can be combined.
    pub is_valid: bool,
    /// Rejection reason; empty when valid.
    #[serde(default)]
    pub reason: String,
    /// Combined expected value in percent.
    #[serde(default)]
    pub combined_ev_pct: Option<Decimal>,
    /// Average pairwise correlation of the legs.
    #[serde(default)]
    pub correlation_score: Option<Decimal>,
    /// Combined American odds.
    #[serde(default)]
    pub combined_odds_american: Option<i32>,
    /// Combined decimal odds.
    #[serde(default)]
    pub combined_odds_decimal: Option<Decimal>,
    /// Suggested Kelly stake fraction.
    #[serde(default)]
    pub suggested_kelly_fraction: Option<Decimal>,
    /// Non-fatal warnings from the compatibility check.
    #[serde(default)]
    pub compatibility_warnings: Vec<String>,
}

impl BuildResponse {
    /// Accepted parlay with the given EV and correlation.
    pub fn valid(combined_ev_pct: Option<Decimal>, correlation_score: Option<Decimal>) -> Self {
        Self {
            is_valid: true,
            combined_ev_pct,
            correlation_score,
            ..Self::default()
        }
    }

    /// Rejected parlay.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason: reason.into(),
            ..Self::default()
        }
    }
}
