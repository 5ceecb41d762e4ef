//! Game listing and sport filtering over a snapshot batch.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::types::OddsSnapshot;

/// Sports with a short display label, in tab order.
pub const SPORT_TABS: [(&str, &str); 4] = [
    ("basketball_nba", "NBA"),
    ("basketball_ncaab", "NCAAB"),
    ("icehockey_nhl", "NHL"),
    ("americanfootball_ncaaf", "NCAAF"),
];

/// Short label for a sport key, falling back to the key itself.
pub fn sport_label(sport_key: &str) -> &str {
    SPORT_TABS
        .iter()
        .find(|(key, _)| *key == sport_key)
        .map(|(_, label)| *label)
        .unwrap_or(sport_key)
}

/// Which sports the board shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SportFilter {
    /// Every sport.
    #[default]
    All,
    /// A single sport key.
    Only(String),
}

impl SportFilter {
    /// Build a filter from an optional sport key; `None` or `"all"` means every sport.
    pub fn from_option(sport: Option<&str>) -> Self {
        match sport {
            None => SportFilter::All,
            Some(key) if key.eq_ignore_ascii_case("all") => SportFilter::All,
            Some(key) => SportFilter::Only(key.to_string()),
        }
    }

    /// Whether a sport key passes the filter.
    pub fn matches(&self, sport_key: &str) -> bool {
        match self {
            SportFilter::All => true,
            SportFilter::Only(key) => key == sport_key,
        }
    }
}

/// One game appearing in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    /// Contest identifier.
    pub game_id: i64,
    /// Home team name.
    pub home_team: String,
    /// Away team name.
    pub away_team: String,
    /// Sport key.
    pub sport_key: String,
}

impl GameSummary {
    /// `"Away @ Home"`, or `"Game <id>"` when either name is blank.
    pub fn label(&self) -> String {
        let away = self.away_team.trim();
        let home = self.home_team.trim();
        if away.is_empty() || home.is_empty() {
            format!("Game {}", self.game_id)
        } else {
            format!("{} @ {}", away, home)
        }
    }
}

/// Unique games in first-seen order, restricted to `filter`.
pub fn list_games(snapshots: &[OddsSnapshot], filter: &SportFilter) -> Vec<GameSummary> {
    let mut seen = HashSet::new();

    snapshots
        .iter()
        .filter(|snapshot| seen.insert(snapshot.game_id))
        .filter(|snapshot| filter.matches(&snapshot.sport_key))
        .map(|snapshot| GameSummary {
            game_id: snapshot.game_id,
            home_team: snapshot.home_team.clone(),
            away_team: snapshot.away_team.clone(),
            sport_key: snapshot.sport_key.clone(),
        })
        .collect()
}

/// Snapshot count per sport key. Sports with no snapshots get no tab.
pub fn sport_counts(snapshots: &[OddsSnapshot]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for snapshot in snapshots {
        *counts.entry(snapshot.sport_key.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::fixtures::snapshot;
    use crate::odds::Market;

    #[test]
    fn games_are_unique_in_first_seen_order() {
        let batch = vec![
            snapshot(9, "fanduel", Market::H2h, "home", -110, 1),
            snapshot(7, "fanduel", Market::H2h, "home", -110, 1),
            snapshot(9, "draftkings", Market::H2h, "home", -115, 2),
        ];

        let ids: Vec<_> = list_games(&batch, &SportFilter::All)
            .iter()
            .map(|g| g.game_id)
            .collect();

        assert_eq!(ids, vec![9, 7]);
    }

    #[test]
    fn sport_filter_restricts_games() {
        let mut hockey = snapshot(12, "fanduel", Market::H2h, "home", -140, 1);
        hockey.sport_key = "icehockey_nhl".to_string();
        let batch = vec![snapshot(7, "fanduel", Market::H2h, "home", -110, 1), hockey];

        let games = list_games(&batch, &SportFilter::from_option(Some("icehockey_nhl")));

        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game_id, 12);
        assert_eq!(SportFilter::from_option(Some("ALL")), SportFilter::All);
    }

    #[test]
    fn label_falls_back_to_game_id() {
        let mut game = GameSummary {
            game_id: 55,
            home_team: "Boston Celtics".to_string(),
            away_team: " New York Knicks ".to_string(),
            sport_key: "basketball_nba".to_string(),
        };
        assert_eq!(game.label(), "New York Knicks @ Boston Celtics");

        game.home_team = "  ".to_string();
        assert_eq!(game.label(), "Game 55");
    }

    #[test]
    fn counts_snapshots_per_sport() {
        let mut hockey = snapshot(12, "fanduel", Market::H2h, "home", -140, 1);
        hockey.sport_key = "icehockey_nhl".to_string();
        let batch = vec![
            snapshot(7, "fanduel", Market::H2h, "home", -110, 1),
            snapshot(7, "fanduel", Market::H2h, "away", -110, 1),
            hockey,
        ];

        let counts = sport_counts(&batch);

        assert_eq!(counts["basketball_nba"], 2);
        assert_eq!(counts["icehockey_nhl"], 1);
        assert!(!counts.contains_key("basketball_ncaab"));
    }

    #[test]
    fn sport_labels() {
        assert_eq!(sport_label("basketball_nba"), "NBA");
        assert_eq!(sport_label("soccer_epl"), "soccer_epl");
    }
}
