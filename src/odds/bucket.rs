//! Side normalization: maps a bookmaker's side label to a [`Bucket`].
//!
//! Books report sides inconsistently (team name, `home`/`away`, mixed case,
//! stray whitespace). This is the single place that normalization happens so
//! grouping code downstream never special-cases a bookmaker.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use tracing::warn;

use super::types::{Bucket, Market, OddsSnapshot};

/// Known alternate spellings of team names, keyed by normalized label.
static TEAM_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("la clippers", "los angeles clippers"),
        ("los angeles clippers", "los angeles clippers"),
        ("la lakers", "los angeles lakers"),
        ("los angeles lakers", "los angeles lakers"),
    ])
});

/// Trim, collapse internal whitespace and lowercase a label.
pub fn normalize_label(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalize a team name and resolve it through the alias table.
pub fn canonical_team(name: &str) -> String {
    let normalized = normalize_label(name);
    match TEAM_ALIASES.get(normalized.as_str()) {
        Some(alias) => (*alias).to_string(),
        None => normalized,
    }
}

/// Resolve the bucket a snapshot belongs to within `market`.
///
/// Total over all inputs: anything that cannot be matched is
/// [`Bucket::Unknown`]. Team markets never yield over/under and totals never
/// yield home/away.
pub fn resolve_bucket(snapshot: &OddsSnapshot, market: Market) -> Bucket {
    if market.is_team_market() {
        resolve_team_bucket(snapshot)
    } else {
        resolve_total_bucket(&snapshot.side)
    }
}

fn resolve_team_bucket(snapshot: &OddsSnapshot) -> Bucket {
    if let Some(canonical) = snapshot.canonical_side.as_deref() {
        match normalize_label(canonical).as_str() {
            "home" => return Bucket::Home,
            "away" => return Bucket::Away,
            _ => {}
        }
    }

    let side = normalize_label(&snapshot.side);
    match side.as_str() {
        "" => return Bucket::Unknown,
        "home" => return Bucket::Home,
        "away" => return Bucket::Away,
        _ => {}
    }

    if side == normalize_label(&snapshot.home_team) {
        return Bucket::Home;
    }
    if side == normalize_label(&snapshot.away_team) {
        return Bucket::Away;
    }

    let side = canonical_team(&snapshot.side);
    let home = canonical_team(&snapshot.home_team);
    let away = canonical_team(&snapshot.away_team);
    if !home.is_empty() && side == home {
        return Bucket::Home;
    }
    if !away.is_empty() && side == away {
        return Bucket::Away;
    }

    warn!(
        game_id = snapshot.game_id,
        bookmaker = %snapshot.bookmaker,
        side = %snapshot.side,
        "Could not resolve snapshot side"
    );
    Bucket::Unknown
}

fn resolve_total_bucket(side: &str) -> Bucket {
    match normalize_label(side).as_str() {
        "over" => Bucket::Over,
        "under" => Bucket::Under,
        _ => Bucket::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::fixtures::snapshot;

    #[test]
    fn normalize_label_collapses_whitespace() {
        assert_eq!(normalize_label("  Boston   Celtics "), "boston celtics");
        assert_eq!(normalize_label(""), "");
    }

    #[test]
    fn canonical_side_takes_priority() {
        let mut snap = snapshot(1, "fanduel", Market::H2h, "Something Else", -110, 0);
        snap.canonical_side = Some("Away".to_string());

        assert_eq!(resolve_bucket(&snap, Market::H2h), Bucket::Away);
    }

    #[test]
    fn unusable_canonical_side_falls_back_to_label() {
        let mut snap = snapshot(1, "fanduel", Market::H2h, "Boston Celtics", -110, 0);
        snap.canonical_side = Some("over".to_string());

        assert_eq!(resolve_bucket(&snap, Market::H2h), Bucket::Home);
    }

    #[test]
    fn team_names_match_case_insensitively() {
        let home = snapshot(1, "fanduel", Market::Spreads, "boston celtics", -110, 0);
        let away = snapshot(1, "fanduel", Market::Spreads, "NEW YORK KNICKS", -110, 0);
        let literal = snapshot(1, "fanduel", Market::Spreads, " Home ", -110, 0);

        assert_eq!(resolve_bucket(&home, Market::Spreads), Bucket::Home);
        assert_eq!(resolve_bucket(&away, Market::Spreads), Bucket::Away);
        assert_eq!(resolve_bucket(&literal, Market::Spreads), Bucket::Home);
    }

    #[test]
    fn team_aliases_resolve() {
        let mut snap = snapshot(1, "fanduel", Market::H2h, "LA Clippers", 120, 0);
        snap.home_team = "Los Angeles Clippers".to_string();

        assert_eq!(resolve_bucket(&snap, Market::H2h), Bucket::Home);
    }

    #[test]
    fn totals_only_yield_over_under() {
        let over = snapshot(1, "fanduel", Market::Totals, "Over", -105, 0);
        let team = snapshot(1, "fanduel", Market::Totals, "Boston Celtics", -105, 0);
        let home = snapshot(1, "fanduel", Market::Totals, "home", -105, 0);

        assert_eq!(resolve_bucket(&over, Market::Totals), Bucket::Over);
        assert_eq!(resolve_bucket(&team, Market::Totals), Bucket::Unknown);
        assert_eq!(resolve_bucket(&home, Market::Totals), Bucket::Unknown);
    }

    #[test]
    fn team_markets_never_yield_over_under() {
        let over = snapshot(1, "fanduel", Market::H2h, "over", 100, 0);
        let blank = snapshot(1, "fanduel", Market::H2h, "   ", 100, 0);

        assert_eq!(resolve_bucket(&over, Market::H2h), Bucket::Unknown);
        assert_eq!(resolve_bucket(&blank, Market::H2h), Bucket::Unknown);
    }

    #[test]
    fn empty_team_names_do_not_match_empty_sides() {
        let mut snap = snapshot(1, "fanduel", Market::H2h, "Draw", 300, 0);
        snap.home_team.clear();
        snap.away_team.clear();

        assert_eq!(resolve_bucket(&snap, Market::H2h), Bucket::Unknown);
    }
}
