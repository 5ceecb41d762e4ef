//! Same-game, same-market conflict detection.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, instrument};

use super::types::{Conflict, GameKey, Pick, PickId};
use crate::odds::Market;

/// Server rejection reasons that a local conflict pass may be able to resolve.
pub const CONFLICT_REASONS: [&str; 4] = [
    "same_game_opposing_sides_same_market",
    "same_game_same_market",
    "opposing_sides_same_market",
    "same_game_conflict",
];

/// Whether a server rejection reason names a known conflict.
pub fn is_conflict_reason(reason: &str) -> bool {
    CONFLICT_REASONS.iter().any(|known| reason.contains(known))
}

/// Composite identity two legs of a parlay may not share.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConflictKey {
    /// Game identity.
    pub game: GameKey,
    /// Market.
    pub market: Market,
}

impl ConflictKey {
    /// Key for a pick.
    pub fn of(pick: &Pick) -> Self {
        Self {
            game: pick.game_key(),
            market: pick.market,
        }
    }
}

/// Find picks sharing a game and market with an earlier pick.
///
/// Single left-to-right pass: the first pick for each key is kept and every
/// later one is reported against it. Sides are deliberately ignored, two legs
/// on the same game and market never combine whether they oppose or repeat.
#[instrument(skip_all)]
pub fn detect_conflicts<'a, I>(picks: I) -> Vec<Conflict>
where
    I: IntoIterator<Item = &'a Pick>,
{
    let mut keep_by_key: HashMap<ConflictKey, PickId> = HashMap::new();
    let mut conflicts = Vec::new();

    for pick in picks {
        match keep_by_key.entry(ConflictKey::of(pick)) {
            Entry::Occupied(kept) => conflicts.push(Conflict {
                keep: *kept.get(),
                remove: pick.id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(pick.id);
            }
        }
    }

    if !conflicts.is_empty() {
        debug!(conflicts = conflicts.len(), "Conflicting legs detected");
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parlay::fixtures::pick;
    use pretty_assertions::assert_eq;

    #[test]
    fn flags_second_pick_in_same_game_and_market() {
        let picks = vec![
            pick(1, Some(7), Market::H2h, "Boston Celtics"),
            pick(2, Some(7), Market::H2h, "New York Knicks"),
            pick(3, Some(7), Market::Spreads, "Boston Celtics"),
        ];

        assert_eq!(detect_conflicts(&picks), vec![Conflict { keep: 1, remove: 2 }]);
    }

    #[test]
    fn duplicate_sides_also_conflict() {
        let picks = vec![
            pick(1, Some(7), Market::Totals, "Over"),
            pick(2, Some(7), Market::Totals, "Over"),
        ];

        assert_eq!(detect_conflicts(&picks), vec![Conflict { keep: 1, remove: 2 }]);
    }

    #[test]
    fn first_in_selection_order_is_kept() {
        let picks = vec![
            pick(9, Some(7), Market::H2h, "Boston Celtics"),
            pick(4, Some(7), Market::H2h, "New York Knicks"),
            pick(5, Some(7), Market::H2h, "Boston Celtics"),
        ];

        assert_eq!(
            detect_conflicts(&picks),
            vec![Conflict { keep: 9, remove: 4 }, Conflict { keep: 9, remove: 5 }]
        );
    }

    #[test]
    fn matchup_fallback_groups_picks_without_game_id() {
        let mut shouty = pick(2, None, Market::H2h, "New York Knicks");
        shouty.home_team = "BOSTON CELTICS".to_string();
        let picks = vec![pick(1, None, Market::H2h, "Boston Celtics"), shouty];

        assert_eq!(detect_conflicts(&picks), vec![Conflict { keep: 1, remove: 2 }]);
    }

    #[test]
    fn id_and_matchup_keys_do_not_mix() {
        let picks = vec![
            pick(1, Some(7), Market::H2h, "Boston Celtics"),
            pick(2, None, Market::H2h, "New York Knicks"),
        ];

        assert!(detect_conflicts(&picks).is_empty());
    }

    #[test]
    fn cleaned_selection_has_no_residual_conflicts() {
        let picks = vec![
            pick(1, Some(7), Market::H2h, "Boston Celtics"),
            pick(2, Some(7), Market::H2h, "New York Knicks"),
            pick(3, Some(8), Market::Totals, "Over"),
            pick(4, Some(8), Market::Totals, "Under"),
        ];

        let removed: Vec<_> = detect_conflicts(&picks).iter().map(|c| c.remove).collect();
        let cleaned: Vec<_> = picks
            .into_iter()
            .filter(|p| !removed.contains(&p.id))
            .collect();

        assert_eq!(cleaned.len(), 2);
        assert!(detect_conflicts(&cleaned).is_empty());
    }

    #[test]
    fn empty_selection_has_no_conflicts() {
        assert!(detect_conflicts(&[]).is_empty());
    }

    #[test]
    fn reason_vocabulary_matches_substrings() {
        assert!(is_conflict_reason("same_game_same_market"));
        assert!(is_conflict_reason("leg 3: same_game_opposing_sides_same_market"));
        assert!(!is_conflict_reason("pick_not_found"));
        assert!(!is_conflict_reason("correlation_above_ceiling:0.72"));
    }
}
