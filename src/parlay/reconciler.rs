//! Selection owner for the interactive parlay builder.
//!
//! The reconciler is the only writer of the selection and the warning. It is
//! a small state machine: local conflict removal, one build request at a
//! time (ticketed so late responses can be recognized and dropped), and at
//! most one server-driven re-detection per analysis.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, instrument, warn};

use super::conflict::{detect_conflicts, is_conflict_reason};
use super::types::{BuildRequest, BuildResponse, Conflict, Pick, PickId};
use crate::error::SelectionError;
use crate::metrics;

/// Smallest selection worth submitting after conflict removal.
pub const MIN_PARLAY_LEGS: usize = 2;

/// Where the current analysis stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerState {
    /// No pending conflict or request.
    Clean,
    /// Conflicts were removed locally; nothing in flight.
    LocallyConflicted,
    /// A build request is in flight.
    AwaitingValidation {
        /// Ticket of the in-flight request.
        ticket: u64,
        /// Legs submitted.
        pick_ids: Vec<PickId>,
        /// Whether the server-driven re-detection was already spent.
        server_retry_used: bool,
    },
    /// Server reported a conflict the local pass could not resolve.
    ServerConflicted {
        /// Reason exactly as returned.
        reason: String,
    },
    /// Server rejected for a reason outside the conflict vocabulary, or the
    /// request failed.
    Rejected {
        /// Reason exactly as returned.
        reason: String,
    },
}

/// What the caller should do after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Send this request and report back with its ticket.
    Submit(BuildRequest),
    /// Nothing further to do.
    Settled,
    /// The response belonged to a superseded request and was ignored.
    Stale,
}

/// Owns the user's pick selection and resolves conflicts within it.
#[derive(Debug, Clone)]
pub struct SelectionReconciler {
    picks_by_id: HashMap<PickId, Pick>,
    selection: Vec<PickId>,
    warning: Option<String>,
    state: ReconcilerState,
    next_ticket: u64,
    last_conflicts: Vec<Conflict>,
    last_build: Option<BuildResponse>,
}

impl Default for SelectionReconciler {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl SelectionReconciler {
    /// Create a reconciler over a pick set.
    pub fn new(picks: Vec<Pick>) -> Self {
        Self {
            picks_by_id: picks.into_iter().map(|pick| (pick.id, pick)).collect(),
            selection: Vec::new(),
            warning: None,
            state: ReconcilerState::Clean,
            next_ticket: 0,
            last_conflicts: Vec::new(),
            last_build: None,
        }
    }

    /// Replace the pick set with a fresh fetch.
    ///
    /// The selection and any in-flight request are kept: a response arriving
    /// afterwards is checked against the refreshed picks.
    pub fn set_picks(&mut self, picks: Vec<Pick>) {
        self.picks_by_id = picks.into_iter().map(|pick| (pick.id, pick)).collect();
        debug!(picks = self.picks_by_id.len(), "Pick set refreshed");
    }

    /// Add a pick to the end of the selection.
    pub fn select(&mut self, id: PickId) -> Result<(), SelectionError> {
        if !self.picks_by_id.contains_key(&id) {
            return Err(SelectionError::UnknownPick(id));
        }
        if !self.selection.contains(&id) {
            self.selection.push(id);
            self.supersede();
        }
        Ok(())
    }

    /// Remove a pick from the selection. Returns whether it was selected.
    pub fn deselect(&mut self, id: PickId) -> bool {
        let before = self.selection.len();
        self.selection.retain(|selected| *selected != id);
        let removed = self.selection.len() != before;
        if removed {
            self.supersede();
        }
        removed
    }

    /// Drop the whole selection and any warning.
    pub fn clear(&mut self) {
        self.selection.clear();
        self.warning = None;
        self.last_conflicts.clear();
        self.supersede();
    }

    /// Selected pick ids in selection order.
    pub fn selection(&self) -> &[PickId] {
        &self.selection
    }

    /// Current user-facing warning.
    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    /// Current state.
    pub fn state(&self) -> &ReconcilerState {
        &self.state
    }

    /// Every conflict removed by the most recent removal pass.
    pub fn last_conflicts(&self) -> &[Conflict] {
        &self.last_conflicts
    }

    /// Most recent server verdict for the current analysis.
    pub fn last_build(&self) -> Option<&BuildResponse> {
        self.last_build.as_ref()
    }

    /// Look up a pick in the current pick set.
    pub fn pick(&self, id: PickId) -> Option<&Pick> {
        self.picks_by_id.get(&id)
    }

    /// Selected picks in selection order; ids missing from the pick set are skipped.
    pub fn selected_picks(&self) -> Vec<&Pick> {
        self.selection
            .iter()
            .filter_map(|id| self.picks_by_id.get(id))
            .collect()
    }

    /// Start an analysis of the current selection.
    ///
    /// Conflicting legs are removed first; otherwise the selection is
    /// submitted as-is and the server enforces leg-count rules.
    #[instrument(skip(self), fields(selection = ?self.selection))]
    pub fn analyze(&mut self) -> Step {
        self.warning = None;
        self.last_build = None;
        self.last_conflicts.clear();

        let conflicts = detect_conflicts(self.selected_picks());
        if conflicts.is_empty() {
            return self.submit(false);
        }

        self.remove_conflicts(conflicts, false)
    }

    /// Apply the server's verdict for `ticket`.
    #[instrument(skip(self, response), fields(is_valid = response.is_valid, reason = %response.reason))]
    pub fn on_build_response(&mut self, ticket: u64, response: BuildResponse) -> Step {
        let Some(server_retry_used) = self.in_flight(ticket) else {
            return self.stale(ticket);
        };

        if response.is_valid {
            info!(legs = self.selection.len(), "Parlay validated");
            self.state = ReconcilerState::Clean;
            self.last_build = Some(response);
            return Step::Settled;
        }

        metrics::inc_server_rejections();
        let reason = response.reason.clone();
        self.last_build = Some(response);

        if !is_conflict_reason(&reason) {
            warn!(reason = %reason, "Parlay rejected");
            return self.reject(reason);
        }

        self.state = ReconcilerState::ServerConflicted {
            reason: reason.clone(),
        };

        if server_retry_used {
            warn!(reason = %reason, "Server still reports a conflict after re-detection");
            self.warning = Some(reason);
            return Step::Settled;
        }

        let conflicts = detect_conflicts(self.selected_picks());
        if conflicts.is_empty() {
            warn!(reason = %reason, "Server conflict not reproducible locally");
            self.warning = Some(reason);
            return Step::Settled;
        }

        self.remove_conflicts(conflicts, true)
    }

    /// Record a transport failure for `ticket`.
    pub fn on_build_failure(&mut self, ticket: u64, message: impl Into<String>) -> Step {
        if self.in_flight(ticket).is_none() {
            return self.stale(ticket);
        }

        let message = message.into();
        warn!(error = %message, "Parlay build request failed");
        self.reject(message)
    }

    fn remove_conflicts(&mut self, conflicts: Vec<Conflict>, server_retry_used: bool) -> Step {
        let removed: HashSet<PickId> = conflicts.iter().map(|c| c.remove).collect();
        self.selection.retain(|id| !removed.contains(id));
        metrics::inc_conflicts_removed(removed.len());

        if let Some(first) = conflicts.first().and_then(|c| self.picks_by_id.get(&c.remove)) {
            self.warning = Some(format!(
                "Removed conflicting pick: {} (can't parlay two sides of the same game and market)",
                first.side
            ));
        }

        info!(
            removed = removed.len(),
            remaining = self.selection.len(),
            "Removed conflicting legs"
        );

        self.last_conflicts = conflicts;
        self.state = ReconcilerState::LocallyConflicted;

        if self.selection.len() >= MIN_PARLAY_LEGS {
            self.submit(server_retry_used)
        } else {
            debug!("Too few legs left to build");
            Step::Settled
        }
    }

    fn submit(&mut self, server_retry_used: bool) -> Step {
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        let pick_ids = self.selection.clone();

        self.state = ReconcilerState::AwaitingValidation {
            ticket,
            pick_ids: pick_ids.clone(),
            server_retry_used,
        };
        metrics::inc_builds_submitted();
        debug!(ticket, legs = pick_ids.len(), "Submitting parlay for validation");

        Step::Submit(BuildRequest { ticket, pick_ids })
    }

    fn reject(&mut self, reason: String) -> Step {
        self.warning = Some(reason.clone());
        self.state = ReconcilerState::Rejected { reason };
        Step::Settled
    }

    fn stale(&self, ticket: u64) -> Step {
        debug!(ticket, "Ignoring response for superseded request");
        metrics::inc_stale_responses();
        Step::Stale
    }

    /// Retry flag of the in-flight request if `ticket` is still current.
    fn in_flight(&self, ticket: u64) -> Option<bool> {
        match &self.state {
            ReconcilerState::AwaitingValidation {
                ticket: current,
                pick_ids,
                server_retry_used,
            } if *current == ticket && *pick_ids == self.selection => Some(*server_retry_used),
            _ => None,
        }
    }

    fn supersede(&mut self) {
        if matches!(self.state, ReconcilerState::AwaitingValidation { .. }) {
            debug!("Selection changed; in-flight request superseded");
        }
        self.state = ReconcilerState::Clean;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odds::Market;
    use crate::parlay::fixtures::pick;
    use pretty_assertions::assert_eq;

    fn reconciler_with(picks: Vec<Pick>, selection: &[PickId]) -> SelectionReconciler {
        let mut reconciler = SelectionReconciler::new(picks);
        for id in selection {
            reconciler.select(*id).unwrap();
        }
        reconciler
    }

    fn submitted(step: Step) -> BuildRequest {
        match step {
            Step::Submit(request) => request,
            other => panic!("expected a submission, got {:?}", other),
        }
    }

    #[test]
    fn conflicting_pair_shrinks_below_minimum_without_request() {
        let mut reconciler = reconciler_with(
            vec![
                pick(101, Some(55), Market::H2h, "Boston Celtics"),
                pick(102, Some(55), Market::H2h, "New York Knicks"),
            ],
            &[101, 102],
        );

        let step = reconciler.analyze();

        assert_eq!(step, Step::Settled);
        assert_eq!(reconciler.selection(), &[101]);
        assert!(reconciler.warning().unwrap().contains("New York Knicks"));
        assert_eq!(reconciler.state(), &ReconcilerState::LocallyConflicted);
        assert_eq!(reconciler.last_conflicts(), &[Conflict { keep: 101, remove: 102 }]);
    }

    #[test]
    fn local_removal_submits_remaining_legs() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, Some(7), Market::H2h, "Boston Celtics"),
                pick(2, Some(7), Market::H2h, "New York Knicks"),
                pick(3, Some(8), Market::Totals, "Over"),
                pick(4, Some(8), Market::Totals, "Under"),
                pick(5, Some(9), Market::Spreads, "Denver Nuggets"),
            ],
            &[1, 2, 3, 4, 5],
        );

        let request = submitted(reconciler.analyze());

        assert_eq!(request.pick_ids, vec![1, 3, 5]);
        assert_eq!(reconciler.last_conflicts().len(), 2);
        assert!(reconciler.warning().unwrap().contains("New York Knicks"));
        assert!(!reconciler.warning().unwrap().contains("Under"));
    }

    #[test]
    fn clean_selection_is_submitted_as_is() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, Some(7), Market::H2h, "Boston Celtics"),
                pick(2, Some(7), Market::Totals, "Over"),
            ],
            &[1, 2],
        );

        let request = submitted(reconciler.analyze());
        assert_eq!(request.pick_ids, vec![1, 2]);

        let step = reconciler.on_build_response(request.ticket, BuildResponse::valid(None, None));

        assert_eq!(step, Step::Settled);
        assert_eq!(reconciler.state(), &ReconcilerState::Clean);
        assert_eq!(reconciler.warning(), None);
        assert!(reconciler.last_build().unwrap().is_valid);
    }

    #[test]
    fn single_leg_is_still_submitted_when_clean() {
        let mut reconciler =
            reconciler_with(vec![pick(1, Some(7), Market::H2h, "Boston Celtics")], &[1]);

        let request = submitted(reconciler.analyze());
        assert_eq!(request.pick_ids, vec![1]);

        reconciler.on_build_response(
            request.ticket,
            BuildResponse::rejected("at_least_two_picks_required"),
        );
        assert_eq!(
            reconciler.state(),
            &ReconcilerState::Rejected {
                reason: "at_least_two_picks_required".to_string()
            }
        );
    }

    #[test]
    fn server_conflict_with_stale_picks_is_resolved_on_second_pass() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, None, Market::H2h, "Boston Celtics"),
                pick(2, Some(55), Market::H2h, "New York Knicks"),
                pick(3, Some(60), Market::Totals, "Over"),
            ],
            &[1, 2, 3],
        );
        let request = submitted(reconciler.analyze());
        assert_eq!(request.pick_ids, vec![1, 2, 3]);

        reconciler.set_picks(vec![
            pick(1, Some(55), Market::H2h, "Boston Celtics"),
            pick(2, Some(55), Market::H2h, "New York Knicks"),
            pick(3, Some(60), Market::Totals, "Over"),
        ]);
        let retry = submitted(reconciler.on_build_response(
            request.ticket,
            BuildResponse::rejected("same_game_same_market"),
        ));

        assert_eq!(retry.pick_ids, vec![1, 3]);
        assert_ne!(retry.ticket, request.ticket);
        assert!(reconciler.warning().unwrap().contains("New York Knicks"));
        assert_eq!(
            reconciler.state(),
            &ReconcilerState::AwaitingValidation {
                ticket: retry.ticket,
                pick_ids: vec![1, 3],
                server_retry_used: true,
            }
        );

        let step = reconciler.on_build_response(
            retry.ticket,
            BuildResponse::rejected("same_game_opposing_sides_same_market"),
        );
        assert_eq!(step, Step::Settled);
        assert_eq!(
            reconciler.warning(),
            Some("same_game_opposing_sides_same_market")
        );
        assert!(matches!(
            reconciler.state(),
            ReconcilerState::ServerConflicted { .. }
        ));
    }

    #[test]
    fn unreproducible_server_conflict_is_surfaced_verbatim() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, Some(7), Market::H2h, "Boston Celtics"),
                pick(2, Some(8), Market::H2h, "Denver Nuggets"),
            ],
            &[1, 2],
        );
        let request = submitted(reconciler.analyze());

        let step =
            reconciler.on_build_response(request.ticket, BuildResponse::rejected("same_game_conflict"));

        assert_eq!(step, Step::Settled);
        assert_eq!(reconciler.selection(), &[1, 2]);
        assert_eq!(reconciler.warning(), Some("same_game_conflict"));
        assert_eq!(
            reconciler.state(),
            &ReconcilerState::ServerConflicted {
                reason: "same_game_conflict".to_string()
            }
        );
    }

    #[test]
    fn unknown_reason_is_rejected_without_retry() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, Some(7), Market::H2h, "Boston Celtics"),
                pick(2, Some(8), Market::H2h, "Denver Nuggets"),
            ],
            &[1, 2],
        );
        let request = submitted(reconciler.analyze());

        let step = reconciler
            .on_build_response(request.ticket, BuildResponse::rejected("correlation_above_ceiling:0.81"));

        assert_eq!(step, Step::Settled);
        assert_eq!(reconciler.warning(), Some("correlation_above_ceiling:0.81"));
        assert!(matches!(reconciler.state(), ReconcilerState::Rejected { .. }));
    }

    #[test]
    fn response_after_selection_change_is_stale() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, Some(7), Market::H2h, "Boston Celtics"),
                pick(2, Some(8), Market::H2h, "Denver Nuggets"),
                pick(3, Some(9), Market::H2h, "Miami Heat"),
            ],
            &[1, 2],
        );
        let request = submitted(reconciler.analyze());

        reconciler.select(3).unwrap();
        let step = reconciler.on_build_response(request.ticket, BuildResponse::rejected("pick_not_found"));

        assert_eq!(step, Step::Stale);
        assert_eq!(reconciler.state(), &ReconcilerState::Clean);
        assert_eq!(reconciler.warning(), None);
    }

    #[test]
    fn newer_analysis_supersedes_older_ticket() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, Some(7), Market::H2h, "Boston Celtics"),
                pick(2, Some(8), Market::H2h, "Denver Nuggets"),
            ],
            &[1, 2],
        );
        let first = submitted(reconciler.analyze());
        let second = submitted(reconciler.analyze());

        assert_eq!(
            reconciler.on_build_response(first.ticket, BuildResponse::valid(None, None)),
            Step::Stale
        );
        assert_eq!(
            reconciler.on_build_response(second.ticket, BuildResponse::valid(None, None)),
            Step::Settled
        );
    }

    #[test]
    fn transport_failure_is_surfaced() {
        let mut reconciler = reconciler_with(
            vec![
                pick(1, Some(7), Market::H2h, "Boston Celtics"),
                pick(2, Some(8), Market::H2h, "Denver Nuggets"),
            ],
            &[1, 2],
        );
        let request = submitted(reconciler.analyze());

        reconciler.on_build_failure(request.ticket, "connection refused");

        assert_eq!(reconciler.warning(), Some("connection refused"));
        assert_eq!(
            reconciler.on_build_failure(request.ticket, "late duplicate"),
            Step::Stale
        );
    }

    #[test]
    fn select_rejects_unknown_ids_and_ignores_duplicates() {
        let mut reconciler =
            reconciler_with(vec![pick(1, Some(7), Market::H2h, "Boston Celtics")], &[1]);

        assert_eq!(reconciler.select(99), Err(SelectionError::UnknownPick(99)));
        reconciler.select(1).unwrap();
        assert_eq!(reconciler.selection(), &[1]);
        assert!(reconciler.deselect(1));
        assert!(!reconciler.deselect(1));
    }

    #[test]
    fn empty_selection_has_no_conflicts() {
        let mut reconciler = SelectionReconciler::default();
        let request = submitted(reconciler.analyze());
        assert!(request.pick_ids.is_empty());
        assert!(reconciler.last_conflicts().is_empty());
    }
}
