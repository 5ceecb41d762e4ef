//! Runs one analysis of the selection through its build round trips.

use tracing::{info, instrument};

use super::ParlayApi;
use crate::parlay::{ReconcilerState, SelectionReconciler, Step};

/// Analyze the current selection, submitting build requests until the
/// reconciler settles.
///
/// Requests go out one at a time and each response is applied before the
/// next request is issued. The reconciler allows one server-driven retry, so
/// this makes at most two requests per call.
#[instrument(skip_all, fields(selection = ?reconciler.selection()))]
pub async fn run_analysis<'r, A: ParlayApi>(
    reconciler: &'r mut SelectionReconciler,
    api: &A,
) -> &'r ReconcilerState {
    let mut step = reconciler.analyze();

    while let Step::Submit(request) = step {
        step = match api.build_parlay(&request.pick_ids).await {
            Ok(response) => reconciler.on_build_response(request.ticket, response),
            Err(e) => reconciler.on_build_failure(request.ticket, e.to_string()),
        };
    }

    info!(
        state = ?reconciler.state(),
        legs = reconciler.selection().len(),
        "Analysis settled"
    );

    reconciler.state()
}
