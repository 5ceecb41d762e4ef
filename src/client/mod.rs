//! Backend access for odds, picks and parlay validation.
//!
//! This module handles:
//! - The [`ParlayApi`] seam the reconciler's driver talks through
//! - HTTP client for the picks service
//! - Mock client for testing
//! - Reading offline batches from JSON files
//! - Driving an analysis through its build round trips

use std::future::Future;

use crate::error::ApiError;
use crate::parlay::{BuildResponse, PickId};

pub mod driver;
pub mod file;
pub mod http;
pub mod mock;

pub use driver::run_analysis;
pub use file::{read_picks, read_snapshots};
pub use http::DeskClient;
pub use mock::MockParlayApi;

/// Validates proposed parlays.
pub trait ParlayApi {
    /// Ask the server whether `pick_ids` can be combined.
    fn build_parlay(
        &self,
        pick_ids: &[PickId],
    ) -> impl Future<Output = Result<BuildResponse, ApiError>> + Send;
}
