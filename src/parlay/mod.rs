//! Parlay builder module.
//!
//! This module handles:
//! - Pick and build request/response types
//! - Same-game, same-market conflict detection
//! - Selection ownership and server round-trip reconciliation

pub mod conflict;
pub mod reconciler;
pub mod types;

pub use conflict::{detect_conflicts, is_conflict_reason, ConflictKey, CONFLICT_REASONS};
pub use reconciler::{ReconcilerState, SelectionReconciler, Step, MIN_PARLAY_LEGS};
pub use types::{BuildRequest, BuildResponse, Conflict, GameKey, Pick, PickId};
