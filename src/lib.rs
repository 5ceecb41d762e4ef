//! Sports odds comparison board and parlay selection reconciler.
//!
//! Turns an append-only stream of bookmaker price snapshots into per-game
//! comparison tables, and keeps a user's parlay selection free of legs that
//! cannot be combined.
//!
//! # Pipeline
//!
//! ```text
//! snapshots ─► dedup ─► bucketize ─► best price ─► market groups
//! selection ─► conflict detector ─► reconciler ─► build request ─► reconciler
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`odds`]: Snapshot dedup, bucketing and the comparison board
//! - [`parlay`]: Conflict detection and the selection reconciler
//! - [`client`]: Picks service client, mock and analysis driver
//! - [`metrics`]: Metric names and recording helpers

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod odds;
pub mod parlay;

pub use config::Config;
pub use error::{DeskError, Result};
