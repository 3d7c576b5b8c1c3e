//! Free-space reconciliation.
//!
//! A single linear pass: check free space, and if it falls short, pick
//! finished torrents to remove, delete them, wait, and check again.

mod runner;
mod types;

pub use runner::{check_free_space, SpaceReconciler};
pub use types::{ReconcileError, ReconcileOutcome, ReconcilePhase};
