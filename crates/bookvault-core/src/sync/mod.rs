//! Vault reconciliation: cursor state and the catch-up job

mod cursor;
mod reconcile;

pub use cursor::{CursorStore, SyncState};
pub use reconcile::{ReconcileJob, SyncReport};
