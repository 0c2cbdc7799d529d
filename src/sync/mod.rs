// Reconciliation engine — the decision core of the bridge.
//
// `tracker` classifies observed posts (new / unchanged / edited),
// `executor` creates multi-part threads with rollback, and `runner` drives
// both on the polling schedules.

pub mod executor;
pub mod runner;
pub mod tracker;

pub use runner::{Bridge, BridgeSettings, Outcome};
