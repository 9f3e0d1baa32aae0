//! Session store and its supporting pieces.
//!
//! This module contains the engine itself ([`store::SessionStore`]),
//! the snapshot/restore protocol backing optimistic toggles, and the
//! three-tier exercise-state reconstruction used when a session is
//! materialized.

mod materialize;
mod snapshot;
pub mod store;

pub use store::{AddOutcome, DayClearOutcome, MemoOutcome, SessionStore, ToggleOutcome};
