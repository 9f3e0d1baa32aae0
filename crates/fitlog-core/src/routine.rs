//! Routine input models.
//!
//! Routine CRUD is an external collaborator; the engine receives
//! routines as plain values from the caller and only checks ownership.

use serde::{Deserialize, Serialize};

/// A single exercise within a routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: u64,
    pub name: String,
}

/// A workout routine as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub id: u64,
    /// The user that owns this routine; checked against the caller
    /// before any session is materialized from it.
    pub owner_id: String,
    pub name: String,
    /// Ordered list; order matters for rate-based state estimation.
    pub exercises: Vec<Exercise>,
}
