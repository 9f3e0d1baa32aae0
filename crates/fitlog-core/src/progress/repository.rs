//! Progress cache repository trait.
//!
//! The durable local store that keeps per-exercise completion flags
//! across process restarts, independently of the remote service, so
//! optimistic edits survive a reload even before their network write
//! lands.

use super::key::ProgressKey;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cached per-exercise completion flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseCheck {
    pub exercise_id: u64,
    pub is_completed: bool,
}

/// Repository for the local durable progress cache.
///
/// # Implementation Notes
///
/// `load` must degrade a corrupt or unreadable entry to `Ok(None)`
/// (the routine is treated as freshly started) instead of
/// propagating a parse error.
#[async_trait]
pub trait ProgressCacheRepository: Send + Sync {
    /// Loads the cached completion array for a key.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(checks))`: A valid entry exists
    /// - `Ok(None)`: No entry, or the entry could not be parsed
    /// - `Err(_)`: Storage access failed outright
    async fn load(&self, key: &ProgressKey) -> Result<Option<Vec<ExerciseCheck>>>;

    /// Writes the full completion array for a key, replacing any
    /// previous entry.
    async fn save(&self, key: &ProgressKey, checks: &[ExerciseCheck]) -> Result<()>;

    /// Removes the entry for a key. Removing a missing entry is not
    /// an error.
    async fn remove(&self, key: &ProgressKey) -> Result<()>;

    /// Removes every routine entry for the given `(user, date)` pair.
    async fn remove_day(&self, user_id: &str, date: NaiveDate) -> Result<()>;
}
