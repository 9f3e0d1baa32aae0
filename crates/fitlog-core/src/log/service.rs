//! Remote log service trait.
//!
//! Defines the four verbs the engine consumes from the remote log
//! store. The store itself is an external collaborator; this trait
//! decouples the engine from its transport (HTTP client, test mock).

use super::model::{ExerciseLog, ExerciseLogPatch, NewExerciseLog};
use crate::error::Result;
use async_trait::async_trait;

/// An abstract client for the authoritative exercise-log store.
///
/// # Implementation Notes
///
/// `delete` must surface a missing record as
/// [`FitlogError::NotFound`](crate::FitlogError::NotFound) rather
/// than folding it into a generic failure; callers rely on that
/// distinction for idempotent-delete semantics.
#[async_trait]
pub trait ExerciseLogService: Send + Sync {
    /// Fetches every log row belonging to the given user.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<ExerciseLog>)`: All rows for the user (possibly empty)
    /// - `Err(_)`: Transport or remote failure
    async fn fetch_for_user(&self, user_id: &str) -> Result<Vec<ExerciseLog>>;

    /// Creates a new log row.
    ///
    /// # Returns
    ///
    /// - `Ok(id)`: The server-assigned identifier for the new row
    /// - `Err(_)`: Transport or remote failure
    async fn create(&self, log: &NewExerciseLog) -> Result<u64>;

    /// Partially updates an existing log row.
    async fn update(&self, id: u64, patch: &ExerciseLogPatch) -> Result<()>;

    /// Deletes a log row by id.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Row deleted
    /// - `Err(NotFound)`: Row was already gone
    /// - `Err(_)`: Any other failure
    async fn delete(&self, id: u64) -> Result<()>;
}
