//! Exercise log domain model.
//!
//! `ExerciseLog` is the authoritative, remotely persisted record of a
//! routine's completion on a calendar date. One row is created per
//! routine that begins being tracked on a date, so a single date may
//! legitimately own multiple rows.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// The authoritative remote record of tracked progress for one date.
///
/// The engine only reads and writes these through the four verbs of
/// [`ExerciseLogService`](super::service::ExerciseLogService); the
/// remote service owns the rows and assigns the ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLog {
    /// Server-assigned identifier
    pub id: u64,
    /// Owning user
    pub user_id: String,
    /// Calendar day, no time-of-day component
    pub exercise_date: NaiveDate,
    /// Completion percentage, 0-100
    pub completion_rate: f32,
    /// Routines this row tracks (the engine writes single-element sets)
    pub routine_ids: Vec<u64>,
    /// Free-text memo attached to the date
    #[serde(default)]
    pub memo: String,
    /// Server-side creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ExerciseLog {
    /// Whether this row tracks the given routine.
    pub fn references_routine(&self, routine_id: u64) -> bool {
        self.routine_ids.contains(&routine_id)
    }
}

/// Payload for creating a new exercise log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExerciseLog {
    pub user_id: String,
    pub exercise_date: NaiveDate,
    pub completion_rate: f32,
    pub routine_ids: Vec<u64>,
    #[serde(default)]
    pub memo: String,
}

/// Partial update payload for an existing exercise log.
///
/// Only the fields that are set are serialized, so a patch never
/// clobbers fields the caller did not intend to touch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseLogPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_rate: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl ExerciseLogPatch {
    /// A patch touching only the completion rate.
    pub fn completion_rate(rate: f32) -> Self {
        Self {
            completion_rate: Some(rate),
            ..Default::default()
        }
    }

    /// A patch touching only the memo.
    pub fn memo(memo: impl Into<String>) -> Self {
        Self {
            memo: Some(memo.into()),
            ..Default::default()
        }
    }
}
