//! Session domain model.
//!
//! Transient in-memory progress records for a routine and its
//! exercises on a given date. These are never the source of truth:
//! they are reconstructed from the progress cache or estimated from a
//! remote log's completion rate.

use crate::progress::ExerciseCheck;
use crate::routine::Routine;
use serde::{Deserialize, Serialize};

/// Per-exercise progress within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExercise {
    pub exercise_id: u64,
    pub exercise_name: String,
    pub is_completed: bool,
}

/// Per-routine progress within a session.
///
/// Invariant: `completion_rate` always equals
/// `100 * completed / total` (0 for an empty exercise list). It is
/// recomputed via [`recompute_completion_rate`](Self::recompute_completion_rate)
/// after every mutation and never edited directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRoutine {
    /// The remote `ExerciseLog` id once this routine has synced,
    /// `None` while it only exists locally.
    pub log_id: Option<u64>,
    pub routine_id: u64,
    pub routine_name: String,
    /// Ordered list, same order as the source routine.
    pub exercises: Vec<SessionExercise>,
    pub completion_rate: f32,
}

impl SessionRoutine {
    /// Creates a freshly started session routine: every exercise
    /// incomplete, no remote log yet.
    pub fn fresh(routine: &Routine) -> Self {
        let exercises = routine
            .exercises
            .iter()
            .map(|e| SessionExercise {
                exercise_id: e.id,
                exercise_name: e.name.clone(),
                is_completed: false,
            })
            .collect();
        Self {
            log_id: None,
            routine_id: routine.id,
            routine_name: routine.name.clone(),
            exercises,
            completion_rate: 0.0,
        }
    }

    /// Recomputes `completion_rate` from the exercise flags.
    pub fn recompute_completion_rate(&mut self) {
        let total = self.exercises.len();
        if total == 0 {
            self.completion_rate = 0.0;
            return;
        }
        let completed = self.exercises.iter().filter(|e| e.is_completed).count();
        self.completion_rate = 100.0 * completed as f32 / total as f32;
    }

    /// Flips the completion flag of the named exercise.
    ///
    /// Returns `false` (and changes nothing) when the exercise is not
    /// part of this routine.
    pub fn toggle_exercise(&mut self, exercise_id: u64) -> bool {
        match self
            .exercises
            .iter_mut()
            .find(|e| e.exercise_id == exercise_id)
        {
            Some(exercise) => {
                exercise.is_completed = !exercise.is_completed;
                self.recompute_completion_rate();
                true
            }
            None => false,
        }
    }

    /// The full per-exercise completion array, in the shape the
    /// progress cache stores.
    pub fn checks(&self) -> Vec<ExerciseCheck> {
        self.exercises
            .iter()
            .map(|e| ExerciseCheck {
                exercise_id: e.exercise_id,
                is_completed: e.is_completed,
            })
            .collect()
    }

    /// Whether every exercise is checked off (and there is at least one).
    pub fn is_fully_completed(&self) -> bool {
        !self.exercises.is_empty() && self.exercises.iter().all(|e| e.is_completed)
    }
}
