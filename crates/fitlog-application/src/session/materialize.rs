//! Exercise-state reconstruction for session materialization.
//!
//! When a session is (re)loaded for a date, each routine's exercise
//! state is rebuilt with a three-tier priority: the durable progress
//! cache verbatim, else an estimate from the remote log's completion
//! rate, else everything incomplete.

use fitlog_core::log::ExerciseLog;
use fitlog_core::progress::ExerciseCheck;
use fitlog_core::routine::Routine;
use fitlog_core::session::{SessionExercise, SessionRoutine};

/// Number of leading exercises (by list order) considered complete
/// for a scalar completion rate.
///
/// 100 marks everything, 0 nothing, a fractional rate the first
/// `floor(rate/100 * count)` exercises. This is a lossy,
/// order-dependent heuristic: the exact original per-exercise state
/// is not recoverable from a scalar rate.
pub(crate) fn estimated_completed_count(rate: f32, exercise_count: usize) -> usize {
    if exercise_count == 0 {
        return 0;
    }
    let completed = (rate / 100.0 * exercise_count as f32).floor() as usize;
    completed.min(exercise_count)
}

/// Rebuilds one routine's session state from the available sources.
///
/// `cached` wins over the log-rate estimate; the log (when it
/// references this routine) contributes the `log_id` either way.
pub(crate) fn materialize_routine(
    routine: &Routine,
    cached: Option<Vec<ExerciseCheck>>,
    day_log: Option<&ExerciseLog>,
) -> SessionRoutine {
    let matched_log = day_log.filter(|log| log.references_routine(routine.id));

    let exercises = match cached {
        // Tier 1: the durable cache is authoritative for local continuity.
        Some(checks) => from_cached_checks(routine, checks),
        None => match matched_log {
            // Tier 2: estimate from the remote completion rate.
            Some(log) => from_rate_estimate(routine, log.completion_rate),
            // Tier 3: fresh tracking.
            None => fresh_exercises(routine),
        },
    };

    let mut session_routine = SessionRoutine {
        log_id: matched_log.map(|log| log.id),
        routine_id: routine.id,
        routine_name: routine.name.clone(),
        exercises,
        completion_rate: 0.0,
    };
    session_routine.recompute_completion_rate();
    session_routine
}

fn fresh_exercises(routine: &Routine) -> Vec<SessionExercise> {
    routine
        .exercises
        .iter()
        .map(|e| SessionExercise {
            exercise_id: e.id,
            exercise_name: e.name.clone(),
            is_completed: false,
        })
        .collect()
}

/// Reproduces the cached completion array verbatim, in cache order.
/// Names are resolved against the routine; an exercise the routine no
/// longer knows keeps an empty name rather than being dropped.
fn from_cached_checks(routine: &Routine, checks: Vec<ExerciseCheck>) -> Vec<SessionExercise> {
    checks
        .into_iter()
        .map(|check| {
            let name = routine
                .exercises
                .iter()
                .find(|e| e.id == check.exercise_id)
                .map(|e| e.name.clone())
                .unwrap_or_default();
            SessionExercise {
                exercise_id: check.exercise_id,
                exercise_name: name,
                is_completed: check.is_completed,
            }
        })
        .collect()
}

fn from_rate_estimate(routine: &Routine, rate: f32) -> Vec<SessionExercise> {
    let completed = estimated_completed_count(rate, routine.exercises.len());
    routine
        .exercises
        .iter()
        .enumerate()
        .map(|(index, e)| SessionExercise {
            exercise_id: e.id,
            exercise_name: e.name.clone(),
            is_completed: index < completed,
        })
        .collect()
}
