//! The exercise-session store: the engine's single mutation surface.
//!
//! `SessionStore` owns the materialized view (selected date, per-date
//! routine progress, the deduplicated past-logs mirror, the day memo)
//! and is the only component that talks to both the remote log
//! service and the durable progress cache.

use chrono::{Local, NaiveDate};
use fitlog_core::error::{FitlogError, Result};
use fitlog_core::log::{ExerciseLog, ExerciseLogPatch, ExerciseLogService, NewExerciseLog};
use fitlog_core::progress::{ProgressCacheRepository, ProgressKey};
use fitlog_core::routine::Routine;
use fitlog_core::session::{SessionRoutine, SessionSignal};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

use super::materialize::materialize_routine;
use super::snapshot::DaySnapshot;

/// Capacity of the advisory signal channel.
const SIGNAL_CHANNEL_CAPACITY: usize = 32;

/// Result of a toggle, for callers that want the derived rate
/// without re-reading state.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The routine is not part of the current date's session.
    NoSuchRoutine,
    /// The flip was applied and synchronized.
    Synced {
        completion_rate: f32,
        routine_completed: bool,
    },
}

/// How many routines an add actually appended vs silently skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddOutcome {
    pub added: usize,
    pub skipped: usize,
}

/// Whether a memo save reached the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoOutcome {
    Saved,
    /// Nothing to attach the memo to; it stays local-only.
    Skipped,
}

/// Result of erasing the selected date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayClearOutcome {
    Cleared { deleted: usize },
    NothingToClear,
}

/// The in-memory materialized view the store mutates.
struct SessionState {
    /// The active calendar date.
    selected_date: NaiveDate,
    /// Per-date routine progress. Within one date, routine ids are
    /// unique.
    sessions: HashMap<NaiveDate, Vec<SessionRoutine>>,
    /// Past-logs mirror: one row per date, the greatest-id row wins.
    past_logs: HashMap<NaiveDate, ExerciseLog>,
    /// Memo for the selected date, derived from the mirror.
    current_day_memo: String,
}

impl SessionState {
    fn memo_for(&self, date: NaiveDate) -> String {
        self.past_logs
            .get(&date)
            .map(|log| log.memo.clone())
            .unwrap_or_default()
    }
}

/// Observable state container for per-date exercise progress.
///
/// `SessionStore` is responsible for:
/// - Mirroring the user's remote logs, deduplicated by date
/// - Materializing per-routine session state for the selected date
/// - Optimistic toggles with snapshot rollback on sync failure
/// - Keeping the durable progress cache current on every toggle
///
/// All operations are `&self` async methods; the state lock is held
/// only in short critical sections and always dropped across remote
/// awaits. Two rapid toggles against the same routine therefore
/// read-modify-write without a transaction spanning their network
/// calls: if the first one fails, its rollback restores the snapshot
/// captured before the first toggle and erases the second one's
/// in-memory change too (the cache keeps both). This lost-update
/// hazard is current behavior, not designed away.
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    logs: Arc<dyn ExerciseLogService>,
    cache: Arc<dyn ProgressCacheRepository>,
    signals: broadcast::Sender<SessionSignal>,
}

impl SessionStore {
    /// Creates a store with the selected date set to today.
    pub fn new(
        logs: Arc<dyn ExerciseLogService>,
        cache: Arc<dyn ProgressCacheRepository>,
    ) -> Self {
        Self::with_selected_date(logs, cache, Local::now().date_naive())
    }

    /// Creates a store with an explicit initial date.
    pub fn with_selected_date(
        logs: Arc<dyn ExerciseLogService>,
        cache: Arc<dyn ProgressCacheRepository>,
        selected_date: NaiveDate,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(SessionState {
                selected_date,
                sessions: HashMap::new(),
                past_logs: HashMap::new(),
                current_day_memo: String::new(),
            })),
            logs,
            cache,
            signals,
        }
    }

    /// Subscribes to the advisory notification channel.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSignal> {
        self.signals.subscribe()
    }

    fn emit(&self, signal: SessionSignal) {
        // Advisory channel; no subscribers is fine.
        let _ = self.signals.send(signal);
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    pub async fn selected_date(&self) -> NaiveDate {
        self.state.read().await.selected_date
    }

    pub async fn current_day_memo(&self) -> String {
        self.state.read().await.current_day_memo.clone()
    }

    /// The routine progress list for the selected date.
    pub async fn current_session(&self) -> Vec<SessionRoutine> {
        let state = self.state.read().await;
        state
            .sessions
            .get(&state.selected_date)
            .cloned()
            .unwrap_or_default()
    }

    /// The mirror row retained for a date, if any.
    pub async fn past_log_for(&self, date: NaiveDate) -> Option<ExerciseLog> {
        self.state.read().await.past_logs.get(&date).cloned()
    }

    // ========================================================================
    // Log mirror loader
    // ========================================================================

    /// Refreshes the past-logs mirror from the remote store.
    ///
    /// Rows whose `user_id` does not match are dropped (trust boundary
    /// against a misbehaving or cached response), then rows are
    /// deduplicated by date keeping the greatest id. The memo for the
    /// selected date is re-derived from the retained row.
    ///
    /// Fail-safe-empty: an empty `user_id` or a fetch failure clears
    /// the mirror and memo rather than leaving stale data. No retries.
    pub async fn fetch_past_logs(&self, user_id: &str) -> Result<()> {
        if user_id.is_empty() {
            let mut state = self.state.write().await;
            state.past_logs.clear();
            state.current_day_memo.clear();
            return Ok(());
        }

        let rows = match self.logs.fetch_for_user(user_id).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("[SessionStore] past-log fetch failed: {e}");
                let mut state = self.state.write().await;
                state.past_logs.clear();
                state.current_day_memo.clear();
                return Err(e);
            }
        };

        let mut mirror: HashMap<NaiveDate, ExerciseLog> = HashMap::new();
        for row in rows.into_iter().filter(|row| row.user_id == user_id) {
            match mirror.get(&row.exercise_date) {
                Some(kept) if kept.id >= row.id => {}
                _ => {
                    mirror.insert(row.exercise_date, row);
                }
            }
        }

        tracing::debug!(
            "[SessionStore] mirror refreshed: {} date(s) retained",
            mirror.len()
        );

        let mut state = self.state.write().await;
        state.past_logs = mirror;
        let memo = state.memo_for(state.selected_date);
        state.current_day_memo = memo;
        Ok(())
    }

    // ========================================================================
    // Date selector
    // ========================================================================

    /// Switches the active date and re-derives the day memo from the
    /// mirror. Purely local; touches neither the network nor the
    /// progress cache.
    pub async fn set_selected_date(&self, date: NaiveDate) {
        let mut state = self.state.write().await;
        state.selected_date = date;
        let memo = state.memo_for(date);
        state.current_day_memo = memo;
    }

    // ========================================================================
    // Session materializer
    // ========================================================================

    /// Starts or reloads the session for the selected date.
    ///
    /// Every routine must be owned by `user_id`; any mismatch aborts
    /// the whole operation before any I/O with no state change.
    /// Per-routine exercise state is rebuilt with the cache-first
    /// three-tier priority, and the date's routine list is replaced
    /// (not merged) with one entry per input routine.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` on any ownership mismatch.
    pub async fn start_or_load_session(
        &self,
        user_id: &str,
        routines: &[Routine],
    ) -> Result<()> {
        if let Some(other) = routines.iter().find(|r| r.owner_id != user_id) {
            return Err(FitlogError::permission_denied(format!(
                "routine {} belongs to another user",
                other.id
            )));
        }

        let (date, day_log) = {
            let state = self.state.read().await;
            (
                state.selected_date,
                state.past_logs.get(&state.selected_date).cloned(),
            )
        };

        let mut materialized = Vec::with_capacity(routines.len());
        for routine in routines {
            let key = ProgressKey::new(user_id, date, routine.id);
            let cached = self.cache.load(&key).await?;
            materialized.push(materialize_routine(routine, cached, day_log.as_ref()));
        }

        tracing::debug!(
            "[SessionStore] session materialized for {date}: {} routine(s)",
            materialized.len()
        );

        let mut state = self.state.write().await;
        state.sessions.insert(date, materialized);
        Ok(())
    }

    // ========================================================================
    // Routine adder
    // ========================================================================

    /// Appends routines not already present in the current date's
    /// session, each starting at zero completion with no log id.
    /// Routines already present are silently skipped.
    pub async fn add_routines_to_session(&self, routines: &[Routine]) -> AddOutcome {
        let mut state = self.state.write().await;
        let date = state.selected_date;
        let session = state.sessions.entry(date).or_default();

        let mut added = 0;
        let mut skipped = 0;
        for routine in routines {
            if session.iter().any(|sr| sr.routine_id == routine.id) {
                skipped += 1;
            } else {
                session.push(SessionRoutine::fresh(routine));
                added += 1;
            }
        }
        drop(state);

        self.emit(SessionSignal::RoutinesAdded { added, skipped });
        AddOutcome { added, skipped }
    }

    // ========================================================================
    // Exercise toggle & synchronizer
    // ========================================================================

    /// Flips one exercise's completion flag and synchronizes.
    ///
    /// The in-memory flip and the durable cache write happen before
    /// the remote call (optimistic mutation). The cache write is
    /// unconditional and never rolled back. On remote failure the
    /// whole date's session is restored to its pre-toggle snapshot,
    /// so the cache may hold a newer state than memory until the
    /// routine is next rematerialized.
    ///
    /// # Errors
    ///
    /// Surfaces the remote failure after rolling back.
    pub async fn toggle_exercise_check(
        &self,
        user_id: &str,
        routine_id: u64,
        exercise_id: u64,
    ) -> Result<ToggleOutcome> {
        // Optimistic mutation under the lock, capturing the snapshot
        // and everything the sync step needs.
        let (snapshot, date, checks, new_rate, log_id) = {
            let mut state = self.state.write().await;
            let date = state.selected_date;
            let snapshot = DaySnapshot::capture(&state.sessions, date);

            let Some(routine) = state
                .sessions
                .get_mut(&date)
                .and_then(|s| s.iter_mut().find(|sr| sr.routine_id == routine_id))
            else {
                return Ok(ToggleOutcome::NoSuchRoutine);
            };
            if !routine.toggle_exercise(exercise_id) {
                return Ok(ToggleOutcome::NoSuchRoutine);
            }

            (
                snapshot,
                date,
                routine.checks(),
                routine.completion_rate,
                routine.log_id,
            )
        };

        // Durable cache write, outside the rollback boundary. A cache
        // failure degrades durability, not the toggle itself.
        let key = ProgressKey::new(user_id, date, routine_id);
        if let Err(e) = self.cache.save(&key, &checks).await {
            tracing::warn!("[SessionStore] progress cache write failed: {e}");
        }

        let sync_result = match log_id {
            Some(id) => {
                self.logs
                    .update(id, &ExerciseLogPatch::completion_rate(new_rate))
                    .await
            }
            None => match self
                .logs
                .create(&NewExerciseLog {
                    user_id: user_id.to_string(),
                    exercise_date: date,
                    completion_rate: new_rate,
                    routine_ids: vec![routine_id],
                    memo: String::new(),
                })
                .await
            {
                Ok(new_id) => {
                    // Adopt the server-assigned id if the routine is
                    // still materialized.
                    let mut state = self.state.write().await;
                    if let Some(routine) = state
                        .sessions
                        .get_mut(&date)
                        .and_then(|s| s.iter_mut().find(|sr| sr.routine_id == routine_id))
                    {
                        routine.log_id = Some(new_id);
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            },
        };

        if let Err(e) = sync_result {
            tracing::warn!("[SessionStore] toggle sync failed, rolling back: {e}");
            let mut state = self.state.write().await;
            snapshot.restore(&mut state.sessions);
            drop(state);
            self.emit(SessionSignal::SyncFailed {
                routine_id,
                message: e.to_string(),
            });
            return Err(e);
        }

        let routine_completed = (new_rate - 100.0).abs() < f32::EPSILON;
        if routine_completed {
            self.emit(SessionSignal::RoutineCompleted { routine_id });
        }

        // The toggle itself succeeded; a failed mirror refresh only
        // costs staleness.
        if let Err(e) = self.fetch_past_logs(user_id).await {
            tracing::warn!("[SessionStore] mirror refresh after toggle failed: {e}");
        }

        Ok(ToggleOutcome::Synced {
            completion_rate: new_rate,
            routine_completed,
        })
    }

    // ========================================================================
    // Memo editor
    // ========================================================================

    /// Pure local memo setter.
    pub async fn update_memo(&self, memo: impl Into<String>) {
        self.state.write().await.current_day_memo = memo.into();
    }

    /// Persists the current memo remotely.
    ///
    /// Patches the selected date's existing log when the mirror has
    /// one; otherwise creates a zero-rate log carrying the session's
    /// routine-id set, but only when the date has at least one
    /// session routine. With neither, the memo is silently skipped
    /// until there is something to attach it to.
    pub async fn save_memo(&self, user_id: &str) -> Result<MemoOutcome> {
        let (date, memo, day_log, routine_ids) = {
            let state = self.state.read().await;
            let routine_ids: Vec<u64> = state
                .sessions
                .get(&state.selected_date)
                .map(|s| s.iter().map(|sr| sr.routine_id).collect())
                .unwrap_or_default();
            (
                state.selected_date,
                state.current_day_memo.clone(),
                state.past_logs.get(&state.selected_date).cloned(),
                routine_ids,
            )
        };

        match day_log {
            Some(log) => {
                self.logs
                    .update(log.id, &ExerciseLogPatch::memo(memo))
                    .await?;
            }
            None if !routine_ids.is_empty() => {
                self.logs
                    .create(&NewExerciseLog {
                        user_id: user_id.to_string(),
                        exercise_date: date,
                        completion_rate: 0.0,
                        routine_ids,
                        memo,
                    })
                    .await?;
            }
            None => {
                tracing::debug!("[SessionStore] memo save skipped: nothing to attach to");
                self.emit(SessionSignal::MemoSkipped);
                return Ok(MemoOutcome::Skipped);
            }
        }

        if let Err(e) = self.fetch_past_logs(user_id).await {
            tracing::warn!("[SessionStore] mirror refresh after memo save failed: {e}");
        }
        self.emit(SessionSignal::MemoSaved);
        Ok(MemoOutcome::Saved)
    }

    // ========================================================================
    // Day eraser
    // ========================================================================

    /// Deletes every remote log for the selected date (one delete per
    /// row), clears the date's session and memo, and drops every
    /// progress-cache key for the day.
    ///
    /// A no-op with an informational signal when there is nothing to
    /// delete.
    pub async fn delete_current_day_logs(&self, user_id: &str) -> Result<DayClearOutcome> {
        let date = self.selected_date().await;

        // The mirror is deduplicated, so a fresh fetch is needed to
        // see every sibling row for the date.
        let rows: Vec<ExerciseLog> = self
            .logs
            .fetch_for_user(user_id)
            .await?
            .into_iter()
            .filter(|row| row.user_id == user_id && row.exercise_date == date)
            .collect();

        let has_session = {
            let state = self.state.read().await;
            state
                .sessions
                .get(&date)
                .is_some_and(|s| !s.is_empty())
        };

        if rows.is_empty() && !has_session {
            self.emit(SessionSignal::NothingToClear);
            return Ok(DayClearOutcome::NothingToClear);
        }

        let mut deleted = 0;
        for row in &rows {
            match self.logs.delete(row.id).await {
                Ok(()) => deleted += 1,
                // Already gone counts as deleted.
                Err(e) if e.is_not_found() => deleted += 1,
                Err(e) => return Err(e),
            }
        }

        {
            let mut state = self.state.write().await;
            state.sessions.insert(date, Vec::new());
            state.current_day_memo.clear();
        }
        if let Err(e) = self.cache.remove_day(user_id, date).await {
            tracing::warn!("[SessionStore] day cache cleanup failed: {e}");
        }

        if let Err(e) = self.fetch_past_logs(user_id).await {
            tracing::warn!("[SessionStore] mirror refresh after day erase failed: {e}");
        }
        self.emit(SessionSignal::DayCleared { deleted });
        Ok(DayClearOutcome::Cleared { deleted })
    }

    // ========================================================================
    // Routine remover
    // ========================================================================

    /// Removes one routine from the current date's session.
    ///
    /// When the routine has synced, its remote log is deleted first;
    /// a not-found response is treated as success (idempotent
    /// delete). Any other remote failure is surfaced and the routine
    /// is left in place. A routine that was never synced is removed
    /// locally only.
    pub async fn delete_routine_from_session(
        &self,
        user_id: &str,
        routine_id: u64,
    ) -> Result<()> {
        let (date, log_id) = {
            let state = self.state.read().await;
            let date = state.selected_date;
            let Some(routine) = state
                .sessions
                .get(&date)
                .and_then(|s| s.iter().find(|sr| sr.routine_id == routine_id))
            else {
                return Ok(());
            };
            (date, routine.log_id)
        };

        if let Some(id) = log_id {
            match self.logs.delete(id).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {
                    tracing::debug!("[SessionStore] log {id} already gone, treating as deleted");
                }
                Err(e) => return Err(e),
            }
        }

        {
            let mut state = self.state.write().await;
            if let Some(session) = state.sessions.get_mut(&date) {
                session.retain(|sr| sr.routine_id != routine_id);
            }
        }
        let key = ProgressKey::new(user_id, date, routine_id);
        if let Err(e) = self.cache.remove(&key).await {
            tracing::warn!("[SessionStore] progress cache cleanup failed: {e}");
        }

        self.emit(SessionSignal::RoutineRemoved { routine_id });
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
