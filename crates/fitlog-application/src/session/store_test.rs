use crate::session::store::{
    AddOutcome, DayClearOutcome, MemoOutcome, SessionStore, ToggleOutcome,
};
use chrono::{NaiveDate, Utc};
use fitlog_core::error::{FitlogError, Result};
use fitlog_core::log::{ExerciseLog, ExerciseLogPatch, ExerciseLogService, NewExerciseLog};
use fitlog_core::progress::{ExerciseCheck, ProgressCacheRepository, ProgressKey};
use fitlog_core::routine::{Exercise, Routine};
use fitlog_core::session::SessionSignal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// Mock remote log service with failure injection
struct MockLogService {
    rows: Mutex<Vec<ExerciseLog>>,
    next_id: Mutex<u64>,
    creates: Mutex<usize>,
    fail_fetch: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockLogService {
    fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            next_id: Mutex::new(100),
            creates: Mutex::new(0),
            fail_fetch: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn seed(&self, row: ExerciseLog) {
        self.rows.lock().unwrap().push(row);
    }

    fn rows(&self) -> Vec<ExerciseLog> {
        self.rows.lock().unwrap().clone()
    }

    fn create_count(&self) -> usize {
        *self.creates.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl ExerciseLogService for MockLogService {
    async fn fetch_for_user(&self, _user_id: &str) -> Result<Vec<ExerciseLog>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(FitlogError::transport("fetch refused"));
        }
        // Deliberately unfiltered: the store's trust boundary must
        // drop rows for other users itself.
        Ok(self.rows())
    }

    async fn create(&self, log: &NewExerciseLog) -> Result<u64> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FitlogError::transport("create refused"));
        }
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        *self.creates.lock().unwrap() += 1;
        self.rows.lock().unwrap().push(ExerciseLog {
            id,
            user_id: log.user_id.clone(),
            exercise_date: log.exercise_date,
            completion_rate: log.completion_rate,
            routine_ids: log.routine_ids.clone(),
            memo: log.memo.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn update(&self, id: u64, patch: &ExerciseLogPatch) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FitlogError::transport("update refused"));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| FitlogError::not_found("ExerciseLog", id))?;
        if let Some(rate) = patch.completion_rate {
            row.completion_rate = rate;
        }
        if let Some(memo) = &patch.memo {
            row.memo = memo.clone();
        }
        Ok(())
    }

    async fn delete(&self, id: u64) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(FitlogError::transport("delete refused"));
        }
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        if rows.len() == before {
            return Err(FitlogError::not_found("ExerciseLog", id));
        }
        Ok(())
    }
}

// Mock progress cache keyed by the encoded token
struct MockProgressCache {
    entries: Mutex<HashMap<String, Vec<ExerciseCheck>>>,
}

impl MockProgressCache {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn seed(&self, key: &ProgressKey, checks: Vec<ExerciseCheck>) {
        self.entries.lock().unwrap().insert(key.encode(), checks);
    }

    fn get(&self, key: &ProgressKey) -> Option<Vec<ExerciseCheck>> {
        self.entries.lock().unwrap().get(&key.encode()).cloned()
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ProgressCacheRepository for MockProgressCache {
    async fn load(&self, key: &ProgressKey) -> Result<Option<Vec<ExerciseCheck>>> {
        Ok(self.get(key))
    }

    async fn save(&self, key: &ProgressKey, checks: &[ExerciseCheck]) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.encode(), checks.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &ProgressKey) -> Result<()> {
        self.entries.lock().unwrap().remove(&key.encode());
        Ok(())
    }

    async fn remove_day(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        let prefix = ProgressKey::day_prefix(user_id, date);
        self.entries
            .lock()
            .unwrap()
            .retain(|token, _| !token.starts_with(&prefix));
        Ok(())
    }
}

const USER: &str = "user-1";

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn routine(id: u64, exercise_ids: &[u64]) -> Routine {
    Routine {
        id,
        owner_id: USER.to_string(),
        name: format!("Routine {id}"),
        exercises: exercise_ids
            .iter()
            .map(|&eid| Exercise {
                id: eid,
                name: format!("Exercise {eid}"),
            })
            .collect(),
    }
}

fn log_row(id: u64, user_id: &str, log_date: NaiveDate, rate: f32, routine_ids: Vec<u64>) -> ExerciseLog {
    ExerciseLog {
        id,
        user_id: user_id.to_string(),
        exercise_date: log_date,
        completion_rate: rate,
        routine_ids,
        memo: String::new(),
        created_at: Utc::now(),
    }
}

fn store() -> (Arc<MockLogService>, Arc<MockProgressCache>, SessionStore) {
    let logs = Arc::new(MockLogService::new());
    let cache = Arc::new(MockProgressCache::new());
    let store = SessionStore::with_selected_date(logs.clone(), cache.clone(), date());
    (logs, cache, store)
}

async fn assert_rate_invariant(store: &SessionStore) {
    for sr in store.current_session().await {
        let total = sr.exercises.len();
        let expected = if total == 0 {
            0.0
        } else {
            100.0 * sr.exercises.iter().filter(|e| e.is_completed).count() as f32 / total as f32
        };
        assert!(
            (sr.completion_rate - expected).abs() < 1e-4,
            "routine {} rate {} != derived {}",
            sr.routine_id,
            sr.completion_rate,
            expected
        );
    }
}

#[tokio::test]
async fn test_dedup_keeps_greatest_id_per_date() {
    let (logs, _cache, store) = store();
    logs.seed(log_row(5, USER, date(), 50.0, vec![1]));
    logs.seed(log_row(9, USER, date(), 100.0, vec![2]));

    store.fetch_past_logs(USER).await.unwrap();

    let retained = store.past_log_for(date()).await.unwrap();
    assert_eq!(retained.id, 9);
}

#[tokio::test]
async fn test_fetch_drops_foreign_rows() {
    let (logs, _cache, store) = store();
    logs.seed(log_row(1, "someone-else", date(), 100.0, vec![1]));

    store.fetch_past_logs(USER).await.unwrap();

    assert!(store.past_log_for(date()).await.is_none());
}

#[tokio::test]
async fn test_fetch_failure_clears_mirror_and_memo() {
    let (logs, _cache, store) = store();
    let mut row = log_row(1, USER, date(), 0.0, vec![1]);
    row.memo = "keep hydrated".to_string();
    logs.seed(row);
    store.fetch_past_logs(USER).await.unwrap();
    assert_eq!(store.current_day_memo().await, "keep hydrated");

    logs.fail_fetch.store(true, Ordering::SeqCst);
    assert!(store.fetch_past_logs(USER).await.is_err());

    assert!(store.past_log_for(date()).await.is_none());
    assert_eq!(store.current_day_memo().await, "");
}

#[tokio::test]
async fn test_empty_user_clears_mirror() {
    let (logs, _cache, store) = store();
    logs.seed(log_row(1, USER, date(), 0.0, vec![1]));
    store.fetch_past_logs(USER).await.unwrap();

    store.fetch_past_logs("").await.unwrap();
    assert!(store.past_log_for(date()).await.is_none());
}

#[tokio::test]
async fn test_set_selected_date_rederives_memo() {
    let (logs, _cache, store) = store();
    let other = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    let mut row = log_row(3, USER, other, 0.0, vec![1]);
    row.memo = "deload week".to_string();
    logs.seed(row);
    store.fetch_past_logs(USER).await.unwrap();
    assert_eq!(store.current_day_memo().await, "");

    store.set_selected_date(other).await;
    assert_eq!(store.selected_date().await, other);
    assert_eq!(store.current_day_memo().await, "deload week");
}

#[tokio::test]
async fn test_ownership_gate_fails_closed() {
    let (_logs, _cache, store) = store();
    store
        .add_routines_to_session(&[routine(1, &[10])])
        .await;
    let before = store.current_session().await;

    let mut foreign = routine(2, &[20]);
    foreign.owner_id = "someone-else".to_string();
    let err = store
        .start_or_load_session(USER, &[routine(1, &[10]), foreign])
        .await
        .unwrap_err();

    assert!(err.is_permission_denied());
    assert_eq!(store.current_session().await, before);
}

#[tokio::test]
async fn test_reconstruction_cache_wins_over_rate_estimate() {
    let (logs, cache, store) = store();
    logs.seed(log_row(42, USER, date(), 100.0, vec![7]));
    cache.seed(
        &ProgressKey::new(USER, date(), 7),
        vec![
            ExerciseCheck {
                exercise_id: 1,
                is_completed: true,
            },
            ExerciseCheck {
                exercise_id: 2,
                is_completed: false,
            },
        ],
    );
    store.fetch_past_logs(USER).await.unwrap();

    store
        .start_or_load_session(USER, &[routine(7, &[1, 2])])
        .await
        .unwrap();

    let session = store.current_session().await;
    assert_eq!(session.len(), 1);
    assert!(session[0].exercises[0].is_completed);
    assert!(!session[0].exercises[1].is_completed);
    assert_eq!(session[0].log_id, Some(42));
    assert_rate_invariant(&store).await;
}

#[tokio::test]
async fn test_start_or_load_replaces_session() {
    let (_logs, _cache, store) = store();
    store
        .start_or_load_session(USER, &[routine(1, &[10]), routine(2, &[20])])
        .await
        .unwrap();
    store
        .start_or_load_session(USER, &[routine(3, &[30])])
        .await
        .unwrap();

    let session = store.current_session().await;
    assert_eq!(session.len(), 1);
    assert_eq!(session[0].routine_id, 3);
}

#[tokio::test]
async fn test_idempotent_add() {
    let (_logs, _cache, store) = store();
    let routines = [routine(1, &[10]), routine(2, &[20])];

    let first = store.add_routines_to_session(&routines).await;
    assert_eq!(first, AddOutcome { added: 2, skipped: 0 });
    let before = store.current_session().await;

    let second = store.add_routines_to_session(&routines).await;
    assert_eq!(second, AddOutcome { added: 0, skipped: 2 });
    assert_eq!(store.current_session().await, before);
}

#[tokio::test]
async fn test_toggle_unknown_routine_is_noop() {
    let (_logs, _cache, store) = store();
    let outcome = store.toggle_exercise_check(USER, 99, 1).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::NoSuchRoutine);
}

#[tokio::test]
async fn test_toggle_rollback_on_sync_failure() {
    let (logs, cache, store) = store();
    store.add_routines_to_session(&[routine(7, &[1, 2])]).await;

    logs.fail_writes.store(true, Ordering::SeqCst);
    let err = store.toggle_exercise_check(USER, 7, 1).await.unwrap_err();
    assert!(!err.is_not_found());

    // In-memory state is back at the pre-toggle snapshot.
    let session = store.current_session().await;
    assert_eq!(session[0].completion_rate, 0.0);
    assert!(!session[0].exercises[0].is_completed);

    // The durable cache keeps the flipped (now orphaned) value.
    let cached = cache.get(&ProgressKey::new(USER, date(), 7)).unwrap();
    assert!(cached[0].is_completed);
    assert!(!cached[1].is_completed);
    assert_rate_invariant(&store).await;
}

#[tokio::test]
async fn test_end_to_end_create_then_patch() {
    let (logs, _cache, store) = store();
    store.add_routines_to_session(&[routine(7, &[1, 2])]).await;

    // First toggle creates a log at 50%.
    let outcome = store.toggle_exercise_check(USER, 7, 1).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Synced {
            completion_rate: 50.0,
            routine_completed: false,
        }
    );
    assert_eq!(logs.create_count(), 1);
    let created = &logs.rows()[0];
    assert_eq!(created.completion_rate, 50.0);
    assert_eq!(created.routine_ids, vec![7]);

    let log_id = store.current_session().await[0].log_id;
    assert_eq!(log_id, Some(created.id));

    // Second toggle (uncheck) patches the same log, no second create.
    let outcome = store.toggle_exercise_check(USER, 7, 1).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Synced {
            completion_rate: 0.0,
            routine_completed: false,
        }
    );
    assert_eq!(logs.create_count(), 1);
    assert_eq!(logs.rows()[0].completion_rate, 0.0);
    assert_eq!(store.current_session().await[0].log_id, log_id);
    assert_rate_invariant(&store).await;
}

#[tokio::test]
async fn test_full_completion_emits_signal() {
    let (_logs, _cache, store) = store();
    let mut signals = store.subscribe();
    store.add_routines_to_session(&[routine(7, &[1])]).await;

    let outcome = store.toggle_exercise_check(USER, 7, 1).await.unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome::Synced {
            completion_rate: 100.0,
            routine_completed: true,
        }
    );

    // RoutinesAdded arrives first, then the completion signal.
    loop {
        match signals.try_recv().unwrap() {
            SessionSignal::RoutineCompleted { routine_id } => {
                assert_eq!(routine_id, 7);
                break;
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn test_memo_patches_existing_log() {
    let (logs, _cache, store) = store();
    logs.seed(log_row(42, USER, date(), 50.0, vec![7]));
    store.fetch_past_logs(USER).await.unwrap();

    store.update_memo("new grip felt better").await;
    let outcome = store.save_memo(USER).await.unwrap();

    assert_eq!(outcome, MemoOutcome::Saved);
    assert_eq!(logs.rows()[0].memo, "new grip felt better");
    assert_eq!(logs.create_count(), 0);
}

#[tokio::test]
async fn test_memo_creates_log_when_session_exists() {
    let (logs, _cache, store) = store();
    store
        .add_routines_to_session(&[routine(7, &[1]), routine(8, &[2])])
        .await;

    store.update_memo("first session").await;
    let outcome = store.save_memo(USER).await.unwrap();

    assert_eq!(outcome, MemoOutcome::Saved);
    assert_eq!(logs.create_count(), 1);
    let created = &logs.rows()[0];
    assert_eq!(created.completion_rate, 0.0);
    assert_eq!(created.memo, "first session");
    assert_eq!(created.routine_ids, vec![7, 8]);
}

#[tokio::test]
async fn test_memo_skipped_with_nothing_to_attach_to() {
    let (logs, _cache, store) = store();
    store.update_memo("orphan memo").await;

    let outcome = store.save_memo(USER).await.unwrap();

    assert_eq!(outcome, MemoOutcome::Skipped);
    assert!(logs.rows().is_empty());
}

#[tokio::test]
async fn test_day_clear_deletes_every_sibling_row() {
    let (logs, cache, store) = store();
    // Two sibling rows on the same date, one on another date.
    logs.seed(log_row(5, USER, date(), 50.0, vec![1]));
    logs.seed(log_row(9, USER, date(), 100.0, vec![2]));
    let other = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    logs.seed(log_row(11, USER, other, 0.0, vec![1]));

    store
        .start_or_load_session(USER, &[routine(1, &[10]), routine(2, &[20])])
        .await
        .unwrap();
    cache.seed(
        &ProgressKey::new(USER, date(), 1),
        vec![ExerciseCheck {
            exercise_id: 10,
            is_completed: true,
        }],
    );
    assert!(cache.len() > 0);

    let outcome = store.delete_current_day_logs(USER).await.unwrap();

    assert_eq!(outcome, DayClearOutcome::Cleared { deleted: 2 });
    assert!(store.current_session().await.is_empty());
    assert_eq!(store.current_day_memo().await, "");
    assert_eq!(cache.len(), 0);
    // The other date's row survives.
    assert_eq!(logs.rows().len(), 1);
    assert_eq!(logs.rows()[0].id, 11);
}

#[tokio::test]
async fn test_day_clear_noop_when_nothing_to_delete() {
    let (_logs, _cache, store) = store();
    let outcome = store.delete_current_day_logs(USER).await.unwrap();
    assert_eq!(outcome, DayClearOutcome::NothingToClear);
}

#[tokio::test]
async fn test_delete_routine_not_found_is_success() {
    let (logs, _cache, store) = store();
    logs.seed(log_row(42, USER, date(), 50.0, vec![7]));
    store.fetch_past_logs(USER).await.unwrap();
    store
        .start_or_load_session(USER, &[routine(7, &[1, 2])])
        .await
        .unwrap();
    assert_eq!(store.current_session().await[0].log_id, Some(42));

    // The remote row vanishes behind the engine's back.
    logs.rows.lock().unwrap().clear();

    store.delete_routine_from_session(USER, 7).await.unwrap();
    assert!(store.current_session().await.is_empty());
}

#[tokio::test]
async fn test_delete_routine_other_failure_leaves_routine_in_place() {
    let (logs, _cache, store) = store();
    logs.seed(log_row(42, USER, date(), 50.0, vec![7]));
    store.fetch_past_logs(USER).await.unwrap();
    store
        .start_or_load_session(USER, &[routine(7, &[1, 2])])
        .await
        .unwrap();

    logs.fail_writes.store(true, Ordering::SeqCst);
    assert!(store.delete_routine_from_session(USER, 7).await.is_err());
    assert_eq!(store.current_session().await.len(), 1);
}

#[tokio::test]
async fn test_delete_local_only_routine_makes_no_remote_call() {
    let (logs, cache, store) = store();
    store.add_routines_to_session(&[routine(7, &[1])]).await;
    cache.seed(
        &ProgressKey::new(USER, date(), 7),
        vec![ExerciseCheck {
            exercise_id: 1,
            is_completed: true,
        }],
    );

    // Remote writes would fail, but a never-synced routine needs none.
    logs.fail_writes.store(true, Ordering::SeqCst);
    store.delete_routine_from_session(USER, 7).await.unwrap();

    assert!(store.current_session().await.is_empty());
    assert!(cache.get(&ProgressKey::new(USER, date(), 7)).is_none());
}
