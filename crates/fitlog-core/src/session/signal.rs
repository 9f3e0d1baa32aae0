use serde::{Deserialize, Serialize};

/// Lightweight notifications emitted by the session store.
///
/// Every mutating operation reports its outcome on a broadcast
/// channel so a UI can surface toasts without polling state. The
/// channel is advisory; dropped signals are not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionSignal {
    /// A routine reached exactly 100% completion.
    RoutineCompleted { routine_id: u64 },
    /// A remote synchronization failed; in-memory state was rolled
    /// back to its pre-mutation snapshot.
    SyncFailed { routine_id: u64, message: String },
    /// Routines were appended to the current date's session.
    RoutinesAdded { added: usize, skipped: usize },
    /// A routine was removed from the session.
    RoutineRemoved { routine_id: u64 },
    /// Every log for the selected date was deleted.
    DayCleared { deleted: usize },
    /// Day erase requested but there was nothing to delete.
    NothingToClear,
    /// The memo was persisted remotely.
    MemoSaved,
    /// The memo had nothing to attach to and was not persisted.
    MemoSkipped,
}
