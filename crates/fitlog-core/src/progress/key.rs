//! Structured progress-cache key.
//!
//! The cache namespace used to be built by ad-hoc string
//! concatenation at every call site; the structured key owns that
//! encoding so it cannot collide or be hand-constructed incorrectly
//! elsewhere.

use chrono::NaiveDate;

/// Identifies one per-routine progress entry: the `(user, date,
/// routine)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub user_id: String,
    pub date: NaiveDate,
    pub routine_id: u64,
}

impl ProgressKey {
    pub fn new(user_id: impl Into<String>, date: NaiveDate, routine_id: u64) -> Self {
        Self {
            user_id: user_id.into(),
            date,
            routine_id,
        }
    }

    /// The storage token for this key: `userId:date:routineId`.
    ///
    /// Only storage implementations should care about this shape;
    /// engine code passes the structured key around.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", self.user_id, self.date, self.routine_id)
    }

    /// The token prefix shared by every routine key of one
    /// `(user, date)` pair, used to clear a whole day.
    pub fn day_prefix(user_id: &str, date: NaiveDate) -> String {
        format!("{user_id}:{date}:")
    }
}
