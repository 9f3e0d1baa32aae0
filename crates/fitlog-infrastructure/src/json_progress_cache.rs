//! File-backed progress cache.
//!
//! Stores one JSON file per `(user, date, routine)` key so that
//! per-exercise completion flags survive a process restart even
//! before their remote write has landed.

use async_trait::async_trait;
use chrono::NaiveDate;
use fitlog_core::error::Result;
use fitlog_core::progress::{ExerciseCheck, ProgressCacheRepository, ProgressKey};
use std::fs;
use std::path::{Path, PathBuf};

/// Durable key/value store for per-routine exercise progress.
///
/// Layout:
/// ```text
/// base_dir/
/// └── progress/
///     ├── user-1:2024-06-01:7.json
///     └── user-1:2024-06-01:9.json
/// ```
pub struct JsonProgressCache {
    progress_dir: PathBuf,
}

impl JsonProgressCache {
    /// Creates a cache rooted at the given base directory, creating
    /// the layout if needed.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let progress_dir = base_dir.as_ref().join("progress");
        fs::create_dir_all(&progress_dir)?;
        Ok(Self { progress_dir })
    }

    /// Creates a cache at the platform data directory
    /// (`~/.local/share/fitlog` on Linux).
    pub fn default_location() -> Result<Self> {
        Self::new(crate::paths::FitlogPaths::data_dir()?)
    }

    fn entry_path(&self, key: &ProgressKey) -> PathBuf {
        self.progress_dir.join(format!("{}.json", key.encode()))
    }
}

#[async_trait]
impl ProgressCacheRepository for JsonProgressCache {
    async fn load(&self, key: &ProgressKey) -> Result<Option<Vec<ExerciseCheck>>> {
        let path = self.entry_path(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        // A corrupt entry is treated as absent: the routine restarts
        // fresh instead of the reload failing.
        match serde_json::from_str(&json) {
            Ok(checks) => Ok(Some(checks)),
            Err(e) => {
                tracing::warn!(
                    "[JsonProgressCache] discarding unparsable entry {:?}: {e}",
                    path
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, key: &ProgressKey, checks: &[ExerciseCheck]) -> Result<()> {
        let json = serde_json::to_string_pretty(checks)?;
        fs::write(self.entry_path(key), json)?;
        Ok(())
    }

    async fn remove(&self, key: &ProgressKey) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    async fn remove_day(&self, user_id: &str, date: NaiveDate) -> Result<()> {
        let prefix = ProgressKey::day_prefix(user_id, date);
        for entry in fs::read_dir(&self.progress_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&prefix) {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}
