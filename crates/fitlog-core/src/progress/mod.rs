//! Local durable progress cache: structured key and repository trait.

pub mod key;
pub mod repository;

pub use key::ProgressKey;
pub use repository::{ExerciseCheck, ProgressCacheRepository};
