//! Exercise log domain: the authoritative remote record and the
//! service trait the engine consumes it through.

pub mod model;
pub mod service;

pub use model::{ExerciseLog, ExerciseLogPatch, NewExerciseLog};
pub use service::ExerciseLogService;
