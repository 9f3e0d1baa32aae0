//! Transient session progress models and store signals.

pub mod model;
pub mod signal;

pub use model::{SessionExercise, SessionRoutine};
pub use signal::SessionSignal;
