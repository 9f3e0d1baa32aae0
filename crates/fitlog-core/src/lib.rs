pub mod error;
pub mod log;
pub mod progress;
pub mod routine;
pub mod session;

// Re-export common error type
pub use error::FitlogError;
