pub mod config;
pub mod http_log_service;
pub mod json_progress_cache;
pub mod paths;

pub use config::FitlogConfig;
pub use http_log_service::HttpLogService;
pub use json_progress_cache::JsonProgressCache;
pub use paths::FitlogPaths;
