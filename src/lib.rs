pub mod browser;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod jobs;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod telemetry;
pub mod utils;
pub mod vendors;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use jobs::SearchJobTracker;
pub use orchestrator::SearchOrchestrator;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
