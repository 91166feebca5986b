pub mod config;
pub mod models;
pub mod service;
pub mod upload;

pub use config::ServiceConfig;
pub use models::AnalyzeResponse;
pub use service::{AppState, create_app};
