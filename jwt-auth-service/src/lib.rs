pub mod app;
pub mod config;
pub mod credentials;
pub mod handlers;
pub mod metrics;
pub mod policy;

pub use app::{build_router, AppState};
