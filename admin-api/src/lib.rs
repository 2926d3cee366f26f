pub mod admin_handlers;
pub mod app;
pub mod config;
pub mod cookies;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod seeder;
pub mod session_handlers;
pub mod store;

pub use app::{router, AppState};
