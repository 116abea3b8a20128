pub mod app;
pub mod cache;
pub mod config;
pub mod controller;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod projector;
pub mod selection;
pub mod source;
pub mod state;
pub mod storage;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::{load_log, HitStore};
