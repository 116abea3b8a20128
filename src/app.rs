use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/hits", get(handlers::get_hits))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/window/start", post(handlers::set_start))
        .route("/api/window/end", post(handlers::set_end))
        .route("/api/cursor", post(handlers::set_cursor))
        .route("/api/selection/toggle", post(handlers::toggle_region))
        .route("/api/selection/reset", post(handlers::reset_selection))
        .with_state(state)
}
