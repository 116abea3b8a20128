use crate::controller::EditOutcome;
use crate::errors::AppError;
use crate::models::{DashboardView, DateRequest, HitRecord, RangeQuery, Region, RegionRequest, is_all_sentinel};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use tracing::debug;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.regions))
}

pub async fn get_hits(
    State(state): State<AppState>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<HitRecord>>, AppError> {
    if range.start_date > range.end_date {
        return Err(AppError::bad_request("start-date must not be after end-date"));
    }
    Ok(Json(state.store.query_range(range.start_date, range.end_date)))
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.controller.view().await)
}

pub async fn set_start(
    State(state): State<AppState>,
    Json(payload): Json<DateRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let outcome = state.controller.set_start(payload.date).await?;
    log_outcome("start", outcome);
    Ok(Json(state.controller.view().await))
}

pub async fn set_end(
    State(state): State<AppState>,
    Json(payload): Json<DateRequest>,
) -> Result<Json<DashboardView>, AppError> {
    let outcome = state.controller.set_end(payload.date).await?;
    log_outcome("end", outcome);
    Ok(Json(state.controller.view().await))
}

pub async fn set_cursor(
    State(state): State<AppState>,
    Json(payload): Json<DateRequest>,
) -> Json<DashboardView> {
    state.controller.set_cursor(payload.date).await;
    Json(state.controller.view().await)
}

pub async fn toggle_region(
    State(state): State<AppState>,
    Json(payload): Json<RegionRequest>,
) -> Result<Json<DashboardView>, AppError> {
    if is_all_sentinel(&payload.region) {
        state.controller.reset_selection().await;
    } else {
        let region = Region::parse(&payload.region)?;
        state.controller.toggle_region(region).await;
    }
    Ok(Json(state.controller.view().await))
}

pub async fn reset_selection(State(state): State<AppState>) -> Json<DashboardView> {
    state.controller.reset_selection().await;
    Json(state.controller.view().await)
}

fn log_outcome(edge: &str, outcome: EditOutcome) {
    if outcome != EditOutcome::Applied {
        debug!(edge, ?outcome, "window edit did not change the series");
    }
}
