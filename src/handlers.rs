use crate::errors::AppError;
use crate::models::{
    DashboardView, DayRequest, NewRecordDraft, ReportView, SearchRequest, ServedUpdateRequest,
};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{extract::State, response::Html, Json};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.view().await))
}

pub async fn get_state(State(state): State<AppState>) -> Json<DashboardView> {
    Json(state.view().await)
}

pub async fn reload(State(state): State<AppState>) -> Json<DashboardView> {
    state.load().await;
    Json(state.view().await)
}

pub async fn set_day(
    State(state): State<AppState>,
    Json(payload): Json<DayRequest>,
) -> Json<DashboardView> {
    state.set_active_day(payload.day).await;
    Json(state.view().await)
}

pub async fn set_search(
    State(state): State<AppState>,
    Json(payload): Json<SearchRequest>,
) -> Json<DashboardView> {
    state.set_search(payload.term).await;
    Json(state.view().await)
}

/// Answers with the optimistic view; the store confirmation settles in the
/// background and the page picks it up on its next poll.
pub async fn update_served(
    State(state): State<AppState>,
    Json(payload): Json<ServedUpdateRequest>,
) -> Json<DashboardView> {
    if let Some(pending) = state
        .begin_served_update(payload.row_index, payload.day, payload.new_count)
        .await
    {
        tokio::spawn(pending.settle());
    }
    Json(state.view().await)
}

pub async fn add_record(
    State(state): State<AppState>,
    Json(draft): Json<NewRecordDraft>,
) -> Result<Json<DashboardView>, AppError> {
    state.add_record(draft).await?;
    Ok(Json(state.view().await))
}

pub async fn trigger_report(State(state): State<AppState>) -> Json<ReportView> {
    if let Some(summary) = state.start_report().await {
        let worker = state.clone();
        tokio::spawn(async move {
            worker.finish_report(summary).await;
        });
    }
    Json(state.report().await)
}

pub async fn get_report(State(state): State<AppState>) -> Json<ReportView> {
    Json(state.report().await)
}
