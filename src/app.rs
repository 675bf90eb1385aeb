use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/state", get(handlers::get_state))
        .route("/api/reload", post(handlers::reload))
        .route("/api/day", post(handlers::set_day))
        .route("/api/search", post(handlers::set_search))
        .route("/api/served", post(handlers::update_served))
        .route("/api/records", post(handlers::add_record))
        .route("/api/report", get(handlers::get_report).post(handlers::trigger_report))
        .with_state(state)
}
