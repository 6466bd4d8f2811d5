use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

pub fn appointment_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment).get(handlers::list_appointments))
        .route("/past", get(handlers::list_past_appointments))
        .route("/bulk-reschedule", post(handlers::bulk_reschedule))
        .route("/cancel-day", post(handlers::cancel_day))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/status", patch(handlers::update_status))
        .with_state(state)
}

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/migrations/run", post(handlers::run_migration))
        .with_state(state)
}
