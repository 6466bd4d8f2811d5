use axum::{
    routing::{delete, get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

pub fn doctor_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/{doctor_id}/blocked-slots",
            post(handlers::create_blocked_slot).get(handlers::list_blocked_slots),
        )
        .route("/{doctor_id}/blocked-slots/check", get(handlers::check_blocked))
        .route("/{doctor_id}/blocked-slots/full-day", get(handlers::get_full_day_block))
        .route(
            "/{doctor_id}/blocked-slots/{blocked_slot_id}",
            delete(handlers::deactivate_blocked_slot),
        )
        .with_state(state)
}
