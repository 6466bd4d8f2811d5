use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::{admin_routes, appointment_routes};
use doctor_cell::router::doctor_routes;
use shared_utils::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduler API is running!" }))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/admin", admin_routes(state))
}
