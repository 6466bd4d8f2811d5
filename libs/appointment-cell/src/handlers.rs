use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    AppointmentListQuery, BookAppointmentRequest, BulkOperationResult, BulkRescheduleRequest, CancelDayRequest,
    MigrationReport, MigrationTrigger, PastAppointmentQuery, UpdateStatusRequest,
};
use crate::services::{
    AppointmentBookingService, AppointmentLifecycleService, BulkRescheduleService, LifecycleMigrator,
};

fn bulk_response(result: BulkOperationResult) -> (StatusCode, Json<BulkOperationResult>) {
    let status = if result.is_partial() {
        StatusCode::MULTI_STATUS
    } else {
        StatusCode::OK
    };
    (status, Json(result))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AppointmentBookingService::from_state(&state);
    let appointment = service.book_appointment(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "appointment": appointment,
            "message": "Appointment booked"
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::from_state(&state);
    let appointments = service.list_appointments(query.doctor_id, query.workplace_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn list_past_appointments(
    State(state): State<AppState>,
    Query(query): Query<PastAppointmentQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::from_state(&state);
    let appointments = service.list_past_appointments(query.doctor_id).await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentBookingService::from_state(&state);
    let appointment = service.get_appointment(appointment_id).await?;

    Ok(Json(json!({ "appointment": appointment })))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::from_state(&state);
    let appointment = service
        .transition_status(appointment_id, request.status, request.note.as_deref())
        .await?;

    Ok(Json(json!({
        "appointment": appointment,
        "message": format!("Appointment is now {}", appointment.status)
    })))
}

// ==============================================================================
// BULK HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn bulk_reschedule(
    State(state): State<AppState>,
    Json(request): Json<BulkRescheduleRequest>,
) -> Result<(StatusCode, Json<BulkOperationResult>), AppError> {
    let service = BulkRescheduleService::from_state(&state);
    let result = service.bulk_reschedule(request).await?;
    Ok(bulk_response(result))
}

#[axum::debug_handler]
pub async fn cancel_day(
    State(state): State<AppState>,
    Json(request): Json<CancelDayRequest>,
) -> Result<(StatusCode, Json<BulkOperationResult>), AppError> {
    let service = BulkRescheduleService::from_state(&state);
    let result = service.cancel_day(request).await?;
    Ok(bulk_response(result))
}

// ==============================================================================
// ADMIN HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn run_migration(State(state): State<AppState>) -> (StatusCode, Json<MigrationReport>) {
    let migrator = LifecycleMigrator::from_state(&state);
    let report = migrator.run_daily_migration(MigrationTrigger::Manual).await;

    let status = if report.succeeded() {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    (status, Json(report))
}
