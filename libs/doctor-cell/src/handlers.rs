use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::slot::{parse_date, parse_time};
use shared_utils::AppState;

use crate::models::{
    BlockCheckQuery, BlockCheckResponse, BlockedSlotListQuery, CreateBlockedSlotRequest, FullDayBlockQuery,
};
use crate::services::BlockedSlotService;

// ==============================================================================
// BLOCKED SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_blocked_slot(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
    Json(request): Json<CreateBlockedSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = BlockedSlotService::from_state(&state);
    let created = service.create_blocked_slot(doctor_id, request).await?;

    // Some cancellations did not go through; the block itself is stored.
    let status = if created.failed.is_empty() {
        StatusCode::CREATED
    } else {
        StatusCode::MULTI_STATUS
    };

    Ok((
        status,
        Json(json!({
            "blocked_slot": created.blocked_slot,
            "cancelled_count": created.cancelled_count,
            "cancelled_appointment_ids": created.cancelled_appointment_ids,
            "failed": created.failed,
            "message": format!("Blocked slot created; {} appointment(s) cancelled", created.cancelled_count)
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_blocked_slots(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<BlockedSlotListQuery>,
) -> Result<Json<Value>, AppError> {
    let date = query
        .date
        .as_deref()
        .map(parse_date)
        .transpose()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = BlockedSlotService::from_state(&state);
    let slots = service.list(doctor_id, date, query.include_inactive).await?;

    Ok(Json(json!({
        "blocked_slots": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn deactivate_blocked_slot(
    State(state): State<AppState>,
    Path((doctor_id, blocked_slot_id)): Path<(i64, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let service = BlockedSlotService::from_state(&state);
    let slot = service.deactivate(doctor_id, blocked_slot_id).await?;

    Ok(Json(json!({
        "blocked_slot": slot,
        "message": "Blocked slot deactivated"
    })))
}

#[axum::debug_handler]
pub async fn check_blocked(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<BlockCheckQuery>,
) -> Result<Json<BlockCheckResponse>, AppError> {
    let date = parse_date(&query.date).map_err(|e| AppError::ValidationError(e.to_string()))?;
    let time = parse_time(&query.time).map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = BlockedSlotService::from_state(&state);
    let is_blocked = service.is_time_blocked(doctor_id, query.workplace_id, date, time).await?;

    Ok(Json(BlockCheckResponse {
        doctor_id,
        workplace_id: query.workplace_id,
        date: query.date,
        time: query.time,
        is_blocked,
    }))
}

#[axum::debug_handler]
pub async fn get_full_day_block(
    State(state): State<AppState>,
    Path(doctor_id): Path<i64>,
    Query(query): Query<FullDayBlockQuery>,
) -> Result<Json<Value>, AppError> {
    let date = parse_date(&query.date).map_err(|e| AppError::ValidationError(e.to_string()))?;

    let service = BlockedSlotService::from_state(&state);
    let block = service.full_day_block(doctor_id, query.workplace_id, date).await?;

    Ok(Json(json!({
        "is_full_day_blocked": block.is_some(),
        "blocked_slot": block
    })))
}
