use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::{BatchFailure, BlockedSlot, SlotError};

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockedSlotRequest {
    /// `None` blocks every workplace of the doctor.
    pub workplace_id: Option<i64>,
    pub block_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_full_day: bool,
    pub reason: Option<String>,
    /// Cancel BOOKED/RESCHEDULED appointments that fall inside the block.
    #[serde(default)]
    pub cancel_existing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedSlotCreated {
    pub blocked_slot: BlockedSlot,
    pub cancelled_count: usize,
    pub cancelled_appointment_ids: Vec<Uuid>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedSlotListQuery {
    pub date: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockCheckQuery {
    pub workplace_id: i64,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullDayBlockQuery {
    pub workplace_id: i64,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockCheckResponse {
    pub doctor_id: i64,
    pub workplace_id: i64,
    pub date: String,
    pub time: String,
    pub is_blocked: bool,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum BlockedSlotError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Blocked slot not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<SlotError> for BlockedSlotError {
    fn from(err: SlotError) -> Self {
        BlockedSlotError::ValidationError(err.to_string())
    }
}

impl From<StoreError> for BlockedSlotError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => BlockedSlotError::NotFound(id),
            other => BlockedSlotError::DatabaseError(other.to_string()),
        }
    }
}

impl From<BlockedSlotError> for AppError {
    fn from(err: BlockedSlotError) -> Self {
        match err {
            BlockedSlotError::ValidationError(msg) => AppError::ValidationError(msg),
            BlockedSlotError::NotFound(id) => AppError::NotFound(format!("Blocked slot {} not found", id)),
            BlockedSlotError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
