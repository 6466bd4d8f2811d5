use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::BlockedSlotError;
use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::{AppointmentStatus, BatchFailure, BatchOutcome, InvalidStatusTransition, SlotError};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_id: i64,
    pub user_id: i64,
    pub workplace_id: i64,
    /// Clinic-local date, `YYYY-MM-DD`.
    pub date: String,
    /// Clinic-local start time, `HH:MM`.
    pub time: String,
    pub duration_minutes: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulkRescheduleRequest {
    pub doctor_id: i64,
    pub workplace_id: i64,
    pub extend_hours: Option<i64>,
    pub extend_minutes: Option<i64>,
    /// Takes precedence over the extension fields when present.
    pub new_date: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelDayRequest {
    pub workplace_id: i64,
    pub date: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentListQuery {
    pub doctor_id: i64,
    pub workplace_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PastAppointmentQuery {
    pub doctor_id: i64,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkOperationResult {
    pub count: usize,
    pub message: String,
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BatchFailure>,
}

impl BulkOperationResult {
    pub fn noop(message: impl Into<String>) -> Self {
        Self {
            count: 0,
            message: message.into(),
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn from_outcome(outcome: BatchOutcome, message: impl Into<String>) -> Self {
        Self {
            count: outcome.succeeded.len(),
            message: message.into(),
            succeeded: outcome.succeeded,
            failed: outcome.failed,
        }
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationTrigger {
    Scheduled,
    Manual,
}

impl std::fmt::Display for MigrationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationTrigger::Scheduled => write!(f, "scheduled"),
            MigrationTrigger::Manual => write!(f, "manual"),
        }
    }
}

/// Summary of one migration run. Counts are per row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub run_id: Uuid,
    pub trigger: MigrationTrigger,
    pub today: NaiveDate,
    pub promoted: usize,
    pub archived: usize,
    /// Rows another run archived first, or that changed while being read.
    pub skipped: usize,
    pub failed: Vec<BatchFailure>,
    /// Phase-level errors, e.g. the candidate query itself failing.
    pub errors: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty() && self.errors.is_empty()
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    InvalidStatusTransition(#[from] InvalidStatusTransition),

    #[error("Appointment was modified concurrently: {0}")]
    Conflict(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Doctor is unavailable at the requested time: {0}")]
    SlotBlocked(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<SlotError> for AppointmentError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::InvalidDate(raw) => AppointmentError::InvalidDate(raw),
            other => AppointmentError::ValidationError(other.to_string()),
        }
    }
}

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => AppointmentError::NotFound(id),
            StoreError::VersionConflict { id, .. } => AppointmentError::Conflict(id.to_string()),
            StoreError::Duplicate(id) => AppointmentError::Conflict(id),
            other => AppointmentError::DatabaseError(other.to_string()),
        }
    }
}

impl From<BlockedSlotError> for AppointmentError {
    fn from(err: BlockedSlotError) -> Self {
        match err {
            BlockedSlotError::ValidationError(msg) => AppointmentError::ValidationError(msg),
            BlockedSlotError::NotFound(id) => AppointmentError::NotFound(id),
            BlockedSlotError::DatabaseError(msg) => AppointmentError::DatabaseError(msg),
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidStatusTransition(_) | AppointmentError::InvalidDate(_) => {
                AppError::BadRequest(err.to_string())
            }
            AppointmentError::Conflict(_) | AppointmentError::SlotBlocked(_) => AppError::Conflict(err.to_string()),
            AppointmentError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}
