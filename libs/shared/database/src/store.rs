// libs/shared/database/src/store.rs
//
// Repository interfaces over the three storage buckets: active appointments,
// archived appointments and blocked slots, plus read-only directory lookups.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_models::{Appointment, BlockedSlot, DoctorSummary, PastAppointment, WorkplaceSummary};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Record {id} was modified concurrently (expected version {expected})")]
    VersionConflict { id: Uuid, expected: i64 },

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Backend(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Result of moving one appointment from the active store into the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveOutcome {
    /// Inserted into the archive and removed from the active store.
    Archived,
    /// The archive already held this id; the active row (if any) was dropped.
    AlreadyArchived,
    /// Neither bucket held the id, usually because another run won the race.
    Missing,
    /// The active row changed since it was read; nothing was written.
    VersionConflict,
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError>;

    async fn insert_appointment(&self, appointment: Appointment) -> Result<Appointment, StoreError>;

    /// Ordered by `appointment_time` ascending, like every range query below.
    async fn find_by_doctor_and_workplace(
        &self,
        doctor_id: i64,
        workplace_id: i64,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn find_by_workplace_and_date(
        &self,
        workplace_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    async fn find_by_doctor_and_date(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// Active appointments dated strictly before `date`.
    async fn find_before_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, StoreError>;

    /// Writes `appointment` if the stored version still equals
    /// `appointment.version`; the returned record carries the bumped version.
    async fn update_appointment(&self, appointment: &Appointment) -> Result<Appointment, StoreError>;

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError>;

    /// Whether future-dated appointments live in a partition of their own.
    fn has_future_partition(&self) -> bool {
        false
    }

    /// Moves appointments due on or before `today` out of the future
    /// partition. Unified stores have nothing to move.
    async fn promote_due_appointments(&self, _today: NaiveDate) -> Result<usize, StoreError> {
        Ok(0)
    }
}

#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Inserts `past` into the archive and deletes the active row with the
    /// same id as one atomic step, guarded by `expected_version`.
    async fn archive_appointment(
        &self,
        past: PastAppointment,
        expected_version: i64,
    ) -> Result<ArchiveOutcome, StoreError>;

    async fn get_past_appointment(&self, id: Uuid) -> Result<Option<PastAppointment>, StoreError>;

    async fn find_past_by_doctor(&self, doctor_id: i64) -> Result<Vec<PastAppointment>, StoreError>;
}

#[async_trait]
pub trait BlockedSlotStore: Send + Sync {
    async fn insert_blocked_slot(&self, slot: BlockedSlot) -> Result<BlockedSlot, StoreError>;

    async fn get_blocked_slot(&self, id: Uuid) -> Result<Option<BlockedSlot>, StoreError>;

    async fn find_active_blocked_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BlockedSlot>, StoreError>;

    /// Every block of the doctor, active or not, ordered by date.
    async fn list_blocked_slots(&self, doctor_id: i64) -> Result<Vec<BlockedSlot>, StoreError>;

    async fn deactivate_blocked_slot(&self, id: Uuid) -> Result<BlockedSlot, StoreError>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn workplace_summary(&self, workplace_id: i64) -> Result<Option<WorkplaceSummary>, StoreError>;

    async fn doctor_summary(&self, doctor_id: i64) -> Result<Option<DoctorSummary>, StoreError>;
}

/// Everything the scheduling services need from persistence.
pub trait SchedulingStore: AppointmentStore + ArchiveStore + BlockedSlotStore + DirectoryStore {}

impl<T> SchedulingStore for T where T: AppointmentStore + ArchiveStore + BlockedSlotStore + DirectoryStore {}
