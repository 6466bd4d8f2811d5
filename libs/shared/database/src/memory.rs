// libs/shared/database/src/memory.rs
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::{Appointment, BlockedSlot, DoctorSummary, PastAppointment, WorkplaceSummary};

use crate::store::{
    AppointmentStore, ArchiveOutcome, ArchiveStore, BlockedSlotStore, DirectoryStore, StoreError,
};

#[derive(Default)]
struct Inner {
    active: HashMap<Uuid, Appointment>,
    archive: HashMap<Uuid, PastAppointment>,
    blocked: HashMap<Uuid, BlockedSlot>,
    workplaces: HashMap<i64, WorkplaceSummary>,
    doctors: HashMap<i64, DoctorSummary>,
    failing_ids: HashSet<Uuid>,
    failing_queries: bool,
}

/// Process-local store. All buckets sit behind one lock, which makes the
/// archive move and every version check atomic.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_workplace(&self, workplace: WorkplaceSummary) {
        self.inner.write().await.workplaces.insert(workplace.id, workplace);
    }

    pub async fn add_doctor(&self, doctor: DoctorSummary) {
        self.inner.write().await.doctors.insert(doctor.id, doctor);
    }

    /// Makes every write touching `id` fail with a backend error.
    pub async fn fail_writes_for(&self, id: Uuid) {
        self.inner.write().await.failing_ids.insert(id);
    }

    pub async fn clear_write_failures(&self) {
        self.inner.write().await.failing_ids.clear();
    }

    /// Makes the appointment list queries fail with a backend error.
    pub async fn fail_queries(&self, failing: bool) {
        self.inner.write().await.failing_queries = failing;
    }

    pub async fn active_count(&self) -> usize {
        self.inner.read().await.active.len()
    }

    pub async fn archive_count(&self) -> usize {
        self.inner.read().await.archive.len()
    }
}

fn sorted(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by_key(|a| a.appointment_time);
    appointments
}

fn check_writable(inner: &Inner, id: Uuid) -> Result<(), StoreError> {
    if inner.failing_ids.contains(&id) {
        return Err(StoreError::Backend(format!("write rejected for {}", id)));
    }
    Ok(())
}

fn check_queryable(inner: &Inner) -> Result<(), StoreError> {
    if inner.failing_queries {
        return Err(StoreError::Backend("appointment query rejected".to_string()));
    }
    Ok(())
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>, StoreError> {
        Ok(self.inner.read().await.active.get(&id).cloned())
    }

    async fn insert_appointment(&self, mut appointment: Appointment) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.write().await;
        check_writable(&inner, appointment.id)?;

        if inner.active.contains_key(&appointment.id) || inner.archive.contains_key(&appointment.id) {
            return Err(StoreError::Duplicate(appointment.id.to_string()));
        }

        appointment.version = 1;
        inner.active.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn find_by_doctor_and_workplace(
        &self,
        doctor_id: i64,
        workplace_id: i64,
    ) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        check_queryable(&inner)?;
        Ok(sorted(
            inner
                .active
                .values()
                .filter(|a| a.doctor_id == doctor_id && a.workplace_id == workplace_id)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_workplace_and_date(
        &self,
        workplace_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        check_queryable(&inner)?;
        Ok(sorted(
            inner
                .active
                .values()
                .filter(|a| a.workplace_id == workplace_id && a.appointment_date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_doctor_and_date(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        check_queryable(&inner)?;
        Ok(sorted(
            inner
                .active
                .values()
                .filter(|a| a.doctor_id == doctor_id && a.appointment_date == date)
                .cloned()
                .collect(),
        ))
    }

    async fn find_before_date(&self, date: NaiveDate) -> Result<Vec<Appointment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(sorted(
            inner
                .active
                .values()
                .filter(|a| a.appointment_date < date)
                .cloned()
                .collect(),
        ))
    }

    async fn update_appointment(&self, appointment: &Appointment) -> Result<Appointment, StoreError> {
        let mut inner = self.inner.write().await;
        check_writable(&inner, appointment.id)?;

        let stored = inner
            .active
            .get_mut(&appointment.id)
            .ok_or_else(|| StoreError::NotFound(appointment.id.to_string()))?;

        if stored.version != appointment.version {
            return Err(StoreError::VersionConflict {
                id: appointment.id,
                expected: appointment.version,
            });
        }

        let mut updated = appointment.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete_appointment(&self, id: Uuid) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        check_writable(&inner, id)?;

        inner
            .active
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }
}

#[async_trait]
impl ArchiveStore for InMemoryStore {
    async fn archive_appointment(
        &self,
        past: PastAppointment,
        expected_version: i64,
    ) -> Result<ArchiveOutcome, StoreError> {
        let mut inner = self.inner.write().await;
        check_writable(&inner, past.id)?;

        if inner.archive.contains_key(&past.id) {
            inner.active.remove(&past.id);
            debug!("Appointment {} already archived", past.id);
            return Ok(ArchiveOutcome::AlreadyArchived);
        }

        let current_version = inner.active.get(&past.id).map(|a| a.version);
        match current_version {
            None => Ok(ArchiveOutcome::Missing),
            Some(version) if version != expected_version => Ok(ArchiveOutcome::VersionConflict),
            Some(_) => {
                inner.active.remove(&past.id);
                inner.archive.insert(past.id, past);
                Ok(ArchiveOutcome::Archived)
            }
        }
    }

    async fn get_past_appointment(&self, id: Uuid) -> Result<Option<PastAppointment>, StoreError> {
        Ok(self.inner.read().await.archive.get(&id).cloned())
    }

    async fn find_past_by_doctor(&self, doctor_id: i64) -> Result<Vec<PastAppointment>, StoreError> {
        let inner = self.inner.read().await;
        let mut past: Vec<PastAppointment> = inner
            .archive
            .values()
            .filter(|p| p.doctor_id == doctor_id)
            .cloned()
            .collect();
        past.sort_by_key(|p| p.appointment_time);
        Ok(past)
    }
}

#[async_trait]
impl BlockedSlotStore for InMemoryStore {
    async fn insert_blocked_slot(&self, slot: BlockedSlot) -> Result<BlockedSlot, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.blocked.contains_key(&slot.id) {
            return Err(StoreError::Duplicate(slot.id.to_string()));
        }
        inner.blocked.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn get_blocked_slot(&self, id: Uuid) -> Result<Option<BlockedSlot>, StoreError> {
        Ok(self.inner.read().await.blocked.get(&id).cloned())
    }

    async fn find_active_blocked_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<BlockedSlot>, StoreError> {
        let inner = self.inner.read().await;
        let mut slots: Vec<BlockedSlot> = inner
            .blocked
            .values()
            .filter(|s| s.is_active && s.doctor_id == doctor_id && s.block_date == date)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.start_time, s.created_at));
        Ok(slots)
    }

    async fn list_blocked_slots(&self, doctor_id: i64) -> Result<Vec<BlockedSlot>, StoreError> {
        let inner = self.inner.read().await;
        let mut slots: Vec<BlockedSlot> = inner
            .blocked
            .values()
            .filter(|s| s.doctor_id == doctor_id)
            .cloned()
            .collect();
        slots.sort_by_key(|s| (s.block_date, s.start_time, s.created_at));
        Ok(slots)
    }

    async fn deactivate_blocked_slot(&self, id: Uuid) -> Result<BlockedSlot, StoreError> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .blocked
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        slot.is_active = false;
        Ok(slot.clone())
    }
}

#[async_trait]
impl DirectoryStore for InMemoryStore {
    async fn workplace_summary(&self, workplace_id: i64) -> Result<Option<WorkplaceSummary>, StoreError> {
        Ok(self.inner.read().await.workplaces.get(&workplace_id).cloned())
    }

    async fn doctor_summary(&self, doctor_id: i64) -> Result<Option<DoctorSummary>, StoreError> {
        Ok(self.inner.read().await.doctors.get(&doctor_id).cloned())
    }
}
