use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use notification_cell::{notify_best_effort, Notification, NotificationEvent, Notifier};
use shared_database::SchedulingStore;
use shared_models::slot::{parse_date, parse_time};
use shared_models::{Appointment, AppointmentStatus, BatchOutcome, BlockedSlot, Clock};
use shared_utils::AppState;

use crate::models::{BlockedSlotCreated, BlockedSlotError, CreateBlockedSlotRequest};
use crate::services::index::BlockedTimeIndex;

pub struct BlockedSlotService {
    store: Arc<dyn SchedulingStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    notification_timeout: Duration,
}

impl BlockedSlotService {
    pub fn new(
        store: Arc<dyn SchedulingStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        notification_timeout: Duration,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            notification_timeout,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.store),
            Arc::clone(&state.notifier),
            Arc::clone(&state.clock),
            state.notification_timeout(),
        )
    }

    /// Stores a new block and, when requested, cancels the open appointments
    /// it overlaps. Cancellation is per appointment; one failed write does not
    /// undo the block or the other cancellations.
    #[instrument(skip(self, request), fields(block_date = %request.block_date))]
    pub async fn create_blocked_slot(
        &self,
        doctor_id: i64,
        request: CreateBlockedSlotRequest,
    ) -> Result<BlockedSlotCreated, BlockedSlotError> {
        let slot = self.validate_request(doctor_id, &request)?;

        debug!(
            "Creating blocked slot for doctor {} on {} (workplace {:?}, full day {})",
            doctor_id, slot.block_date, slot.workplace_id, slot.is_full_day
        );

        // Candidates are read before the insert so a failed query stores nothing.
        let candidates = if request.cancel_existing {
            self.covered_appointments(&slot).await?
        } else {
            Vec::new()
        };

        let slot = self.store.insert_blocked_slot(slot).await?;
        let outcome = self.cancel_appointments(candidates, &slot).await;

        info!(
            blocked_slot_id = %slot.id,
            doctor_id,
            cancelled = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Blocked slot created"
        );

        Ok(BlockedSlotCreated {
            cancelled_count: outcome.succeeded.len(),
            cancelled_appointment_ids: outcome.succeeded,
            failed: outcome.failed,
            blocked_slot: slot,
        })
    }

    pub async fn is_time_blocked(
        &self,
        doctor_id: i64,
        workplace_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<bool, BlockedSlotError> {
        let slots = self.store.find_active_blocked_slots(doctor_id, date).await?;
        Ok(BlockedTimeIndex::new(&slots).is_blocked(doctor_id, workplace_id, date, time))
    }

    pub async fn full_day_block(
        &self,
        doctor_id: i64,
        workplace_id: i64,
        date: NaiveDate,
    ) -> Result<Option<BlockedSlot>, BlockedSlotError> {
        let slots = self.store.find_active_blocked_slots(doctor_id, date).await?;
        Ok(BlockedTimeIndex::new(&slots)
            .full_day_block(doctor_id, workplace_id, date)
            .cloned())
    }

    pub async fn list(
        &self,
        doctor_id: i64,
        date: Option<NaiveDate>,
        include_inactive: bool,
    ) -> Result<Vec<BlockedSlot>, BlockedSlotError> {
        let slots = self.store.list_blocked_slots(doctor_id).await?;
        Ok(slots
            .into_iter()
            .filter(|slot| include_inactive || slot.is_active)
            .filter(|slot| date.map_or(true, |d| slot.block_date == d))
            .collect())
    }

    /// Lifts a block. Appointments it cancelled stay cancelled.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, doctor_id: i64, blocked_slot_id: Uuid) -> Result<BlockedSlot, BlockedSlotError> {
        let existing = self
            .store
            .get_blocked_slot(blocked_slot_id)
            .await?
            .filter(|slot| slot.doctor_id == doctor_id)
            .ok_or_else(|| BlockedSlotError::NotFound(blocked_slot_id.to_string()))?;

        if !existing.is_active {
            return Ok(existing);
        }

        let slot = self.store.deactivate_blocked_slot(blocked_slot_id).await?;
        info!(blocked_slot_id = %slot.id, doctor_id, "Blocked slot deactivated");
        Ok(slot)
    }

    fn validate_request(
        &self,
        doctor_id: i64,
        request: &CreateBlockedSlotRequest,
    ) -> Result<BlockedSlot, BlockedSlotError> {
        let block_date = parse_date(&request.block_date)?;
        if block_date < self.clock.today() {
            return Err(BlockedSlotError::ValidationError(format!(
                "Cannot block a past date: {}",
                block_date
            )));
        }

        let (start_time, end_time) = if request.is_full_day {
            (None, None)
        } else {
            let (start, end) = match (&request.start_time, &request.end_time) {
                (Some(start), Some(end)) => (parse_time(start)?, parse_time(end)?),
                _ => {
                    return Err(BlockedSlotError::ValidationError(
                        "start_time and end_time are required unless is_full_day is set".to_string(),
                    ))
                }
            };

            if start >= end {
                return Err(BlockedSlotError::ValidationError(
                    "start_time must be before end_time".to_string(),
                ));
            }
            (Some(start), Some(end))
        };

        Ok(BlockedSlot {
            id: Uuid::new_v4(),
            doctor_id,
            workplace_id: request.workplace_id,
            block_date,
            start_time,
            end_time,
            is_full_day: request.is_full_day,
            reason: request.reason.clone(),
            is_active: true,
            created_at: self.clock.now_utc(),
        })
    }

    async fn covered_appointments(&self, slot: &BlockedSlot) -> Result<Vec<Appointment>, BlockedSlotError> {
        let offset = self.clock.offset();
        Ok(self
            .store
            .find_by_doctor_and_date(slot.doctor_id, slot.block_date)
            .await?
            .into_iter()
            .filter(|appt| appt.is_open() && slot.applies_to_workplace(appt.workplace_id))
            .filter(|appt| slot.covers(appt.appointment_time.with_timezone(&offset).time()))
            .collect())
    }

    async fn cancel_appointments(&self, candidates: Vec<Appointment>, slot: &BlockedSlot) -> BatchOutcome {
        let note = match &slot.reason {
            Some(reason) if !reason.trim().is_empty() => format!("Cancelled: doctor unavailable ({})", reason.trim()),
            _ => "Cancelled: doctor unavailable".to_string(),
        };

        let mut outcome = BatchOutcome::default();
        for mut appt in candidates {
            let id = appt.id;
            if let Err(e) = appt.transition_to(AppointmentStatus::Cancelled, self.clock.now_utc()) {
                outcome.record_failure(id, e.to_string());
                continue;
            }
            appt.append_note(&note);

            match self.store.update_appointment(&appt).await {
                Ok(updated) => {
                    outcome.record_success(id);
                    self.notify_cancelled(&updated, slot).await;
                }
                Err(e) => {
                    warn!(appointment_id = %id, "Failed to cancel appointment for blocked slot: {}", e);
                    outcome.record_failure(id, e.to_string());
                }
            }
        }

        outcome
    }

    async fn notify_cancelled(&self, appt: &Appointment, slot: &BlockedSlot) {
        let body = format!(
            "Your appointment on {} ({}) was cancelled because the doctor is unavailable.",
            appt.appointment_date, appt.slot
        );
        let body = match &slot.reason {
            Some(reason) if !reason.trim().is_empty() => format!("{} Reason: {}", body, reason.trim()),
            _ => body,
        };

        let notification = Notification::new(
            appt.user_id,
            "Appointment cancelled",
            body,
            NotificationEvent::AppointmentCancelled,
        );
        notify_best_effort(self.notifier.as_ref(), notification, self.notification_timeout).await;
    }
}
