// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{Duration, TimeZone};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use doctor_cell::BlockedTimeIndex;
use shared_database::SchedulingStore;
use shared_models::slot::{compute_slot, parse_date, parse_time};
use shared_models::{Appointment, AppointmentStatus, Clock, PastAppointment};
use shared_utils::AppState;

use crate::models::{AppointmentError, BookAppointmentRequest};

const MAX_DURATION_MINUTES: i32 = 24 * 60;

pub struct AppointmentBookingService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
}

impl AppointmentBookingService {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.store), Arc::clone(&state.clock))
    }

    #[instrument(skip(self, request), fields(doctor_id = request.doctor_id, workplace_id = request.workplace_id))]
    pub async fn book_appointment(&self, request: BookAppointmentRequest) -> Result<Appointment, AppointmentError> {
        if request.duration_minutes <= 0 || request.duration_minutes > MAX_DURATION_MINUTES {
            return Err(AppointmentError::ValidationError(format!(
                "duration_minutes must be between 1 and {}",
                MAX_DURATION_MINUTES
            )));
        }

        let date = parse_date(&request.date)?;
        let time = parse_time(&request.time)?;
        let offset = self.clock.offset();
        let start = offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .ok_or_else(|| AppointmentError::InvalidDate(request.date.clone()))?;

        if start <= self.clock.now() {
            return Err(AppointmentError::ValidationError(
                "Appointments can only be booked in the future".to_string(),
            ));
        }

        let blocks = self.store.find_active_blocked_slots(request.doctor_id, date).await?;
        if let Some(block) =
            BlockedTimeIndex::new(&blocks).blocking_slot(request.doctor_id, request.workplace_id, date, time)
        {
            return Err(AppointmentError::SlotBlocked(
                block.reason.clone().unwrap_or_else(|| format!("{} {}", date, time.format("%H:%M"))),
            ));
        }

        let end = start + Duration::minutes(request.duration_minutes as i64);
        let clash = self
            .store
            .find_by_doctor_and_date(request.doctor_id, date)
            .await?
            .into_iter()
            .find(|existing| existing.is_open() && existing.appointment_time < end && start < existing.end_time());
        if let Some(existing) = clash {
            debug!(existing_id = %existing.id, "Requested time overlaps an existing appointment");
            return Err(AppointmentError::Conflict(format!(
                "doctor already has an appointment at {}",
                existing.slot
            )));
        }

        let now = self.clock.now_utc();
        let mut appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_id: request.doctor_id,
            user_id: request.user_id,
            workplace_id: request.workplace_id,
            appointment_date: date,
            appointment_time: start,
            duration_minutes: request.duration_minutes,
            slot: compute_slot(start, request.duration_minutes as i64),
            status: AppointmentStatus::Booked,
            notes: None,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        if let Some(notes) = &request.notes {
            appointment.append_note(notes);
        }

        let appointment = self.store.insert_appointment(appointment).await?;
        info!(appointment_id = %appointment.id, slot = %appointment.slot, "Appointment booked");
        Ok(appointment)
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        if let Some(appointment) = self.store.get_appointment(appointment_id).await? {
            return Ok(appointment);
        }

        let detail = match self.store.get_past_appointment(appointment_id).await? {
            Some(_) => format!("{} (already archived)", appointment_id),
            None => appointment_id.to_string(),
        };
        Err(AppointmentError::NotFound(detail))
    }

    pub async fn list_appointments(&self, doctor_id: i64, workplace_id: i64) -> Result<Vec<Appointment>, AppointmentError> {
        Ok(self.store.find_by_doctor_and_workplace(doctor_id, workplace_id).await?)
    }

    pub async fn list_past_appointments(&self, doctor_id: i64) -> Result<Vec<PastAppointment>, AppointmentError> {
        Ok(self.store.find_past_by_doctor(doctor_id).await?)
    }
}
