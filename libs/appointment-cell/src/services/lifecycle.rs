// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::SchedulingStore;
use shared_models::{Appointment, AppointmentStatus, Clock};
use shared_utils::AppState;

use crate::models::AppointmentError;

/// Single-appointment status changes made by doctors.
pub struct AppointmentLifecycleService {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
}

impl AppointmentLifecycleService {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.store), Arc::clone(&state.clock))
    }

    /// Read-modify-write guarded by the appointment's version. A concurrent
    /// writer makes this fail with `Conflict`; a concurrent archive makes it
    /// fail with `NotFound`. The stored record is never partially updated.
    #[instrument(skip(self, note))]
    pub async fn transition_status(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        note: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.load_active(appointment_id).await?;
        let previous = appointment.status;

        appointment.transition_to(new_status, self.clock.now_utc())?;
        if let Some(note) = note {
            appointment.append_note(note);
        }

        let updated = match self.store.update_appointment(&appointment).await {
            Ok(updated) => updated,
            Err(e) => {
                warn!(appointment_id = %appointment_id, "Status update lost the race: {}", e);
                return Err(self.resolve_write_failure(appointment_id, e.into()).await);
            }
        };

        info!(
            appointment_id = %appointment_id,
            from = %previous,
            to = %updated.status,
            version = updated.version,
            "Appointment status changed"
        );
        Ok(updated)
    }

    async fn load_active(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        match self.store.get_appointment(appointment_id).await? {
            Some(appointment) => Ok(appointment),
            None => Err(self.missing(appointment_id).await),
        }
    }

    /// A failed write may mean the row was archived in between; report that
    /// as `NotFound` rather than a version conflict.
    async fn resolve_write_failure(&self, appointment_id: Uuid, err: AppointmentError) -> AppointmentError {
        match err {
            AppointmentError::Conflict(_) | AppointmentError::NotFound(_) => {
                match self.store.get_appointment(appointment_id).await {
                    Ok(None) => self.missing(appointment_id).await,
                    _ => err,
                }
            }
            other => other,
        }
    }

    async fn missing(&self, appointment_id: Uuid) -> AppointmentError {
        match self.store.get_past_appointment(appointment_id).await {
            Ok(Some(_)) => {
                debug!(appointment_id = %appointment_id, "Appointment already archived");
                AppointmentError::NotFound(format!("{} (already archived)", appointment_id))
            }
            _ => AppointmentError::NotFound(appointment_id.to_string()),
        }
    }
}
