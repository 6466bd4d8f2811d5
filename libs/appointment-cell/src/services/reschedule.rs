// libs/appointment-cell/src/services/reschedule.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::{debug, info, instrument, warn};

use notification_cell::{notify_best_effort, Notification, NotificationEvent, Notifier};
use shared_database::SchedulingStore;
use shared_models::slot::{compute_slot, local_date, parse_date, shift_time, with_date};
use shared_models::{Appointment, AppointmentStatus, BatchOutcome, Clock};
use shared_utils::AppState;

use crate::models::{AppointmentError, BulkOperationResult, BulkRescheduleRequest, CancelDayRequest};

enum Adjustment {
    MoveTo(NaiveDate),
    Extend(i64),
}

/// Batch time-shifts and day cancellations. Rows are written one by one, so
/// results carry per-appointment outcomes instead of failing as a whole.
pub struct BulkRescheduleService {
    store: Arc<dyn SchedulingStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    notification_timeout: Duration,
}

impl BulkRescheduleService {
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

    #[instrument(skip(self, request), fields(doctor_id = request.doctor_id, workplace_id = request.workplace_id))]
    pub async fn bulk_reschedule(&self, request: BulkRescheduleRequest) -> Result<BulkOperationResult, AppointmentError> {
        let adjustment = match Self::adjustment(&request)? {
            Some(adjustment) => adjustment,
            None => {
                return Ok(BulkOperationResult::noop(
                    "No extension or new date provided; no appointments were changed.",
                ))
            }
        };

        let booked: Vec<Appointment> = self
            .store
            .find_by_doctor_and_workplace(request.doctor_id, request.workplace_id)
            .await?
            .into_iter()
            .filter(|appt| appt.status == AppointmentStatus::Booked)
            .collect();

        if booked.is_empty() {
            return Ok(BulkOperationResult::noop("No booked appointments found to reschedule."));
        }

        debug!(candidates = booked.len(), "Rescheduling booked appointments");

        let offset = self.clock.offset();
        let mut outcome = BatchOutcome::default();
        for mut appt in booked {
            let id = appt.id;
            // Rows can come back in any offset; slot and date are clinic-local.
            let current = appt.appointment_time.with_timezone(&offset);
            let new_time = match &adjustment {
                Adjustment::MoveTo(date) => match with_date(current, *date) {
                    Some(time) => time,
                    None => {
                        outcome.record_failure(id, format!("Cannot move appointment to {}", date));
                        continue;
                    }
                },
                Adjustment::Extend(minutes) => shift_time(current, *minutes),
            };

            self.apply_new_time(&mut appt, new_time, &offset);
            if let Some(reason) = &request.reason {
                appt.append_note(reason);
            }

            match self.store.update_appointment(&appt).await {
                Ok(updated) => {
                    outcome.record_success(id);
                    self.notify(&updated, NotificationEvent::AppointmentRescheduled, request.reason.as_deref())
                        .await;
                }
                Err(e) => {
                    warn!(appointment_id = %id, "Failed to reschedule appointment: {}", e);
                    outcome.record_failure(id, e.to_string());
                }
            }
        }

        let message = reschedule_message(&outcome, &adjustment);
        info!(
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "{}",
            message
        );
        Ok(BulkOperationResult::from_outcome(outcome, message))
    }

    #[instrument(skip(self, request), fields(workplace_id = request.workplace_id, date = %request.date))]
    pub async fn cancel_day(&self, request: CancelDayRequest) -> Result<BulkOperationResult, AppointmentError> {
        let date = parse_date(&request.date)?;

        let booked: Vec<Appointment> = self
            .store
            .find_by_workplace_and_date(request.workplace_id, date)
            .await?
            .into_iter()
            .filter(|appt| appt.status == AppointmentStatus::Booked)
            .collect();

        if booked.is_empty() {
            return Ok(BulkOperationResult::noop(format!(
                "No booked appointments found on {}.",
                date
            )));
        }

        let note = match request.reason.as_deref().map(str::trim) {
            Some(reason) if !reason.is_empty() => format!("Cancelled: {}", reason),
            _ => "Cancelled by clinic".to_string(),
        };

        let mut outcome = BatchOutcome::default();
        for mut appt in booked {
            let id = appt.id;
            if let Err(e) = appt.transition_to(AppointmentStatus::Cancelled, self.clock.now_utc()) {
                outcome.record_failure(id, e.to_string());
                continue;
            }
            appt.append_note(&note);

            match self.store.update_appointment(&appt).await {
                Ok(updated) => {
                    outcome.record_success(id);
                    self.notify(&updated, NotificationEvent::AppointmentCancelled, request.reason.as_deref())
                        .await;
                }
                Err(e) => {
                    warn!(appointment_id = %id, "Failed to cancel appointment: {}", e);
                    outcome.record_failure(id, e.to_string());
                }
            }
        }

        let message = if outcome.is_partial() {
            format!(
                "{} of {} appointments on {} have been cancelled.",
                outcome.succeeded.len(),
                outcome.attempted(),
                date
            )
        } else {
            format!("All {} appointments on {} have been cancelled.", outcome.succeeded.len(), date)
        };
        info!(succeeded = outcome.succeeded.len(), failed = outcome.failed.len(), "{}", message);
        Ok(BulkOperationResult::from_outcome(outcome, message))
    }

    /// `None` when the request asks for no change at all.
    fn adjustment(request: &BulkRescheduleRequest) -> Result<Option<Adjustment>, AppointmentError> {
        let hours = request.extend_hours.unwrap_or(0);
        let minutes = request.extend_minutes.unwrap_or(0);
        if hours < 0 || minutes < 0 {
            return Err(AppointmentError::ValidationError(
                "extend_hours and extend_minutes must not be negative".to_string(),
            ));
        }

        match request.new_date.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Ok(Some(Adjustment::MoveTo(parse_date(raw)?))),
            _ => {
                let total = hours
                    .checked_mul(60)
                    .and_then(|h| h.checked_add(minutes))
                    .ok_or_else(|| AppointmentError::ValidationError("extension is too large".to_string()))?;
                Ok((total > 0).then_some(Adjustment::Extend(total)))
            }
        }
    }

    fn apply_new_time(&self, appt: &mut Appointment, new_time: DateTime<FixedOffset>, offset: &FixedOffset) {
        let local = new_time.with_timezone(offset);
        appt.appointment_time = local;
        appt.appointment_date = local_date(&local, offset);
        appt.slot = compute_slot(local, appt.duration_minutes as i64);
        appt.updated_at = self.clock.now_utc();
    }

    async fn notify(&self, appt: &Appointment, event: NotificationEvent, reason: Option<&str>) {
        let (title, body) = match event {
            NotificationEvent::AppointmentCancelled => (
                "Appointment cancelled",
                format!("Your appointment on {} ({}) has been cancelled.", appt.appointment_date, appt.slot),
            ),
            NotificationEvent::AppointmentRescheduled => (
                "Appointment rescheduled",
                format!("Your appointment is now on {} ({}).", appt.appointment_date, appt.slot),
            ),
        };
        let body = match reason.map(str::trim) {
            Some(reason) if !reason.is_empty() => format!("{} Reason: {}", body, reason),
            _ => body,
        };

        let notification = Notification::new(appt.user_id, title, body, event);
        notify_best_effort(self.notifier.as_ref(), notification, self.notification_timeout).await;
    }
}

fn reschedule_message(outcome: &BatchOutcome, adjustment: &Adjustment) -> String {
    let subject = if outcome.is_partial() {
        format!("{} of {} appointments", outcome.succeeded.len(), outcome.attempted())
    } else {
        format!("All {} appointments", outcome.succeeded.len())
    };

    match adjustment {
        Adjustment::MoveTo(date) => format!("{} have been moved to {}.", subject, date),
        Adjustment::Extend(total) => format!("{} have been extended by {}.", subject, describe_extension(*total)),
    }
}

/// `90` renders as "1 hour 30 minutes", `120` as "2 hours".
fn describe_extension(total_minutes: i64) -> String {
    let plural = |n: i64, unit: &str| if n == 1 { format!("1 {}", unit) } else { format!("{} {}s", n, unit) };
    let (hours, minutes) = (total_minutes / 60, total_minutes % 60);

    match (hours, minutes) {
        (0, m) => plural(m, "minute"),
        (h, 0) => plural(h, "hour"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}
