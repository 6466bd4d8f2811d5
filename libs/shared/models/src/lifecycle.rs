// libs/shared/models/src/lifecycle.rs
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::appointment::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Error)]
#[error("Appointment cannot move from {from} to {to}")]
pub struct InvalidStatusTransition {
    pub from: AppointmentStatus,
    pub to: AppointmentStatus,
}

impl AppointmentStatus {
    /// All valid next statuses for the current status.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Booked => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::Rescheduled,
            ],
            AppointmentStatus::Rescheduled => &[
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
            ],
            // Terminal states - no transitions allowed
            AppointmentStatus::Completed => &[],
            AppointmentStatus::Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }
}

/// Validate that a status transition is allowed.
pub fn validate_status_transition(
    current: AppointmentStatus,
    next: AppointmentStatus,
) -> Result<(), InvalidStatusTransition> {
    if !current.can_transition_to(next) {
        warn!("Invalid status transition attempted: {} -> {}", current, next);
        return Err(InvalidStatusTransition { from: current, to: next });
    }

    debug!("Status transition validated: {} -> {}", current, next);
    Ok(())
}

impl Appointment {
    /// Moves the appointment to `next`, stamping `updated_at`. Every status
    /// mutation in the workspace goes through here.
    pub fn transition_to(
        &mut self,
        next: AppointmentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), InvalidStatusTransition> {
        validate_status_transition(self.status, next)?;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}
