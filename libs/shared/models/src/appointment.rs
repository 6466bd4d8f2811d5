// libs/shared/models/src/appointment.rs
use std::fmt;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==============================================================================
// ACTIVE APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: i64,
    pub user_id: i64,
    pub workplace_id: i64,
    /// Clinic-local calendar date of `appointment_time`.
    pub appointment_date: NaiveDate,
    pub appointment_time: DateTime<FixedOffset>,
    pub duration_minutes: i32,
    pub slot: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Incremented by the store on every successful write.
    #[serde(default)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn end_time(&self) -> DateTime<FixedOffset> {
        self.appointment_time + Duration::minutes(self.duration_minutes as i64)
    }

    /// Appends a line to the free-text notes.
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }

        self.notes = match self.notes.take() {
            Some(existing) if !existing.trim().is_empty() => Some(format!("{}\n{}", existing, note)),
            _ => Some(note.to_string()),
        };
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, AppointmentStatus::Booked | AppointmentStatus::Rescheduled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Booked,
    Rescheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "BOOKED",
            AppointmentStatus::Rescheduled => "RESCHEDULED",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==============================================================================
// ARCHIVE
// ==============================================================================

/// Denormalized workplace fields captured when an appointment is archived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkplaceSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    pub specialization: Option<String>,
}

/// Append-only snapshot of an appointment that left the active store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PastAppointment {
    pub id: Uuid,
    pub doctor_id: i64,
    pub user_id: i64,
    pub workplace_id: i64,
    pub appointment_date: NaiveDate,
    pub appointment_time: DateTime<FixedOffset>,
    pub duration_minutes: i32,
    pub slot: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub workplace_name: Option<String>,
    pub workplace_type: Option<String>,
    pub workplace_address: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_specialization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
}

impl PastAppointment {
    pub fn from_appointment(
        appointment: &Appointment,
        workplace: Option<&WorkplaceSummary>,
        doctor: Option<&DoctorSummary>,
        archived_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: appointment.id,
            doctor_id: appointment.doctor_id,
            user_id: appointment.user_id,
            workplace_id: appointment.workplace_id,
            appointment_date: appointment.appointment_date,
            appointment_time: appointment.appointment_time,
            duration_minutes: appointment.duration_minutes,
            slot: appointment.slot.clone(),
            status: appointment.status,
            notes: appointment.notes.clone(),
            workplace_name: workplace.map(|w| w.name.clone()),
            workplace_type: workplace.and_then(|w| w.kind.clone()),
            workplace_address: workplace.and_then(|w| w.address.clone()),
            doctor_name: doctor.map(|d| d.name.clone()),
            doctor_specialization: doctor.and_then(|d| d.specialization.clone()),
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
            archived_at,
        }
    }
}
