use assert_matches::assert_matches;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use shared_models::{
    validate_status_transition, Appointment, AppointmentStatus, InvalidStatusTransition,
};

fn appointment(status: AppointmentStatus) -> Appointment {
    let offset = FixedOffset::east_opt(330 * 60).unwrap();
    let start: DateTime<FixedOffset> = offset.with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
    let created = Utc.with_ymd_and_hms(2025, 8, 20, 10, 0, 0).unwrap();

    Appointment {
        id: Uuid::new_v4(),
        doctor_id: 1,
        user_id: 42,
        workplace_id: 7,
        appointment_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
        appointment_time: start,
        duration_minutes: 30,
        slot: "8:00AM - 8:30AM".to_string(),
        status,
        notes: None,
        version: 1,
        created_at: created,
        updated_at: created,
    }
}

#[test]
fn booked_can_reach_every_other_state() {
    for next in [
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::Rescheduled,
    ] {
        assert!(validate_status_transition(AppointmentStatus::Booked, next).is_ok());
    }
}

#[test]
fn rescheduled_can_complete_or_cancel_only() {
    assert!(AppointmentStatus::Rescheduled.can_transition_to(AppointmentStatus::Completed));
    assert!(AppointmentStatus::Rescheduled.can_transition_to(AppointmentStatus::Cancelled));
    assert!(!AppointmentStatus::Rescheduled.can_transition_to(AppointmentStatus::Booked));
    assert!(!AppointmentStatus::Rescheduled.can_transition_to(AppointmentStatus::Rescheduled));
}

#[test]
fn terminal_states_reject_everything() {
    for terminal in [AppointmentStatus::Completed, AppointmentStatus::Cancelled] {
        assert!(terminal.is_terminal());
        for next in [
            AppointmentStatus::Booked,
            AppointmentStatus::Rescheduled,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
        ] {
            assert_matches!(
                validate_status_transition(terminal, next),
                Err(InvalidStatusTransition { from, to }) if from == terminal && to == next
            );
        }
    }
}

#[test]
fn transition_stamps_updated_at() {
    let mut appt = appointment(AppointmentStatus::Booked);
    let now = Utc.with_ymd_and_hms(2025, 9, 1, 3, 0, 0).unwrap();

    appt.transition_to(AppointmentStatus::Completed, now).unwrap();

    assert_eq!(appt.status, AppointmentStatus::Completed);
    assert_eq!(appt.updated_at, now);
}

#[test]
fn rejected_transition_leaves_appointment_untouched() {
    let mut appt = appointment(AppointmentStatus::Cancelled);
    let before = appt.clone();

    let result = appt.transition_to(
        AppointmentStatus::Completed,
        Utc.with_ymd_and_hms(2025, 9, 2, 0, 0, 0).unwrap(),
    );

    assert!(result.is_err());
    assert_eq!(appt, before);
}

#[test]
fn notes_are_appended_line_by_line() {
    let mut appt = appointment(AppointmentStatus::Booked);
    appt.append_note("first");
    appt.append_note("   ");
    appt.append_note("second");

    assert_eq!(appt.notes.as_deref(), Some("first\nsecond"));
}

#[test]
fn status_serializes_in_upper_case() {
    let json = serde_json::to_string(&AppointmentStatus::Rescheduled).unwrap();
    assert_eq!(json, "\"RESCHEDULED\"");
}
