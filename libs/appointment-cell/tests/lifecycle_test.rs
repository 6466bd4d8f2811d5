use std::sync::Arc;

use assert_matches::assert_matches;

use appointment_cell::{AppointmentError, AppointmentLifecycleService, LifecycleMigrator, MigrationTrigger};
use shared_database::{AppointmentStore, InMemoryStore, StoreError};
use shared_models::error::AppError;
use shared_models::{AppointmentStatus, Clock, InvalidStatusTransition};
use shared_utils::test_utils::{FixedClock, TestAppointment};

fn service(store: &Arc<InMemoryStore>, clock: &Arc<FixedClock>) -> AppointmentLifecycleService {
    AppointmentLifecycleService::new(store.clone(), clock.clone())
}

#[tokio::test]
async fn completing_a_booked_appointment_bumps_version_and_timestamp() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-09-01", "08:45"));
    let appt = TestAppointment::new(1, 7).insert(store.as_ref()).await.unwrap();

    let updated = service(&store, &clock)
        .transition_status(appt.id, AppointmentStatus::Completed, Some("Seen by doctor"))
        .await
        .unwrap();

    assert_eq!(updated.status, AppointmentStatus::Completed);
    assert_eq!(updated.version, appt.version + 1);
    assert_eq!(updated.updated_at, clock.now_utc());
    assert_eq!(updated.notes.as_deref(), Some("Seen by doctor"));
}

#[tokio::test]
async fn rescheduled_can_still_be_cancelled() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-09-01", "07:00"));
    let appt = TestAppointment::new(1, 7).insert(store.as_ref()).await.unwrap();
    let service = service(&store, &clock);

    service
        .transition_status(appt.id, AppointmentStatus::Rescheduled, None)
        .await
        .unwrap();
    let cancelled = service
        .transition_status(appt.id, AppointmentStatus::Cancelled, None)
        .await
        .unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
    assert_eq!(cancelled.version, appt.version + 2);
}

#[tokio::test]
async fn terminal_states_reject_transitions_and_stay_unchanged() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-09-01", "07:00"));
    let appt = TestAppointment::new(1, 7)
        .status(AppointmentStatus::Cancelled)
        .insert(store.as_ref())
        .await
        .unwrap();

    let result = service(&store, &clock)
        .transition_status(appt.id, AppointmentStatus::Booked, Some("should not stick"))
        .await;

    assert_matches!(
        result,
        Err(AppointmentError::InvalidStatusTransition(InvalidStatusTransition {
            from: AppointmentStatus::Cancelled,
            to: AppointmentStatus::Booked,
        }))
    );
    assert_eq!(store.get_appointment(appt.id).await.unwrap().unwrap(), appt);
}

#[tokio::test]
async fn archived_appointment_reports_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-09-02", "00:01"));
    let appt = TestAppointment::new(1, 7).insert(store.as_ref()).await.unwrap();

    LifecycleMigrator::new(store.clone(), clock.clone())
        .run_daily_migration(MigrationTrigger::Scheduled)
        .await;

    let result = service(&store, &clock)
        .transition_status(appt.id, AppointmentStatus::Cancelled, None)
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound(detail)) if detail.contains("already archived"));
}

#[tokio::test]
async fn unknown_appointment_is_not_found() {
    let store = Arc::new(InMemoryStore::new());
    let clock = Arc::new(FixedClock::at("2025-09-01", "07:00"));

    let result = service(&store, &clock)
        .transition_status(uuid::Uuid::new_v4(), AppointmentStatus::Completed, None)
        .await;

    assert_matches!(result, Err(AppointmentError::NotFound(_)));
}

#[tokio::test]
async fn stale_write_surfaces_as_conflict() {
    let store = Arc::new(InMemoryStore::new());
    let appt = TestAppointment::new(1, 7).insert(store.as_ref()).await.unwrap();

    let mut first = appt.clone();
    first.transition_to(AppointmentStatus::Completed, appt.updated_at).unwrap();
    store.update_appointment(&first).await.unwrap();

    let mut stale = appt.clone();
    stale.transition_to(AppointmentStatus::Cancelled, appt.updated_at).unwrap();
    let err: AppointmentError = store.update_appointment(&stale).await.unwrap_err().into();

    assert_matches!(err, AppointmentError::Conflict(_));
    assert_matches!(AppError::from(err), AppError::Conflict(_));
}

#[test]
fn errors_map_to_http_classes() {
    use axum::http::StatusCode;

    let cases = [
        (AppointmentError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppointmentError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
        (AppointmentError::InvalidDate("x".into()), StatusCode::BAD_REQUEST),
        (
            AppointmentError::InvalidStatusTransition(InvalidStatusTransition {
                from: AppointmentStatus::Completed,
                to: AppointmentStatus::Booked,
            }),
            StatusCode::BAD_REQUEST,
        ),
        (AppointmentError::Conflict("x".into()), StatusCode::CONFLICT),
        (AppointmentError::SlotBlocked("x".into()), StatusCode::CONFLICT),
        (
            AppointmentError::from(StoreError::Backend("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    ];

    for (err, status) in cases {
        assert_eq!(AppError::from(err).status_code(), status);
    }
}
