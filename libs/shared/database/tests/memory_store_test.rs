use assert_matches::assert_matches;
use chrono::{FixedOffset, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use shared_database::{
    AppointmentStore, ArchiveOutcome, ArchiveStore, BlockedSlotStore, InMemoryStore, StoreError,
};
use shared_models::{Appointment, AppointmentStatus, BlockedSlot, PastAppointment};

fn appointment(day: u32, hour: u32, workplace_id: i64) -> Appointment {
    let offset = FixedOffset::east_opt(330 * 60).unwrap();
    let created = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();
    Appointment {
        id: Uuid::new_v4(),
        doctor_id: 1,
        user_id: 100,
        workplace_id,
        appointment_date: NaiveDate::from_ymd_opt(2025, 9, day).unwrap(),
        appointment_time: offset.with_ymd_and_hms(2025, 9, day, hour, 0, 0).unwrap(),
        duration_minutes: 30,
        slot: String::new(),
        status: AppointmentStatus::Booked,
        notes: None,
        version: 0,
        created_at: created,
        updated_at: created,
    }
}

#[tokio::test]
async fn insert_assigns_first_version_and_rejects_duplicates() {
    let store = InMemoryStore::new();
    let appt = appointment(1, 9, 7);

    let stored = store.insert_appointment(appt.clone()).await.unwrap();
    assert_eq!(stored.version, 1);

    let again = store.insert_appointment(appt).await;
    assert_matches!(again, Err(StoreError::Duplicate(_)));
}

#[tokio::test]
async fn range_queries_are_ordered_by_time() {
    let store = InMemoryStore::new();
    for hour in [15, 9, 11] {
        store.insert_appointment(appointment(1, hour, 7)).await.unwrap();
    }
    store.insert_appointment(appointment(2, 8, 7)).await.unwrap();
    store.insert_appointment(appointment(1, 8, 8)).await.unwrap();

    let day = store
        .find_by_workplace_and_date(7, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap())
        .await
        .unwrap();
    let hours: Vec<_> = day.iter().map(|a| a.appointment_time.format("%H").to_string()).collect();
    assert_eq!(hours, vec!["09", "11", "15"]);

    let all = store.find_by_doctor_and_workplace(1, 7).await.unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.windows(2).all(|w| w[0].appointment_time <= w[1].appointment_time));
}

#[tokio::test]
async fn stale_update_is_reported_as_conflict() {
    let store = InMemoryStore::new();
    let stored = store.insert_appointment(appointment(1, 9, 7)).await.unwrap();

    let mut first = stored.clone();
    first.notes = Some("first writer".into());
    let written = store.update_appointment(&first).await.unwrap();
    assert_eq!(written.version, 2);

    let mut second = stored.clone();
    second.notes = Some("second writer".into());
    assert_matches!(
        store.update_appointment(&second).await,
        Err(StoreError::VersionConflict { expected: 1, .. })
    );

    let current = store.get_appointment(stored.id).await.unwrap().unwrap();
    assert_eq!(current.notes.as_deref(), Some("first writer"));
}

#[tokio::test]
async fn archive_moves_once_and_never_duplicates() {
    let store = InMemoryStore::new();
    let stored = store.insert_appointment(appointment(1, 9, 7)).await.unwrap();
    let past = PastAppointment::from_appointment(&stored, None, None, Utc::now());

    let outcome = store.archive_appointment(past.clone(), stored.version).await.unwrap();
    assert_eq!(outcome, ArchiveOutcome::Archived);
    assert!(store.get_appointment(stored.id).await.unwrap().is_none());

    let outcome = store.archive_appointment(past, stored.version).await.unwrap();
    assert_eq!(outcome, ArchiveOutcome::AlreadyArchived);
    assert_eq!(store.archive_count().await, 1);
}

#[tokio::test]
async fn archive_with_stale_version_writes_nothing() {
    let store = InMemoryStore::new();
    let stored = store.insert_appointment(appointment(1, 9, 7)).await.unwrap();
    let past = PastAppointment::from_appointment(&stored, None, None, Utc::now());

    let outcome = store.archive_appointment(past, stored.version + 5).await.unwrap();

    assert_eq!(outcome, ArchiveOutcome::VersionConflict);
    assert_eq!(store.active_count().await, 1);
    assert_eq!(store.archive_count().await, 0);
}

#[tokio::test]
async fn deactivated_blocks_drop_out_of_active_queries() {
    let store = InMemoryStore::new();
    let date = NaiveDate::from_ymd_opt(2025, 10, 21).unwrap();
    let slot = BlockedSlot {
        id: Uuid::new_v4(),
        doctor_id: 1,
        workplace_id: None,
        block_date: date,
        start_time: None,
        end_time: None,
        is_full_day: true,
        reason: Some("Conference".into()),
        is_active: true,
        created_at: Utc::now(),
    };
    store.insert_blocked_slot(slot.clone()).await.unwrap();
    assert_eq!(store.find_active_blocked_slots(1, date).await.unwrap().len(), 1);

    let deactivated = store.deactivate_blocked_slot(slot.id).await.unwrap();
    assert!(!deactivated.is_active);
    assert!(store.find_active_blocked_slots(1, date).await.unwrap().is_empty());
    assert_eq!(store.list_blocked_slots(1).await.unwrap().len(), 1);
}
