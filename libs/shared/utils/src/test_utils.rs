use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use notification_cell::{Notification, NotificationError, Notifier};
use shared_config::AppConfig;
use shared_database::{AppointmentStore, InMemoryStore, StoreError};
use shared_models::slot::compute_slot;
use shared_models::{Appointment, AppointmentStatus, Clock, DoctorSummary, WorkplaceSummary};

use crate::state::AppState;

/// UTC+05:30, the offset every fixture uses.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).expect("valid offset")
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("fixture date must be YYYY-MM-DD")
}

pub struct TestConfig {
    pub clinic_utc_offset_minutes: i32,
    pub notification_timeout_seconds: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            clinic_utc_offset_minutes: 330,
            notification_timeout_seconds: 2,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            clinic_utc_offset_minutes: self.clinic_utc_offset_minutes,
            notification_timeout_seconds: self.notification_timeout_seconds,
            migration_enabled: false,
            ..AppConfig::default()
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

// ==============================================================================
// CLOCK
// ==============================================================================

pub struct FixedClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Clinic-local `date` at `HH:MM`.
    pub fn at(date_str: &str, time: &str) -> Self {
        let time = NaiveTime::parse_from_str(time, "%H:%M").expect("fixture time must be HH:MM");
        let now = ist()
            .from_local_datetime(&date(date_str).and_time(time))
            .single()
            .expect("fixed offsets are unambiguous");
        Self::new(now)
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock().expect("clock mutex poisoned") = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

// ==============================================================================
// NOTIFIER
// ==============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every attempt but reports each one as failed.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().expect("notifier mutex poisoned").len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().expect("notifier mutex poisoned").push(notification);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Delivery("gateway unavailable".to_string()));
        }
        Ok(())
    }
}

// ==============================================================================
// FIXTURES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct TestAppointment {
    pub doctor_id: i64,
    pub workplace_id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    /// Store `appointment_time` at `+00:00`, the way PostgREST returns it.
    pub stored_in_utc: bool,
}

impl TestAppointment {
    pub fn new(doctor_id: i64, workplace_id: i64) -> Self {
        Self {
            doctor_id,
            workplace_id,
            user_id: 100,
            date: date("2025-09-01"),
            time: NaiveTime::from_hms_opt(8, 0, 0).expect("valid time"),
            duration_minutes: 30,
            status: AppointmentStatus::Booked,
            stored_in_utc: false,
        }
    }

    pub fn on(mut self, date_str: &str) -> Self {
        self.date = date(date_str);
        self
    }

    pub fn at(mut self, time: &str) -> Self {
        self.time = NaiveTime::parse_from_str(time, "%H:%M").expect("fixture time must be HH:MM");
        self
    }

    pub fn duration(mut self, minutes: i32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn status(mut self, status: AppointmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn stored_in_utc(mut self) -> Self {
        self.stored_in_utc = true;
        self
    }

    pub fn build(&self) -> Appointment {
        let start = ist()
            .from_local_datetime(&self.date.and_time(self.time))
            .single()
            .expect("fixed offsets are unambiguous");
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).single().expect("valid timestamp");
        let stored_time = if self.stored_in_utc {
            start.with_timezone(&FixedOffset::east_opt(0).expect("valid offset"))
        } else {
            start
        };

        Appointment {
            id: Uuid::new_v4(),
            doctor_id: self.doctor_id,
            user_id: self.user_id,
            workplace_id: self.workplace_id,
            appointment_date: self.date,
            appointment_time: stored_time,
            duration_minutes: self.duration_minutes,
            slot: compute_slot(start, self.duration_minutes as i64),
            status: self.status,
            notes: None,
            version: 0,
            created_at: created,
            updated_at: created,
        }
    }

    pub async fn insert(&self, store: &dyn AppointmentStore) -> Result<Appointment, StoreError> {
        store.insert_appointment(self.build()).await
    }
}

pub async fn seed_directory(store: &InMemoryStore) {
    for (id, name) in [(7, "City Clinic"), (8, "Lakeside Hospital")] {
        store
            .add_workplace(WorkplaceSummary {
                id,
                name: name.to_string(),
                kind: Some("clinic".to_string()),
                address: Some(format!("{} Main Road", id)),
            })
            .await;
    }

    store
        .add_doctor(DoctorSummary {
            id: 1,
            name: "Dr. Asha Rao".to_string(),
            specialization: Some("Cardiology".to_string()),
        })
        .await;
}

pub fn test_state(
    store: Arc<InMemoryStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<FixedClock>,
) -> AppState {
    AppState::new(TestConfig::default().to_app_config(), store, notifier, clock)
}
