// libs/appointment-cell/src/services/migration.rs
//
// Daily lifecycle migration. Phase one promotes future-partition rows when the
// store has such a partition; phase two moves every appointment dated before
// today into the archive, one atomic move per row.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_database::{ArchiveOutcome, SchedulingStore};
use shared_models::{Appointment, BatchFailure, Clock, DoctorSummary, PastAppointment, WorkplaceSummary};
use shared_utils::AppState;

use crate::models::{MigrationReport, MigrationTrigger};

pub struct LifecycleMigrator {
    store: Arc<dyn SchedulingStore>,
    clock: Arc<dyn Clock>,
}

/// Directory lookups resolved once per run.
#[derive(Default)]
struct DirectoryCache {
    workplaces: HashMap<i64, Option<WorkplaceSummary>>,
    doctors: HashMap<i64, Option<DoctorSummary>>,
}

impl LifecycleMigrator {
    pub fn new(store: Arc<dyn SchedulingStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(Arc::clone(&state.store), Arc::clone(&state.clock))
    }

    /// Never fails: every problem is recorded in the report and the affected
    /// rows stay in the active store for the next run.
    pub async fn run_daily_migration(&self, trigger: MigrationTrigger) -> MigrationReport {
        let today = self.clock.today();
        let mut report = MigrationReport {
            run_id: Uuid::new_v4(),
            trigger,
            today,
            promoted: 0,
            archived: 0,
            skipped: 0,
            failed: Vec::new(),
            errors: Vec::new(),
            started_at: self.clock.now_utc(),
            finished_at: self.clock.now_utc(),
        };

        info!(run_id = %report.run_id, %trigger, %today, "Lifecycle migration started");

        self.promote_due(&mut report).await;
        self.archive_expired(&mut report).await;

        report.finished_at = self.clock.now_utc();

        if report.succeeded() {
            info!(
                run_id = %report.run_id,
                %trigger,
                %today,
                promoted = report.promoted,
                archived = report.archived,
                skipped = report.skipped,
                failed = report.failed.len(),
                "Lifecycle migration finished"
            );
        } else {
            error!(
                run_id = %report.run_id,
                %trigger,
                %today,
                promoted = report.promoted,
                archived = report.archived,
                skipped = report.skipped,
                failed = report.failed.len(),
                errors = ?report.errors,
                "Lifecycle migration finished with failures"
            );
        }

        report
    }

    async fn promote_due(&self, report: &mut MigrationReport) {
        if !self.store.has_future_partition() {
            debug!("Unified appointment store, nothing to promote");
            return;
        }

        match self.store.promote_due_appointments(report.today).await {
            Ok(promoted) => report.promoted = promoted,
            Err(e) => {
                warn!(run_id = %report.run_id, "Promotion phase failed: {}", e);
                report.errors.push(format!("promote: {}", e));
            }
        }
    }

    async fn archive_expired(&self, report: &mut MigrationReport) {
        let candidates = match self.store.find_before_date(report.today).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(run_id = %report.run_id, "Could not load appointments to archive: {}", e);
                report.errors.push(format!("archive: {}", e));
                return;
            }
        };

        debug!(run_id = %report.run_id, candidates = candidates.len(), "Archiving expired appointments");

        let mut cache = DirectoryCache::default();
        for appointment in candidates {
            let id = appointment.id;
            let past = self.denormalize(&appointment, &mut cache).await;

            match self.store.archive_appointment(past, appointment.version).await {
                Ok(ArchiveOutcome::Archived) => report.archived += 1,
                Ok(outcome) => {
                    debug!(appointment_id = %id, ?outcome, "Appointment not archived by this run");
                    report.skipped += 1;
                }
                Err(e) => {
                    warn!(appointment_id = %id, "Failed to archive appointment: {}", e);
                    report.failed.push(BatchFailure {
                        id,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    async fn denormalize(&self, appointment: &Appointment, cache: &mut DirectoryCache) -> PastAppointment {
        if !cache.workplaces.contains_key(&appointment.workplace_id) {
            let summary = self
                .store
                .workplace_summary(appointment.workplace_id)
                .await
                .unwrap_or_else(|e| {
                    warn!(workplace_id = appointment.workplace_id, "Workplace lookup failed: {}", e);
                    None
                });
            cache.workplaces.insert(appointment.workplace_id, summary);
        }

        if !cache.doctors.contains_key(&appointment.doctor_id) {
            let summary = self
                .store
                .doctor_summary(appointment.doctor_id)
                .await
                .unwrap_or_else(|e| {
                    warn!(doctor_id = appointment.doctor_id, "Doctor lookup failed: {}", e);
                    None
                });
            cache.doctors.insert(appointment.doctor_id, summary);
        }

        let workplace = cache.workplaces.get(&appointment.workplace_id).and_then(Option::as_ref);
        let doctor = cache.doctors.get(&appointment.doctor_id).and_then(Option::as_ref);

        PastAppointment::from_appointment(appointment, workplace, doctor, self.clock.now_utc())
    }
}
