use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone};
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use shared_models::Clock;

use crate::models::MigrationTrigger;
use crate::services::migration::LifecycleMigrator;

/// First instant strictly after `now` whose clinic-local time is `at`.
pub fn next_run_after(now: DateTime<FixedOffset>, at: NaiveTime) -> DateTime<FixedOffset> {
    let offset = *now.offset();
    let today = offset
        .from_local_datetime(&now.date_naive().and_time(at))
        .single()
        .unwrap_or(now);

    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Fires the lifecycle migration once a day at a fixed clinic-local time.
pub struct MigrationScheduler {
    migrator: Arc<LifecycleMigrator>,
    clock: Arc<dyn Clock>,
    run_at: NaiveTime,
}

impl MigrationScheduler {
    pub fn new(migrator: Arc<LifecycleMigrator>, clock: Arc<dyn Clock>, run_at: NaiveTime) -> Self {
        Self { migrator, clock, run_at }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped. A run
    /// already in progress finishes before the loop checks for shutdown.
    #[instrument(skip(self, shutdown), fields(run_at = %self.run_at))]
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Lifecycle migration scheduler started");

        loop {
            let now = self.clock.now();
            let next = next_run_after(now, self.run_at);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_run = %next, "Next lifecycle migration scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    let report = self.migrator.run_daily_migration(MigrationTrigger::Scheduled).await;
                    if !report.succeeded() {
                        warn!(run_id = %report.run_id, "Scheduled migration left rows for the next run");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Lifecycle migration scheduler stopped");
    }
}
