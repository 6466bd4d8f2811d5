pub mod booking;
pub mod lifecycle;
pub mod migration;
pub mod reschedule;
pub mod scheduler;

pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use migration::LifecycleMigrator;
pub use reschedule::BulkRescheduleService;
pub use scheduler::{next_run_after, MigrationScheduler};
