pub mod appointment;
pub mod batch;
pub mod blocked_slot;
pub mod clock;
pub mod error;
pub mod lifecycle;
pub mod slot;

pub use appointment::*;
pub use batch::{BatchFailure, BatchOutcome};
pub use blocked_slot::*;
pub use clock::{Clock, SystemClock};
pub use lifecycle::{validate_status_transition, InvalidStatusTransition};
pub use slot::SlotError;
