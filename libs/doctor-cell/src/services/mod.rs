pub mod blocked_slots;
pub mod index;

pub use blocked_slots::BlockedSlotService;
pub use index::BlockedTimeIndex;
