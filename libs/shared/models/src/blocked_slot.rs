// libs/shared/models/src/blocked_slot.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A range of time a doctor is unavailable. A `None` workplace applies to
/// every workplace of the doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedSlot {
    pub id: Uuid,
    pub doctor_id: i64,
    pub workplace_id: Option<i64>,
    pub block_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub is_full_day: bool,
    pub reason: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl BlockedSlot {
    /// Whether `time` falls inside the blocked window. End is exclusive.
    pub fn covers(&self, time: NaiveTime) -> bool {
        if self.is_full_day {
            return true;
        }

        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => start <= time && time < end,
            _ => false,
        }
    }

    pub fn applies_to_workplace(&self, workplace_id: i64) -> bool {
        self.workplace_id.map_or(true, |id| id == workplace_id)
    }
}
