// libs/doctor-cell/src/services/index.rs
use chrono::{NaiveDate, NaiveTime};

use shared_models::BlockedSlot;

/// Read-only view answering "is this doctor blocked?" over a set of blocks.
/// Doctor-wide (`workplace_id = None`) and workplace-specific blocks are
/// OR-ed together; neither takes precedence.
pub struct BlockedTimeIndex<'a> {
    slots: &'a [BlockedSlot],
}

impl<'a> BlockedTimeIndex<'a> {
    pub fn new(slots: &'a [BlockedSlot]) -> Self {
        Self { slots }
    }

    fn matching(
        &self,
        doctor_id: i64,
        workplace_id: i64,
        date: NaiveDate,
    ) -> impl Iterator<Item = &'a BlockedSlot> + '_ {
        self.slots.iter().filter(move |slot| {
            slot.is_active
                && slot.doctor_id == doctor_id
                && slot.block_date == date
                && slot.applies_to_workplace(workplace_id)
        })
    }

    pub fn is_blocked(&self, doctor_id: i64, workplace_id: i64, date: NaiveDate, time: NaiveTime) -> bool {
        self.matching(doctor_id, workplace_id, date)
            .any(|slot| slot.covers(time))
    }

    pub fn full_day_block(&self, doctor_id: i64, workplace_id: i64, date: NaiveDate) -> Option<&'a BlockedSlot> {
        self.matching(doctor_id, workplace_id, date)
            .find(|slot| slot.is_full_day)
    }

    /// First block covering `time`, for "why can't I book" messages.
    pub fn blocking_slot(
        &self,
        doctor_id: i64,
        workplace_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Option<&'a BlockedSlot> {
        self.matching(doctor_id, workplace_id, date)
            .find(|slot| slot.covers(time))
    }
}
