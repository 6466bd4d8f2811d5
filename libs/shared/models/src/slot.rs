// libs/shared/models/src/slot.rs
//
// Slot arithmetic shared by booking, rescheduling and migration. Every path
// that renders a slot string goes through `compute_slot` so the display never
// drifts from `appointment_time`.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use thiserror::Error;

const SLOT_TIME_FORMAT: &str = "%-I:%M%p";
const SLOT_SEPARATOR: &str = " - ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Invalid time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Invalid slot '{0}'")]
    InvalidSlot(String),
}

/// Renders `start` and `start + duration` as e.g. `"8:00AM - 8:30AM"`.
pub fn compute_slot(start: DateTime<FixedOffset>, duration_minutes: i64) -> String {
    let end = start + Duration::minutes(duration_minutes);
    format!(
        "{}{}{}",
        start.format(SLOT_TIME_FORMAT),
        SLOT_SEPARATOR,
        end.format(SLOT_TIME_FORMAT)
    )
}

pub fn shift_time(original: DateTime<FixedOffset>, extend_minutes: i64) -> DateTime<FixedOffset> {
    original + Duration::minutes(extend_minutes)
}

/// Replaces the calendar date, keeping wall-clock time and offset.
pub fn move_to_date(original: DateTime<FixedOffset>, new_date: &str) -> Result<DateTime<FixedOffset>, SlotError> {
    let date = parse_date(new_date)?;
    with_date(original, date).ok_or_else(|| SlotError::InvalidDate(new_date.to_string()))
}

pub fn with_date(original: DateTime<FixedOffset>, date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    original
        .offset()
        .from_local_datetime(&date.and_time(original.time()))
        .single()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, SlotError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| SlotError::InvalidDate(raw.to_string()))
}

/// Accepts `HH:MM` and `HH:MM:SS`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, SlotError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| SlotError::InvalidTime(raw.to_string()))
}

/// Inverse of `compute_slot`: the start and end wall-clock times.
pub fn parse_slot(slot: &str) -> Result<(NaiveTime, NaiveTime), SlotError> {
    let (start, end) = slot
        .split_once(SLOT_SEPARATOR)
        .ok_or_else(|| SlotError::InvalidSlot(slot.to_string()))?;

    let parse = |part: &str| {
        NaiveTime::parse_from_str(part.trim(), "%I:%M%p").map_err(|_| SlotError::InvalidSlot(slot.to_string()))
    };

    Ok((parse(start)?, parse(end)?))
}

/// Calendar date of `instant` as seen from `offset`.
pub fn local_date<Tz: TimeZone>(instant: &DateTime<Tz>, offset: &FixedOffset) -> NaiveDate {
    instant.with_timezone(offset).date_naive()
}
