use assert_matches::assert_matches;
use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};

use shared_models::slot::{
    compute_slot, local_date, move_to_date, parse_date, parse_slot, parse_time, shift_time,
};
use shared_models::SlotError;

fn ist() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).unwrap()
}

#[test]
fn slot_uses_twelve_hour_clock_without_leading_zero() {
    let start = ist().with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
    assert_eq!(compute_slot(start, 30), "8:00AM - 8:30AM");

    let afternoon = ist().with_ymd_and_hms(2025, 9, 1, 13, 45, 0).unwrap();
    assert_eq!(compute_slot(afternoon, 30), "1:45PM - 2:15PM");

    let late = ist().with_ymd_and_hms(2025, 9, 1, 23, 45, 0).unwrap();
    assert_eq!(compute_slot(late, 30), "11:45PM - 12:15AM");
}

#[test]
fn slot_round_trips_for_every_quarter_hour_and_duration() {
    let day = ist().with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap();

    for quarter in 0..96 {
        let start = day + Duration::minutes(quarter * 15);
        for duration in [5, 15, 30, 45, 60, 90, 240] {
            let slot = compute_slot(start, duration);
            let (parsed_start, parsed_end) = parse_slot(&slot).unwrap();
            let end = start + Duration::minutes(duration);

            assert_eq!((parsed_start.hour(), parsed_start.minute()), (start.hour(), start.minute()), "{}", slot);
            assert_eq!((parsed_end.hour(), parsed_end.minute()), (end.hour(), end.minute()), "{}", slot);
        }
    }
}

#[test]
fn shift_adds_minutes_and_zero_is_identity() {
    let start = ist().with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();
    assert_eq!(shift_time(start, 0), start);
    assert_eq!(shift_time(start, 90), ist().with_ymd_and_hms(2025, 9, 1, 9, 30, 0).unwrap());
}

#[test]
fn move_to_date_keeps_time_of_day_and_offset() {
    let offsets = [ist(), FixedOffset::west_opt(5 * 3600).unwrap(), FixedOffset::east_opt(0).unwrap()];

    for offset in offsets {
        let original = offset.with_ymd_and_hms(2025, 9, 1, 8, 15, 0).unwrap();
        let moved = move_to_date(original, "2025-12-31").unwrap();

        assert_eq!(moved.date_naive(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert_eq!(moved.time(), original.time());
        assert_eq!(moved.offset(), original.offset());
    }
}

#[test]
fn move_to_date_rejects_unparsable_dates() {
    let original = ist().with_ymd_and_hms(2025, 9, 1, 8, 0, 0).unwrap();

    for bad in ["", "2025-13-01", "2025-02-30", "01/09/2025", "tomorrow"] {
        assert_matches!(move_to_date(original, bad), Err(SlotError::InvalidDate(_)), "{}", bad);
    }
}

#[test]
fn parse_helpers() {
    assert_eq!(parse_date(" 2025-10-21 ").unwrap(), NaiveDate::from_ymd_opt(2025, 10, 21).unwrap());
    assert_eq!(parse_time("09:00").unwrap(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert_eq!(parse_time("17:30:00").unwrap(), NaiveTime::from_hms_opt(17, 30, 0).unwrap());
    assert_matches!(parse_time("9am"), Err(SlotError::InvalidTime(_)));
    assert_matches!(parse_slot("8:00AM"), Err(SlotError::InvalidSlot(_)));
}

#[test]
fn local_date_follows_the_clinic_offset() {
    // 20:00 UTC is already the next day in IST.
    let instant = Utc.with_ymd_and_hms(2025, 10, 20, 20, 0, 0).unwrap();
    assert_eq!(local_date(&instant, &ist()), NaiveDate::from_ymd_opt(2025, 10, 21).unwrap());
}
