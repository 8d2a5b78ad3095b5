//! Tests for hour-aligned slot quantization.

use chrono::{DateTime, Duration, TimeZone, Timelike};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Europe::Amsterdam;
use chrono_tz::Tz;
use slot_engine::error::EngineError;
use slot_engine::freebusy::{compute_free, BusyInterval, FreeInterval};
use slot_engine::policy::BusinessHoursPolicy;
use slot_engine::quantize::{align_to_hour, quantize, slot_duration, Slot, MAX_SLOT_MINUTES};
use slot_engine::window::TimeWindow;

fn at(hour: u32, min: u32) -> DateTime<Tz> {
    Amsterdam.with_ymd_and_hms(2026, 3, 16, hour, min, 0).unwrap()
}

fn free(start: DateTime<Tz>, end: DateTime<Tz>) -> FreeInterval {
    FreeInterval::from_window(&TimeWindow::new(start, end)).unwrap()
}

fn hour() -> Duration {
    Duration::minutes(60)
}

#[test]
fn business_day_with_one_meeting_yields_expected_slots() {
    // Busy 10:00-11:30 leaves 08:00-10:00 and 11:30-22:00; 11:30 rounds up to 12:00.
    let policy = BusinessHoursPolicy::from_names("Europe/Amsterdam", "08:00", "22:00").unwrap();
    let query = TimeWindow::new(at(8, 0), at(22, 0));
    let busy = [BusyInterval::new(at(10, 0), at(11, 30))];

    let slots = quantize(&compute_free(&query, &busy, &policy), hour()).unwrap();

    let mut expected = vec![Slot::new(at(8, 0)), Slot::new(at(9, 0))];
    expected.extend((12..22).map(|h| Slot::new(at(h, 0))));
    assert_eq!(slots, expected);
    assert_eq!(slots.len(), 12);
}

#[test]
fn unaligned_start_rounds_up_never_down() {
    let slots = quantize(&[free(at(9, 15), at(12, 0))], hour()).unwrap();

    assert_eq!(slots.first(), Some(&Slot::new(at(10, 0))));
    assert_eq!(slots.len(), 2);
}

#[test]
fn partial_hour_remainder_is_dropped() {
    // 08:00-10:45 holds two full hours; 10:00-10:45 is not offered.
    let slots = quantize(&[free(at(8, 0), at(10, 45))], hour()).unwrap();
    assert_eq!(slots, vec![Slot::new(at(8, 0)), Slot::new(at(9, 0))]);
}

#[test]
fn interval_shorter_than_slot_after_alignment_contributes_nothing() {
    // 09:30-10:50: aligned start 10:00 + 60 min passes 10:50.
    let slots = quantize(&[free(at(9, 30), at(10, 50))], hour()).unwrap();
    assert!(slots.is_empty());
}

#[test]
fn exact_fit_is_offered() {
    let slots = quantize(&[free(at(21, 0), at(22, 0))], hour()).unwrap();
    assert_eq!(slots, vec![Slot::new(at(21, 0))]);
}

#[test]
fn shorter_slots_step_from_the_hour() {
    let slots = quantize(&[free(at(8, 10), at(10, 0))], Duration::minutes(30)).unwrap();

    let starts: Vec<_> = slots.iter().map(|s| (s.start.hour(), s.start.minute())).collect();
    assert_eq!(starts, vec![(9, 0), (9, 30)]);
}

#[test]
fn slots_from_several_intervals_stay_chronological() {
    let slots = quantize(
        &[free(at(8, 0), at(9, 0)), free(at(13, 20), at(16, 0))],
        hour(),
    )
    .unwrap();

    assert_eq!(
        slots,
        vec![
            Slot::new(at(8, 0)),
            Slot::new(at(14, 0)),
            Slot::new(at(15, 0)),
        ]
    );
}

#[test]
fn non_positive_duration_is_rejected() {
    let err = quantize(&[free(at(8, 0), at(9, 0))], Duration::zero()).unwrap_err();
    assert!(matches!(err, EngineError::InvalidSlotDuration(0)));

    assert!(matches!(
        slot_duration(-15),
        Err(EngineError::InvalidSlotDuration(-15))
    ));
    assert_eq!(slot_duration(45).unwrap(), Duration::minutes(45));
}

#[test]
fn oversized_duration_is_rejected() {
    assert!(matches!(
        slot_duration(i64::MAX),
        Err(EngineError::InvalidSlotDuration(i64::MAX))
    ));
    assert!(matches!(
        slot_duration(MAX_SLOT_MINUTES + 1),
        Err(EngineError::InvalidSlotDuration(1441))
    ));
    assert_eq!(slot_duration(MAX_SLOT_MINUTES).unwrap(), Duration::days(1));
}

#[test]
fn duration_past_the_calendar_range_yields_no_slots() {
    let whole_day = free(at(8, 0), at(22, 0));

    let slots = quantize(&[whole_day], Duration::days(100_000_000)).unwrap();

    assert!(slots.is_empty());
}

#[test]
fn align_to_hour_uses_local_wall_clock() {
    // Kolkata is UTC+05:30: local 09:00 is not a UTC hour boundary, but is aligned.
    let local_nine = Kolkata.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
    assert_eq!(align_to_hour(local_nine), local_nine);

    let local_nine_thirty = Kolkata.with_ymd_and_hms(2026, 3, 16, 9, 30, 0).unwrap();
    assert_eq!(
        align_to_hour(local_nine_thirty),
        Kolkata.with_ymd_and_hms(2026, 3, 16, 10, 0, 0).unwrap()
    );
}

#[test]
fn align_to_hour_advances_on_seconds() {
    let just_past = Amsterdam.with_ymd_and_hms(2026, 3, 16, 9, 0, 1).unwrap();
    assert_eq!(align_to_hour(just_past), at(10, 0));
}

#[test]
fn slot_end_and_display() {
    let slot = Slot::new(at(9, 0));

    assert_eq!(slot.end(hour()), at(10, 0));
    assert_eq!(slot.window(hour()).duration_minutes(), 60);
    assert_eq!(slot.to_string(), "2026-03-16T09:00:00+01:00");
}
