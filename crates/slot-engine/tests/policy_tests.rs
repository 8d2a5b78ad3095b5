//! Tests for the business-hours policy.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Europe::Amsterdam;
use chrono_tz::Tz;
use slot_engine::error::EngineError;
use slot_engine::policy::{parse_time_of_day, BusinessHoursPolicy};
use slot_engine::window::TimeWindow;

fn policy() -> BusinessHoursPolicy {
    BusinessHoursPolicy::from_names("Europe/Amsterdam", "08:00", "22:00").unwrap()
}

fn at(month: u32, day: u32, hour: u32, min: u32) -> DateTime<Tz> {
    Amsterdam.with_ymd_and_hms(2026, month, day, hour, min, 0).unwrap()
}

#[test]
fn bounds_for_date_in_policy_timezone() {
    let bounds = policy().bounds_for(NaiveDate::from_ymd_opt(2026, 3, 16).unwrap());

    assert_eq!(bounds.start(), at(3, 16, 8, 0));
    assert_eq!(bounds.end(), at(3, 16, 22, 0));
    assert_eq!(
        bounds.start().with_timezone(&Utc),
        Utc.with_ymd_and_hms(2026, 3, 16, 7, 0, 0).unwrap()
    );
    assert_eq!(bounds.duration_minutes(), 14 * 60);
}

#[test]
fn bounds_follow_dst_switch() {
    // Europe/Amsterdam springs forward on 2026-03-29: 08:00 is then UTC+2.
    let bounds = policy().bounds_for(NaiveDate::from_ymd_opt(2026, 3, 29).unwrap());

    assert_eq!(
        bounds.start().with_timezone(&Utc),
        Utc.with_ymd_and_hms(2026, 3, 29, 6, 0, 0).unwrap()
    );
    assert_eq!(bounds.duration_minutes(), 14 * 60);
}

#[test]
fn localize_moves_out_of_dst_gap() {
    let night = BusinessHoursPolicy::from_names("Europe/Amsterdam", "02:30", "05:00").unwrap();

    // 02:30 does not exist on 2026-03-29; the day opens at the first valid time after it.
    let bounds = night.bounds_for(NaiveDate::from_ymd_opt(2026, 3, 29).unwrap());

    assert_eq!(
        bounds.start().with_timezone(&Utc),
        Utc.with_ymd_and_hms(2026, 3, 29, 1, 0, 0).unwrap()
    );
    assert!(!bounds.is_empty());
}

#[test]
fn localize_crosses_a_skipped_calendar_day() {
    // Samoa moved across the date line: 2011-12-30 never happened in Apia.
    let apia = BusinessHoursPolicy::from_names("Pacific/Apia", "08:00", "22:00").unwrap();
    let noon = NaiveDate::from_ymd_opt(2011, 12, 30)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    let resolved = apia.localize(noon);

    assert_eq!(
        resolved.with_timezone(&Utc),
        Utc.with_ymd_and_hms(2011, 12, 30, 10, 0, 0).unwrap()
    );
    assert_eq!(
        resolved.naive_local(),
        NaiveDate::from_ymd_opt(2011, 12, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    );
}

#[test]
fn unknown_timezone_is_rejected() {
    let err = BusinessHoursPolicy::from_names("Mars/Olympus_Mons", "08:00", "22:00").unwrap_err();
    assert!(matches!(err, EngineError::InvalidTimezone(tz) if tz == "Mars/Olympus_Mons"));
}

#[test]
fn inverted_hours_are_rejected() {
    let err = BusinessHoursPolicy::from_names("UTC", "22:00", "08:00").unwrap_err();
    assert!(matches!(err, EngineError::InvalidConfig(_)));
}

#[test]
fn time_of_day_accepts_seconds() {
    assert_eq!(
        parse_time_of_day("08:30:15").unwrap(),
        NaiveTime::from_hms_opt(8, 30, 15).unwrap()
    );
    assert_eq!(
        parse_time_of_day(" 22:00 ").unwrap(),
        NaiveTime::from_hms_opt(22, 0, 0).unwrap()
    );
    assert!(parse_time_of_day("8 o'clock").is_err());
}

#[test]
fn clip_uses_start_day() {
    let w = TimeWindow::new(at(3, 16, 21, 0), at(3, 17, 10, 0));

    let clipped = policy().clip(&w);

    assert_eq!(clipped.start(), at(3, 16, 21, 0));
    assert_eq!(clipped.end(), at(3, 16, 22, 0));
}

#[test]
fn clip_converts_foreign_zone_to_local_day() {
    // 23:30 UTC on the 15th is 00:30 on the 16th in Amsterdam: before opening.
    let start = Utc.with_ymd_and_hms(2026, 3, 15, 23, 30, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 16, 8, 0, 0).unwrap();
    let w = TimeWindow::in_timezone(&start, &end, Amsterdam);

    let clipped = policy().clip(&w);

    assert_eq!(clipped.start(), at(3, 16, 8, 0));
    assert_eq!(clipped.end(), at(3, 16, 9, 0));
}

#[test]
fn split_by_day_cuts_at_local_midnight() {
    let w = TimeWindow::new(at(3, 16, 20, 0), at(3, 18, 3, 0));

    let pieces = policy().split_by_day(&w);

    assert_eq!(pieces.len(), 3);
    assert_eq!(pieces[0].end(), at(3, 17, 0, 0));
    assert_eq!(pieces[1].start(), at(3, 17, 0, 0));
    assert_eq!(pieces[1].end(), at(3, 18, 0, 0));
    assert_eq!(pieces[2].end(), at(3, 18, 3, 0));
}

#[test]
fn clip_each_day_keeps_every_business_day() {
    let w = TimeWindow::new(at(3, 16, 20, 0), at(3, 18, 9, 0));

    let days = policy().clip_each_day(&w);

    assert_eq!(days.len(), 3);
    assert_eq!((days[0].start(), days[0].end()), (at(3, 16, 20, 0), at(3, 16, 22, 0)));
    assert_eq!((days[1].start(), days[1].end()), (at(3, 17, 8, 0), at(3, 17, 22, 0)));
    assert_eq!((days[2].start(), days[2].end()), (at(3, 18, 8, 0), at(3, 18, 9, 0)));
}

#[test]
fn horizon_before_opening_starts_at_opening() {
    let now = at(3, 16, 6, 30);

    let horizon = policy().booking_horizon(&now, 2);

    assert_eq!(horizon.start(), at(3, 16, 8, 0));
    assert_eq!(horizon.end(), at(3, 18, 22, 0));
}

#[test]
fn horizon_after_opening_starts_now() {
    let now = Utc.with_ymd_and_hms(2026, 3, 16, 11, 15, 0).unwrap();

    let horizon = policy().booking_horizon(&now, 1);

    assert_eq!(horizon.start(), at(3, 16, 12, 15));
    assert_eq!(horizon.end(), at(3, 17, 22, 0));
}

#[test]
fn horizon_of_zero_days_past_close_is_empty() {
    let now = at(3, 16, 23, 0);
    assert!(policy().booking_horizon(&now, 0).is_empty());
}
