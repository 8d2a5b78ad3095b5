//! Tests for the TimeWindow value type and the clip primitive.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Europe::Amsterdam;
use chrono_tz::Tz;
use slot_engine::error::EngineError;
use slot_engine::window::{clip, TimeWindow};

fn at(day: u32, hour: u32, min: u32) -> DateTime<Tz> {
    Amsterdam.with_ymd_and_hms(2026, 3, day, hour, min, 0).unwrap()
}

#[test]
fn inverted_window_collapses_to_empty_at_start() {
    let w = TimeWindow::new(at(16, 12, 0), at(16, 10, 0));

    assert!(w.is_empty());
    assert_eq!(w.start(), at(16, 12, 0));
    assert_eq!(w.end(), at(16, 12, 0));
    assert_eq!(w.duration_minutes(), 0, "duration is never negative");
}

#[test]
fn try_new_rejects_zero_length() {
    let err = TimeWindow::try_new(at(16, 9, 0), at(16, 9, 0)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidWindow(_)));

    let ok = TimeWindow::try_new(at(16, 9, 0), at(16, 10, 30)).unwrap();
    assert_eq!(ok.duration_minutes(), 90);
}

#[test]
fn in_timezone_converts_utc_input() {
    let start = Utc.with_ymd_and_hms(2026, 3, 16, 7, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();

    let w = TimeWindow::in_timezone(&start, &end, Amsterdam);

    // CET is UTC+1 in March before the DST switch.
    assert_eq!(w.start(), at(16, 8, 0));
    assert_eq!(w.duration_minutes(), 120);
}

#[test]
fn clip_returns_intersection() {
    let w = TimeWindow::new(at(16, 6, 0), at(16, 10, 0));

    let clipped = clip(&w, at(16, 8, 0), at(16, 22, 0));

    assert_eq!(clipped.start(), at(16, 8, 0));
    assert_eq!(clipped.end(), at(16, 10, 0));
}

#[test]
fn clip_outside_business_hours_is_empty() {
    let w = TimeWindow::new(at(16, 22, 0), at(16, 23, 30));

    let clipped = clip(&w, at(16, 8, 0), at(16, 22, 0));

    assert!(clipped.is_empty(), "window after close must clip to empty");
}

#[test]
fn clip_does_not_split_multi_day_windows() {
    // 16th 20:00 to 17th 12:00 against the 16th's business day: only 20:00-22:00.
    let w = TimeWindow::new(at(16, 20, 0), at(17, 12, 0));

    let clipped = clip(&w, at(16, 8, 0), at(16, 22, 0));

    assert_eq!(clipped.start(), at(16, 20, 0));
    assert_eq!(clipped.end(), at(16, 22, 0));
}

#[test]
fn clip_of_empty_window_is_empty() {
    let w = TimeWindow::empty_at(at(16, 9, 0));
    assert!(clip(&w, at(16, 8, 0), at(16, 22, 0)).is_empty());
}

#[test]
fn adjacent_windows_do_not_overlap() {
    let a = TimeWindow::new(at(16, 9, 0), at(16, 10, 0));
    let b = TimeWindow::new(at(16, 10, 0), at(16, 11, 0));
    let c = TimeWindow::new(at(16, 9, 30), at(16, 10, 30));

    assert!(!a.overlaps(&b));
    assert!(a.overlaps(&c));
    assert!(a.intersect(&b).is_empty());
    assert_eq!(a.intersect(&c).duration_minutes(), 30);
}

#[test]
fn contains_is_half_open() {
    let w = TimeWindow::new(at(16, 9, 0), at(16, 10, 0));

    assert!(w.contains(at(16, 9, 0)));
    assert!(w.contains(at(16, 9, 59)));
    assert!(!w.contains(at(16, 10, 0)));
}

#[test]
fn display_keeps_offsets() {
    let w = TimeWindow::new(at(16, 8, 0), at(16, 9, 0));
    assert_eq!(
        w.to_string(),
        "[2026-03-16T08:00:00+01:00, 2026-03-16T09:00:00+01:00)"
    );
}
