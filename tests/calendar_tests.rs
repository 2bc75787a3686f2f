use chrono::{Datelike, NaiveDate, Weekday};
use schedule_export::calendar::WorkCalendar;
use schedule_export::config::{Holiday, WorkdayConfiguration};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn default_calendar_weekends_are_not_working_dates() {
    let cal = WorkCalendar::default();
    // 2025-01-04 is a Saturday, 2025-01-05 is a Sunday
    assert!(!cal.is_working_date(d(2025, 1, 4)));
    assert!(!cal.is_working_date(d(2025, 1, 5)));
    assert!(cal.is_working_date(d(2025, 1, 6)));
    assert_eq!(cal.week_start(), Weekday::Mon);
}

#[test]
fn default_calendar_has_no_holidays() {
    let cal = WorkCalendar::default();
    // New Year's Day 2025 is a Wednesday
    assert!(cal.is_working_date(d(2025, 1, 1)));
    assert!(cal.holidays().is_empty());
}

#[test]
fn working_date_on_or_after_snaps_weekend_to_monday() {
    let cal = WorkCalendar::default();
    let snapped = cal.working_date_on_or_after(d(2025, 1, 4));
    assert_eq!(snapped.weekday(), Weekday::Mon);
    assert_eq!(snapped, d(2025, 1, 6));
    assert_eq!(cal.working_date_on_or_after(d(2025, 1, 7)), d(2025, 1, 7));
}

#[test]
fn next_working_date_is_exclusive() {
    let cal = WorkCalendar::default();
    // From Friday 2025-01-03 the next working date is Monday 2025-01-06
    assert_eq!(cal.next_working_date(d(2025, 1, 3)), d(2025, 1, 6));
    assert_eq!(cal.next_working_date(d(2025, 1, 6)), d(2025, 1, 7));
}

#[test]
fn count_working_days_is_inclusive() {
    let cal = WorkCalendar::default();
    assert_eq!(cal.count_working_days(d(2025, 1, 6), d(2025, 1, 10)), 5);
    assert_eq!(cal.count_working_days(d(2025, 1, 6), d(2025, 1, 12)), 5);
    assert_eq!(cal.count_working_days(d(2025, 1, 6), d(2025, 1, 6)), 1);
    assert_eq!(cal.count_working_days(d(2025, 1, 10), d(2025, 1, 6)), 0);
}

#[test]
fn set_working_days_includes_saturday() {
    let mut cal = WorkCalendar::default();
    cal.set_working_days(vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
    ]);
    assert!(cal.is_working_date(d(2025, 1, 4)));
    assert!(!cal.is_working_date(d(2025, 1, 5)));
    assert_eq!(cal.working_days().len(), 6);
}

#[test]
fn holidays_are_skipped_when_snapping() {
    let cal = WorkCalendar::custom(
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
        [d(2025, 1, 6)],
    );
    assert!(!cal.is_working_date(d(2025, 1, 6)));
    assert_eq!(cal.working_date_on_or_after(d(2025, 1, 4)), d(2025, 1, 7));
}

#[test]
fn calendar_from_configuration_keeps_week_start_and_holidays() {
    let config = WorkdayConfiguration {
        start_of_week: Weekday::Sun,
        working_days: vec![Weekday::Sun, Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu],
        holidays: vec![
            Holiday::new("Second", d(2025, 3, 2)),
            Holiday::new("First", d(2025, 1, 1)),
        ],
        allow_work_on_non_working_days: false,
    };
    let cal = WorkCalendar::from_config(&config);
    assert_eq!(cal.week_start(), Weekday::Sun);
    assert!(cal.is_working_date(d(2025, 1, 5)));
    assert!(!cal.is_working_date(d(2025, 1, 3)));
    assert_eq!(
        cal.holidays(),
        vec![(d(2025, 1, 1), "First"), (d(2025, 3, 2), "Second")]
    );
}

#[test]
fn missing_configuration_falls_back_to_default_week() {
    let cal = WorkCalendar::from_optional_config(None);
    assert_eq!(cal, WorkCalendar::default());
    assert_eq!(
        cal.working_days(),
        vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
    );
}

#[test]
fn calendar_without_working_days_leaves_dates_untouched() {
    let cal = WorkCalendar::custom(Vec::<Weekday>::new(), Vec::<NaiveDate>::new());
    assert_eq!(cal.working_date_on_or_after(d(2025, 1, 4)), d(2025, 1, 4));
}
